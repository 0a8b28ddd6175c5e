use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::Add;
use std::str::FromStr;

use crate::errors::{require_non_negative, ValidationError};

/// Reference nutrition facts for one food, per 100 g.
///
/// Sodium is stored in milligrams, every other nutrient in grams (calories in kcal).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NutrientRecord {
    pub name: String,
    pub calories_per_100: f64,
    pub protein_per_100: f64,
    pub carbs_per_100: f64,
    pub fat_per_100: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fiber_per_100: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sugar_per_100: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sodium_per_100: Option<f64>,
}

impl NutrientRecord {
    pub fn new(name: impl Into<String>, calories: f64, protein: f64, carbs: f64, fat: f64) -> Self {
        Self {
            name: name.into(),
            calories_per_100: calories,
            protein_per_100: protein,
            carbs_per_100: carbs,
            fat_per_100: fat,
            fiber_per_100: None,
            sugar_per_100: None,
            sodium_per_100: None,
        }
    }

    /// Every present nutrient must be finite and non-negative.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_non_negative("caloriesPer100", self.calories_per_100)?;
        require_non_negative("proteinPer100", self.protein_per_100)?;
        require_non_negative("carbsPer100", self.carbs_per_100)?;
        require_non_negative("fatPer100", self.fat_per_100)?;
        if let Some(v) = self.fiber_per_100 {
            require_non_negative("fiberPer100", v)?;
        }
        if let Some(v) = self.sugar_per_100 {
            require_non_negative("sugarPer100", v)?;
        }
        if let Some(v) = self.sodium_per_100 {
            require_non_negative("sodiumPer100", v)?;
        }
        Ok(())
    }
}

/// An ingredient as logged by the user. Scaling happens on read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsumedItem {
    pub record: NutrientRecord,
    pub quantity_grams: f64,
}

impl ConsumedItem {
    pub fn new(record: NutrientRecord, quantity_grams: f64) -> Result<Self, ValidationError> {
        let quantity_grams = require_non_negative("quantityGrams", quantity_grams)?;
        Ok(Self {
            record,
            quantity_grams,
        })
    }
}

/// Summed nutrients for a meal, recipe or day. Optional nutrients are always present as 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MealTotals {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub fiber: f64,
    pub sugar: f64,
    pub sodium: f64,
}

impl MealTotals {
    /// Reads a (usually already scaled) record as absolute amounts.
    pub fn from_record(record: &NutrientRecord) -> Self {
        Self {
            calories: record.calories_per_100,
            protein: record.protein_per_100,
            carbs: record.carbs_per_100,
            fat: record.fat_per_100,
            fiber: record.fiber_per_100.unwrap_or(0.0),
            sugar: record.sugar_per_100.unwrap_or(0.0),
            sodium: record.sodium_per_100.unwrap_or(0.0),
        }
    }

    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            calories: self.calories * factor,
            protein: self.protein * factor,
            carbs: self.carbs * factor,
            fat: self.fat * factor,
            fiber: self.fiber * factor,
            sugar: self.sugar * factor,
            sodium: self.sodium * factor,
        }
    }
}

impl Add for MealTotals {
    type Output = MealTotals;

    fn add(self, other: MealTotals) -> MealTotals {
        MealTotals {
            calories: self.calories + other.calories,
            protein: self.protein + other.protein,
            carbs: self.carbs + other.carbs,
            fat: self.fat + other.fat,
            fiber: self.fiber + other.fiber,
            sugar: self.sugar + other.sugar,
            sodium: self.sodium + other.sodium,
        }
    }
}

impl Sum for MealTotals {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(MealTotals::default(), |acc, t| acc + t)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "String")]
pub enum Sex {
    Male,
    Female,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "String")]
pub enum ActivityLevel {
    Sedentary,
    Light,
    Moderate,
    Active,
    VeryActive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "String")]
pub enum Goal {
    Loss,
    Maintenance,
    Gain,
}

/// Stored plan selection. No feature gating is attached to it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "String")]
pub enum SubscriptionPlan {
    #[default]
    Free,
    Pro,
    Fitness,
}

// Closed enums parsed from user-facing strings. Matching ignores case, '-' and '_'
// so "veryActive", "very_active" and "VERY-ACTIVE" are the same value.
macro_rules! closed_enum {
    ($ty:ident, $kind:literal, [$($variant:ident => $name:literal),+ $(,)?]) => {
        impl $ty {
            pub const ALL: &'static [$ty] = &[$($ty::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($ty::$variant => $name),+
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = normalize_variant(s);
                $ty::ALL
                    .iter()
                    .copied()
                    .find(|v| normalize_variant(v.as_str()) == wanted)
                    .ok_or_else(|| ValidationError::UnknownVariant {
                        kind: $kind,
                        value: s.to_string(),
                        expected: concat!($($name, " "),+).trim_end(),
                    })
            }
        }

        impl TryFrom<String> for $ty {
            type Error = ValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }
    };
}

fn normalize_variant(s: &str) -> String {
    s.trim()
        .chars()
        .filter(|c| *c != '_' && *c != '-')
        .flat_map(char::to_lowercase)
        .collect()
}

closed_enum!(Sex, "sex", [Male => "male", Female => "female"]);
closed_enum!(ActivityLevel, "activity level", [
    Sedentary => "sedentary",
    Light => "light",
    Moderate => "moderate",
    Active => "active",
    VeryActive => "veryActive",
]);
closed_enum!(Goal, "goal", [Loss => "loss", Maintenance => "maintenance", Gain => "gain"]);
closed_enum!(SubscriptionPlan, "plan", [Free => "free", Pro => "pro", Fitness => "fitness"]);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub age_years: f64,
    pub weight_kg: f64,
    pub height_cm: f64,
    pub sex: Sex,
    pub activity_level: ActivityLevel,
    pub goal: Goal,
}

/// Daily intake targets derived from a [`UserProfile`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyTargets {
    pub calories: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
    pub fiber_g: f64,
    pub sugar_g: f64,
    pub sodium_mg: f64,
}
