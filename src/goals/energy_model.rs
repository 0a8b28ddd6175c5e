//! Energy expenditure and macro split.
//!
//! BMR uses the Mifflin-St Jeor equation (Mifflin et al., 1990):
//! `10 x weight_kg + 6.25 x height_cm - 5 x age + s`, with `s = +5` for men and
//! `s = -161` for women.

use serde::{Deserialize, Serialize};

use crate::errors::{require_in_range, require_non_negative, ValidationError};
use crate::models::{ActivityLevel, Goal, Sex};

pub const MAX_WEIGHT_KG: f64 = 500.0;
pub const MAX_HEIGHT_CM: f64 = 300.0;
pub const MAX_AGE_YEARS: f64 = 120.0;

pub const PROTEIN_G_PER_KG: f64 = 2.2;
pub const FAT_CALORIE_SHARE: f64 = 0.25;
pub const KCAL_PER_G_PROTEIN: f64 = 4.0;
pub const KCAL_PER_G_CARBS: f64 = 4.0;
pub const KCAL_PER_G_FAT: f64 = 9.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MacroTargets {
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
}

impl ActivityLevel {
    pub fn factor(&self) -> f64 {
        match self {
            ActivityLevel::Sedentary => 1.2,
            ActivityLevel::Light => 1.375,
            ActivityLevel::Moderate => 1.55,
            ActivityLevel::Active => 1.725,
            ActivityLevel::VeryActive => 1.9,
        }
    }
}

impl Goal {
    /// Daily kcal added to TDEE. Gain uses a lean +300 surplus.
    pub fn calorie_offset(&self) -> f64 {
        match self {
            Goal::Loss => -500.0,
            Goal::Maintenance => 0.0,
            Goal::Gain => 300.0,
        }
    }
}

pub fn compute_bmr(
    weight_kg: f64,
    height_cm: f64,
    age_years: f64,
    sex: Sex,
) -> Result<f64, ValidationError> {
    let weight_kg = require_in_range("weightKg", weight_kg, 0.0, MAX_WEIGHT_KG)?;
    let height_cm = require_in_range("heightCm", height_cm, 0.0, MAX_HEIGHT_CM)?;
    let age_years = require_in_range("ageYears", age_years, 0.0, MAX_AGE_YEARS)?;

    let sex_constant = match sex {
        Sex::Male => 5.0,
        Sex::Female => -161.0,
    };

    Ok(10.0 * weight_kg + 6.25 * height_cm - 5.0 * age_years + sex_constant)
}

pub fn compute_tdee(bmr: f64, activity_level: ActivityLevel) -> Result<f64, ValidationError> {
    let bmr = require_in_range("bmr", bmr, 0.0, f64::MAX)?;
    Ok(bmr * activity_level.factor())
}

/// Never negative, even for a tiny TDEE with a loss goal.
pub fn compute_goal_calories(tdee: f64, goal: Goal) -> Result<f64, ValidationError> {
    let tdee = require_in_range("tdee", tdee, 0.0, f64::MAX)?;
    Ok((tdee + goal.calorie_offset()).max(0.0))
}

/// Protein is fixed per kg, fat is a share of calories, carbs fill the remainder.
///
/// Carbs clamp at 0 when protein and fat alone exceed `goal_calories`.
pub fn compute_macros(goal_calories: f64, weight_kg: f64) -> Result<MacroTargets, ValidationError> {
    let goal_calories = require_non_negative("goalCalories", goal_calories)?;
    let weight_kg = require_in_range("weightKg", weight_kg, 0.0, MAX_WEIGHT_KG)?;

    let protein_g = PROTEIN_G_PER_KG * weight_kg;
    let fat_g = goal_calories * FAT_CALORIE_SHARE / KCAL_PER_G_FAT;
    let remaining = goal_calories - protein_g * KCAL_PER_G_PROTEIN - fat_g * KCAL_PER_G_FAT;
    let carbs_g = (remaining / KCAL_PER_G_CARBS).max(0.0);

    Ok(MacroTargets {
        protein_g,
        carbs_g,
        fat_g,
    })
}
