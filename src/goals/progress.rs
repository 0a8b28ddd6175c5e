use serde::{Deserialize, Serialize};

use crate::goals::targets::round1;
use crate::models::{DailyTargets, MealTotals};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NutrientProgress {
    pub consumed: f64,
    pub target: f64,
    /// Negative once the target is exceeded.
    pub remaining: f64,
    /// `None` when the target is zero.
    pub percent_of_target: Option<f64>,
}

impl NutrientProgress {
    fn new(consumed: f64, target: f64) -> Self {
        let percent_of_target = if target > 0.0 {
            Some(round1(consumed / target * 100.0))
        } else {
            None
        };
        Self {
            consumed: round1(consumed),
            target,
            remaining: round1(target - consumed),
            percent_of_target,
        }
    }

    pub fn is_over(&self) -> bool {
        self.remaining < 0.0
    }
}

/// Consumed totals measured against daily targets.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyProgress {
    pub calories: NutrientProgress,
    pub protein: NutrientProgress,
    pub carbs: NutrientProgress,
    pub fat: NutrientProgress,
    pub fiber: NutrientProgress,
    pub sugar: NutrientProgress,
    pub sodium: NutrientProgress,
}

impl DailyProgress {
    pub fn compute(consumed: &MealTotals, targets: &DailyTargets) -> Self {
        Self {
            calories: NutrientProgress::new(consumed.calories, targets.calories),
            protein: NutrientProgress::new(consumed.protein, targets.protein_g),
            carbs: NutrientProgress::new(consumed.carbs, targets.carbs_g),
            fat: NutrientProgress::new(consumed.fat, targets.fat_g),
            fiber: NutrientProgress::new(consumed.fiber, targets.fiber_g),
            sugar: NutrientProgress::new(consumed.sugar, targets.sugar_g),
            sodium: NutrientProgress::new(consumed.sodium, targets.sodium_mg),
        }
    }
}
