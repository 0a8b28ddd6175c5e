use serde::{Deserialize, Serialize};

use crate::errors::ValidationError;
use crate::goals::energy_model::{
    compute_bmr, compute_goal_calories, compute_macros, compute_tdee, KCAL_PER_G_CARBS,
};
use crate::models::{DailyTargets, UserProfile};

/// Fiber guidance: 14 g per 1000 kcal eaten.
pub const FIBER_G_PER_1000_KCAL: f64 = 14.0;
/// Added sugar capped at 10% of daily calories.
pub const SUGAR_CALORIE_SHARE: f64 = 0.10;
pub const SODIUM_LIMIT_MG: f64 = 2300.0;

/// Intermediate values of the target pipeline, kept for display and debugging.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnergyBreakdown {
    pub bmr: f64,
    pub tdee: f64,
    pub goal_calories: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetReport {
    pub energy: EnergyBreakdown,
    pub targets: DailyTargets,
}

/// Rounds half away from zero to one decimal place.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Runs the whole BMR -> TDEE -> goal -> macros pipeline at full precision, then
/// rounds every reported figure to one decimal.
pub fn compute_target_report(profile: &UserProfile) -> Result<TargetReport, ValidationError> {
    let bmr = compute_bmr(
        profile.weight_kg,
        profile.height_cm,
        profile.age_years,
        profile.sex,
    )?;
    let tdee = compute_tdee(bmr, profile.activity_level)?;
    let goal_calories = compute_goal_calories(tdee, profile.goal)?;
    let macros = compute_macros(goal_calories, profile.weight_kg)?;

    let fiber_g = goal_calories / 1000.0 * FIBER_G_PER_1000_KCAL;
    let sugar_g = goal_calories * SUGAR_CALORIE_SHARE / KCAL_PER_G_CARBS;

    Ok(TargetReport {
        energy: EnergyBreakdown {
            bmr: round1(bmr),
            tdee: round1(tdee),
            goal_calories: round1(goal_calories),
        },
        targets: DailyTargets {
            calories: round1(goal_calories),
            protein_g: round1(macros.protein_g),
            carbs_g: round1(macros.carbs_g),
            fat_g: round1(macros.fat_g),
            fiber_g: round1(fiber_g),
            sugar_g: round1(sugar_g),
            sodium_mg: SODIUM_LIMIT_MG,
        },
    })
}

pub fn compute_daily_targets(profile: &UserProfile) -> Result<DailyTargets, ValidationError> {
    Ok(compute_target_report(profile)?.targets)
}
