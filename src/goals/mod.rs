pub mod energy_model;
pub mod progress;
pub mod targets;

pub use energy_model::{
    compute_bmr, compute_goal_calories, compute_macros, compute_tdee, MacroTargets,
};
pub use progress::{DailyProgress, NutrientProgress};
pub use targets::{compute_daily_targets, compute_target_report, round1, TargetReport};
