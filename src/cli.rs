use clap::{Args, Parser, Subcommand};

use crate::models::{ActivityLevel, Goal, Sex, SubscriptionPlan, UserProfile};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Nutrition tracking and daily goal calculator",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compute daily calorie and macro targets
    Targets(TargetsArgs),
    /// Log and inspect meals
    Meal {
        #[command(subcommand)]
        action: MealAction,
    },
    /// Build and inspect recipes
    Recipe {
        #[command(subcommand)]
        action: RecipeAction,
    },
    /// Search every food source for a query
    Search {
        query: String,
        /// Overrides MAX_SEARCH_RESULTS
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Look up a packaged product by barcode on OpenFoodFacts
    Barcode {
        code: String,
        /// Scale the product to this many servings
        #[arg(short, long)]
        servings: Option<f64>,
        /// Serving size in grams, when the product label has none
        #[arg(long)]
        serving_grams: Option<f64>,
    },
    /// Compare everything logged against the saved profile's targets
    Progress,
    /// Show or change the selected plan
    Plan { plan: Option<SubscriptionPlan> },
}

#[derive(Args, Debug)]
pub struct TargetsArgs {
    #[arg(long)]
    pub age: Option<f64>,
    /// Body weight in kg
    #[arg(long)]
    pub weight: Option<f64>,
    /// Height in cm
    #[arg(long)]
    pub height: Option<f64>,
    #[arg(long)]
    pub sex: Option<Sex>,
    /// sedentary, light, moderate, active or veryActive
    #[arg(long)]
    pub activity: Option<ActivityLevel>,
    /// loss, maintenance or gain
    #[arg(long)]
    pub goal: Option<Goal>,
    /// Store the given profile for later `progress` runs
    #[arg(long)]
    pub save: bool,
}

impl TargetsArgs {
    /// Returns a profile when every field was passed on the command line.
    pub fn profile(&self) -> Option<UserProfile> {
        Some(UserProfile {
            age_years: self.age?,
            weight_kg: self.weight?,
            height_cm: self.height?,
            sex: self.sex?,
            activity_level: self.activity?,
            goal: self.goal?,
        })
    }

    pub fn any_field_set(&self) -> bool {
        self.age.is_some()
            || self.weight.is_some()
            || self.height.is_some()
            || self.sex.is_some()
            || self.activity.is_some()
            || self.goal.is_some()
    }
}

#[derive(Subcommand, Debug)]
pub enum MealAction {
    /// Add the best search match for a food to a meal, creating the meal if needed
    Add {
        meal: String,
        food: String,
        #[arg(short, long)]
        grams: f64,
    },
    /// Remove one item (0-based index) from a meal
    Remove { meal: String, index: usize },
    /// Change the quantity of one item
    SetQuantity {
        meal: String,
        index: usize,
        grams: f64,
    },
    /// Print every logged meal with its totals
    List,
    /// Delete all logged meals
    Clear,
}

#[derive(Subcommand, Debug)]
pub enum RecipeAction {
    /// Create an empty recipe
    Create {
        name: String,
        #[arg(short, long, default_value_t = 1)]
        servings: u32,
    },
    /// Add the best search match for a food to a recipe
    Add {
        recipe: String,
        food: String,
        #[arg(short, long)]
        grams: f64,
    },
    /// Print every recipe with its whole-dish profile and per-serving totals
    List,
    /// Delete a recipe
    Delete { name: String },
}

pub fn parse_args() -> Cli {
    Cli::parse()
}
