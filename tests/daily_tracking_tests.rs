use calorie_tracker::goals::{compute_daily_targets, DailyProgress};
use calorie_tracker::meal_aggregator::{aggregate, Meal, Recipe};
use calorie_tracker::models::{
    ActivityLevel, ConsumedItem, Goal, MealTotals, Sex, SubscriptionPlan, UserProfile,
};
use calorie_tracker::search::LocalFoodTable;
use calorie_tracker::store::JsonStore;
use calorie_tracker::unit_scaler::scale;

fn profile() -> UserProfile {
    UserProfile {
        age_years: 30.0,
        weight_kg: 70.0,
        height_cm: 175.0,
        sex: Sex::Male,
        activity_level: ActivityLevel::Moderate,
        goal: Goal::Maintenance,
    }
}

fn assert_close(a: f64, b: f64) {
    assert!((a - b).abs() < 1e-6, "{} != {}", a, b);
}

#[test]
fn test_reference_profile_end_to_end() {
    let targets = compute_daily_targets(&profile()).unwrap();
    assert_eq!(targets.calories, 2594.3);
    assert_eq!(targets.protein_g, 154.0);
    assert_eq!(targets.fat_g, 72.1);
    assert_eq!(targets.carbs_g, 332.4);

    let json = serde_json::to_value(targets).unwrap();
    assert_eq!(json["proteinG"], 154.0);
    assert_eq!(json["sodiumMg"], 2300.0);
}

#[test]
fn test_meal_from_local_table_against_targets() {
    let table = LocalFoodTable::curated().unwrap();
    let banana = table.find("banana", 1)[0].clone();
    let oats = table.find("oats", 1)[0].clone();

    let mut breakfast = Meal::new("Breakfast");
    breakfast.add_item(oats.clone(), 50.0).unwrap();
    breakfast.add_item(banana.clone(), 120.0).unwrap();

    let totals = breakfast.totals().unwrap();
    let expected_calories = scale(&oats, 50.0).unwrap().calories_per_100
        + scale(&banana, 120.0).unwrap().calories_per_100;
    assert_close(totals.calories, expected_calories);

    let targets = compute_daily_targets(&profile()).unwrap();
    let progress = DailyProgress::compute(&totals, &targets);
    assert!(!progress.calories.is_over());
    assert!(progress.calories.percent_of_target.unwrap() > 0.0);
    assert_close(progress.sodium.target, 2300.0);
}

#[test]
fn test_totals_follow_quantity_edits() {
    let table = LocalFoodTable::curated().unwrap();
    let banana = table.find("banana", 1)[0].clone();

    let mut snack = Meal::new("Snack");
    snack.add_item(banana, 100.0).unwrap();
    let before = snack.totals().unwrap().calories;

    assert!(snack.set_quantity(0, 200.0).unwrap());
    assert_close(snack.totals().unwrap().calories, before * 2.0);

    assert!(snack.set_quantity(0, -1.0).is_err());
    assert!(!snack.set_quantity(5, 10.0).unwrap());

    snack.remove_item(0);
    assert_eq!(snack.totals().unwrap(), MealTotals::default());
}

#[test]
fn test_recipe_per_serving_matches_whole_divided() {
    let table = LocalFoodTable::curated().unwrap();
    let oats = table.find("oats", 1)[0].clone();
    let banana = table.find("banana", 1)[0].clone();
    let ingredients = vec![
        ConsumedItem::new(oats, 200.0).unwrap(),
        ConsumedItem::new(banana, 240.0).unwrap(),
    ];

    let whole = aggregate(&ingredients).unwrap();
    let recipe = Recipe {
        name: "Banana oat bake".to_string(),
        servings: 4,
        ingredients,
    };
    let per_serving = recipe.per_serving().unwrap();
    assert_close(per_serving.calories * 4.0, whole.calories);

    let profile = recipe.profile().unwrap();
    assert_close(profile.total_mass_g, 440.0);
    assert_close(profile.per_100g.calories, whole.calories / 4.4);
}

#[tokio::test]
async fn test_state_survives_a_store_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonStore::new(dir.path());
    let table = LocalFoodTable::curated().unwrap();

    let mut lunch = Meal::new("Lunch");
    lunch.add_item(table.find("salmon", 1)[0].clone(), 150.0).unwrap();
    store.save_meals(&[lunch.clone()]).await.unwrap();
    store.save_profile(&profile()).await.unwrap();
    store.save_plan(SubscriptionPlan::Pro).await.unwrap();

    let reopened = JsonStore::new(dir.path());
    let meals = reopened.load_meals().await.unwrap();
    assert_eq!(meals, vec![lunch.clone()]);
    assert_eq!(meals[0].totals().unwrap(), lunch.totals().unwrap());
    assert_eq!(reopened.load_profile().await.unwrap(), Some(profile()));
    assert_eq!(reopened.load_plan().await.unwrap(), SubscriptionPlan::Pro);

    let consumed: MealTotals = meals.iter().map(|m| m.totals().unwrap()).sum();
    let progress = DailyProgress::compute(&consumed, &compute_daily_targets(&profile()).unwrap());
    assert_close(progress.calories.consumed, 309.0);
}
