use serde::{Deserialize, Serialize};

use crate::errors::{require_non_negative, ValidationError};
use crate::models::{ConsumedItem, MealTotals, NutrientRecord};
use crate::unit_scaler::scale;

/// Sums the scaled nutrients of every item. Absent optional nutrients count as 0.
pub fn aggregate(items: &[ConsumedItem]) -> Result<MealTotals, ValidationError> {
    items
        .iter()
        .map(|item| scale(&item.record, item.quantity_grams).map(|r| MealTotals::from_record(&r)))
        .sum()
}

// Aggregated totals plus the same values normalized per 100 g of the finished dish.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MealProfile {
    pub total_mass_g: f64,
    pub totals: MealTotals,
    pub per_100g: MealTotals,
}

pub fn calculate_meal_profile(items: &[ConsumedItem]) -> Result<MealProfile, ValidationError> {
    let totals = aggregate(items)?;
    let total_mass_g: f64 = items.iter().map(|i| i.quantity_grams).sum();

    let per_100g = if total_mass_g > 0.0 {
        totals.scaled(100.0 / total_mass_g)
    } else {
        MealTotals::default()
    };

    Ok(MealProfile {
        total_mass_g,
        totals,
        per_100g,
    })
}

/// A logged meal. The ingredient list is the only stored state; totals are derived on read.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Meal {
    pub name: String,
    #[serde(default)]
    items: Vec<ConsumedItem>,
}

impl Meal {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            items: Vec::new(),
        }
    }

    pub fn items(&self) -> &[ConsumedItem] {
        &self.items
    }

    pub fn add_item(
        &mut self,
        record: NutrientRecord,
        quantity_grams: f64,
    ) -> Result<(), ValidationError> {
        self.items.push(ConsumedItem::new(record, quantity_grams)?);
        Ok(())
    }

    pub fn remove_item(&mut self, index: usize) -> Option<ConsumedItem> {
        if index < self.items.len() {
            Some(self.items.remove(index))
        } else {
            None
        }
    }

    /// Returns false when `index` is out of bounds.
    pub fn set_quantity(
        &mut self,
        index: usize,
        quantity_grams: f64,
    ) -> Result<bool, ValidationError> {
        let quantity_grams = require_non_negative("quantityGrams", quantity_grams)?;
        match self.items.get_mut(index) {
            Some(item) => {
                item.quantity_grams = quantity_grams;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn totals(&self) -> Result<MealTotals, ValidationError> {
        aggregate(&self.items)
    }

    pub fn profile(&self) -> Result<MealProfile, ValidationError> {
        calculate_meal_profile(&self.items)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub name: String,
    pub servings: u32,
    pub ingredients: Vec<ConsumedItem>,
}

impl Recipe {
    pub fn profile(&self) -> Result<MealProfile, ValidationError> {
        calculate_meal_profile(&self.ingredients)
    }

    pub fn per_serving(&self) -> Result<MealTotals, ValidationError> {
        if self.servings == 0 {
            return Err(ValidationError::OutOfRange {
                field: "servings",
                value: 0.0,
                min: 0.0,
                max: f64::from(u32::MAX),
            });
        }
        Ok(aggregate(&self.ingredients)?.scaled(1.0 / f64::from(self.servings)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::seq::SliceRandom;

    fn chicken() -> NutrientRecord {
        NutrientRecord {
            sodium_per_100: Some(74.0),
            ..NutrientRecord::new("Chicken breast", 165.0, 31.0, 0.0, 3.6)
        }
    }

    fn rice() -> NutrientRecord {
        NutrientRecord {
            fiber_per_100: Some(0.4),
            sugar_per_100: Some(0.1),
            ..NutrientRecord::new("White rice, cooked", 130.0, 2.7, 28.0, 0.3)
        }
    }

    fn broccoli() -> NutrientRecord {
        NutrientRecord {
            fiber_per_100: Some(2.6),
            sugar_per_100: Some(1.7),
            sodium_per_100: Some(33.0),
            ..NutrientRecord::new("Broccoli", 34.0, 2.8, 6.6, 0.4)
        }
    }

    fn item(record: NutrientRecord, grams: f64) -> ConsumedItem {
        ConsumedItem::new(record, grams).unwrap()
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn totals_close(a: &MealTotals, b: &MealTotals) -> bool {
        close(a.calories, b.calories)
            && close(a.protein, b.protein)
            && close(a.carbs, b.carbs)
            && close(a.fat, b.fat)
            && close(a.fiber, b.fiber)
            && close(a.sugar, b.sugar)
            && close(a.sodium, b.sodium)
    }

    #[test]
    fn test_aggregate_empty_is_all_zero() {
        let totals = aggregate(&[]).unwrap();
        assert_eq!(
            totals,
            MealTotals {
                calories: 0.0,
                protein: 0.0,
                carbs: 0.0,
                fat: 0.0,
                fiber: 0.0,
                sugar: 0.0,
                sodium: 0.0,
            }
        );
    }

    #[test]
    fn test_aggregate_sums_scaled_items_and_defaults_missing_fields() {
        let items = vec![item(chicken(), 200.0), item(rice(), 150.0)];
        let totals = aggregate(&items).unwrap();
        assert!(close(totals.calories, 330.0 + 195.0));
        assert!(close(totals.protein, 62.0 + 4.05));
        assert!(close(totals.fiber, 0.6)); // chicken has no fiber
        assert!(close(totals.sodium, 148.0)); // rice has no sodium
    }

    #[test]
    fn test_aggregate_is_order_independent() {
        let mut items = vec![
            item(chicken(), 180.0),
            item(rice(), 220.0),
            item(broccoli(), 95.5),
            item(rice(), 12.25),
            item(broccoli(), 300.0),
        ];
        let expected = aggregate(&items).unwrap();
        let mut rng = rand::thread_rng();
        for _ in 0..20 {
            items.shuffle(&mut rng);
            let shuffled = aggregate(&items).unwrap();
            assert!(totals_close(&expected, &shuffled), "{:?} vs {:?}", expected, shuffled);
        }
    }

    #[test]
    fn test_aggregate_rejects_deserialized_negative_quantity() {
        let json = r#"[{
            "record": {
                "name": "Rice",
                "caloriesPer100": 130,
                "proteinPer100": 2.7,
                "carbsPer100": 28,
                "fatPer100": 0.3
            },
            "quantityGrams": -50
        }]"#;
        let items: Vec<ConsumedItem> = serde_json::from_str(json).unwrap();
        assert!(aggregate(&items).is_err());
    }

    #[test]
    fn test_meal_profile_normalizes_per_100g() {
        let items = vec![item(chicken(), 100.0), item(broccoli(), 100.0)];
        let profile = calculate_meal_profile(&items).unwrap();
        assert!(close(profile.total_mass_g, 200.0));
        assert!(close(profile.totals.calories, 199.0));
        assert!(close(profile.per_100g.calories, 99.5));
        assert!(close(profile.per_100g.fiber, 1.3));
    }

    #[test]
    fn test_meal_profile_zero_mass() {
        let profile = calculate_meal_profile(&[item(rice(), 0.0)]).unwrap();
        assert_eq!(profile.total_mass_g, 0.0);
        assert_eq!(profile.per_100g, MealTotals::default());
    }

    #[test]
    fn test_meal_totals_follow_edits() {
        let mut meal = Meal::new("Lunch");
        meal.add_item(chicken(), 100.0).unwrap();
        meal.add_item(rice(), 100.0).unwrap();
        assert!(close(meal.totals().unwrap().calories, 295.0));

        assert!(meal.set_quantity(1, 200.0).unwrap());
        assert!(close(meal.totals().unwrap().calories, 425.0));

        assert!(!meal.set_quantity(5, 10.0).unwrap());
        assert!(meal.set_quantity(0, -1.0).is_err());

        let removed = meal.remove_item(0).unwrap();
        assert_eq!(removed.record.name, "Chicken breast");
        assert!(close(meal.totals().unwrap().calories, 260.0));
        assert!(meal.remove_item(3).is_none());
    }

    #[test]
    fn test_meal_serializes_without_totals() {
        let mut meal = Meal::new("Snack");
        meal.add_item(broccoli(), 50.0).unwrap();
        let value = serde_json::to_value(&meal).unwrap();
        assert!(value.get("totals").is_none());
        assert_eq!(value["items"][0]["quantityGrams"], 50.0);
    }

    #[test]
    fn test_recipe_per_serving() {
        let recipe = Recipe {
            name: "Chicken & rice".to_string(),
            servings: 4,
            ingredients: vec![item(chicken(), 400.0), item(rice(), 600.0)],
        };
        let serving = recipe.per_serving().unwrap();
        assert!(close(serving.calories, (660.0 + 780.0) / 4.0));

        let broken = Recipe { servings: 0, ..recipe };
        assert!(broken.per_serving().is_err());
    }
}
