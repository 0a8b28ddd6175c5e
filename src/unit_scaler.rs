use crate::errors::{require_in_range, require_non_negative, ValidationError};
use crate::models::NutrientRecord;

/// Largest serving size accepted from a product label, in grams.
const MAX_SERVING_SIZE_G: f64 = 10_000.0;

/// Scales a per-100 g record to the amounts contained in `quantity_grams`.
///
/// Optional nutrients stay `None` when the source did not report them.
pub fn scale(
    record: &NutrientRecord,
    quantity_grams: f64,
) -> Result<NutrientRecord, ValidationError> {
    let quantity_grams = require_non_negative("quantityGrams", quantity_grams)?;
    let factor = quantity_grams / 100.0;

    Ok(NutrientRecord {
        name: record.name.clone(),
        calories_per_100: record.calories_per_100 * factor,
        protein_per_100: record.protein_per_100 * factor,
        carbs_per_100: record.carbs_per_100 * factor,
        fat_per_100: record.fat_per_100 * factor,
        fiber_per_100: record.fiber_per_100.map(|v| v * factor),
        sugar_per_100: record.sugar_per_100.map(|v| v * factor),
        sodium_per_100: record.sodium_per_100.map(|v| v * factor),
    })
}

/// Scales by a number of servings of a labelled serving size (e.g. "1 bar = 45 g").
pub fn scale_servings(
    record: &NutrientRecord,
    servings: f64,
    serving_size_g: f64,
) -> Result<NutrientRecord, ValidationError> {
    let servings = require_non_negative("servings", servings)?;
    let serving_size_g = require_in_range("servingSizeG", serving_size_g, 0.0, MAX_SERVING_SIZE_G)?;
    scale(record, servings * serving_size_g)
}
