use anyhow::{Context, Result};
use csv::ReaderBuilder;
use std::io::Read;
use std::path::Path;
use tracing::debug;

use crate::models::NutrientRecord;

// Expected column headers
const NAME_COL: &str = "Name";
const KCAL_COL: &str = "kcal/100g";
const PROTEIN_COL: &str = "Protein (g/100g)";
const CARB_COL: &str = "Carbohydrate (g/100g)";
const FAT_COL: &str = "Fat (g/100g)";
// Optional columns
const FIBER_COL: &str = "Fiber (g/100g)";
const SUGARS_COL: &str = "Sugars (g/100g)";
const SODIUM_COL: &str = "Sodium (mg/100g)";

fn parse_optional_f64(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok()
}

pub fn load_local_foods(csv_path: &Path) -> Result<Vec<NutrientRecord>> {
    if !csv_path.exists() {
        return Err(anyhow::anyhow!("Local food CSV file not found at: {:?}", csv_path));
    }
    let file = std::fs::File::open(csv_path)
        .with_context(|| format!("Failed to open local food CSV file at {:?}", csv_path))?;
    load_local_foods_from_reader(file)
        .with_context(|| format!("Failed to load local food table from {:?}", csv_path))
}

pub fn load_local_foods_from_reader<R: Read>(reader: R) -> Result<Vec<NutrientRecord>> {
    let mut rdr = ReaderBuilder::new().has_headers(true).from_reader(reader);
    let headers = rdr.headers()?.clone();

    let required = |name: &str| {
        headers
            .iter()
            .position(|h| h.trim() == name)
            .ok_or_else(|| anyhow::anyhow!("Column '{}' not found", name))
    };
    let name_idx = required(NAME_COL)?;
    let kcal_idx = required(KCAL_COL)?;
    let protein_idx = required(PROTEIN_COL)?;
    let carb_idx = required(CARB_COL)?;
    let fat_idx = required(FAT_COL)?;

    let optional = |name: &str| headers.iter().position(|h| h.trim() == name);
    let fiber_idx = optional(FIBER_COL);
    let sugars_idx = optional(SUGARS_COL);
    let sodium_idx = optional(SODIUM_COL);

    let mut foods = Vec::new();
    for (row_index, result) in rdr.records().enumerate() {
        let record = result
            .with_context(|| format!("Failed to read record at row index {}", row_index))?;

        let name = record.get(name_idx).unwrap_or_default().trim().to_string();
        if name.is_empty() {
            continue;
        }

        let field = |idx: usize| record.get(idx).and_then(parse_optional_f64);
        let optional_field = |idx: Option<usize>| idx.and_then(|i| field(i));

        let (Some(kcal), Some(protein), Some(carbs), Some(fat)) =
            (field(kcal_idx), field(protein_idx), field(carb_idx), field(fat_idx))
        else {
            debug!(row = row_index, name = %name, "skipping local food row with missing macros");
            continue;
        };

        let food = NutrientRecord {
            fiber_per_100: optional_field(fiber_idx),
            sugar_per_100: optional_field(sugars_idx),
            sodium_per_100: optional_field(sodium_idx),
            ..NutrientRecord::new(name, kcal, protein, carbs, fat)
        };
        if let Err(e) = food.validate() {
            debug!(row = row_index, error = %e, "skipping invalid local food row");
            continue;
        }
        foods.push(food);
    }

    if foods.is_empty() {
        return Err(anyhow::anyhow!("No valid foods loaded from local table"));
    }

    Ok(foods)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn header_line() -> String {
        format!(
            "{},{},{},{},{},{},{},{}",
            NAME_COL, KCAL_COL, PROTEIN_COL, CARB_COL, FAT_COL, FIBER_COL, SUGARS_COL, SODIUM_COL
        )
    }

    fn create_test_csv_file() -> Result<NamedTempFile> {
        let mut file = NamedTempFile::new()?;
        writeln!(file, "{}", header_line())?;
        writeln!(file, "Apple,52,0.3,13.8,0.2,2.4,10.4,1")?;
        writeln!(file, "Banana,89,1.1,22.8,0.3,,12.2,")?; // No fiber or sodium
        writeln!(file, ",10,10,10,10,10,10,10")?; // Empty name
        writeln!(file, "Mystery,text,1,1,1,1,1,1")?; // Invalid kcal
        writeln!(file, "Negative,-5,1,1,1,1,1,1")?;
        file.flush()?;
        Ok(file)
    }

    #[test]
    fn test_load_local_foods_success() -> Result<()> {
        let file = create_test_csv_file()?;
        let data = load_local_foods(file.path())?;

        assert_eq!(data.len(), 2);

        let apple = data.iter().find(|item| item.name == "Apple").unwrap();
        assert_eq!(apple.calories_per_100, 52.0);
        assert_eq!(apple.fiber_per_100, Some(2.4));
        assert_eq!(apple.sodium_per_100, Some(1.0));

        let banana = data.iter().find(|item| item.name == "Banana").unwrap();
        assert_eq!(banana.fiber_per_100, None);
        assert_eq!(banana.sugar_per_100, Some(12.2));
        assert_eq!(banana.sodium_per_100, None);
        Ok(())
    }

    #[test]
    fn test_optional_columns_may_be_missing() -> Result<()> {
        let csv = format!(
            "{},{},{},{},{}\nOats,389,16.9,66.3,6.9\n",
            NAME_COL, KCAL_COL, PROTEIN_COL, CARB_COL, FAT_COL
        );
        let data = load_local_foods_from_reader(csv.as_bytes())?;
        assert_eq!(data.len(), 1);
        assert_eq!(data[0].fiber_per_100, None);
        Ok(())
    }

    #[test]
    fn test_missing_required_column() {
        let csv = format!(
            "{},{},{},{}\nApple,0.3,13.8,0.2\n",
            NAME_COL, PROTEIN_COL, CARB_COL, FAT_COL
        );
        let result = load_local_foods_from_reader(csv.as_bytes());
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains(&format!("Column '{}' not found", KCAL_COL)));
    }

    #[test]
    fn test_empty_table_is_an_error() {
        let csv = format!("{}\n", header_line());
        let result = load_local_foods_from_reader(csv.as_bytes());
        assert!(result.unwrap_err().to_string().contains("No valid foods loaded"));
    }

    #[test]
    fn test_file_not_found() {
        let result = load_local_foods(Path::new("this_file_does_not_exist.csv"));
        assert!(result.unwrap_err().to_string().contains("Local food CSV file not found"));
    }
}
