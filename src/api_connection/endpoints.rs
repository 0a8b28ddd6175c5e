use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const USDA_DEFAULT_BASE_URL: &str = "https://api.nal.usda.gov/fdc/v1";
pub const OPEN_FOOD_FACTS_DEFAULT_BASE_URL: &str = "https://world.openfoodfacts.org";

// FoodData Central nutrient ids.
pub const USDA_ENERGY_KCAL: u32 = 1008;
pub const USDA_ENERGY_ATWATER_GENERAL: u32 = 2047;
pub const USDA_ENERGY_ATWATER_SPECIFIC: u32 = 2048;
pub const USDA_PROTEIN: u32 = 1003;
pub const USDA_FAT: u32 = 1004;
pub const USDA_CARBS: u32 = 1005;
pub const USDA_FIBER: u32 = 1079;
pub const USDA_SUGARS_TOTAL: u32 = 2000;
pub const USDA_SUGARS_NLEA: u32 = 1063;
pub const USDA_SODIUM_MG: u32 = 1093;

#[derive(Debug, Deserialize, Clone)]
pub struct UsdaSearchResponse {
    #[serde(default)]
    pub foods: Vec<UsdaSearchFood>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct UsdaSearchFood {
    pub fdc_id: u64,
    pub description: String,
    #[serde(default)]
    pub data_type: Option<String>,
    #[serde(default)]
    pub brand_owner: Option<String>,
    #[serde(default)]
    pub food_nutrients: Vec<UsdaSearchNutrient>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct UsdaSearchNutrient {
    pub nutrient_id: u32,
    #[serde(default)]
    pub nutrient_name: Option<String>,
    #[serde(default)]
    pub unit_name: Option<String>,
    #[serde(default)]
    pub value: Option<f64>,
}

impl UsdaSearchFood {
    pub fn nutrient(&self, id: u32) -> Option<f64> {
        self.food_nutrients
            .iter()
            .find(|n| n.nutrient_id == id)
            .and_then(|n| n.value)
    }

    /// Energy in kcal, preferring the classic value over the Atwater estimates.
    pub fn energy_kcal(&self) -> Option<f64> {
        [USDA_ENERGY_KCAL, USDA_ENERGY_ATWATER_GENERAL, USDA_ENERGY_ATWATER_SPECIFIC]
            .iter()
            .find_map(|id| {
                self.food_nutrients.iter().find(|n| {
                    n.nutrient_id == *id
                        && n.unit_name
                            .as_deref()
                            .map_or(true, |u| u.eq_ignore_ascii_case("kcal"))
                })
            })
            .and_then(|n| n.value)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct OffSearchResponse {
    #[serde(default)]
    pub products: Vec<OffProduct>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct OffProductResponse {
    #[serde(default)]
    pub status: i64,
    #[serde(default)]
    pub product: Option<OffProduct>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct OffProduct {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub product_name: Option<String>,
    #[serde(default)]
    pub brands: Option<String>,
    // OpenFoodFacts sends this as a number or a numeric string.
    #[serde(default)]
    pub serving_quantity: Option<Value>,
    #[serde(default)]
    pub nutriments: Map<String, Value>,
}

/// Reads a nutriment that may be encoded as a JSON number or a numeric string.
pub fn numeric_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', ".").parse::<f64>().ok(),
        _ => None,
    }
}

impl OffProduct {
    pub fn nutriment(&self, key: &str) -> Option<f64> {
        self.nutriments.get(key).and_then(numeric_value)
    }

    pub fn serving_quantity_g(&self) -> Option<f64> {
        self.serving_quantity
            .as_ref()
            .and_then(numeric_value)
            .filter(|q| *q > 0.0)
    }
}
