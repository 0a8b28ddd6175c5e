//! USDA FoodData Central search adapter.
//!
//! API reference: <https://fdc.nal.usda.gov/api-guide.html>

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::api_connection::endpoints::{
    UsdaSearchFood, UsdaSearchResponse, USDA_CARBS, USDA_FAT, USDA_FIBER, USDA_PROTEIN,
    USDA_SODIUM_MG, USDA_SUGARS_NLEA, USDA_SUGARS_TOTAL,
};
use crate::api_connection::{get_json, ApiConnectionError};
use crate::models::NutrientRecord;
use crate::search::source::{FoodSource, SourceHit, SourceKind};

const MAX_PAGE_SIZE: usize = 200;

pub struct UsdaSource {
    http_client: Client,
    base_url: String,
    api_key: String,
}

impl UsdaSource {
    pub fn new(
        http_client: Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }
}

/// Converts one search hit. Foods without an energy value are dropped; USDA omits
/// zero-valued macros on many branded foods, so a missing macro reads as 0.
pub fn usda_food_to_hit(food: &UsdaSearchFood) -> Option<SourceHit> {
    let Some(calories) = food.energy_kcal() else {
        debug!(fdc_id = food.fdc_id, "USDA food has no kcal energy value, skipping");
        return None;
    };

    let record = NutrientRecord {
        fiber_per_100: food.nutrient(USDA_FIBER),
        sugar_per_100: food
            .nutrient(USDA_SUGARS_TOTAL)
            .or_else(|| food.nutrient(USDA_SUGARS_NLEA)),
        sodium_per_100: food.nutrient(USDA_SODIUM_MG),
        ..NutrientRecord::new(
            food.description.trim(),
            calories,
            food.nutrient(USDA_PROTEIN).unwrap_or(0.0),
            food.nutrient(USDA_CARBS).unwrap_or(0.0),
            food.nutrient(USDA_FAT).unwrap_or(0.0),
        )
    };

    Some(SourceHit {
        record,
        external_id: Some(food.fdc_id.to_string()),
        brand: food.brand_owner.clone(),
        serving_size_g: None,
    })
}

pub fn usda_response_to_hits(response: &UsdaSearchResponse) -> Vec<SourceHit> {
    response.foods.iter().filter_map(usda_food_to_hit).collect()
}

#[async_trait]
impl FoodSource for UsdaSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Usda
    }

    async fn search(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<SourceHit>, ApiConnectionError> {
        if self.api_key.is_empty() {
            return Err(ApiConnectionError::MissingApiKey("USDA_API_KEY".to_string()));
        }
        let url = format!("{}/foods/search", self.base_url);
        let page_size = limit.clamp(1, MAX_PAGE_SIZE).to_string();
        let response: UsdaSearchResponse = get_json(
            &self.http_client,
            &url,
            &[
                ("query", query),
                ("pageSize", page_size.as_str()),
                ("api_key", self.api_key.as_str()),
            ],
        )
        .await?;

        let mut hits = usda_response_to_hits(&response);
        hits.truncate(limit);
        Ok(hits)
    }
}
