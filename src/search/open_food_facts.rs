use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use crate::api_connection::endpoints::{OffProduct, OffProductResponse, OffSearchResponse};
use crate::api_connection::{get_json, ApiConnectionError};
use crate::errors::ValidationError;
use crate::models::NutrientRecord;
use crate::search::source::{FoodSource, SourceHit, SourceKind};

const KJ_PER_KCAL: f64 = 4.184;
// Salt is roughly 40% sodium by mass.
const SALT_TO_SODIUM: f64 = 0.4;
const MAX_PAGE_SIZE: usize = 100;

/// EAN-8 / UPC-A / EAN-13 / GTIN-14 digits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub struct Barcode(String);

impl Barcode {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Barcode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits: String = s.chars().filter(|c| !c.is_whitespace() && *c != '-').collect();
        if (8..=14).contains(&digits.len()) && digits.chars().all(|c| c.is_ascii_digit()) {
            Ok(Barcode(digits))
        } else {
            Err(ValidationError::InvalidBarcode(s.to_string()))
        }
    }
}

impl TryFrom<String> for Barcode {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for Barcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub struct OpenFoodFactsSource {
    http_client: Client,
    base_url: String,
}

/// Converts a product. Products without an energy value are dropped.
///
/// OpenFoodFacts reports sodium in g/100g; it is converted to mg here. When only
/// salt is present, sodium is derived from it.
pub fn off_product_to_hit(product: &OffProduct) -> Option<SourceHit> {
    let calories = product
        .nutriment("energy-kcal_100g")
        .or_else(|| product.nutriment("energy_100g").map(|kj| kj / KJ_PER_KCAL));
    let Some(calories) = calories else {
        debug!(code = ?product.code, "OpenFoodFacts product has no energy value, skipping");
        return None;
    };

    let name = product
        .product_name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .or(product.code.as_deref())?
        .to_string();

    let sodium_g = product
        .nutriment("sodium_100g")
        .or_else(|| product.nutriment("salt_100g").map(|salt| salt * SALT_TO_SODIUM));

    let record = NutrientRecord {
        fiber_per_100: product.nutriment("fiber_100g"),
        sugar_per_100: product.nutriment("sugars_100g"),
        sodium_per_100: sodium_g.map(|g| g * 1000.0),
        ..NutrientRecord::new(
            name,
            calories,
            product.nutriment("proteins_100g").unwrap_or(0.0),
            product.nutriment("carbohydrates_100g").unwrap_or(0.0),
            product.nutriment("fat_100g").unwrap_or(0.0),
        )
    };

    Some(SourceHit {
        record,
        external_id: product.code.clone(),
        brand: product.brands.clone().filter(|b| !b.trim().is_empty()),
        serving_size_g: product.serving_quantity_g(),
    })
}

impl OpenFoodFactsSource {
    pub fn new(http_client: Client, base_url: impl Into<String>) -> Self {
        Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Looks up a scanned product. A product without usable nutrition data is `NotFound`.
    pub async fn lookup_barcode(&self, barcode: &Barcode) -> Result<SourceHit, ApiConnectionError> {
        let url = format!("{}/api/v0/product/{}.json", self.base_url, barcode);
        let response: OffProductResponse = get_json(&self.http_client, &url, &[]).await?;
        product_response_to_hit(barcode, &response)
    }
}

pub fn product_response_to_hit(
    barcode: &Barcode,
    response: &OffProductResponse,
) -> Result<SourceHit, ApiConnectionError> {
    if response.status != 1 {
        return Err(ApiConnectionError::NotFound(format!("product {}", barcode)));
    }
    let product = response.product.as_ref().ok_or_else(|| {
        ApiConnectionError::MalformedPayload(format!(
            "product {} reported found but missing",
            barcode
        ))
    })?;
    off_product_to_hit(product).ok_or_else(|| {
        ApiConnectionError::NotFound(format!("nutrition facts for product {}", barcode))
    })
}

#[async_trait]
impl FoodSource for OpenFoodFactsSource {
    fn kind(&self) -> SourceKind {
        SourceKind::OpenFoodFacts
    }

    async fn search(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<SourceHit>, ApiConnectionError> {
        let url = format!("{}/cgi/search.pl", self.base_url);
        let page_size = limit.clamp(1, MAX_PAGE_SIZE).to_string();
        let response: OffSearchResponse = get_json(
            &self.http_client,
            &url,
            &[
                ("search_terms", query),
                ("search_simple", "1"),
                ("action", "process"),
                ("json", "1"),
                ("page_size", page_size.as_str()),
            ],
        )
        .await?;

        Ok(response
            .products
            .iter()
            .filter_map(off_product_to_hit)
            .take(limit)
            .collect())
    }
}
