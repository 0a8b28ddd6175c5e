use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::api_connection::ApiConnectionError;
use crate::models::NutrientRecord;

/// Where a search hit came from. Declaration order is merge priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SourceKind {
    Local,
    Usda,
    OpenFoodFacts,
}

impl SourceKind {
    pub fn display_name(&self) -> &'static str {
        match self {
            SourceKind::Local => "local food table",
            SourceKind::Usda => "USDA FoodData Central",
            SourceKind::OpenFoodFacts => "OpenFoodFacts",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// A single match returned by a source adapter, before merging.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceHit {
    pub record: NutrientRecord,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serving_size_g: Option<f64>,
}

impl SourceHit {
    pub fn from_record(record: NutrientRecord) -> Self {
        Self {
            record,
            external_id: None,
            brand: None,
            serving_size_g: None,
        }
    }
}

#[async_trait]
pub trait FoodSource: Send + Sync {
    fn kind(&self) -> SourceKind;

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SourceHit>, ApiConnectionError>;
}
