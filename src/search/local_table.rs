use anyhow::Result;
use async_trait::async_trait;
use std::path::Path;

use crate::api_connection::ApiConnectionError;
use crate::models::NutrientRecord;
use crate::search::data_loader::{load_local_foods, load_local_foods_from_reader};
use crate::search::source::{FoodSource, SourceHit, SourceKind};

const CURATED_FOODS_CSV: &str = include_str!("../../data/curated_foods.csv");

/// Curated in-process food table, searched before any network source.
pub struct LocalFoodTable {
    foods: Vec<NutrientRecord>,
}

impl LocalFoodTable {
    pub fn new(foods: Vec<NutrientRecord>) -> Self {
        Self { foods }
    }

    /// The table shipped with the crate.
    pub fn curated() -> Result<Self> {
        Ok(Self::new(load_local_foods_from_reader(CURATED_FOODS_CSV.as_bytes())?))
    }

    pub fn from_csv(path: &Path) -> Result<Self> {
        Ok(Self::new(load_local_foods(path)?))
    }

    pub fn len(&self) -> usize {
        self.foods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.foods.is_empty()
    }

    /// Case-insensitive word match: every query word must start one of the words of
    /// the name, so "oil" finds "Olive oil" but not "Potato boiled".
    pub fn find(&self, query: &str, limit: usize) -> Vec<&NutrientRecord> {
        let tokens = words(query);
        if tokens.is_empty() {
            return Vec::new();
        }
        self.foods
            .iter()
            .filter(|food| {
                let name_words = words(&food.name);
                tokens
                    .iter()
                    .all(|t| name_words.iter().any(|w| w.starts_with(t.as_str())))
            })
            .take(limit)
            .collect()
    }
}

fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

#[async_trait]
impl FoodSource for LocalFoodTable {
    fn kind(&self) -> SourceKind {
        SourceKind::Local
    }

    async fn search(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<SourceHit>, ApiConnectionError> {
        Ok(self
            .find(query, limit)
            .into_iter()
            .map(|food| SourceHit::from_record(food.clone()))
            .collect())
    }
}
