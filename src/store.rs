//! JSON persistence for meals, recipes, the user profile and the selected plan.
//!
//! One file per key in a data directory. Each file holds an envelope
//! `{ schemaVersion, savedAt, data }` so incompatible blobs are refused instead of
//! being half-decoded.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::ErrorKind;
use std::path::PathBuf;
use thiserror::Error;
use tokio::fs;
use tracing::debug;

use crate::meal_aggregator::{Meal, Recipe};
use crate::models::{SubscriptionPlan, UserProfile};

pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
    Meals,
    Recipes,
    Profile,
    SelectedPlan,
}

impl StorageKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageKey::Meals => "meals",
            StorageKey::Recipes => "recipes",
            StorageKey::Profile => "profile",
            StorageKey::SelectedPlan => "selectedPlan",
        }
    }

    fn file_name(&self) -> String {
        format!("{}.json", self.as_str())
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<T> {
    pub schema_version: u32,
    pub saved_at: DateTime<Utc>,
    pub data: T,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("stored {key} could not be (de)serialized: {source}")]
    Serialization {
        key: StorageKey,
        #[source]
        source: serde_json::Error,
    },

    #[error("stored {key} has schema version {found}, expected {expected}")]
    UnsupportedSchemaVersion {
        key: StorageKey,
        found: u32,
        expected: u32,
    },
}

pub struct JsonStore {
    dir: PathBuf,
}

impl JsonStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: StorageKey) -> PathBuf {
        self.dir.join(key.file_name())
    }

    pub async fn save<T: Serialize>(&self, key: StorageKey, data: &T) -> Result<(), StoreError> {
        let envelope = Envelope {
            schema_version: SCHEMA_VERSION,
            saved_at: Utc::now(),
            data,
        };
        let json = serde_json::to_string_pretty(&envelope)
            .map_err(|source| StoreError::Serialization { key, source })?;

        fs::create_dir_all(&self.dir).await.map_err(|source| StoreError::Io {
            path: self.dir.clone(),
            source,
        })?;

        // Written next to the target, then renamed into place.
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json).await.map_err(|source| StoreError::Io {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, &path).await.map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;

        debug!(key = %key, path = %path.display(), "saved");
        Ok(())
    }

    /// Returns `Ok(None)` when nothing was stored under `key` yet.
    pub async fn load_envelope<T: DeserializeOwned>(
        &self,
        key: StorageKey,
    ) -> Result<Option<Envelope<T>>, StoreError> {
        let path = self.path_for(key);
        let raw = match fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(StoreError::Io { path, source }),
        };

        let envelope: Envelope<serde_json::Value> =
            serde_json::from_str(&raw).map_err(|source| StoreError::Serialization { key, source })?;
        if envelope.schema_version != SCHEMA_VERSION {
            return Err(StoreError::UnsupportedSchemaVersion {
                key,
                found: envelope.schema_version,
                expected: SCHEMA_VERSION,
            });
        }

        let data = serde_json::from_value(envelope.data)
            .map_err(|source| StoreError::Serialization { key, source })?;
        Ok(Some(Envelope {
            schema_version: envelope.schema_version,
            saved_at: envelope.saved_at,
            data,
        }))
    }

    pub async fn load<T: DeserializeOwned>(
        &self,
        key: StorageKey,
    ) -> Result<Option<T>, StoreError> {
        Ok(self.load_envelope(key).await?.map(|e| e.data))
    }

    /// Deleting a key that was never written is not an error.
    pub async fn remove(&self, key: StorageKey) -> Result<(), StoreError> {
        let path = self.path_for(key);
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StoreError::Io { path, source }),
        }
    }

    pub async fn load_meals(&self) -> Result<Vec<Meal>, StoreError> {
        Ok(self.load(StorageKey::Meals).await?.unwrap_or_default())
    }

    pub async fn save_meals(&self, meals: &[Meal]) -> Result<(), StoreError> {
        self.save(StorageKey::Meals, &meals).await
    }

    pub async fn load_recipes(&self) -> Result<Vec<Recipe>, StoreError> {
        Ok(self.load(StorageKey::Recipes).await?.unwrap_or_default())
    }

    pub async fn save_recipes(&self, recipes: &[Recipe]) -> Result<(), StoreError> {
        self.save(StorageKey::Recipes, &recipes).await
    }

    pub async fn load_profile(&self) -> Result<Option<UserProfile>, StoreError> {
        self.load(StorageKey::Profile).await
    }

    pub async fn save_profile(&self, profile: &UserProfile) -> Result<(), StoreError> {
        self.save(StorageKey::Profile, profile).await
    }

    pub async fn load_plan(&self) -> Result<SubscriptionPlan, StoreError> {
        Ok(self.load(StorageKey::SelectedPlan).await?.unwrap_or_default())
    }

    pub async fn save_plan(&self, plan: SubscriptionPlan) -> Result<(), StoreError> {
        self.save(StorageKey::SelectedPlan, &plan).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ActivityLevel, ConsumedItem, Goal, NutrientRecord, Sex};

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

    #[tokio::test]
    async fn test_missing_keys_load_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path().join("nested"));
        assert!(store.load_meals().await.unwrap().is_empty());
        assert_eq!(store.load_profile().await.unwrap(), None);
        assert_eq!(store.load_plan().await.unwrap(), SubscriptionPlan::Free);
        store.remove(StorageKey::Recipes).await.unwrap();
    }

    #[tokio::test]
    async fn test_save_and_load_meals_and_profile() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path());

        let mut meal = Meal::new("Lunch");
        meal.add_item(NutrientRecord::new("Rice", 130.0, 2.7, 28.0, 0.3), 150.0)
            .unwrap();
        store.save_meals(&[meal.clone()]).await.unwrap();
        store.save_profile(&profile()).await.unwrap();
        store.save_plan(SubscriptionPlan::Fitness).await.unwrap();

        assert_eq!(store.load_meals().await.unwrap(), vec![meal]);
        assert_eq!(store.load_profile().await.unwrap(), Some(profile()));
        assert_eq!(store.load_plan().await.unwrap(), SubscriptionPlan::Fitness);

        let raw = std::fs::read_to_string(dir.path().join("selectedPlan.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["schemaVersion"], 1);
        assert_eq!(value["data"], "fitness");
        assert!(value["savedAt"].is_string());
    }

    #[tokio::test]
    async fn test_save_and_load_recipes() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path());
        assert!(store.load_recipes().await.unwrap().is_empty());

        let recipe = Recipe {
            name: "Overnight oats".to_string(),
            servings: 2,
            ingredients: vec![
                ConsumedItem::new(NutrientRecord::new("Oats", 389.0, 16.9, 66.3, 6.9), 80.0)
                    .unwrap(),
                ConsumedItem::new(NutrientRecord::new("Milk", 61.0, 3.2, 4.8, 3.3), 250.0)
                    .unwrap(),
            ],
        };
        store.save_recipes(&[recipe.clone()]).await.unwrap();

        let loaded = store.load_recipes().await.unwrap();
        assert_eq!(loaded, vec![recipe.clone()]);
        assert_eq!(loaded[0].per_serving().unwrap(), recipe.per_serving().unwrap());

        let raw = std::fs::read_to_string(dir.path().join("recipes.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["schemaVersion"], 1);
        assert_eq!(value["data"][0]["servings"], 2);
    }

    #[tokio::test]
    async fn test_recipes_with_unknown_schema_version_are_refused() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("recipes.json"),
            r#"{"schemaVersion": 2, "savedAt": "2024-01-01T00:00:00Z", "data": []}"#,
        )
        .unwrap();
        let store = JsonStore::new(dir.path());
        assert!(matches!(
            store.load_recipes().await,
            Err(StoreError::UnsupportedSchemaVersion { key: StorageKey::Recipes, found: 2, .. })
        ));
    }

    #[tokio::test]
    async fn test_meal_totals_are_not_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path());
        let mut meal = Meal::new("Snack");
        meal.add_item(NutrientRecord::new("Apple", 52.0, 0.3, 14.0, 0.2), 200.0)
            .unwrap();
        store.save_meals(&[meal]).await.unwrap();

        let raw = std::fs::read_to_string(dir.path().join("meals.json")).unwrap();
        assert!(!raw.contains("totals"));
        assert!(raw.contains("quantityGrams"));
    }

    #[tokio::test]
    async fn test_unknown_schema_version_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("profile.json"),
            r#"{"schemaVersion": 7, "savedAt": "2024-01-01T00:00:00Z", "data": {}}"#,
        )
        .unwrap();
        let store = JsonStore::new(dir.path());
        let err = store.load_profile().await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::UnsupportedSchemaVersion { key: StorageKey::Profile, found: 7, expected: 1 }
        ));
    }

    #[tokio::test]
    async fn test_corrupt_blob_is_a_serialization_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("meals.json"), "not json").unwrap();
        let store = JsonStore::new(dir.path());
        assert!(matches!(
            store.load_meals().await,
            Err(StoreError::Serialization { key: StorageKey::Meals, .. })
        ));
    }
}
