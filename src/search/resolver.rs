//! Fan-out food search over several sources.
//!
//! Every source is queried concurrently under its own timeout. A source that errors,
//! times out or returns a malformed payload contributes nothing and is reported in
//! `failures`; it never aborts the other sources. Results are concatenated in source
//! priority order (local, then USDA, then OpenFoodFacts) with no cross-source
//! re-ranking, and duplicates across sources are kept, each tagged with its source.

use futures::future::join_all;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::api_connection::ApiConnectionError;
use crate::errors::ValidationError;
use crate::models::NutrientRecord;
use crate::search::source::{FoodSource, SourceHit, SourceKind};

pub const DEFAULT_SOURCE_TIMEOUT: Duration = Duration::from_secs(8);
pub const DEFAULT_MAX_RESULTS: usize = 25;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolverOptions {
    pub max_results: usize,
    pub per_source_timeout: Duration,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            max_results: DEFAULT_MAX_RESULTS,
            per_source_timeout: DEFAULT_SOURCE_TIMEOUT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedResult {
    /// 1-based position in the merged list.
    pub rank: usize,
    pub source: SourceKind,
    pub record: NutrientRecord,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serving_size_g: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceFailure {
    pub source: SourceKind,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum ResolveOutcome {
    /// At least one valid result. `failures` lists sources that did not answer.
    Found {
        results: Vec<RankedResult>,
        failures: Vec<SourceFailure>,
    },
    /// At least one source answered, none had a match.
    NoMatches { failures: Vec<SourceFailure> },
    /// Sources returned hits but every one failed record validation.
    FilteredOut {
        discarded: usize,
        failures: Vec<SourceFailure>,
    },
    /// No source answered.
    AllSourcesFailed { failures: Vec<SourceFailure> },
}

impl ResolveOutcome {
    pub fn results(&self) -> &[RankedResult] {
        match self {
            ResolveOutcome::Found { results, .. } => results,
            _ => &[],
        }
    }

    pub fn failures(&self) -> &[SourceFailure] {
        match self {
            ResolveOutcome::Found { failures, .. }
            | ResolveOutcome::NoMatches { failures }
            | ResolveOutcome::FilteredOut { failures, .. }
            | ResolveOutcome::AllSourcesFailed { failures } => failures,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, ResolveOutcome::Found { .. })
    }
}

async fn query_source(
    source: &dyn FoodSource,
    query: &str,
    options: &ResolverOptions,
) -> Result<Vec<SourceHit>, SourceFailure> {
    let kind = source.kind();
    let result = match tokio::time::timeout(
        options.per_source_timeout,
        source.search(query, options.max_results),
    )
    .await
    {
        Ok(result) => result,
        Err(_) => Err(ApiConnectionError::Timeout {
            source_name: kind.display_name(),
            after: options.per_source_timeout,
        }),
    };

    result.map_err(|e| {
        warn!(source = %kind, error = %e, "food source failed, continuing without it");
        SourceFailure {
            source: kind,
            reason: e.to_string(),
        }
    })
}

fn is_valid_hit(kind: SourceKind, hit: &SourceHit) -> bool {
    match hit.record.validate() {
        Ok(()) => true,
        Err(e) => {
            debug!(source = %kind, name = %hit.record.name, error = %e, "dropping invalid hit");
            false
        }
    }
}

pub async fn resolve(
    query: &str,
    sources: &[Box<dyn FoodSource>],
    options: &ResolverOptions,
) -> Result<ResolveOutcome, ValidationError> {
    let query = query.trim();
    if query.is_empty() {
        return Err(ValidationError::EmptyQuery);
    }

    let mut ordered: Vec<&dyn FoodSource> = sources.iter().map(|s| s.as_ref()).collect();
    ordered.sort_by_key(|s| s.kind());

    let answers = join_all(ordered.iter().map(|s| query_source(*s, query, options))).await;

    let mut failures = Vec::new();
    let mut answered = 0usize;
    let mut raw_hits = 0usize;
    let mut merged: Vec<(SourceKind, SourceHit)> = Vec::new();

    for (source, answer) in ordered.iter().zip(answers) {
        let kind = source.kind();
        match answer {
            Ok(hits) => {
                answered += 1;
                raw_hits += hits.len();
                merged.extend(
                    hits.into_iter()
                        .filter(|hit| is_valid_hit(kind, hit))
                        .map(|hit| (kind, hit)),
                );
            }
            Err(failure) => failures.push(failure),
        }
    }

    info!(
        query,
        sources = ordered.len(),
        answered,
        raw_hits,
        valid = merged.len(),
        "resolved food search"
    );

    if answered == 0 {
        return Ok(ResolveOutcome::AllSourcesFailed { failures });
    }
    if raw_hits == 0 {
        return Ok(ResolveOutcome::NoMatches { failures });
    }
    if merged.is_empty() {
        return Ok(ResolveOutcome::FilteredOut {
            discarded: raw_hits,
            failures,
        });
    }

    let results = merged
        .into_iter()
        .take(options.max_results)
        .enumerate()
        .map(|(i, (source, hit))| RankedResult {
            rank: i + 1,
            source,
            record: hit.record,
            external_id: hit.external_id,
            brand: hit.brand,
            serving_size_g: hit.serving_size_g,
        })
        .collect();

    Ok(ResolveOutcome::Found { results, failures })
}

/// Owns a fixed set of sources and the options used to query them.
pub struct Resolver {
    sources: Vec<Box<dyn FoodSource>>,
    options: ResolverOptions,
}

impl Resolver {
    pub fn new(sources: Vec<Box<dyn FoodSource>>, options: ResolverOptions) -> Self {
        Self { sources, options }
    }

    pub async fn resolve(&self, query: &str) -> Result<ResolveOutcome, ValidationError> {
        resolve(query, &self.sources, &self.options).await
    }
}
