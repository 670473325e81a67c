// Core structs: Period, VariantListing, PriceObservation, CrossFilterIndex, DepreciationReport
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::collections::HashMap;
use thiserror::Error;

/// A sampled reference month in the price history. `date` is always the
/// first day of the month; the sequence is gap-tolerant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Period {
    pub id: i64,
    pub date: NaiveDate,
}

/// A variant of a brand's model that has a price point in a given period,
/// joined with its model for display.
#[derive(Debug, Clone)]
pub struct VariantListing {
    pub variant_id: i64,
    pub model_id: i64,
    pub model_name: String,
    pub description: String,
}

/// One price point inside a report window, flattened across the
/// brand/model/variant join.
#[derive(Debug, Clone)]
pub struct PriceObservation {
    pub variant_id: i64,
    pub period_date: NaiveDate,
    pub price: f64,
    pub model_id: i64,
    pub model_name: String,
    pub brand_id: i64,
    pub brand_name: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelEntry {
    pub id: i64,
    pub name: String,
}

/// Bidirectional lookup structures for the cascading model/variant
/// selectors. Rebuilt per call; never cached.
///
/// Descriptions sort descending by plain string comparison. That equals
/// numeric newest-first order only because every description starts with a
/// 4-digit year token ("2024 Flex") — a precondition of the upstream data.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CrossFilterIndex {
    pub models: Vec<ModelEntry>,
    pub variant_descriptions: Vec<String>,
    pub model_to_descriptions: HashMap<i64, Vec<String>>,
    pub description_to_model_ids: HashMap<String, Vec<i64>>,
    pub model_description_to_variant: HashMap<i64, HashMap<String, i64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BrandRow {
    pub brand_id: i64,
    pub brand_name: String,
    /// Average annualized rate across qualifying variants, rounded to 2 dp.
    pub avg_annual_rate: f64,
    /// 100 + unrounded average rate, rounded to 1 dp.
    pub value_retention: f64,
    /// Distinct qualifying models of the brand.
    pub sample_size: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgeBucketRow {
    pub bucket: String,
    pub avg_annual_rate: f64,
    pub value_retention: f64,
    /// Qualifying variants in the bucket.
    pub sample_size: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelRow {
    pub model_id: i64,
    pub model_name: String,
    pub avg_annual_rate: f64,
    pub value_retention: f64,
    /// Qualifying variants of the model.
    pub sample_size: usize,
}

/// Annualized depreciation statistics for one (cutoff, window, scope)
/// triple. Lifetime is governed by the analysis cache.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DepreciationReport {
    pub computed_at: DateTime<Utc>,
    pub window_start: NaiveDate,
    pub window_end: NaiveDate,
    pub brand_rows: Vec<BrandRow>,
    pub age_bucket_rows: Vec<AgeBucketRow>,
    /// Present only when the report was scoped to a brand.
    pub model_rows: Option<Vec<ModelRow>>,
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(String),
    #[error("not found")]
    NotFound,
}

impl From<rusqlite::Error> for StorageError {
    fn from(e: rusqlite::Error) -> Self {
        match e {
            rusqlite::Error::QueryReturnedNoRows => StorageError::NotFound,
            other => StorageError::Database(other.to_string()),
        }
    }
}

#[derive(Debug, Error)]
pub enum AnalyticsError {
    /// Caller-correctable input problem; names the offending field.
    #[error("invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },
    /// The price store holds no periods at all.
    #[error("no price data available")]
    NoData,
    /// Repository fault, propagated unmodified.
    #[error(transparent)]
    Storage(#[from] StorageError),
}
