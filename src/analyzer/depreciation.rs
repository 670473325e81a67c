use crate::analyzer::grouping::group_then_reduce;
use crate::model::{
    AgeBucketRow, AnalyticsError, BrandRow, DepreciationReport, ModelRow, Period,
    PriceObservation,
};
use crate::storage::PriceRepository;
use chrono::{Duration, Utc};
use std::collections::{HashMap, HashSet};
use tracing::warn;

pub const MIN_WINDOW_MONTHS: u32 = 1;
pub const MAX_WINDOW_MONTHS: u32 = 60;

/// Fixed 30-day month approximation; the window is not calendar-month based.
const DAYS_PER_MONTH: i64 = 30;
const DAYS_PER_YEAR: f64 = 365.25;

/// Brands with fewer qualifying distinct models are omitted from brand rows.
const MIN_MODELS_PER_BRAND: usize = 3;

/// First-to-last price movement of one variant inside the window, already
/// annualized.
#[derive(Debug, Clone)]
pub struct VariantChange {
    pub variant_id: i64,
    pub model_id: i64,
    pub model_name: String,
    pub brand_id: i64,
    pub brand_name: String,
    pub description: String,
    pub annual_rate: f64,
}

pub struct DepreciationCalculator;

impl DepreciationCalculator {
    pub fn validate_window(window_months: u32) -> Result<(), AnalyticsError> {
        if !(MIN_WINDOW_MONTHS..=MAX_WINDOW_MONTHS).contains(&window_months) {
            return Err(AnalyticsError::Validation {
                field: "window_months",
                reason: format!(
                    "{window_months} is outside {MIN_WINDOW_MONTHS}..={MAX_WINDOW_MONTHS}"
                ),
            });
        }
        Ok(())
    }

    /// Computes the full report for a window ending at the cutoff,
    /// optionally scoped to one brand. Model rows are produced only for
    /// scoped reports.
    pub fn compute<R: PriceRepository + ?Sized>(
        repo: &R,
        cutoff: &Period,
        window_months: u32,
        brand_id: Option<i64>,
    ) -> Result<DepreciationReport, AnalyticsError> {
        Self::validate_window(window_months)?;

        let window_start = cutoff.date - Duration::days(i64::from(window_months) * DAYS_PER_MONTH);
        let window_end = cutoff.date;

        let observations = repo.list_price_points_in_window(window_start, window_end, brand_id)?;
        let changes = Self::reduce_variants(&observations);

        Ok(DepreciationReport {
            computed_at: Utc::now(),
            window_start,
            window_end,
            brand_rows: Self::brand_rows(&changes),
            age_bucket_rows: Self::age_bucket_rows(&changes),
            model_rows: brand_id.map(|_| Self::model_rows(&changes)),
        })
    }

    /// Collapses each variant's in-window price points to its earliest and
    /// latest observation and annualizes the percentage change over the
    /// elapsed span. Variants with a single in-window point carry no elapsed
    /// span and are excluded; so are non-positive prices.
    pub fn reduce_variants(observations: &[PriceObservation]) -> Vec<VariantChange> {
        struct Series<'a> {
            first: &'a PriceObservation,
            last: &'a PriceObservation,
        }

        let mut grouped: HashMap<i64, Series> = HashMap::new();
        for obs in observations {
            if obs.price <= 0.0 {
                continue;
            }
            let entry = grouped
                .entry(obs.variant_id)
                .or_insert(Series { first: obs, last: obs });
            if obs.period_date < entry.first.period_date {
                entry.first = obs;
            }
            if obs.period_date > entry.last.period_date {
                entry.last = obs;
            }
        }

        let mut changes = Vec::new();
        for (variant_id, series) in grouped {
            let elapsed_days = (series.last.period_date - series.first.period_date).num_days();
            if elapsed_days <= 0 {
                continue;
            }
            let observed_pct =
                (series.last.price - series.first.price) / series.first.price * 100.0;
            let annual_rate = observed_pct * (DAYS_PER_YEAR / elapsed_days as f64);
            changes.push(VariantChange {
                variant_id,
                model_id: series.last.model_id,
                model_name: series.last.model_name.clone(),
                brand_id: series.last.brand_id,
                brand_name: series.last.brand_name.clone(),
                description: series.last.description.clone(),
                annual_rate,
            });
        }
        changes
    }

    /// Per-brand averages. Sample size counts distinct models, not variants,
    /// and brands below the model minimum are silently omitted.
    pub fn brand_rows(changes: &[VariantChange]) -> Vec<BrandRow> {
        let mut rows: Vec<BrandRow> = group_then_reduce(
            changes,
            |c| (c.brand_id, c.brand_name.clone()),
            |_, members| {
                let avg = average_rate(members);
                let models: HashSet<i64> = members.iter().map(|c| c.model_id).collect();
                (avg, models.len())
            },
        )
        .into_iter()
        .filter(|(_, (_, model_count))| *model_count >= MIN_MODELS_PER_BRAND)
        .map(|((brand_id, brand_name), (avg, model_count))| BrandRow {
            brand_id,
            brand_name,
            avg_annual_rate: round2(avg),
            value_retention: round1(100.0 + avg),
            sample_size: model_count,
        })
        .collect();

        rows.sort_by(|a, b| {
            b.avg_annual_rate
                .total_cmp(&a.avg_annual_rate)
                .then_with(|| a.brand_name.cmp(&b.brand_name))
        });
        rows
    }

    /// Averages per vehicle-age bucket derived from the year prefix of the
    /// variant description. No minimum-sample filter.
    pub fn age_bucket_rows(changes: &[VariantChange]) -> Vec<AgeBucketRow> {
        let bucketed: Vec<(&VariantChange, &'static str)> = changes
            .iter()
            .filter_map(|change| match Self::age_bucket(&change.description) {
                Some(bucket) => Some((change, bucket)),
                None => {
                    warn!(
                        "Variant {} has no parseable year prefix ({:?}), excluded from age buckets",
                        change.variant_id, change.description
                    );
                    None
                }
            })
            .collect();

        let mut rows: Vec<AgeBucketRow> = group_then_reduce(
            &bucketed,
            |entry| entry.1,
            |_, members| {
                let rates: Vec<f64> = members.iter().map(|m| m.0.annual_rate).collect();
                (rates.iter().sum::<f64>() / rates.len() as f64, rates.len())
            },
        )
        .into_iter()
        .map(|(bucket, (avg, count))| AgeBucketRow {
            bucket: bucket.to_string(),
            avg_annual_rate: round2(avg),
            value_retention: round1(100.0 + avg),
            sample_size: count,
        })
        .collect();

        // Ordinal descending over the labels; "<2005" sorts first because
        // '<' outranks every digit in ASCII.
        rows.sort_by(|a, b| b.bucket.cmp(&a.bucket));
        rows
    }

    /// Per-model averages for brand-scoped reports. No minimum-sample filter.
    pub fn model_rows(changes: &[VariantChange]) -> Vec<ModelRow> {
        let mut rows: Vec<ModelRow> = group_then_reduce(
            changes,
            |c| (c.model_id, c.model_name.clone()),
            |_, members| (average_rate(members), members.len()),
        )
        .into_iter()
        .map(|((model_id, model_name), (avg, count))| ModelRow {
            model_id,
            model_name,
            avg_annual_rate: round2(avg),
            value_retention: round1(100.0 + avg),
            sample_size: count,
        })
        .collect();

        rows.sort_by(|a, b| {
            b.avg_annual_rate
                .total_cmp(&a.avg_annual_rate)
                .then_with(|| a.model_name.cmp(&b.model_name))
        });
        rows
    }

    /// Maps the leading year token of a description to its age bucket.
    /// Returns `None` when the token does not parse as an integer.
    fn age_bucket(description: &str) -> Option<&'static str> {
        let year: i32 = description.split_whitespace().next()?.parse().ok()?;
        Some(match year {
            y if y >= 2020 => "2020-2024",
            y if y >= 2015 => "2015-2019",
            y if y >= 2010 => "2010-2014",
            y if y >= 2005 => "2005-2009",
            _ => "<2005",
        })
    }
}

fn average_rate(members: &[&VariantChange]) -> f64 {
    members.iter().map(|c| c.annual_rate).sum::<f64>() / members.len() as f64
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
