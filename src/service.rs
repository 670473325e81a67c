use crate::analyzer::{CrossFilterIndexBuilder, DepreciationCalculator};
use crate::cache::{AnalysisCache, ReportKey};
use crate::model::{AnalyticsError, CrossFilterIndex, DepreciationReport};
use crate::storage::PriceRepository;
use std::sync::Arc;
use tracing::{debug, info};

/// Entry point consumed by the web layer: cross-filter index construction
/// and cache-backed depreciation reports over one price repository.
pub struct AnalyticsService<R: PriceRepository> {
    repo: R,
    cache: AnalysisCache,
}

impl<R: PriceRepository> AnalyticsService<R> {
    pub fn new(repo: R) -> Self {
        Self {
            repo,
            cache: AnalysisCache::new(),
        }
    }

    /// Builds the cascading-selector index for one brand, restricted to
    /// variants priced in the most recent period. A store without any
    /// periods yields an empty index, not an error.
    pub fn build_index(&self, brand_id: i64) -> Result<CrossFilterIndex, AnalyticsError> {
        validate_positive("brand_id", brand_id)?;

        let Some(cutoff) = self.repo.latest_period()? else {
            return Ok(CrossFilterIndex::default());
        };
        let listings = self.repo.list_available_variants(brand_id, cutoff.id)?;
        debug!(
            "Building cross-filter index for brand {} at cutoff {} ({} listings)",
            brand_id,
            cutoff.date,
            listings.len()
        );
        Ok(CrossFilterIndexBuilder::build(&listings))
    }

    /// Returns the depreciation report for a window ending at the current
    /// cutoff. The cutoff is resolved fresh on every call before the cache
    /// lookup, so stale entries are bypassed as soon as new data lands.
    pub fn compute_report(
        &self,
        window_months: u32,
        brand_id: Option<i64>,
    ) -> Result<Arc<DepreciationReport>, AnalyticsError> {
        DepreciationCalculator::validate_window(window_months)?;
        if let Some(id) = brand_id {
            validate_positive("brand_id", id)?;
        }

        let cutoff = self.repo.latest_period()?.ok_or(AnalyticsError::NoData)?;
        let key = ReportKey {
            cutoff: cutoff.date,
            window_months,
            brand_id,
        };

        if let Some(report) = self.cache.get(&key) {
            debug!(
                "Report cache hit: cutoff={}, window={}m, brand={:?}",
                key.cutoff, window_months, brand_id
            );
            return Ok(report);
        }

        info!(
            "Computing depreciation report: cutoff={}, window={}m, brand={:?}",
            cutoff.date, window_months, brand_id
        );
        let report = Arc::new(DepreciationCalculator::compute(
            &self.repo,
            &cutoff,
            window_months,
            brand_id,
        )?);
        self.cache.insert(key, Arc::clone(&report));
        Ok(report)
    }
}

fn validate_positive(field: &'static str, id: i64) -> Result<(), AnalyticsError> {
    if id <= 0 {
        return Err(AnalyticsError::Validation {
            field,
            reason: format!("{id} is not a positive id"),
        });
    }
    Ok(())
}
