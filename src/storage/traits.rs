use crate::model::{Period, PriceObservation, StorageError, VariantListing};
use chrono::NaiveDate;
use std::sync::Arc;

/// Read-only view over the price history. The engine never writes through
/// this trait; ingestion is owned by the upstream scraper.
pub trait PriceRepository: Send + Sync {
    /// The period with the maximum date across the whole store, or `None`
    /// when the store is empty.
    fn latest_period(&self) -> Result<Option<Period>, StorageError>;

    /// Variants of the brand's models that have a price point in the given
    /// period, joined with their model.
    fn list_available_variants(
        &self,
        brand_id: i64,
        period_id: i64,
    ) -> Result<Vec<VariantListing>, StorageError>;

    /// All price points whose period date lies in `[start, end]`, optionally
    /// restricted to one brand.
    fn list_price_points_in_window(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        brand_id: Option<i64>,
    ) -> Result<Vec<PriceObservation>, StorageError>;
}

impl<T: PriceRepository + ?Sized> PriceRepository for Arc<T> {
    fn latest_period(&self) -> Result<Option<Period>, StorageError> {
        (**self).latest_period()
    }

    fn list_available_variants(
        &self,
        brand_id: i64,
        period_id: i64,
    ) -> Result<Vec<VariantListing>, StorageError> {
        (**self).list_available_variants(brand_id, period_id)
    }

    fn list_price_points_in_window(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        brand_id: Option<i64>,
    ) -> Result<Vec<PriceObservation>, StorageError> {
        (**self).list_price_points_in_window(start, end, brand_id)
    }
}
