// Storage module: read-only access to the externally-owned price history.

pub mod sqlite;
pub mod traits;

pub use sqlite::SqlitePriceStore;
pub use traits::PriceRepository;
