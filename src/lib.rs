pub mod analyzer;
pub mod cache;
pub mod config;
pub mod model;
pub mod service;
pub mod storage;

pub use service::AnalyticsService;
