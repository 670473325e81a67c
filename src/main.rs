use fipe_insight::AnalyticsService;
use fipe_insight::config::load_config;
use fipe_insight::storage::SqlitePriceStore;
use tracing::{error, info, warn};

fn main() {
    // Initialize logging
    tracing_subscriber::fmt::init();

    // Load configuration from file
    let config = match load_config("config.json") {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Config load error: {}", e);
            return;
        }
    };

    // Open the price database produced by the scraper (read-only use)
    let store = match SqlitePriceStore::new(&config.db_path) {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to open price store: {:?}", e);
            return;
        }
    };

    let service = AnalyticsService::new(store);

    if let Some(brand_id) = config.brand_id {
        match service.build_index(brand_id) {
            Ok(index) => {
                info!(
                    "Cross-filter index for brand {}: {} models, {} variant descriptions",
                    brand_id,
                    index.models.len(),
                    index.variant_descriptions.len()
                );
            }
            Err(e) => warn!("Index build failed: {}", e),
        }
    }

    let report = match service.compute_report(config.window_months, config.brand_id) {
        Ok(r) => r,
        Err(e) => {
            error!("Report computation failed: {}", e);
            return;
        }
    };

    info!(
        "Depreciation report {} → {} ({} brand rows, {} age buckets)",
        report.window_start,
        report.window_end,
        report.brand_rows.len(),
        report.age_bucket_rows.len()
    );
    for row in &report.brand_rows {
        info!(
            "Brand {:<20} avg rate {:>7.2}%/yr | retention {:>5.1}% | {} models",
            row.brand_name, row.avg_annual_rate, row.value_retention, row.sample_size
        );
    }
    for row in &report.age_bucket_rows {
        info!(
            "Bucket {:<10} avg rate {:>7.2}%/yr | retention {:>5.1}% | {} variants",
            row.bucket, row.avg_annual_rate, row.value_retention, row.sample_size
        );
    }
    if let Some(model_rows) = &report.model_rows {
        for row in model_rows {
            info!(
                "Model {:<25} avg rate {:>7.2}%/yr | retention {:>5.1}% | {} variants",
                row.model_name, row.avg_annual_rate, row.value_retention, row.sample_size
            );
        }
    }
}
