#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use pharmacy_forecast::config::ForecastConfig;
use pharmacy_forecast::models::{ProductSnapshot, SaleRecord};
use pharmacy_forecast::repositories::InMemorySalesRepository;
use pharmacy_forecast::services::forecasting::ForecastingService;
use rust_decimal_macros::dec;
use uuid::Uuid;

/// Fixed clock shared by the service tests
pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
}

/// Config with a fixed seed so projections are reproducible
pub fn seeded_config() -> ForecastConfig {
    let mut cfg = ForecastConfig::default();
    cfg.forecast.seed = Some(42);
    cfg
}

/// One sale per day for `days` days ending an hour before `now`
pub fn daily_sales(now: DateTime<Utc>, days: i64, quantity: u32) -> Vec<SaleRecord> {
    (0..days)
        .map(|d| {
            SaleRecord::new(
                now - Duration::days(d) - Duration::hours(1),
                quantity,
                dec!(1.50),
            )
        })
        .collect()
}

pub fn product(name: &str, category: &str, stock: u32, reorder_level: u32) -> ProductSnapshot {
    ProductSnapshot::new(Uuid::new_v4(), name, category)
        .with_stock(stock, reorder_level)
        .with_cost_price(dec!(0.80))
        .with_lead_time(7)
}

pub struct Harness {
    pub repo: Arc<InMemorySalesRepository>,
    pub service: ForecastingService,
}

impl Harness {
    pub fn new(config: ForecastConfig) -> Self {
        let repo = Arc::new(InMemorySalesRepository::new());
        let service = ForecastingService::new(repo.clone(), Arc::new(config));
        Self { repo, service }
    }

    /// Registers a product with flat daily sales and returns its id
    pub fn add_flat(&self, product: ProductSnapshot, days: i64, quantity: u32) -> Uuid {
        let id = product.id;
        self.repo.upsert_product(product);
        self.repo.record_sales(id, daily_sales(now(), days, quantity));
        id
    }

    pub fn add(&self, product: ProductSnapshot, sales: Vec<SaleRecord>) -> Uuid {
        let id = product.id;
        self.repo.upsert_product(product);
        self.repo.record_sales(id, sales);
        id
    }
}

