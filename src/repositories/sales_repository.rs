use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::models::{ProductSnapshot, SaleRecord};

use super::SalesDataSource;

/// In-memory record store, used for tests and for callers that already hold
/// a snapshot of the catalog.
#[derive(Debug, Default)]
pub struct InMemorySalesRepository {
    products: DashMap<Uuid, ProductSnapshot>,
    sales: DashMap<Uuid, Vec<SaleRecord>>,
}

impl InMemorySalesRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert_product(&self, product: ProductSnapshot) {
        self.products.insert(product.id, product);
    }

    /// Adds sales for a product, keeping its history ordered by timestamp
    pub fn record_sales(&self, product_id: Uuid, records: impl IntoIterator<Item = SaleRecord>) {
        let mut history = self.sales.entry(product_id).or_default();
        history.extend(records);
        history.sort_by_key(|r| r.timestamp);
    }
}

#[async_trait]
impl SalesDataSource for InMemorySalesRepository {
    async fn product_snapshot(&self, product_id: Uuid) -> Result<ProductSnapshot, ServiceError> {
        self.products
            .get(&product_id)
            .map(|p| p.value().clone())
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))
    }

    async fn sales_history(
        &self,
        product_id: Uuid,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<SaleRecord>, ServiceError> {
        Ok(self
            .sales
            .get(&product_id)
            .map(|history| {
                history
                    .iter()
                    .filter(|r| r.timestamp >= since && r.timestamp <= until)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    /// Ids in ascending order so catalog-wide views are deterministic
    async fn product_ids(&self) -> Result<Vec<Uuid>, ServiceError> {
        let mut ids: Vec<Uuid> = self.products.iter().map(|p| *p.key()).collect();
        ids.sort();
        Ok(ids)
    }
}
