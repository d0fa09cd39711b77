//! Read-only access to product and sale records.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::models::{ProductSnapshot, SaleRecord};

pub mod sales_repository;

pub use sales_repository::InMemorySalesRepository;

/// The record store the forecasting service reads from.
#[async_trait]
pub trait SalesDataSource: Send + Sync {
    /// Current snapshot of a product; `NotFound` when the id is unknown
    async fn product_snapshot(&self, product_id: Uuid) -> Result<ProductSnapshot, ServiceError>;

    /// Sales of a product in `[since, until]`, oldest first
    async fn sales_history(
        &self,
        product_id: Uuid,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<SaleRecord>, ServiceError>;

    /// Every product in the catalog
    async fn product_ids(&self) -> Result<Vec<Uuid>, ServiceError>;
}
