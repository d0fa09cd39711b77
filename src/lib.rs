//! Pharmacy demand forecasting
//!
//! Turns a product's sale history into a short-horizon demand forecast and a
//! replenishment recommendation. The pure pipeline lives in [`forecasting`];
//! [`services::forecasting::ForecastingService`] wraps it with data access,
//! batching and rankings.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod config;
pub mod errors;
pub mod forecasting;
pub mod metrics;
pub mod models;
pub mod repositories;
pub mod services;

pub use crate::config::{load_config, ForecastConfig};
pub use crate::errors::ServiceError;
pub use crate::models::{ForecastResult, ProductSnapshot, SaleRecord};
pub use crate::repositories::{InMemorySalesRepository, SalesDataSource};
pub use crate::services::forecasting::ForecastingService;
