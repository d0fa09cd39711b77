/*!
 * # Forecast Metrics
 *
 * Prometheus counters for the forecasting service, kept in a crate-local
 * registry so an embedding application can expose them however it likes.
 */

use lazy_static::lazy_static;
use prometheus::core::Collector;
use prometheus::{Encoder, Histogram, HistogramOpts, IntCounter, Registry, TextEncoder};

use crate::errors::ServiceError;

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();
    pub static ref FORECASTS_GENERATED: IntCounter = registered(
        IntCounter::new("forecasts_generated_total", "Total number of forecasts generated")
            .expect("metric can be created")
    );
    pub static ref FORECAST_FAILURES: IntCounter = registered(
        IntCounter::new("forecast_failures_total", "Total number of failed forecasts")
            .expect("metric can be created")
    );
    pub static ref FORECAST_TIMEOUTS: IntCounter = registered(
        IntCounter::new(
            "forecast_timeouts_total",
            "Total number of forecasts abandoned after the per-product timeout"
        )
        .expect("metric can be created")
    );
    pub static ref REORDER_SUGGESTIONS: IntCounter = registered(
        IntCounter::new(
            "reorder_suggestions_total",
            "Total number of forecasts that recommended a reorder"
        )
        .expect("metric can be created")
    );
    pub static ref FORECAST_DURATION: Histogram = registered(
        Histogram::with_opts(HistogramOpts::new(
            "forecast_duration_seconds",
            "Time spent fetching history and building one forecast"
        ))
        .expect("metric can be created")
    );
}

fn registered<C: Collector + Clone + 'static>(collector: C) -> C {
    // duplicate registration only happens if two registries share a name
    let _ = REGISTRY.register(Box::new(collector.clone()));
    collector
}

/// Renders all forecast metrics in the Prometheus text format
pub fn gather_text() -> Result<String, ServiceError> {
    let mut buffer = Vec::new();
    TextEncoder::new()
        .encode(&REGISTRY.gather(), &mut buffer)
        .map_err(|e| ServiceError::InternalError(format!("metrics encoding failed: {}", e)))?;
    String::from_utf8(buffer)
        .map_err(|e| ServiceError::InternalError(format!("metrics are not utf-8: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_show_up_in_text_output() {
        FORECASTS_GENERATED.inc();
        let text = gather_text().unwrap();
        assert!(text.contains("forecasts_generated_total"));
    }
}
