/*!
 * # Replenishment Advisory
 *
 * Turns stock, consumption and forecast figures into a reorder suggestion.
 * The trigger, urgency tiers and cost estimate are shared; how much to order
 * (and which consumption rate to plan against) comes from a pluggable
 * [`ReplenishmentPolicy`] selected by configuration.
 */

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::config::{ReplenishmentConfig, ReplenishmentPolicyKind};
use crate::models::{ProductSnapshot, ReorderSuggestion, StockDays, Urgency};

/// Everything a policy may look at for one product
#[derive(Clone, Debug)]
pub struct ReplenishmentContext<'a> {
    pub product: &'a ProductSnapshot,
    /// Observed units per day over the usage window
    pub daily_average: f64,
    /// Forecast units per day after trend and seasonal adjustment
    pub adjusted_rate: f64,
    /// Standard deviation of historical daily totals
    pub daily_std_dev: f64,
    pub lead_time_days: u32,
    /// False when the product has no sales history at all
    pub has_history: bool,
}

impl ReplenishmentContext<'_> {
    /// Units needed to climb back to the reorder level
    pub fn reorder_shortfall(&self) -> u32 {
        self.product
            .reorder_level
            .saturating_sub(self.product.current_stock)
    }
}

pub trait ReplenishmentPolicy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Consumption rate used for days-of-stock
    fn demand_rate(&self, ctx: &ReplenishmentContext<'_>) -> f64 {
        ctx.daily_average
    }

    /// Policy-specific reorder trigger on top of the lead-time and
    /// reorder-level checks
    fn triggers(&self, _ctx: &ReplenishmentContext<'_>) -> bool {
        false
    }

    /// Units to order, including any reorder-level shortfall
    fn order_quantity(&self, ctx: &ReplenishmentContext<'_>) -> u32;
}

/// Cover the next `coverage_days` at the trailing average.
#[derive(Clone, Debug)]
pub struct MovingAveragePolicy {
    pub coverage_days: u32,
}

impl ReplenishmentPolicy for MovingAveragePolicy {
    fn name(&self) -> &'static str {
        "moving-average"
    }

    fn order_quantity(&self, ctx: &ReplenishmentContext<'_>) -> u32 {
        let cover = (ctx.daily_average * f64::from(self.coverage_days)).ceil() as u32;
        cover.saturating_add(ctx.reorder_shortfall())
    }
}

/// Economic order quantity with a service-level safety stock.
#[derive(Clone, Debug)]
pub struct EoqSafetyStockPolicy {
    pub coverage_days: u32,
    pub ordering_cost: f64,
    pub holding_cost_rate: f64,
    pub service_level_z: f64,
}

impl EoqSafetyStockPolicy {
    pub fn safety_stock(&self, ctx: &ReplenishmentContext<'_>) -> f64 {
        self.service_level_z * ctx.daily_std_dev * f64::from(ctx.lead_time_days).sqrt()
    }

    pub fn reorder_point(&self, ctx: &ReplenishmentContext<'_>) -> f64 {
        ctx.daily_average * f64::from(ctx.lead_time_days) + self.safety_stock(ctx)
    }

    /// `sqrt(2DS / H)`; zero when demand or holding cost is zero
    pub fn economic_order_quantity(&self, ctx: &ReplenishmentContext<'_>) -> f64 {
        let annual_demand = ctx.daily_average * 365.0;
        let unit_cost = ctx.product.unit_cost().to_f64().unwrap_or(0.0);
        let holding_cost = self.holding_cost_rate * unit_cost;
        if annual_demand <= 0.0 || holding_cost <= 0.0 {
            return 0.0;
        }
        (2.0 * annual_demand * self.ordering_cost / holding_cost).sqrt()
    }
}

impl ReplenishmentPolicy for EoqSafetyStockPolicy {
    fn name(&self) -> &'static str {
        "eoq-safety-stock"
    }

    fn triggers(&self, ctx: &ReplenishmentContext<'_>) -> bool {
        f64::from(ctx.product.current_stock) <= self.reorder_point(ctx)
    }

    fn order_quantity(&self, ctx: &ReplenishmentContext<'_>) -> u32 {
        let coverage = (self.reorder_point(ctx)
            + ctx.daily_average * f64::from(self.coverage_days)
            - f64::from(ctx.product.current_stock))
        .max(0.0);
        let eoq = self.economic_order_quantity(ctx);
        (eoq.max(coverage).ceil() as u32).saturating_add(ctx.reorder_shortfall())
    }
}

/// Plan against the trend- and season-adjusted forecast rate.
#[derive(Clone, Debug)]
pub struct DynamicSeasonalPolicy {
    pub coverage_days: u32,
}

impl ReplenishmentPolicy for DynamicSeasonalPolicy {
    fn name(&self) -> &'static str {
        "dynamic-seasonal"
    }

    fn demand_rate(&self, ctx: &ReplenishmentContext<'_>) -> f64 {
        ctx.adjusted_rate
    }

    fn order_quantity(&self, ctx: &ReplenishmentContext<'_>) -> u32 {
        let cover = (ctx.adjusted_rate * f64::from(self.coverage_days)).ceil() as u32;
        cover.saturating_add(ctx.reorder_shortfall())
    }
}

pub fn policy_from_config(config: &ReplenishmentConfig) -> Box<dyn ReplenishmentPolicy> {
    match config.policy {
        ReplenishmentPolicyKind::MovingAverage => Box::new(MovingAveragePolicy {
            coverage_days: config.coverage_days,
        }),
        ReplenishmentPolicyKind::EoqSafetyStock => Box::new(EoqSafetyStockPolicy {
            coverage_days: config.coverage_days,
            ordering_cost: config.ordering_cost,
            holding_cost_rate: config.holding_cost_rate,
            service_level_z: config.service_level_z,
        }),
        ReplenishmentPolicyKind::DynamicSeasonal => Box::new(DynamicSeasonalPolicy {
            coverage_days: config.coverage_days,
        }),
    }
}

pub struct ReplenishmentAdvisor<'a> {
    config: &'a ReplenishmentConfig,
    policy: Box<dyn ReplenishmentPolicy>,
}

impl<'a> ReplenishmentAdvisor<'a> {
    pub fn new(config: &'a ReplenishmentConfig) -> Self {
        Self {
            config,
            policy: policy_from_config(config),
        }
    }

    pub fn with_policy(
        config: &'a ReplenishmentConfig,
        policy: Box<dyn ReplenishmentPolicy>,
    ) -> Self {
        Self { config, policy }
    }

    pub fn advise(&self, ctx: &ReplenishmentContext<'_>) -> ReorderSuggestion {
        let product = ctx.product;
        let days = StockDays::from_rate(product.current_stock, self.policy.demand_rate(ctx));

        if !ctx.has_history {
            return self.no_reorder(days, "No sales history; no reorder suggested".to_string());
        }

        let should_reorder = days.at_most(f64::from(ctx.lead_time_days))
            || product.current_stock <= product.reorder_level
            || self.policy.triggers(ctx);

        if !should_reorder {
            let message = match days {
                StockDays::Finite(d) => format!("Stock sufficient for {:.1} days", d),
                StockDays::Unbounded => "No recent consumption; stock sufficient".to_string(),
            };
            return self.no_reorder(days, message);
        }

        let quantity = self.policy.order_quantity(ctx);
        let urgency = self.urgency(product.current_stock, days);
        let message = match (urgency, days) {
            (Urgency::Critical, _) => {
                format!("Out of stock: reorder {} units immediately", quantity)
            }
            (Urgency::High, StockDays::Finite(d)) => {
                format!("Stock runs out in {:.1} days: reorder {} units now", d, quantity)
            }
            (Urgency::Medium, StockDays::Finite(d)) => format!(
                "Stock covers {:.1} days, within lead time: reorder {} units",
                d, quantity
            ),
            _ => format!("Stock at or below reorder level: reorder {} units", quantity),
        };

        ReorderSuggestion {
            should_reorder: true,
            urgency,
            suggested_quantity: quantity,
            days_until_stockout: days,
            estimated_cost: Decimal::from(quantity) * product.unit_cost(),
            message,
            policy: self.policy.name().to_string(),
        }
    }

    /// Critical when empty, then by remaining days of stock.
    pub fn urgency(&self, current_stock: u32, days: StockDays) -> Urgency {
        if current_stock == 0 {
            Urgency::Critical
        } else if days.at_most(self.config.high_urgency_days) {
            Urgency::High
        } else if days.at_most(self.config.medium_urgency_days) {
            Urgency::Medium
        } else {
            Urgency::Low
        }
    }

    fn no_reorder(&self, days: StockDays, message: String) -> ReorderSuggestion {
        ReorderSuggestion {
            should_reorder: false,
            urgency: Urgency::Low,
            suggested_quantity: 0,
            days_until_stockout: days,
            estimated_cost: Decimal::ZERO,
            message,
            policy: self.policy.name().to_string(),
        }
    }
}
