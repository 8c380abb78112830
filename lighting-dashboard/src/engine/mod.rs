//! Aggregation engine.
//!
//! Pure functions over an already-fetched, already-filtered slice of monthly
//! records. Every function is total: empty input and zero denominators yield
//! a placeholder (`0`, `None` or a not-applicable variant), never `NaN`,
//! `Infinity` or a panic.

pub mod flags;
pub mod insights;
pub mod levy;
pub mod series;
pub mod summary;
pub mod trend;
pub mod variance;

use lighting_client::domain::MonthlyEnergyRecord;

pub use flags::{colored_months, flag_breakdown, flag_counts, flag_extra_cost, ColoredMonths, FlagBreakdown, FlagCounts, FlagTotals};
pub use insights::{insights, Insight, InsightKind};
pub use levy::{
    customer_count_delta, levy_analysis, levy_efficiency, CollectionStatus, CustomerCountDelta, LevyAnalysis, LevyEfficiency,
    LevyMonth, LevyTrend,
};
pub use series::{monthly_series, MonthlyPoint, MonthlySeries};
pub use summary::{cost_per_kwh, summary, Summary};
pub use trend::{
    extremes, next_month_projection, rank_by_cost_per_kwh, tariff_evolution, trend, Extremes, RankDirection,
    RankedMonth, TariffEvolution, Trend,
};
pub use variance::{latest_month, period_comparison, period_over_period_variance, LatestMonth, PeriodComparison, VarianceDirection};

/// `numerator / denominator`, or `0` when the denominator is zero.
pub(crate) fn ratio_or_zero(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

/// Arithmetic mean, `0` for an empty input.
pub(crate) fn mean<I: IntoIterator<Item = f64>>(values: I) -> f64 {
    let (sum, n) = values.into_iter().fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    ratio_or_zero(sum, n as f64)
}

/// Records sorted by billing period; equal periods keep input order.
pub(crate) fn chronological(records: &[MonthlyEnergyRecord]) -> Vec<&MonthlyEnergyRecord> {
    let mut sorted: Vec<&MonthlyEnergyRecord> = records.iter().collect();
    sorted.sort_by_key(|r| r.period);
    sorted
}

#[cfg(test)]
pub(crate) mod fixtures {
    use lighting_client::domain::{BillingPeriod, LevyFigures, MonthlyEnergyRecord, TariffFlag};

    pub fn record(year: i32, month: u32, consumption_kwh: f64, amount_paid: f64) -> MonthlyEnergyRecord {
        MonthlyEnergyRecord {
            id: format!("{year}-{month:02}"),
            period: BillingPeriod::new(year, month),
            consumption_kwh,
            amount_billed: amount_paid,
            amount_paid,
            tariff_flag: TariffFlag::Green,
            flag_amount_billed: None,
            unit_price_energy: None,
            unit_price_distribution: None,
            levy: LevyFigures::default(),
            delinquency_rate: None,
            notes: None,
            updated_at: None,
        }
    }

    /// Twelve months of 2024 with consumption `1000 + 10 * month` and cost
    /// growing by one cent per kWh each month.
    pub fn year_2024() -> Vec<MonthlyEnergyRecord> {
        (1..=12)
            .map(|m| {
                let kwh = 1000.0 + 10.0 * m as f64;
                record(2024, m, kwh, kwh * (0.50 + 0.01 * m as f64))
            })
            .collect()
    }
}
