use lighting_client::domain::{BillingPeriod, FlagKind, MonthlyEnergyRecord};
use serde::Serialize;

use super::{chronological, cost_per_kwh, summary, Summary};

/// Below this absolute percentage a change is shown as steady.
const STEADY_THRESHOLD_PCT: f64 = 0.5;

/// `(current - previous) / previous * 100`.
///
/// `None` means "not comparable" (no previous value, or a zero one) and must
/// not be rendered as 0%.
pub fn period_over_period_variance(current: f64, previous: Option<f64>) -> Option<f64> {
    match previous {
        Some(p) if p != 0.0 => Some((current - p) / p * 100.0),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VarianceDirection {
    Up,
    Down,
    Steady,
}

impl VarianceDirection {
    pub fn classify(variance: Option<f64>) -> Option<Self> {
        variance.map(|v| {
            if v.abs() < STEADY_THRESHOLD_PCT {
                VarianceDirection::Steady
            } else if v > 0.0 {
                VarianceDirection::Up
            } else {
                VarianceDirection::Down
            }
        })
    }
}

/// The most recent month against the one before it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LatestMonth {
    pub id: String,
    pub period: BillingPeriod,
    pub label: String,
    pub flag: FlagKind,
    pub consumption_kwh: f64,
    pub amount_paid: f64,
    pub cost_per_kwh: f64,
    pub unit_price_energy: Option<f64>,
    pub unit_price_distribution: Option<f64>,
    pub extra_unit_price: f64,
    pub previous_period: Option<BillingPeriod>,
    pub consumption_variance: Option<f64>,
    pub paid_variance: Option<f64>,
    pub consumption_direction: Option<VarianceDirection>,
    pub paid_direction: Option<VarianceDirection>,
}

pub fn latest_month(records: &[MonthlyEnergyRecord]) -> Option<LatestMonth> {
    let sorted = chronological(records);
    let (&latest, rest) = sorted.split_last()?;
    let previous = rest.last().copied();

    let consumption_variance =
        period_over_period_variance(latest.consumption_kwh, previous.map(|p| p.consumption_kwh));
    let paid_variance = period_over_period_variance(latest.amount_paid, previous.map(|p| p.amount_paid));

    Some(LatestMonth {
        id: latest.id.clone(),
        period: latest.period,
        label: latest.period.long_label(),
        flag: latest.tariff_flag.kind(),
        consumption_kwh: latest.consumption_kwh,
        amount_paid: latest.amount_paid,
        cost_per_kwh: cost_per_kwh(latest),
        unit_price_energy: latest.unit_price_energy,
        unit_price_distribution: latest.unit_price_distribution,
        extra_unit_price: latest.tariff_flag.extra_unit_price(),
        previous_period: previous.map(|p| p.period),
        consumption_variance,
        paid_variance,
        consumption_direction: VarianceDirection::classify(consumption_variance),
        paid_direction: VarianceDirection::classify(paid_variance),
    })
}

/// The selected period against a comparison period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodComparison {
    pub current: Summary,
    pub previous: Summary,
    pub consumption_variance: Option<f64>,
    pub paid_variance: Option<f64>,
    pub cost_per_kwh_variance: Option<f64>,
}

pub fn period_comparison(current: &[MonthlyEnergyRecord], previous: &[MonthlyEnergyRecord]) -> PeriodComparison {
    let cur = summary(current);
    let prev = summary(previous);
    // An empty comparison period has nothing to compare against.
    let has_previous = prev.record_count > 0;
    let prior = |v: f64| has_previous.then_some(v);

    PeriodComparison {
        consumption_variance: period_over_period_variance(cur.total_consumption, prior(prev.total_consumption)),
        paid_variance: period_over_period_variance(cur.total_paid, prior(prev.total_paid)),
        cost_per_kwh_variance: period_over_period_variance(
            cur.average_cost_per_kwh,
            prior(prev.average_cost_per_kwh),
        ),
        current: cur,
        previous: prev,
    }
}
