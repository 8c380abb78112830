use lighting_client::domain::{BillingPeriod, FlagKind, MonthlyEnergyRecord};
use serde::Serialize;

use super::{chronological, cost_per_kwh, mean};

/// One chart point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyPoint {
    pub period: BillingPeriod,
    pub label: String,
    pub consumption_kwh: f64,
    pub amount_billed: f64,
    pub amount_paid: f64,
    pub cost_per_kwh: f64,
    pub flag: FlagKind,
    pub levy_billed: Option<f64>,
    pub levy_collected: Option<f64>,
    pub levy_customer_count: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct MonthlySeries {
    pub points: Vec<MonthlyPoint>,
    /// Reference lines drawn across the charts.
    pub average_consumption: f64,
    pub average_cost_per_kwh: f64,
}

pub fn monthly_series(records: &[MonthlyEnergyRecord]) -> MonthlySeries {
    let points: Vec<MonthlyPoint> = chronological(records)
        .into_iter()
        .map(|r| MonthlyPoint {
            period: r.period,
            label: r.period.axis_label(),
            consumption_kwh: r.consumption_kwh,
            amount_billed: r.amount_billed,
            amount_paid: r.amount_paid,
            cost_per_kwh: cost_per_kwh(r),
            flag: r.tariff_flag.kind(),
            levy_billed: r.levy.billed,
            levy_collected: r.levy.collected,
            levy_customer_count: r.levy.present_customer_count(),
        })
        .collect();

    MonthlySeries {
        average_consumption: mean(points.iter().map(|p| p.consumption_kwh)),
        average_cost_per_kwh: mean(
            points
                .iter()
                .filter(|p| p.consumption_kwh > 0.0)
                .map(|p| p.cost_per_kwh),
        ),
        points,
    }
}
