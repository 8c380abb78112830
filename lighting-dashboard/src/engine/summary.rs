use lighting_client::domain::MonthlyEnergyRecord;
use serde::Serialize;

use super::ratio_or_zero;

/// Amount paid per kWh consumed; `0` for a month with no consumption.
pub fn cost_per_kwh(record: &MonthlyEnergyRecord) -> f64 {
    ratio_or_zero(record.amount_paid, record.consumption_kwh)
}

/// Period totals and the headline KPIs.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Summary {
    pub record_count: usize,
    pub total_consumption: f64,
    pub total_paid: f64,
    pub total_billed: f64,
    /// `total_paid / total_consumption`, `0` without consumption.
    pub average_cost_per_kwh: f64,
    pub average_monthly_consumption: f64,
    /// Positive means less was paid than billed.
    pub billed_minus_paid: f64,
}

pub fn summary(records: &[MonthlyEnergyRecord]) -> Summary {
    let (total_consumption, total_paid, total_billed) = records.iter().fold((0.0, 0.0, 0.0), |(c, p, b), r| {
        (c + r.consumption_kwh, p + r.amount_paid, b + r.amount_billed)
    });

    Summary {
        record_count: records.len(),
        total_consumption,
        total_paid,
        total_billed,
        average_cost_per_kwh: ratio_or_zero(total_paid, total_consumption),
        average_monthly_consumption: ratio_or_zero(total_consumption, records.len() as f64),
        billed_minus_paid: total_billed - total_paid,
    }
}
