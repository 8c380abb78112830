use lighting_client::domain::{FlagKind, MonthlyEnergyRecord};
use serde::Serialize;

use super::ratio_or_zero;

/// Months per tariff-flag bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct FlagCounts {
    pub green: usize,
    pub yellow: usize,
    pub red_1: usize,
    pub red_2: usize,
}

impl FlagCounts {
    /// Both red tiers together.
    pub fn red(&self) -> usize {
        self.red_1 + self.red_2
    }
}

pub fn flag_counts(records: &[MonthlyEnergyRecord]) -> FlagCounts {
    records.iter().fold(FlagCounts::default(), |mut acc, r| {
        match r.tariff_flag.kind() {
            FlagKind::Green => acc.green += 1,
            FlagKind::Yellow => acc.yellow += 1,
            FlagKind::Red1 => acc.red_1 += 1,
            FlagKind::Red2 => acc.red_2 += 1,
        }
        acc
    })
}

/// Extra cost attributable to colored flags: `extra_unit_price * kWh` summed
/// over non-green months. Green months contribute nothing.
pub fn flag_extra_cost(records: &[MonthlyEnergyRecord]) -> f64 {
    records
        .iter()
        .filter(|r| r.tariff_flag.is_colored())
        .map(|r| r.tariff_flag.extra_unit_price() * r.consumption_kwh)
        .sum()
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ColoredMonths {
    pub count: usize,
    pub share_pct: f64,
}

pub fn colored_months(records: &[MonthlyEnergyRecord]) -> ColoredMonths {
    let count = records.iter().filter(|r| r.tariff_flag.is_colored()).count();
    ColoredMonths {
        count,
        share_pct: ratio_or_zero(count as f64, records.len() as f64) * 100.0,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FlagTotals {
    pub flag: FlagKind,
    pub months: usize,
    pub consumption_kwh: f64,
    pub amount_paid: f64,
}

/// Consumption and spend split by flag bucket, in `FlagKind::ALL` order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlagBreakdown {
    pub buckets: Vec<FlagTotals>,
    pub total_paid: f64,
}

pub fn flag_breakdown(records: &[MonthlyEnergyRecord]) -> FlagBreakdown {
    let buckets: Vec<FlagTotals> = FlagKind::ALL
        .iter()
        .map(|&flag| {
            let (months, consumption_kwh, amount_paid) = records
                .iter()
                .filter(|r| r.tariff_flag.kind() == flag)
                .fold((0, 0.0, 0.0), |(m, c, p), r| (m + 1, c + r.consumption_kwh, p + r.amount_paid));
            FlagTotals {
                flag,
                months,
                consumption_kwh,
                amount_paid,
            }
        })
        .collect();

    let total_paid = buckets.iter().map(|b| b.amount_paid).sum();
    FlagBreakdown { buckets, total_paid }
}
