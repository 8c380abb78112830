//! Public-lighting levy (COSIP) indicators.
//!
//! Only months carrying billed, collected and a customer count take part in
//! the efficiency figures. Delinquency is `100 - efficiency` and goes
//! negative when more was collected than billed; that surplus is reported as
//! such and never clamped.

use lighting_client::domain::{BillingPeriod, MonthlyEnergyRecord};
use serde::Serialize;

use super::{chronological, mean, ratio_or_zero};

const TOP_N: usize = 3;
const PROJECTION_WINDOW: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionStatus {
    /// Collected more than billed (negative delinquency).
    Surplus,
    Deficit,
    Balanced,
}

impl CollectionStatus {
    fn from_delinquency(delinquency_pct: f64) -> Self {
        if delinquency_pct < 0.0 {
            CollectionStatus::Surplus
        } else if delinquency_pct > 0.0 {
            CollectionStatus::Deficit
        } else {
            CollectionStatus::Balanced
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LevyEfficiency {
    pub record_count: usize,
    pub total_billed: f64,
    pub total_collected: f64,
    pub efficiency_pct: f64,
    pub average_delinquency_pct: f64,
    pub status: CollectionStatus,
}

fn complete_levy_months(records: &[MonthlyEnergyRecord]) -> Vec<&MonthlyEnergyRecord> {
    chronological(records)
        .into_iter()
        .filter(|r| r.levy.is_complete())
        .collect()
}

fn billed(r: &MonthlyEnergyRecord) -> f64 {
    r.levy.billed.unwrap_or(0.0)
}

fn collected(r: &MonthlyEnergyRecord) -> f64 {
    r.levy.collected.unwrap_or(0.0)
}

fn efficiency_of(months: &[&MonthlyEnergyRecord]) -> LevyEfficiency {
    let total_billed: f64 = months.iter().map(|r| billed(r)).sum();
    let total_collected: f64 = months.iter().map(|r| collected(r)).sum();
    let efficiency_pct = ratio_or_zero(total_collected, total_billed) * 100.0;
    let average_delinquency_pct = 100.0 - efficiency_pct;

    LevyEfficiency {
        record_count: months.len(),
        total_billed,
        total_collected,
        efficiency_pct,
        average_delinquency_pct,
        status: CollectionStatus::from_delinquency(average_delinquency_pct),
    }
}

/// `None` when no month carries complete levy figures.
pub fn levy_efficiency(records: &[MonthlyEnergyRecord]) -> Option<LevyEfficiency> {
    let months = complete_levy_months(records);
    if months.is_empty() {
        return None;
    }
    Some(efficiency_of(&months))
}

/// Customer-count change between the first and last month that report one.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct CustomerCountDelta {
    pub first: i64,
    pub last: i64,
    pub delta: i64,
    /// `0` when the first count is zero.
    pub delta_pct: f64,
}

pub fn customer_count_delta(records: &[MonthlyEnergyRecord]) -> CustomerCountDelta {
    let counts: Vec<i64> = chronological(records)
        .into_iter()
        .filter_map(|r| r.levy.present_customer_count())
        .collect();

    match (counts.first(), counts.last()) {
        (Some(&first), Some(&last)) => CustomerCountDelta {
            first,
            last,
            delta: last - first,
            delta_pct: ratio_or_zero((last - first) as f64, first as f64) * 100.0,
        },
        _ => CustomerCountDelta::default(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LevyMonth {
    pub period: BillingPeriod,
    pub label: String,
    pub billed: f64,
    pub collected: f64,
    /// `(billed - collected) / billed * 100`; negative on over-collection.
    pub delinquency_pct: f64,
}

impl LevyMonth {
    fn of(r: &MonthlyEnergyRecord) -> Self {
        let (b, c) = (billed(r), collected(r));
        LevyMonth {
            period: r.period,
            label: r.period.short_label(),
            billed: b,
            collected: c,
            delinquency_pct: ratio_or_zero(b - c, b) * 100.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LevyTrend {
    Improving,
    Worsening,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LevyAnalysis {
    pub efficiency: LevyEfficiency,
    pub customers: CustomerCountDelta,
    pub highest_collection: LevyMonth,
    pub lowest_collection: LevyMonth,
    pub best_delinquency: LevyMonth,
    pub worst_delinquency: LevyMonth,
    pub top_collection: Vec<LevyMonth>,
    /// Only months that actually fell short.
    pub top_delinquency: Vec<LevyMonth>,
    pub collection_projection: f64,
    pub collection_trend: LevyTrend,
    pub delinquency_trend: LevyTrend,
    /// Mean of the independently reported delinquency rates.
    pub reported_delinquency_average: f64,
}

/// Stable sort by `key`, descending.
fn sorted_desc(months: &[LevyMonth], key: impl Fn(&LevyMonth) -> f64) -> Vec<LevyMonth> {
    let mut out = months.to_vec();
    out.sort_by(|a, b| key(b).total_cmp(&key(a)));
    out
}

/// Stable sort by `key`, ascending.
fn sorted_asc(months: &[LevyMonth], key: impl Fn(&LevyMonth) -> f64) -> Vec<LevyMonth> {
    let mut out = months.to_vec();
    out.sort_by(|a, b| key(a).total_cmp(&key(b)));
    out
}

fn reported_delinquency_average(records: &[MonthlyEnergyRecord]) -> f64 {
    mean(
        records
            .iter()
            .filter(|r| r.levy.present_customer_count().is_some())
            .filter_map(|r| r.delinquency_rate),
    )
}

pub fn levy_analysis(records: &[MonthlyEnergyRecord]) -> Option<LevyAnalysis> {
    let complete = complete_levy_months(records);
    if complete.is_empty() {
        return None;
    }

    let months: Vec<LevyMonth> = complete.iter().map(|r| LevyMonth::of(r)).collect();
    let by_collection = sorted_desc(&months, |m| m.collected);
    let by_delinquency = sorted_asc(&months, |m| m.delinquency_pct);
    let worst_first = sorted_desc(&months, |m| m.delinquency_pct);

    let n = months.len();
    let last = &months[n - 1];
    let (collection_trend, delinquency_trend) = if n >= 3 {
        let earlier = &months[n - 3];
        (
            if last.collected > earlier.collected { LevyTrend::Improving } else { LevyTrend::Worsening },
            if last.delinquency_pct < earlier.delinquency_pct { LevyTrend::Improving } else { LevyTrend::Worsening },
        )
    } else {
        (LevyTrend::Improving, LevyTrend::Improving)
    };

    let customers = customer_count_delta(records);

    Some(LevyAnalysis {
        efficiency: efficiency_of(&complete),
        customers,
        highest_collection: by_collection[0].clone(),
        lowest_collection: sorted_asc(&months, |m| m.collected)[0].clone(),
        best_delinquency: by_delinquency[0].clone(),
        worst_delinquency: worst_first[0].clone(),
        top_collection: by_collection.iter().take(TOP_N).cloned().collect(),
        top_delinquency: worst_first
            .iter()
            .filter(|m| m.delinquency_pct > 0.0)
            .take(TOP_N)
            .cloned()
            .collect(),
        collection_projection: mean(months[n.saturating_sub(PROJECTION_WINDOW)..].iter().map(|m| m.collected)),
        collection_trend,
        delinquency_trend,
        reported_delinquency_average: reported_delinquency_average(records),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::fixtures::record;
    use lighting_client::domain::LevyFigures;

    fn levy(month: u32, billed: f64, collected: f64, customers: i64) -> MonthlyEnergyRecord {
        let mut r = record(2024, month, 1000.0, 500.0);
        r.levy = LevyFigures {
            billed: Some(billed),
            collected: Some(collected),
            customer_count: Some(customers),
        };
        r
    }

    #[test]
    fn over_collection_is_a_surplus_not_clamped() {
        let records = vec![levy(1, 100.0, 110.0, 50), levy(2, 200.0, 230.0, 52)];
        let eff = levy_efficiency(&records).unwrap();
        assert!(eff.average_delinquency_pct < 0.0);
        assert!((eff.average_delinquency_pct - -13.333333333333329).abs() < 1e-9);
        assert_eq!(eff.status, CollectionStatus::Surplus);
    }

    #[test]
    fn under_collection_is_a_deficit() {
        let eff = levy_efficiency(&[levy(1, 100.0, 90.0, 10)]).unwrap();
        assert!((eff.efficiency_pct - 90.0).abs() < 1e-9);
        assert!((eff.average_delinquency_pct - 10.0).abs() < 1e-9);
        assert_eq!(eff.status, CollectionStatus::Deficit);
    }

    #[test]
    fn incomplete_months_are_ignored() {
        let mut partial = record(2024, 3, 1.0, 1.0);
        partial.levy.billed = Some(1_000.0);
        let no_customers = levy(4, 500.0, 0.0, 0);
        let eff = levy_efficiency(&[levy(1, 100.0, 100.0, 10), partial, no_customers]).unwrap();
        assert_eq!(eff.record_count, 1);
        assert_eq!(eff.status, CollectionStatus::Balanced);
        assert!(levy_efficiency(&[record(2024, 1, 1.0, 1.0)]).is_none());
        assert!(levy_efficiency(&[]).is_none());
    }

    #[test]
    fn customer_delta_is_signed() {
        let records = vec![levy(3, 1.0, 1.0, 90), levy(1, 1.0, 1.0, 100)];
        let delta = customer_count_delta(&records);
        assert_eq!(delta.first, 100);
        assert_eq!(delta.last, 90);
        assert_eq!(delta.delta, -10);
        assert_eq!(delta.delta_pct, -10.0);
        assert_eq!(customer_count_delta(&[]), CustomerCountDelta::default());
    }

    #[test]
    fn analysis_ranks_and_projects() {
        let records = vec![
            levy(1, 100.0, 90.0, 10),
            levy(2, 100.0, 105.0, 10),
            levy(3, 100.0, 80.0, 11),
            levy(4, 100.0, 95.0, 12),
        ];
        let a = levy_analysis(&records).unwrap();
        assert_eq!(a.highest_collection.period.month, 2);
        assert_eq!(a.lowest_collection.period.month, 3);
        assert_eq!(a.best_delinquency.period.month, 2);
        assert_eq!(a.worst_delinquency.period.month, 3);
        let delinquent: Vec<u32> = a.top_delinquency.iter().map(|m| m.period.month).collect();
        assert_eq!(delinquent, vec![3, 1, 4]);
        assert!((a.collection_projection - (105.0 + 80.0 + 95.0) / 3.0).abs() < 1e-9);
        // April (95) against February (105).
        assert_eq!(a.collection_trend, LevyTrend::Worsening);
        assert_eq!(a.delinquency_trend, LevyTrend::Worsening);
        assert_eq!(a.customers.delta, 2);
    }

    #[test]
    fn reported_rates_average_over_months_with_customers() {
        let mut a = levy(1, 100.0, 90.0, 10);
        a.delinquency_rate = Some(4.0);
        let mut b = levy(2, 100.0, 90.0, 10);
        b.delinquency_rate = Some(6.0);
        let mut c = record(2024, 3, 1.0, 1.0);
        c.delinquency_rate = Some(50.0);
        let analysis = levy_analysis(&[a, b, c]).unwrap();
        assert_eq!(analysis.reported_delinquency_average, 5.0);
    }
}
