//! Everything the dashboard renders for one filter selection, computed in a
//! single pass over the selected records.

use lighting_client::domain::{BillingPeriod, MonthlyEnergyRecord};
use serde::Serialize;

use crate::{
    engine::{self, *},
    filter::DashboardFilter,
};

const RANKING_SIZE: usize = 3;

/// Owned view of one end of [`engine::Extremes`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtremeMonth {
    pub id: String,
    pub period: BillingPeriod,
    pub label: String,
    pub consumption_kwh: f64,
}

impl ExtremeMonth {
    fn of(record: &MonthlyEnergyRecord) -> Self {
        Self {
            id: record.id.clone(),
            period: record.period,
            label: record.period.long_label(),
            consumption_kwh: record.consumption_kwh,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsumptionExtremes {
    pub highest: ExtremeMonth,
    pub lowest: ExtremeMonth,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendCard {
    pub trend: Trend,
    pub label: &'static str,
    pub next_month_projection: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardViewModel {
    pub filter: DashboardFilter,
    pub label: String,
    pub record_count: usize,
    pub summary: Summary,
    pub flag_counts: FlagCounts,
    /// Both red tiers, shown as one "Vermelha" badge.
    pub red_flag_months: usize,
    pub flag_extra_cost: f64,
    pub colored_months: ColoredMonths,
    pub flag_breakdown: FlagBreakdown,
    pub tariff_evolution: TariffEvolution,
    pub extremes: Option<ConsumptionExtremes>,
    pub trend: TrendCard,
    pub cheapest_months: Vec<RankedMonth>,
    pub most_expensive_months: Vec<RankedMonth>,
    pub latest_month: Option<LatestMonth>,
    pub levy: Option<LevyAnalysis>,
    pub customer_count_delta: CustomerCountDelta,
    pub insights: Vec<Insight>,
    pub series: MonthlySeries,
    pub comparison: Option<PeriodComparison>,
}

impl DashboardViewModel {
    /// `all_records` is the unfiltered collection; the comparison period is
    /// drawn from it.
    pub fn build(filter: DashboardFilter, all_records: &[MonthlyEnergyRecord]) -> Self {
        let records = filter.apply(all_records);
        let trend = engine::trend(&records);
        let flag_counts = flag_counts(&records);

        Self {
            label: filter.label(),
            record_count: records.len(),
            summary: summary(&records),
            flag_counts,
            red_flag_months: flag_counts.red(),
            flag_extra_cost: flag_extra_cost(&records),
            colored_months: colored_months(&records),
            flag_breakdown: flag_breakdown(&records),
            tariff_evolution: tariff_evolution(&records),
            extremes: extremes(&records).map(|e| ConsumptionExtremes {
                highest: ExtremeMonth::of(e.max),
                lowest: ExtremeMonth::of(e.min),
            }),
            trend: TrendCard {
                trend,
                label: trend.label(),
                next_month_projection: next_month_projection(&records),
            },
            cheapest_months: rank_by_cost_per_kwh(&records, RANKING_SIZE, RankDirection::Asc),
            most_expensive_months: rank_by_cost_per_kwh(&records, RANKING_SIZE, RankDirection::Desc),
            latest_month: latest_month(&records),
            levy: levy_analysis(&records),
            customer_count_delta: customer_count_delta(&records),
            insights: engine::insights(&records),
            series: monthly_series(&records),
            comparison: filter
                .comparison(all_records)
                .map(|previous| period_comparison(&records, &previous)),
            filter,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::fixtures::{record, year_2024};
    use crate::filter::PeriodRange;
    use lighting_client::domain::{FlagKind, TariffFlag};

    #[test]
    fn empty_selection_builds_placeholders() {
        let vm = DashboardViewModel::build(DashboardFilter::for_year(2030), &year_2024());
        assert_eq!(vm.record_count, 0);
        assert_eq!(vm.summary, Summary::default());
        assert!(vm.extremes.is_none());
        assert!(vm.latest_month.is_none());
        assert!(vm.levy.is_none());
        assert_eq!(vm.trend.trend, Trend::NotApplicable);
        assert!(vm.cheapest_months.is_empty());
        assert!(vm.insights.is_empty());
        assert!(vm.comparison.is_none());
    }

    #[test]
    fn year_selection_fills_every_card() {
        let vm = DashboardViewModel::build(DashboardFilter::for_year(2024), &year_2024());
        assert_eq!(vm.label, "2024");
        assert_eq!(vm.record_count, 12);
        assert_eq!(vm.flag_counts.green, 12);

        let extremes = vm.extremes.unwrap();
        assert_eq!(extremes.highest.label, "Dezembro/2024");
        assert_eq!(extremes.lowest.label, "Janeiro/2024");

        assert_eq!(vm.trend.trend, Trend::Rising);
        assert_eq!(vm.trend.label, "Subindo");
        assert_eq!(vm.cheapest_months[0].period.month, 1);
        assert_eq!(vm.most_expensive_months[0].period.month, 12);
        assert_eq!(vm.latest_month.unwrap().period, BillingPeriod::new(2024, 12));
        assert_eq!(vm.series.points.len(), 12);
    }

    #[test]
    fn comparison_is_built_when_requested() {
        let mut records = year_2024();
        records.push(record(2023, 1, 1000.0, 500.0));
        let filter = DashboardFilter {
            year: Some(2024),
            compare: Some(PeriodRange::new(BillingPeriod::new(2023, 1), BillingPeriod::new(2023, 12)).unwrap()),
            ..DashboardFilter::default()
        };
        let vm = DashboardViewModel::build(filter, &records);
        let cmp = vm.comparison.unwrap();
        assert_eq!(cmp.previous.record_count, 1);
        assert_eq!(cmp.current.record_count, 12);
        assert!(cmp.paid_variance.is_some());
    }

    #[test]
    fn red_tiers_share_one_badge() {
        let mut records = year_2024();
        records[0].tariff_flag = TariffFlag::with_kind(FlagKind::Red1, 0.04);
        records[1].tariff_flag = TariffFlag::with_kind(FlagKind::Red2, 0.07);
        records[2].tariff_flag = TariffFlag::with_kind(FlagKind::Yellow, 0.02);
        let vm = DashboardViewModel::build(DashboardFilter::for_year(2024), &records);
        assert_eq!(vm.red_flag_months, 2);
        assert_eq!(vm.flag_counts.yellow, 1);
    }
}
