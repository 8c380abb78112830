use lighting_client::domain::{BillingPeriod, MonthlyEnergyRecord};
use serde::{Deserialize, Serialize};

use super::{chronological, cost_per_kwh, mean};

/// Records on each side of the consumption trend comparison.
const TREND_WINDOW: usize = 3;

/// Percentage change of the per-kWh tariff components between the first and
/// last month of the period.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct TariffEvolution {
    pub distribution_pct: f64,
    pub energy_pct: f64,
}

fn endpoint_change(first: Option<f64>, last: Option<f64>) -> f64 {
    match (first, last) {
        (Some(f), Some(l)) if f != 0.0 && l != 0.0 => (l - f) / f * 100.0,
        _ => 0.0,
    }
}

pub fn tariff_evolution(records: &[MonthlyEnergyRecord]) -> TariffEvolution {
    let sorted = chronological(records);
    let (Some(first), Some(last)) = (sorted.first(), sorted.last()) else {
        return TariffEvolution::default();
    };

    TariffEvolution {
        distribution_pct: endpoint_change(first.unit_price_distribution, last.unit_price_distribution),
        energy_pct: endpoint_change(first.unit_price_energy, last.unit_price_energy),
    }
}

/// Highest and lowest consumption months with their positions in the input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extremes<'a> {
    pub max: &'a MonthlyEnergyRecord,
    pub max_index: usize,
    pub min: &'a MonthlyEnergyRecord,
    pub min_index: usize,
}

/// Ties go to the record met first.
pub fn extremes(records: &[MonthlyEnergyRecord]) -> Option<Extremes<'_>> {
    let first = records.first()?;
    let mut out = Extremes {
        max: first,
        max_index: 0,
        min: first,
        min_index: 0,
    };

    for (i, r) in records.iter().enumerate().skip(1) {
        if r.consumption_kwh > out.max.consumption_kwh {
            out.max = r;
            out.max_index = i;
        }
        if r.consumption_kwh < out.min.consumption_kwh {
            out.min = r;
            out.min_index = i;
        }
    }
    Some(out)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Rising,
    Falling,
    /// Fewer than three months to compare.
    NotApplicable,
}

impl Trend {
    pub fn label(self) -> &'static str {
        match self {
            Trend::Rising => "Subindo",
            Trend::Falling => "Caindo",
            Trend::NotApplicable => "Sem dados suficientes",
        }
    }
}

/// Mean consumption of the last three months against the first three.
pub fn trend(records: &[MonthlyEnergyRecord]) -> Trend {
    let sorted = chronological(records);
    if sorted.len() < TREND_WINDOW {
        return Trend::NotApplicable;
    }

    let early = mean(sorted[..TREND_WINDOW].iter().map(|r| r.consumption_kwh));
    let late = mean(sorted[sorted.len() - TREND_WINDOW..].iter().map(|r| r.consumption_kwh));

    if late < early {
        Trend::Falling
    } else {
        Trend::Rising
    }
}

/// Naive persistence forecast: mean consumption of the last three months
/// (or of however many exist).
pub fn next_month_projection(records: &[MonthlyEnergyRecord]) -> f64 {
    let sorted = chronological(records);
    let start = sorted.len().saturating_sub(TREND_WINDOW);
    mean(sorted[start..].iter().map(|r| r.consumption_kwh))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankDirection {
    /// Cheapest first.
    Asc,
    /// Most expensive first.
    Desc,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedMonth {
    pub id: String,
    pub period: BillingPeriod,
    pub label: String,
    pub cost_per_kwh: f64,
}

/// Top `n` months by cost per kWh. Months without consumption have no cost
/// per kWh and are left out. The sort is stable, so ties keep input order in
/// both directions.
pub fn rank_by_cost_per_kwh(records: &[MonthlyEnergyRecord], n: usize, direction: RankDirection) -> Vec<RankedMonth> {
    let mut ranked: Vec<(f64, &MonthlyEnergyRecord)> = records
        .iter()
        .filter(|r| r.consumption_kwh > 0.0)
        .map(|r| (cost_per_kwh(r), r))
        .collect();

    match direction {
        RankDirection::Asc => ranked.sort_by(|a, b| a.0.total_cmp(&b.0)),
        RankDirection::Desc => ranked.sort_by(|a, b| b.0.total_cmp(&a.0)),
    }

    ranked
        .into_iter()
        .take(n)
        .map(|(cost, r)| RankedMonth {
            id: r.id.clone(),
            period: r.period,
            label: r.period.short_label(),
            cost_per_kwh: cost,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::fixtures::{record, year_2024};

    #[test]
    fn extremes_pick_first_max_and_min() {
        let records = vec![
            record(2024, 1, 10.0, 1.0),
            record(2024, 2, 50.0, 1.0),
            record(2024, 3, 30.0, 1.0),
        ];
        let e = extremes(&records).unwrap();
        assert_eq!(e.max_index, 1);
        assert_eq!(e.min_index, 0);
    }

    #[test]
    fn extremes_ties_keep_first() {
        let records = vec![record(2024, 1, 10.0, 1.0), record(2024, 2, 10.0, 1.0)];
        let e = extremes(&records).unwrap();
        assert_eq!((e.max_index, e.min_index), (0, 0));
        assert!(extremes(&[]).is_none());
    }

    #[test]
    fn trend_needs_three_months() {
        let records = vec![record(2024, 1, 10.0, 1.0), record(2024, 2, 5.0, 1.0)];
        assert_eq!(trend(&records), Trend::NotApplicable);
        assert_eq!(trend(&[]), Trend::NotApplicable);
    }

    #[test]
    fn trend_compares_first_and_last_three() {
        let falling: Vec<_> = (1..=6).map(|m| record(2024, m, 100.0 - m as f64, 1.0)).collect();
        assert_eq!(trend(&falling), Trend::Falling);
        assert_eq!(trend(&year_2024()), Trend::Rising);
    }

    #[test]
    fn flat_consumption_reads_as_rising() {
        let flat: Vec<_> = (1..=4).map(|m| record(2024, m, 100.0, 1.0)).collect();
        assert_eq!(trend(&flat), Trend::Rising);
    }

    #[test]
    fn projection_averages_last_three_chronologically() {
        let records = vec![
            record(2024, 4, 400.0, 1.0),
            record(2024, 1, 100.0, 1.0),
            record(2024, 3, 300.0, 1.0),
            record(2024, 2, 200.0, 1.0),
        ];
        assert_eq!(next_month_projection(&records), 300.0);
        assert_eq!(next_month_projection(&[]), 0.0);
    }

    #[test]
    fn tariff_evolution_between_endpoints() {
        let mut a = record(2024, 1, 1.0, 1.0);
        a.unit_price_distribution = Some(0.40);
        a.unit_price_energy = Some(0.30);
        let b = record(2024, 2, 1.0, 1.0);
        let mut c = record(2024, 3, 1.0, 1.0);
        c.unit_price_distribution = Some(0.50);
        c.unit_price_energy = None;

        let evo = tariff_evolution(&[c, b, a]);
        assert!((evo.distribution_pct - 25.0).abs() < 1e-9);
        assert_eq!(evo.energy_pct, 0.0);
    }

    #[test]
    fn tariff_evolution_with_zero_start_is_zero() {
        let mut a = record(2024, 1, 1.0, 1.0);
        a.unit_price_energy = Some(0.0);
        let mut b = record(2024, 2, 1.0, 1.0);
        b.unit_price_energy = Some(0.5);
        assert_eq!(tariff_evolution(&[a, b]).energy_pct, 0.0);
        assert_eq!(tariff_evolution(&[]), TariffEvolution::default());
    }

    #[test]
    fn ranking_returns_at_most_n_in_order() {
        let records = year_2024();
        let cheapest = rank_by_cost_per_kwh(&records, 3, RankDirection::Asc);
        assert_eq!(cheapest.len(), 3);
        assert!(cheapest.windows(2).all(|w| w[0].cost_per_kwh <= w[1].cost_per_kwh));
        assert_eq!(cheapest[0].period, BillingPeriod::new(2024, 1));

        let few = rank_by_cost_per_kwh(&records[..2], 3, RankDirection::Asc);
        assert_eq!(few.len(), 2);
    }

    #[test]
    fn descending_ranking_reverses_ascending() {
        let records = vec![
            record(2024, 1, 100.0, 50.0),
            record(2024, 2, 100.0, 70.0),
            record(2024, 3, 100.0, 60.0),
        ];
        let asc: Vec<String> = rank_by_cost_per_kwh(&records, 3, RankDirection::Asc)
            .into_iter()
            .map(|r| r.id)
            .collect();
        let mut desc: Vec<String> = rank_by_cost_per_kwh(&records, 3, RankDirection::Desc)
            .into_iter()
            .map(|r| r.id)
            .collect();
        desc.reverse();
        assert_eq!(asc, desc);
    }

    #[test]
    fn ranking_ties_keep_input_order() {
        let records = vec![record(2024, 2, 100.0, 50.0), record(2024, 1, 100.0, 50.0)];
        let asc = rank_by_cost_per_kwh(&records, 2, RankDirection::Asc);
        let desc = rank_by_cost_per_kwh(&records, 2, RankDirection::Desc);
        assert_eq!(asc[0].id, "2024-02");
        assert_eq!(desc[0].id, "2024-02");
    }

    #[test]
    fn months_without_consumption_are_not_ranked() {
        let records = vec![
            record(2024, 1, 1000.0, 500.0),
            record(2024, 2, 0.0, 900.0),
            record(2024, 3, 1000.0, 600.0),
        ];
        let asc: Vec<String> = rank_by_cost_per_kwh(&records, 3, RankDirection::Asc)
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(asc, vec!["2024-01", "2024-03"]);

        let desc = rank_by_cost_per_kwh(&records, 3, RankDirection::Desc);
        assert_eq!(desc.len(), 2);
        assert_eq!(desc[0].id, "2024-03");
    }
}
