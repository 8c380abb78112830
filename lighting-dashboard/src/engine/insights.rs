//! Executive-summary insights: short, ranked observations about the period.

use lighting_client::domain::MonthlyEnergyRecord;
use serde::Serialize;

use super::{chronological, colored_months, cost_per_kwh, flag_extra_cost, mean, period_over_period_variance, summary};
use crate::format;

const MAX_INSIGHTS: usize = 4;
const TREND_WINDOW: usize = 3;
/// Long-term spending trends are only called with at least this many months.
const MIN_MONTHS_FOR_TREND: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightKind {
    Positive,
    Negative,
    Neutral,
    Alert,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Insight {
    pub kind: InsightKind,
    pub title: String,
    pub description: String,
    pub value: Option<String>,
}

impl Insight {
    fn new(kind: InsightKind, title: &str, description: String) -> Self {
        Self {
            kind,
            title: title.to_string(),
            description,
            value: None,
        }
    }

    fn with_value(mut self, value: String) -> Self {
        self.value = Some(value);
        self
    }
}

/// Up to four insights in priority order; empty with fewer than two months.
pub fn insights(records: &[MonthlyEnergyRecord]) -> Vec<Insight> {
    let sorted = chronological(records);
    let n = sorted.len();
    if n < 2 {
        return Vec::new();
    }

    let last = sorted[n - 1];
    let prev = sorted[n - 2];
    let mut out = Vec::new();

    let paid_var = period_over_period_variance(last.amount_paid, Some(prev.amount_paid));
    let consumption_var = period_over_period_variance(last.consumption_kwh, Some(prev.consumption_kwh));

    match paid_var {
        Some(v) if v < -5.0 => out.push(
            Insight::new(
                InsightKind::Positive,
                "Redução nos gastos",
                format!("O gasto caiu {} em relação ao mês anterior", format::percent(v.abs(), 1)),
            )
            .with_value(format::currency_whole(prev.amount_paid - last.amount_paid)),
        ),
        Some(v) if v > 10.0 => out.push(
            Insight::new(
                InsightKind::Alert,
                "Aumento significativo",
                format!("O gasto subiu {} em relação ao mês anterior", format::percent(v, 1)),
            )
            .with_value(format!("+{}", format::currency_whole(last.amount_paid - prev.amount_paid))),
        ),
        _ => {}
    }

    if n >= MIN_MONTHS_FOR_TREND {
        let early = mean(sorted[..TREND_WINDOW].iter().map(|r| r.amount_paid));
        let late = mean(sorted[n - TREND_WINDOW..].iter().map(|r| r.amount_paid));
        match period_over_period_variance(late, Some(early)) {
            Some(t) if t < -5.0 => out.push(Insight::new(
                InsightKind::Positive,
                "Tendência de queda",
                format!("Os gastos estão em tendência de queda de {} no período", format::percent(t.abs(), 1)),
            )),
            Some(t) if t > 10.0 => out.push(Insight::new(
                InsightKind::Negative,
                "Tendência de alta",
                format!("Os gastos apresentam tendência de alta de {} no período", format::percent(t, 1)),
            )),
            _ => {}
        }
    }

    let extra = flag_extra_cost(records);
    let colored = colored_months(records);
    if extra > 0.0 {
        out.push(
            Insight::new(
                InsightKind::Alert,
                "Impacto das bandeiras",
                format!("{} meses com bandeira colorida geraram custo adicional", colored.count),
            )
            .with_value(format::currency_whole(extra)),
        );
    } else if colored.count == 0 && n >= TREND_WINDOW {
        out.push(Insight::new(
            InsightKind::Positive,
            "Bandeira verde",
            "Todo o período operou com bandeira verde, sem custos adicionais".to_string(),
        ));
    }

    if let (Some(c), Some(p)) = (consumption_var, paid_var) {
        if c < -3.0 && p < 0.0 {
            out.push(Insight::new(
                InsightKind::Positive,
                "Maior eficiência",
                "O consumo reduziu acompanhando a queda nos gastos".to_string(),
            ));
        } else if c > 5.0 && p < 0.0 {
            out.push(Insight::new(
                InsightKind::Neutral,
                "Tarifa mais baixa",
                "Consumo aumentou mas gastos caíram devido a tarifas menores".to_string(),
            ));
        }
    }

    let average = summary(records).average_cost_per_kwh;
    let current = cost_per_kwh(last);
    if average > 0.0 && last.consumption_kwh > 0.0 {
        if current < average * 0.9 {
            out.push(Insight::new(
                InsightKind::Positive,
                "Custo abaixo da média",
                format!(
                    "O custo por kWh está {} abaixo da média histórica",
                    format::percent((1.0 - current / average) * 100.0, 0)
                ),
            ));
        } else if current > average * 1.1 {
            out.push(Insight::new(
                InsightKind::Negative,
                "Custo acima da média",
                format!(
                    "O custo por kWh está {} acima da média histórica",
                    format::percent((current / average - 1.0) * 100.0, 0)
                ),
            ));
        }
    }

    out.truncate(MAX_INSIGHTS);
    out
}
