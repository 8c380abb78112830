//! Dashboard selection: year, month range and tariff-flag filters.

use lighting_client::domain::{BillingPeriod, FlagKind, MonthlyEnergyRecord, UnknownFlag};
use serde::{Deserialize, Serialize};

pub const ALL_DATA_LABEL: &str = "Todos os dados";

#[derive(Debug, thiserror::Error)]
pub enum FilterError {
    #[error("mês inválido: {0}")]
    InvalidMonth(u32),
    #[error("período inválido: {start} é posterior a {end}")]
    InvertedRange { start: BillingPeriod, end: BillingPeriod },
    #[error("informe o ano inicial do período")]
    MissingStartYear,
    #[error("bandeira desconhecida: {0}")]
    UnknownFlag(#[from] UnknownFlag),
}

/// Raw query parameters, as sent by the dashboard.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DashboardQuery {
    pub year: Option<i32>,
    pub start_month: Option<u32>,
    pub start_year: Option<i32>,
    pub end_month: Option<u32>,
    pub end_year: Option<i32>,
    pub flag: Option<String>,
    pub compare_start_month: Option<u32>,
    pub compare_start_year: Option<i32>,
    pub compare_end_month: Option<u32>,
    pub compare_end_year: Option<i32>,
}

/// Inclusive span of billing months.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PeriodRange {
    pub start: BillingPeriod,
    pub end: BillingPeriod,
}

impl PeriodRange {
    pub fn new(start: BillingPeriod, end: BillingPeriod) -> Result<Self, FilterError> {
        for p in [start, end] {
            if !p.is_valid_month() {
                return Err(FilterError::InvalidMonth(p.month));
            }
        }
        if start > end {
            return Err(FilterError::InvertedRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// Fill in missing bounds. The start month defaults to January; the end
    /// year to the start year; the end month to the start month when only a
    /// start month/year pair was given, December otherwise.
    fn resolve(
        start_year: Option<i32>,
        start_month: Option<u32>,
        end_year: Option<i32>,
        end_month: Option<u32>,
        fallback_year: Option<i32>,
    ) -> Result<Option<Self>, FilterError> {
        if start_year.is_none() && start_month.is_none() && end_year.is_none() && end_month.is_none() {
            return Ok(None);
        }
        let start_year = start_year.or(fallback_year).ok_or(FilterError::MissingStartYear)?;
        let start = BillingPeriod::new(start_year, start_month.unwrap_or(1));

        let end_month = match (end_month, end_year, start_month) {
            (Some(m), _, _) => m,
            (None, None, Some(m)) => m,
            _ => 12,
        };
        let end = BillingPeriod::new(end_year.unwrap_or(start_year), end_month);

        Self::new(start, end).map(Some)
    }

    pub fn contains(&self, period: BillingPeriod) -> bool {
        self.start <= period && period <= self.end
    }

    /// "Jan/2024 - Mar/2024", or a single month label.
    pub fn label(&self) -> String {
        if self.start == self.end {
            self.start.short_label()
        } else {
            format!("{} - {}", self.start.short_label(), self.end.short_label())
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct DashboardFilter {
    pub year: Option<i32>,
    /// Supersedes `year` when present.
    pub range: Option<PeriodRange>,
    pub flag: Option<FlagKind>,
    pub compare: Option<PeriodRange>,
}

impl TryFrom<DashboardQuery> for DashboardFilter {
    type Error = FilterError;

    fn try_from(q: DashboardQuery) -> Result<Self, Self::Error> {
        let range = PeriodRange::resolve(q.start_year, q.start_month, q.end_year, q.end_month, q.year)?;
        let compare = PeriodRange::resolve(
            q.compare_start_year,
            q.compare_start_month,
            q.compare_end_year,
            q.compare_end_month,
            None,
        )?;

        let flag = match q.flag.as_deref().map(str::trim) {
            None | Some("") | Some("all") => None,
            Some(code) => Some(code.parse::<FlagKind>()?),
        };

        Ok(Self {
            year: q.year,
            range,
            flag,
            compare,
        })
    }
}

impl DashboardFilter {
    pub fn for_year(year: i32) -> Self {
        Self {
            year: Some(year),
            ..Self::default()
        }
    }

    /// Year the store can narrow the fetch to; `None` means every record is needed.
    pub fn store_year(&self) -> Option<i32> {
        match (self.range, self.compare) {
            (None, None) => self.year,
            _ => None,
        }
    }

    fn flag_matches(&self, record: &MonthlyEnergyRecord) -> bool {
        self.flag.map_or(true, |f| record.tariff_flag.kind() == f)
    }

    pub fn matches(&self, record: &MonthlyEnergyRecord) -> bool {
        let in_period = match (self.range, self.year) {
            (Some(range), _) => range.contains(record.period),
            (None, Some(year)) => record.period.year == year,
            (None, None) => true,
        };
        in_period && self.flag_matches(record)
    }

    /// Selected records, in input order.
    pub fn apply(&self, records: &[MonthlyEnergyRecord]) -> Vec<MonthlyEnergyRecord> {
        records.iter().filter(|r| self.matches(r)).cloned().collect()
    }

    /// Comparison collection, taken from the full record set.
    pub fn comparison(&self, records: &[MonthlyEnergyRecord]) -> Option<Vec<MonthlyEnergyRecord>> {
        let range = self.compare?;
        Some(
            records
                .iter()
                .filter(|r| range.contains(r.period) && self.flag_matches(r))
                .cloned()
                .collect(),
        )
    }

    pub fn label(&self) -> String {
        let mut label = match (self.range, self.year) {
            (Some(range), _) => range.label(),
            (None, Some(year)) => year.to_string(),
            (None, None) => ALL_DATA_LABEL.to_string(),
        };
        if let Some(flag) = self.flag {
            label.push_str(" • Bandeira ");
            label.push_str(flag.display_name());
        }
        label
    }

    /// File-name friendly form of the label: `2024`, `2024-01-a-2024-03`, `todos-os-dados`.
    pub fn slug(&self) -> String {
        let mut slug = match (self.range, self.year) {
            (Some(range), _) => format!("{}-a-{}", range.start, range.end),
            (None, Some(year)) => year.to_string(),
            (None, None) => "todos-os-dados".to_string(),
        };
        if let Some(flag) = self.flag {
            slug.push('-');
            slug.push_str(&flag.code().replace('_', "-"));
        }
        slug
    }
}
