use std::fmt;

const MONTH_NAMES: [&str; 12] = [
    "Janeiro",
    "Fevereiro",
    "Março",
    "Abril",
    "Maio",
    "Junho",
    "Julho",
    "Agosto",
    "Setembro",
    "Outubro",
    "Novembro",
    "Dezembro",
];

/// Full pt-BR month name, or an empty string outside 1..=12.
pub fn month_name(month: u32) -> &'static str {
    match month {
        1..=12 => MONTH_NAMES[(month - 1) as usize],
        _ => "",
    }
}

/// First three characters of the month name ("Jan", "Fev", "Mar", ...).
pub fn month_abbrev(month: u32) -> String {
    month_name(month).chars().take(3).collect()
}

/// A billing month. Ordering is chronological: by year, then month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BillingPeriod {
    pub year: i32,
    pub month: u32,
}

impl BillingPeriod {
    pub const fn new(year: i32, month: u32) -> Self {
        Self { year, month }
    }

    pub fn is_valid_month(&self) -> bool {
        (1..=12).contains(&self.month)
    }

    /// "Janeiro/2024"
    pub fn long_label(&self) -> String {
        format!("{}/{}", month_name(self.month), self.year)
    }

    /// "Jan/2024"
    pub fn short_label(&self) -> String {
        format!("{}/{}", month_abbrev(self.month), self.year)
    }

    /// "Jan/24", used on chart axes.
    pub fn axis_label(&self) -> String {
        format!("{}/{:02}", month_abbrev(self.month), self.year.rem_euclid(100))
    }
}

impl fmt::Display for BillingPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:02}", self.year, self.month)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn periods_order_by_year_then_month() {
        let mut periods = vec![
            BillingPeriod::new(2024, 2),
            BillingPeriod::new(2023, 12),
            BillingPeriod::new(2024, 1),
        ];
        periods.sort();
        assert_eq!(
            periods,
            vec![
                BillingPeriod::new(2023, 12),
                BillingPeriod::new(2024, 1),
                BillingPeriod::new(2024, 2),
            ]
        );
    }

    #[test]
    fn labels_use_portuguese_month_names() {
        let p = BillingPeriod::new(2024, 3);
        assert_eq!(p.long_label(), "Março/2024");
        assert_eq!(p.short_label(), "Mar/2024");
        assert_eq!(p.axis_label(), "Mar/24");
        assert_eq!(month_name(13), "");
    }
}
