use time::OffsetDateTime;

use super::{period::BillingPeriod, tariff_flag::TariffFlag};
use crate::error::StoreError;

/// Raw `energy_records` row, exactly as stored.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct EnergyRecordRow {
    pub id: String,
    pub year: i32,
    pub month: i32,
    pub consumption_kwh: f64,
    pub amount_billed: f64,
    pub amount_paid: f64,
    pub tariff_flag: Option<String>,
    pub unit_price_flag: Option<f64>,
    pub flag_amount_billed: Option<f64>,
    pub unit_price_energy: Option<f64>,
    pub unit_price_distribution: Option<f64>,
    pub levy_billed: Option<f64>,
    pub levy_collected: Option<f64>,
    pub levy_customer_count: Option<i64>,
    pub delinquency_rate: Option<f64>,
    pub notes: Option<String>,
    pub updated_at: Option<OffsetDateTime>,
}

/// Public-lighting levy (COSIP) figures for one month.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LevyFigures {
    pub billed: Option<f64>,
    pub collected: Option<f64>,
    pub customer_count: Option<i64>,
}

impl LevyFigures {
    /// Customer count, when it is a real (positive) reading.
    pub fn present_customer_count(&self) -> Option<i64> {
        self.customer_count.filter(|c| *c > 0)
    }

    /// Billed, collected and customer count are all present.
    pub fn is_complete(&self) -> bool {
        self.billed.is_some() && self.collected.is_some() && self.present_customer_count().is_some()
    }
}

/// Everything an administrator enters for a month; the create/update payload.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RecordDraft {
    pub period: BillingPeriod,
    pub consumption_kwh: f64,
    pub amount_billed: f64,
    pub amount_paid: f64,
    #[cfg_attr(feature = "serde", serde(default))]
    pub tariff_flag: TariffFlag,
    #[cfg_attr(feature = "serde", serde(default))]
    pub flag_amount_billed: Option<f64>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub unit_price_energy: Option<f64>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub unit_price_distribution: Option<f64>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub levy: LevyFigures,
    #[cfg_attr(feature = "serde", serde(default))]
    pub delinquency_rate: Option<f64>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub notes: Option<String>,
}

impl RecordDraft {
    pub fn into_record(self, id: String, updated_at: Option<OffsetDateTime>) -> MonthlyEnergyRecord {
        MonthlyEnergyRecord {
            id,
            period: self.period,
            consumption_kwh: self.consumption_kwh,
            amount_billed: self.amount_billed,
            amount_paid: self.amount_paid,
            tariff_flag: self.tariff_flag,
            flag_amount_billed: self.flag_amount_billed,
            unit_price_energy: self.unit_price_energy,
            unit_price_distribution: self.unit_price_distribution,
            levy: self.levy,
            delinquency_rate: self.delinquency_rate,
            notes: self.notes,
            updated_at,
        }
    }
}

/// One billing month for the public-lighting account.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MonthlyEnergyRecord {
    pub id: String,
    pub period: BillingPeriod,
    pub consumption_kwh: f64,
    pub amount_billed: f64,
    pub amount_paid: f64,
    pub tariff_flag: TariffFlag,
    pub flag_amount_billed: Option<f64>,
    pub unit_price_energy: Option<f64>,
    pub unit_price_distribution: Option<f64>,
    pub levy: LevyFigures,
    pub delinquency_rate: Option<f64>,
    pub notes: Option<String>,
    #[cfg_attr(feature = "serde", serde(default, with = "time::serde::rfc3339::option"))]
    pub updated_at: Option<OffsetDateTime>,
}

impl TryFrom<EnergyRecordRow> for MonthlyEnergyRecord {
    type Error = StoreError;

    fn try_from(row: EnergyRecordRow) -> Result<Self, Self::Error> {
        let month = u32::try_from(row.month)
            .ok()
            .filter(|m| (1..=12).contains(m))
            .ok_or_else(|| StoreError::Corrupt(format!("record {} has month {}", row.id, row.month)))?;

        let tariff_flag = TariffFlag::from_parts(row.tariff_flag.as_deref(), row.unit_price_flag)
            .map_err(|e| StoreError::Corrupt(format!("record {}: {e}", row.id)))?;

        Ok(MonthlyEnergyRecord {
            id: row.id,
            period: BillingPeriod::new(row.year, month),
            consumption_kwh: row.consumption_kwh,
            amount_billed: row.amount_billed,
            amount_paid: row.amount_paid,
            tariff_flag,
            flag_amount_billed: row.flag_amount_billed,
            unit_price_energy: row.unit_price_energy,
            unit_price_distribution: row.unit_price_distribution,
            levy: LevyFigures {
                billed: row.levy_billed,
                collected: row.levy_collected,
                customer_count: row.levy_customer_count,
            },
            delinquency_rate: row.delinquency_rate,
            notes: row.notes,
            updated_at: row.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FlagKind;

    fn row() -> EnergyRecordRow {
        EnergyRecordRow {
            id: "r-1".to_string(),
            year: 2024,
            month: 3,
            consumption_kwh: 1000.0,
            amount_billed: 520.0,
            amount_paid: 500.0,
            tariff_flag: Some("yellow".to_string()),
            unit_price_flag: Some(0.0189),
            flag_amount_billed: Some(18.9),
            unit_price_energy: None,
            unit_price_distribution: None,
            levy_billed: None,
            levy_collected: None,
            levy_customer_count: Some(0),
            delinquency_rate: None,
            notes: None,
            updated_at: None,
        }
    }

    #[test]
    fn row_converts_to_record() {
        let rec = MonthlyEnergyRecord::try_from(row()).unwrap();
        assert_eq!(rec.period, BillingPeriod::new(2024, 3));
        assert_eq!(rec.tariff_flag.kind(), FlagKind::Yellow);
        assert_eq!(rec.tariff_flag.extra_unit_price(), 0.0189);
        assert_eq!(rec.levy.present_customer_count(), None);
    }

    #[test]
    fn row_with_bad_month_is_corrupt() {
        let mut r = row();
        r.month = 13;
        assert!(matches!(MonthlyEnergyRecord::try_from(r), Err(StoreError::Corrupt(_))));
    }
}
