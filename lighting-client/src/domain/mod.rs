pub mod energy_record;
pub mod period;
pub mod tariff_flag;

pub use energy_record::{EnergyRecordRow, LevyFigures, MonthlyEnergyRecord, RecordDraft};
pub use period::{month_abbrev, month_name, BillingPeriod};
pub use tariff_flag::{ColoredTier, FlagKind, TariffFlag, UnknownFlag};
