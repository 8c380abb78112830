use std::{fmt, str::FromStr};

/// The four regulator tariff-flag buckets, as stored and filtered on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum FlagKind {
    Green,
    Yellow,
    #[cfg_attr(feature = "serde", serde(rename = "red_1"))]
    Red1,
    #[cfg_attr(feature = "serde", serde(rename = "red_2"))]
    Red2,
}

impl FlagKind {
    pub const ALL: [FlagKind; 4] = [FlagKind::Green, FlagKind::Yellow, FlagKind::Red1, FlagKind::Red2];

    /// Storage code.
    pub fn code(self) -> &'static str {
        match self {
            FlagKind::Green => "green",
            FlagKind::Yellow => "yellow",
            FlagKind::Red1 => "red_1",
            FlagKind::Red2 => "red_2",
        }
    }

    /// Display name ("Verde", "Amarela", "Vermelha 1", "Vermelha 2").
    pub fn display_name(self) -> &'static str {
        match self {
            FlagKind::Green => "Verde",
            FlagKind::Yellow => "Amarela",
            FlagKind::Red1 => "Vermelha 1",
            FlagKind::Red2 => "Vermelha 2",
        }
    }

    pub fn is_colored(self) -> bool {
        self != FlagKind::Green
    }
}

impl fmt::Display for FlagKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown tariff flag code '{0}'")]
pub struct UnknownFlag(pub String);

impl FromStr for FlagKind {
    type Err = UnknownFlag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "green" => Ok(FlagKind::Green),
            "yellow" => Ok(FlagKind::Yellow),
            "red_1" => Ok(FlagKind::Red1),
            "red_2" => Ok(FlagKind::Red2),
            other => Err(UnknownFlag(other.to_string())),
        }
    }
}

/// Surcharge tiers. Green carries no surcharge and so is not a tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ColoredTier {
    Yellow,
    #[cfg_attr(feature = "serde", serde(rename = "red_1"))]
    Red1,
    #[cfg_attr(feature = "serde", serde(rename = "red_2"))]
    Red2,
}

impl From<ColoredTier> for FlagKind {
    fn from(tier: ColoredTier) -> Self {
        match tier {
            ColoredTier::Yellow => FlagKind::Yellow,
            ColoredTier::Red1 => FlagKind::Red1,
            ColoredTier::Red2 => FlagKind::Red2,
        }
    }
}

/// Tariff flag for a billing month.
///
/// The per-kWh surcharge only exists on colored months, so a green month can
/// never carry one.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum TariffFlag {
    #[default]
    Green,
    Colored { tier: ColoredTier, extra_unit_price: f64 },
}

impl TariffFlag {
    /// Build from the nullable storage columns. A missing code means green;
    /// any price stored against a green month is discarded.
    pub fn from_parts(code: Option<&str>, unit_price: Option<f64>) -> Result<Self, UnknownFlag> {
        let kind = match code {
            None => FlagKind::Green,
            Some(c) if c.trim().is_empty() => FlagKind::Green,
            Some(c) => c.parse()?,
        };
        Ok(Self::with_kind(kind, unit_price.unwrap_or(0.0)))
    }

    pub fn with_kind(kind: FlagKind, extra_unit_price: f64) -> Self {
        let tier = match kind {
            FlagKind::Green => return TariffFlag::Green,
            FlagKind::Yellow => ColoredTier::Yellow,
            FlagKind::Red1 => ColoredTier::Red1,
            FlagKind::Red2 => ColoredTier::Red2,
        };
        TariffFlag::Colored { tier, extra_unit_price }
    }

    pub fn kind(&self) -> FlagKind {
        match self {
            TariffFlag::Green => FlagKind::Green,
            TariffFlag::Colored { tier, .. } => (*tier).into(),
        }
    }

    pub fn is_colored(&self) -> bool {
        matches!(self, TariffFlag::Colored { .. })
    }

    /// Extra cost per kWh; always zero for green.
    pub fn extra_unit_price(&self) -> f64 {
        match self {
            TariffFlag::Green => 0.0,
            TariffFlag::Colored { extra_unit_price, .. } => *extra_unit_price,
        }
    }

    /// Nullable price column value for storage.
    pub fn stored_unit_price(&self) -> Option<f64> {
        match self {
            TariffFlag::Green => None,
            TariffFlag::Colored { extra_unit_price, .. } => Some(*extra_unit_price),
        }
    }
}
