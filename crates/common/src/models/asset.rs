use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::models::signal::SignalError;

/// The four tracked markets. Declaration order is the display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Asset {
    Btc,
    Gold,
    UsdJpy,
    EurUsd,
}

impl Asset {
    pub const ALL: [Asset; 4] = [Asset::Btc, Asset::Gold, Asset::UsdJpy, Asset::EurUsd];

    pub fn as_str(&self) -> &'static str {
        match self {
            Asset::Btc => "btc",
            Asset::Gold => "gold",
            Asset::UsdJpy => "usdjpy",
            Asset::EurUsd => "eurusd",
        }
    }

    /// Upper-case ticker used in missing-signal and watch-for strings.
    pub fn label(&self) -> &'static str {
        match self {
            Asset::Btc => "BTC",
            Asset::Gold => "GOLD",
            Asset::UsdJpy => "USDJPY",
            Asset::EurUsd => "EURUSD",
        }
    }

    /// Name shown on trade guidance cards.
    pub fn display_name(&self) -> &'static str {
        match self {
            Asset::Btc => "BTC",
            Asset::Gold => "Gold",
            Asset::UsdJpy => "USDJPY",
            Asset::EurUsd => "EURUSD",
        }
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Asset {
    type Err = SignalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "btc" => Ok(Asset::Btc),
            "gold" => Ok(Asset::Gold),
            "usdjpy" => Ok(Asset::UsdJpy),
            "eurusd" => Ok(Asset::EurUsd),
            _ => Err(SignalError::UnknownAsset(s.to_string())),
        }
    }
}
