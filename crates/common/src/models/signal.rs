use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::models::asset::Asset;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SignalError {
    #[error("Unknown signal '{0}': expected up, down or flat")]
    UnknownSignal(String),
    #[error("Unknown asset '{0}': expected btc, gold, usdjpy or eurusd")]
    UnknownAsset(String),
    #[error("Missing signal for {0}")]
    MissingAsset(Asset),
    #[error("Signal for {0} given more than once")]
    DuplicateAsset(Asset),
    #[error("Malformed pair '{0}': expected asset=signal")]
    MalformedPair(String),
}

/// Daily direction of one asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Signal {
    Up,
    Down,
    Flat,
}

impl Signal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Signal::Up => "up",
            Signal::Down => "down",
            Signal::Flat => "flat",
        }
    }

    pub fn arrow(&self) -> &'static str {
        match self {
            Signal::Up => "↑",
            Signal::Down => "↓",
            Signal::Flat => "→",
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Signal {
    type Err = SignalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "up" => Ok(Signal::Up),
            "down" => Ok(Signal::Down),
            "flat" => Ok(Signal::Flat),
            _ => Err(SignalError::UnknownSignal(s.to_string())),
        }
    }
}

/// One signal per asset. Totality is enforced by construction: every field is
/// required, so a partial vector can never reach the scorer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SignalVector {
    pub btc: Signal,
    pub gold: Signal,
    pub usdjpy: Signal,
    pub eurusd: Signal,
}

impl SignalVector {
    pub fn new(btc: Signal, gold: Signal, usdjpy: Signal, eurusd: Signal) -> Self {
        Self {
            btc,
            gold,
            usdjpy,
            eurusd,
        }
    }

    pub fn get(&self, asset: Asset) -> Signal {
        match asset {
            Asset::Btc => self.btc,
            Asset::Gold => self.gold,
            Asset::UsdJpy => self.usdjpy,
            Asset::EurUsd => self.eurusd,
        }
    }

    /// Builds a vector from loose pairs, rejecting duplicates and any asset
    /// left unset.
    pub fn try_from_pairs<I>(pairs: I) -> Result<Self, SignalError>
    where
        I: IntoIterator<Item = (Asset, Signal)>,
    {
        let mut slots: [Option<Signal>; 4] = [None; 4];
        for (asset, signal) in pairs {
            let slot = &mut slots[asset as usize];
            if slot.is_some() {
                return Err(SignalError::DuplicateAsset(asset));
            }
            *slot = Some(signal);
        }

        let pick = |asset: Asset| slots[asset as usize].ok_or(SignalError::MissingAsset(asset));
        Ok(Self {
            btc: pick(Asset::Btc)?,
            gold: pick(Asset::Gold)?,
            usdjpy: pick(Asset::UsdJpy)?,
            eurusd: pick(Asset::EurUsd)?,
        })
    }

    /// Assets whose signal differs between `self` and `other`, in display order.
    pub fn changed_assets(&self, other: &SignalVector) -> Vec<Asset> {
        Asset::ALL
            .into_iter()
            .filter(|&asset| self.get(asset) != other.get(asset))
            .collect()
    }
}

/// Parses `asset=signal`, e.g. `btc=down`.
pub fn parse_pair(raw: &str) -> Result<(Asset, Signal), SignalError> {
    let (asset, signal) = raw
        .split_once('=')
        .ok_or_else(|| SignalError::MalformedPair(raw.to_string()))?;
    Ok((asset.parse()?, signal.parse()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_rejects_unknown_text() {
        assert_eq!("UP".parse::<Signal>().unwrap(), Signal::Up);
        assert!(matches!(
            "sideways".parse::<Signal>(),
            Err(SignalError::UnknownSignal(_))
        ));
    }

    #[test]
    fn test_vector_from_complete_pairs() {
        let vector = SignalVector::try_from_pairs([
            (Asset::EurUsd, Signal::Down),
            (Asset::Btc, Signal::Up),
            (Asset::UsdJpy, Signal::Flat),
            (Asset::Gold, Signal::Down),
        ])
        .unwrap();

        assert_eq!(
            vector,
            SignalVector::new(Signal::Up, Signal::Down, Signal::Flat, Signal::Down)
        );
        assert_eq!(vector.get(Asset::UsdJpy), Signal::Flat);
    }

    #[test]
    fn test_partial_vector_rejected() {
        let err = SignalVector::try_from_pairs([
            (Asset::Btc, Signal::Up),
            (Asset::Gold, Signal::Up),
            (Asset::EurUsd, Signal::Up),
        ])
        .unwrap_err();

        assert_eq!(err, SignalError::MissingAsset(Asset::UsdJpy));
    }

    #[test]
    fn test_duplicate_asset_rejected() {
        let err = SignalVector::try_from_pairs([
            (Asset::Btc, Signal::Up),
            (Asset::Btc, Signal::Down),
        ])
        .unwrap_err();

        assert_eq!(err, SignalError::DuplicateAsset(Asset::Btc));
    }

    #[test]
    fn test_deserialize_requires_every_asset() {
        let partial = r#"{"btc":"up","gold":"down","usdjpy":"flat"}"#;
        assert!(serde_json::from_str::<SignalVector>(partial).is_err());

        let invalid = r#"{"btc":"up","gold":"down","usdjpy":"flat","eurusd":"sideways"}"#;
        assert!(serde_json::from_str::<SignalVector>(invalid).is_err());
    }

    #[test]
    fn test_parse_pair() {
        assert_eq!(parse_pair("gold=flat").unwrap(), (Asset::Gold, Signal::Flat));
        assert!(matches!(parse_pair("gold"), Err(SignalError::MalformedPair(_))));
        assert!(matches!(parse_pair("oil=up"), Err(SignalError::UnknownAsset(_))));
    }

    #[test]
    fn test_changed_assets_in_display_order() {
        let yesterday = SignalVector::new(Signal::Up, Signal::Up, Signal::Up, Signal::Up);
        let today = SignalVector::new(Signal::Up, Signal::Down, Signal::Up, Signal::Flat);

        assert_eq!(
            today.changed_assets(&yesterday),
            vec![Asset::Gold, Asset::EurUsd]
        );
    }
}
