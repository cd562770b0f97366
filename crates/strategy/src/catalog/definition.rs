use common::models::{Asset, Signal};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// What a scenario expects from one asset.
///
/// Catalog JSON writes a single signal as a string and a disjunction as an
/// array, e.g. `"down"` or `["up", "flat"]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Requirement {
    Exactly(Signal),
    AnyOf(Vec<Signal>),
}

impl Requirement {
    pub fn satisfies(&self, signal: Signal) -> bool {
        match self {
            Requirement::Exactly(required) => *required == signal,
            Requirement::AnyOf(acceptable) => acceptable.contains(&signal),
        }
    }

    /// Renders the acceptable signals joined by `separator` (`" or "`, `"/"`).
    pub fn describe(&self, separator: &str) -> String {
        match self {
            Requirement::Exactly(required) => required.to_string(),
            Requirement::AnyOf(acceptable) => acceptable
                .iter()
                .map(Signal::as_str)
                .collect::<Vec<_>>()
                .join(separator),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Requirement::AnyOf(acceptable) if acceptable.is_empty())
    }
}

impl From<Signal> for Requirement {
    fn from(signal: Signal) -> Self {
        Requirement::Exactly(signal)
    }
}

impl<const N: usize> From<[Signal; N]> for Requirement {
    fn from(signals: [Signal; N]) -> Self {
        Requirement::AnyOf(signals.to_vec())
    }
}

/// Asset constraints kept in declaration order.
///
/// Order matters: missing-signal descriptions and watch-for strings follow
/// it, so this serializes as a JSON object but never goes through a hash map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Constraints(Vec<(Asset, Requirement)>);

impl Constraints {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn with(mut self, asset: Asset, requirement: impl Into<Requirement>) -> Self {
        self.0.push((asset, requirement.into()));
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (Asset, &Requirement)> {
        self.0.iter().map(|(asset, requirement)| (*asset, requirement))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, asset: Asset) -> bool {
        self.0.iter().any(|(a, _)| *a == asset)
    }
}

impl FromIterator<(Asset, Requirement)> for Constraints {
    fn from_iter<T: IntoIterator<Item = (Asset, Requirement)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Serialize for Constraints {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (asset, requirement) in &self.0 {
            map.serialize_entry(asset, requirement)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Constraints {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ConstraintsVisitor;

        impl<'de> Visitor<'de> for ConstraintsVisitor {
            type Value = Constraints;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of asset to signal or list of signals")
            }

            fn visit_map<M: MapAccess<'de>>(self, mut access: M) -> Result<Self::Value, M::Error> {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(4));
                while let Some((asset, requirement)) = access.next_entry::<Asset, Requirement>()? {
                    entries.push((asset, requirement));
                }
                Ok(Constraints(entries))
            }
        }

        deserializer.deserialize_map(ConstraintsVisitor)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeKind {
    Buy,
    Sell,
    Hold,
    Avoid,
}

/// Per-asset trade suggestion shown alongside a match. Not scored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeGuidance {
    pub action: String,
    #[serde(rename = "type")]
    pub kind: TradeKind,
    pub details: String,
    pub risk: String,
}

/// A headed block of the long-form scenario write-up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplanationSection {
    pub heading: String,
    pub paragraphs: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioDefinition {
    pub id: u32,
    pub name: String,
    pub must_have: Constraints,
    #[serde(default)]
    pub confluence: Constraints,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub hold_time: String,
    #[serde(default)]
    pub risk_level: String,
    #[serde(default)]
    pub trades: BTreeMap<Asset, TradeGuidance>,
    #[serde(default)]
    pub key_points: Vec<String>,
    #[serde(default)]
    pub explanation: Vec<ExplanationSection>,
}

impl ScenarioDefinition {
    /// A definition with only the scored parts filled in.
    pub fn new(id: u32, name: impl Into<String>, must_have: Constraints, confluence: Constraints) -> Self {
        Self {
            id,
            name: name.into(),
            must_have,
            confluence,
            description: String::new(),
            hold_time: String::new(),
            risk_level: String::new(),
            trades: BTreeMap::new(),
            key_points: Vec::new(),
            explanation: Vec::new(),
        }
    }

    pub fn trade_for(&self, asset: Asset) -> Option<&TradeGuidance> {
        self.trades.get(&asset)
    }
}

/// Curated successors of a transitional scenario, most likely first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionRule {
    pub from: u32,
    pub candidates: Vec<u32>,
}
