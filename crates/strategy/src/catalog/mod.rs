use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use common::models::Asset;

pub mod definition;

pub use definition::{
    Constraints, ExplanationSection, Requirement, ScenarioDefinition, TradeGuidance, TradeKind,
    TransitionRule,
};

/// A transitional scenario lists at most this many likely successors.
pub const MAX_TRANSITION_CANDIDATES: usize = 3;

const BUILTIN_CATALOG: &str = include_str!("../../data/scenarios.json");

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Scenario {0} not found")]
    NotFound(u32),
    #[error("Catalog has no scenarios")]
    EmptyCatalog,
    #[error("Scenario ids must be positive")]
    InvalidId,
    #[error("Scenario id {0} defined more than once")]
    DuplicateId(u32),
    #[error("Scenario {id}: empty signal set for {asset}")]
    EmptyRequirement { id: u32, asset: Asset },
    #[error("Scenario {id}: {asset} constrained more than once in the same list")]
    DuplicateConstraint { id: u32, asset: Asset },
    #[error("Scenario {id}: {asset} appears in both mustHave and confluence")]
    OverlappingConstraint { id: u32, asset: Asset },
    #[error("Scenario {0} has no constraints, so it can never score")]
    DegenerateScenario(u32),
    #[error("Transition source {0} is not a known scenario")]
    UnknownTransitionSource(u32),
    #[error("Transition rule for scenario {0} defined more than once")]
    DuplicateTransitionSource(u32),
    #[error("Transition from {from} names unknown scenario {target}")]
    UnknownTransitionTarget { from: u32, target: u32 },
    #[error("Transition from {from} lists {count} candidates, at most 3 allowed")]
    TooManyCandidates { from: u32, count: usize },
    #[error("Failed to parse catalog: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Failed to read catalog {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    scenarios: Vec<ScenarioDefinition>,
    #[serde(default)]
    transitions: Vec<TransitionRule>,
}

/// Validated, read-only set of scenarios ordered by ascending id.
///
/// Never mutated after construction. To reload, build a new catalog and swap
/// the `Arc` holding it; match results keep their own `Arc`s to definitions.
#[derive(Debug)]
pub struct ScenarioCatalog {
    scenarios: Vec<Arc<ScenarioDefinition>>,
    transitions: BTreeMap<u32, Vec<u32>>,
}

impl ScenarioCatalog {
    pub fn new(
        mut scenarios: Vec<ScenarioDefinition>,
        rules: Vec<TransitionRule>,
    ) -> Result<Self, CatalogError> {
        if scenarios.is_empty() {
            return Err(CatalogError::EmptyCatalog);
        }

        scenarios.sort_by_key(|scenario| scenario.id);

        let mut seen = BTreeSet::new();
        for scenario in &scenarios {
            if scenario.id == 0 {
                return Err(CatalogError::InvalidId);
            }
            if !seen.insert(scenario.id) {
                return Err(CatalogError::DuplicateId(scenario.id));
            }
            validate_scenario(scenario)?;
        }

        let mut transitions = BTreeMap::new();
        for rule in rules {
            if !seen.contains(&rule.from) {
                return Err(CatalogError::UnknownTransitionSource(rule.from));
            }
            if rule.candidates.len() > MAX_TRANSITION_CANDIDATES {
                return Err(CatalogError::TooManyCandidates {
                    from: rule.from,
                    count: rule.candidates.len(),
                });
            }
            if let Some(&target) = rule.candidates.iter().find(|id| !seen.contains(*id)) {
                return Err(CatalogError::UnknownTransitionTarget {
                    from: rule.from,
                    target,
                });
            }
            if transitions.insert(rule.from, rule.candidates).is_some() {
                return Err(CatalogError::DuplicateTransitionSource(rule.from));
            }
        }

        Ok(Self {
            scenarios: scenarios.into_iter().map(Arc::new).collect(),
            transitions,
        })
    }

    /// The twelve capital-flow scenarios shipped with the crate.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_json(BUILTIN_CATALOG)
    }

    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_json::from_str(json)?;
        Self::new(file.scenarios, file.transitions)
    }

    pub fn from_path(path: &Path) -> Result<Self, CatalogError> {
        let json = fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let catalog = Self::from_json(&json)?;
        info!(
            "Loaded catalog from {:?}: {} scenarios, {} transitional",
            path,
            catalog.len(),
            catalog.transitions.len()
        );
        Ok(catalog)
    }

    pub fn all(&self) -> &[Arc<ScenarioDefinition>] {
        &self.scenarios
    }

    pub fn by_id(&self, id: u32) -> Result<&Arc<ScenarioDefinition>, CatalogError> {
        self.scenarios
            .binary_search_by_key(&id, |scenario| scenario.id)
            .map(|index| &self.scenarios[index])
            .map_err(|_| CatalogError::NotFound(id))
    }

    pub fn is_transitional(&self, id: u32) -> bool {
        self.transitions.contains_key(&id)
    }

    /// Candidate successor ids, empty for non-transitional scenarios.
    pub fn transitions_from(&self, id: u32) -> &[u32] {
        self.transitions.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }
}

fn validate_scenario(scenario: &ScenarioDefinition) -> Result<(), CatalogError> {
    let id = scenario.id;
    if scenario.must_have.is_empty() && scenario.confluence.is_empty() {
        return Err(CatalogError::DegenerateScenario(id));
    }

    for constraints in [&scenario.must_have, &scenario.confluence] {
        let mut assets = BTreeSet::new();
        for (asset, requirement) in constraints.iter() {
            if requirement.is_empty() {
                return Err(CatalogError::EmptyRequirement { id, asset });
            }
            if !assets.insert(asset) {
                return Err(CatalogError::DuplicateConstraint { id, asset });
            }
        }
    }

    if let Some((asset, _)) = scenario
        .confluence
        .iter()
        .find(|(asset, _)| scenario.must_have.contains(*asset))
    {
        return Err(CatalogError::OverlappingConstraint { id, asset });
    }

    Ok(())
}

#[cfg(test)]
impl ScenarioCatalog {
    /// Skips validation; lets tests exercise the empty-catalog paths.
    pub(crate) fn empty() -> Self {
        Self {
            scenarios: Vec::new(),
            transitions: BTreeMap::new(),
        }
    }
}
