use common::models::SignalVector;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::catalog::{CatalogError, ScenarioCatalog, ScenarioDefinition};

pub const MUST_HAVE_WEIGHT: u32 = 10;
pub const CONFLUENCE_WEIGHT: u32 = 3;
/// Runners-up must score strictly above this to be reported as alternatives.
pub const ALTERNATIVE_THRESHOLD: u8 = 40;
pub const MAX_ALTERNATIVES: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    pub fn from_percentage(percentage: u8) -> Self {
        if percentage >= 80 {
            Confidence::High
        } else if percentage >= 60 {
            Confidence::Medium
        } else {
            Confidence::Low
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Confidence::High => write!(f, "high"),
            Confidence::Medium => write!(f, "medium"),
            Confidence::Low => write!(f, "low"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MatchScore {
    pub scenario: Arc<ScenarioDefinition>,
    pub raw_score: u32,
    pub max_score: u32,
    pub percentage: u8,
    /// Unmet mustHave constraints, in mustHave order.
    pub missing_signals: Vec<String>,
}

impl MatchScore {
    pub fn confidence(&self) -> Confidence {
        Confidence::from_percentage(self.percentage)
    }

    /// Badge text, e.g. `85% Match` or `40% Match - Mixed Signals`.
    pub fn badge(&self) -> String {
        match self.confidence() {
            Confidence::Low => format!("{}% Match - Mixed Signals", self.percentage),
            _ => format!("{}% Match", self.percentage),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MatchResult {
    pub best_match: MatchScore,
    pub alternative_matches: Vec<MatchScore>,
    pub all_scores: Vec<MatchScore>,
}

impl MatchResult {
    pub fn to_record(&self) -> MatchResultRecord {
        MatchResultRecord {
            best_match: (&self.best_match).into(),
            alternative_matches: self.alternative_matches.iter().map(Into::into).collect(),
            all_scores: self.all_scores.iter().map(Into::into).collect(),
        }
    }
}

/// Transport form of a [`MatchScore`]: the scenario is referenced by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchScoreRecord {
    pub scenario_id: u32,
    pub scenario_name: String,
    pub raw_score: u32,
    pub max_score: u32,
    pub percentage: u8,
    pub missing_signals: Vec<String>,
}

impl From<&MatchScore> for MatchScoreRecord {
    fn from(score: &MatchScore) -> Self {
        Self {
            scenario_id: score.scenario.id,
            scenario_name: score.scenario.name.clone(),
            raw_score: score.raw_score,
            max_score: score.max_score,
            percentage: score.percentage,
            missing_signals: score.missing_signals.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResultRecord {
    pub best_match: MatchScoreRecord,
    pub alternative_matches: Vec<MatchScoreRecord>,
    pub all_scores: Vec<MatchScoreRecord>,
}

/// Scores a signal vector against every scenario of a catalog.
#[derive(Debug, Clone)]
pub struct Matcher {
    catalog: Arc<ScenarioCatalog>,
}

impl Matcher {
    pub fn new(catalog: Arc<ScenarioCatalog>) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &Arc<ScenarioCatalog> {
        &self.catalog
    }

    pub fn classify(&self, signals: &SignalVector) -> Result<MatchResult, CatalogError> {
        // Catalog order is id-ascending and the sort is stable, so equal
        // percentages stay in id order.
        let mut all_scores: Vec<MatchScore> = self
            .catalog
            .all()
            .iter()
            .map(|scenario| score_scenario(scenario, signals))
            .collect();
        all_scores.sort_by(|a, b| b.percentage.cmp(&a.percentage));

        let Some(best_match) = all_scores.first().cloned() else {
            return Err(CatalogError::EmptyCatalog);
        };

        let alternative_matches = all_scores
            .iter()
            .skip(1)
            .take(MAX_ALTERNATIVES)
            .filter(|score| score.percentage > ALTERNATIVE_THRESHOLD)
            .cloned()
            .collect();

        debug!(
            "Best match: Scenario {} ({}%) for {:?}",
            best_match.scenario.id, best_match.percentage, signals
        );

        Ok(MatchResult {
            best_match,
            alternative_matches,
            all_scores,
        })
    }
}

pub fn score_scenario(scenario: &Arc<ScenarioDefinition>, signals: &SignalVector) -> MatchScore {
    let mut raw_score = 0;
    let mut max_score = 0;
    let mut missing_signals = Vec::new();

    for (asset, requirement) in scenario.must_have.iter() {
        max_score += MUST_HAVE_WEIGHT;
        if requirement.satisfies(signals.get(asset)) {
            raw_score += MUST_HAVE_WEIGHT;
        } else {
            missing_signals.push(format!(
                "{} should be {}",
                asset.label(),
                requirement.describe(" or ")
            ));
        }
    }

    for (asset, acceptable) in scenario.confluence.iter() {
        max_score += CONFLUENCE_WEIGHT;
        if acceptable.satisfies(signals.get(asset)) {
            raw_score += CONFLUENCE_WEIGHT;
        }
    }

    MatchScore {
        scenario: Arc::clone(scenario),
        raw_score,
        max_score,
        percentage: rounded_percentage(raw_score, max_score),
        missing_signals,
    }
}

/// `round(100 * raw / max)` with halves rounded up, in integer arithmetic.
/// A zero `max` yields 0; validated catalogs never contain one.
pub fn rounded_percentage(raw: u32, max: u32) -> u8 {
    if max == 0 {
        return 0;
    }
    let percentage = (200 * raw + max) / (2 * max);
    percentage.min(100) as u8
}
