use common::config::DEFAULT_HISTORY_WINDOW;
use common::models::{Asset, HistoryEntry};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use tracing::warn;

use crate::catalog::{ScenarioCatalog, ScenarioDefinition};

pub const TRANSITION_RECOMMENDATION: &str = "Use small position sizes (30% max) or wait for clear alignment before committing capital.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegimeRef {
    pub scenario_id: u32,
    pub name: String,
}

/// Day-over-day comparison of the two most recent entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LeadLag {
    Stable,
    Leader { asset: Asset },
    PartialConfirmation { assets: [Asset; 2] },
    FullRegimeChange,
}

impl fmt::Display for LeadLag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LeadLag::Stable => write!(f, "All assets holding steady - regime stable"),
            LeadLag::Leader { asset } => write!(
                f,
                "{} leading the move - watch for other assets to confirm",
                asset
            ),
            LeadLag::PartialConfirmation { assets: [first, second] } => {
                write!(f, "{} and {} shifting - partial confirmation", first, second)
            }
            LeadLag::FullRegimeChange => write!(f, "All assets moving - strong regime change signal"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Volatility {
    InsufficientData,
    VeryStable,
    Moderate,
    High,
}

impl fmt::Display for Volatility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Volatility::InsufficientData => write!(f, "Insufficient data"),
            Volatility::VeryStable => write!(f, "Very stable - same scenario throughout"),
            Volatility::Moderate => write!(f, "Moderate - one transition occurred"),
            Volatility::High => write!(f, "High - multiple regime changes"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionCandidate {
    pub scenario_id: u32,
    pub name: String,
    pub watch_for: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionGuidance {
    pub from_scenario_id: u32,
    pub candidates: Vec<TransitionCandidate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextReport {
    pub scenario_id: u32,
    /// Entries actually inspected (at most the analyzer window).
    pub window_len: usize,
    pub consecutive_days: usize,
    pub previous_regime: Option<RegimeRef>,
    pub lead_lag: Option<LeadLag>,
    pub volatility: Volatility,
    pub transition: Option<TransitionGuidance>,
}

impl ContextReport {
    pub fn has_history(&self) -> bool {
        self.window_len > 0
    }

    pub fn duration_summary(&self) -> String {
        match self.consecutive_days {
            0 => "New scenario starting today".to_string(),
            1 => format!("1 consecutive day in Scenario {}", self.scenario_id),
            days => format!("{} consecutive days in Scenario {}", days, self.scenario_id),
        }
    }
}

/// Builds regime context from recent history and the current best match.
#[derive(Debug, Clone)]
pub struct RegimeAnalyzer {
    catalog: Arc<ScenarioCatalog>,
    window: usize,
}

impl RegimeAnalyzer {
    pub fn new(catalog: Arc<ScenarioCatalog>, window: usize) -> Self {
        Self {
            catalog,
            window: window.max(1),
        }
    }

    pub fn with_default_window(catalog: Arc<ScenarioCatalog>) -> Self {
        Self::new(catalog, DEFAULT_HISTORY_WINDOW)
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// `history` is oldest first; only its last `window` entries are used.
    pub fn compute_context(&self, history: &[HistoryEntry], scenario_id: u32) -> ContextReport {
        let recent = self.recent(history);
        let consecutive_days = consecutive_days(recent, scenario_id);

        ContextReport {
            scenario_id,
            window_len: recent.len(),
            consecutive_days,
            previous_regime: self.previous_regime(recent, consecutive_days),
            lead_lag: lead_lag(recent),
            volatility: volatility(recent),
            transition: self.transition_guidance(scenario_id),
        }
    }

    pub fn recent<'a>(&self, history: &'a [HistoryEntry]) -> &'a [HistoryEntry] {
        &history[history.len().saturating_sub(self.window)..]
    }

    /// The scenario in force just before the current streak, if the window
    /// reaches back that far and the catalog still knows it.
    pub fn previous_regime(&self, recent: &[HistoryEntry], streak: usize) -> Option<RegimeRef> {
        if streak >= recent.len() {
            return None;
        }
        let entry = &recent[recent.len() - streak - 1];
        match self.catalog.by_id(entry.scenario_id) {
            Ok(scenario) => Some(RegimeRef {
                scenario_id: scenario.id,
                name: scenario.name.clone(),
            }),
            Err(e) => {
                warn!("Previous regime on {} is unknown: {}", entry.date, e);
                None
            }
        }
    }

    pub fn transition_guidance(&self, scenario_id: u32) -> Option<TransitionGuidance> {
        if !self.catalog.is_transitional(scenario_id) {
            return None;
        }

        let candidates = self
            .catalog
            .transitions_from(scenario_id)
            .iter()
            .filter_map(|&id| match self.catalog.by_id(id) {
                Ok(scenario) => Some(TransitionCandidate {
                    scenario_id: scenario.id,
                    name: scenario.name.clone(),
                    watch_for: watch_for(scenario),
                }),
                Err(e) => {
                    warn!("Skipping transition candidate: {}", e);
                    None
                }
            })
            .collect();

        Some(TransitionGuidance {
            from_scenario_id: scenario_id,
            candidates,
        })
    }
}

/// Entries at the end of `recent` that share `scenario_id`.
pub fn consecutive_days(recent: &[HistoryEntry], scenario_id: u32) -> usize {
    recent
        .iter()
        .rev()
        .take_while(|entry| entry.scenario_id == scenario_id)
        .count()
}

pub fn lead_lag(recent: &[HistoryEntry]) -> Option<LeadLag> {
    let [.., yesterday, today] = recent else {
        return None;
    };

    let changed = today.signals.changed_assets(&yesterday.signals);
    Some(match changed.as_slice() {
        [] => LeadLag::Stable,
        [asset] => LeadLag::Leader { asset: *asset },
        [first, second] => LeadLag::PartialConfirmation {
            assets: [*first, *second],
        },
        _ => LeadLag::FullRegimeChange,
    })
}

pub fn volatility(recent: &[HistoryEntry]) -> Volatility {
    if recent.len() < 3 {
        return Volatility::InsufficientData;
    }

    let distinct: BTreeSet<u32> = recent.iter().map(|entry| entry.scenario_id).collect();
    match distinct.len() {
        1 => Volatility::VeryStable,
        2 => Volatility::Moderate,
        _ => Volatility::High,
    }
}

/// mustHave constraints as `BTC up, GOLD down/flat`.
pub fn watch_for(scenario: &ScenarioDefinition) -> String {
    scenario
        .must_have
        .iter()
        .map(|(asset, requirement)| format!("{} {}", asset.label(), requirement.describe("/")))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Constraints, TransitionRule};
    use chrono::NaiveDate;
    use common::models::{Signal, SignalVector};

    const ALL_UP: SignalVector = SignalVector {
        btc: Signal::Up,
        gold: Signal::Up,
        usdjpy: Signal::Up,
        eurusd: Signal::Up,
    };

    fn entry_with(day: u32, scenario_id: u32, signals: SignalVector) -> HistoryEntry {
        HistoryEntry {
            date: NaiveDate::from_ymd_opt(2025, 6, day).unwrap(),
            timestamp: i64::from(day) * 86_400_000,
            signals,
            scenario_id,
            scenario_name: format!("Scenario {}", scenario_id),
            confidence: 75,
        }
    }

    fn history(ids: &[u32]) -> Vec<HistoryEntry> {
        ids.iter()
            .enumerate()
            .map(|(i, &id)| entry_with(i as u32 + 1, id, ALL_UP))
            .collect()
    }

    fn analyzer() -> RegimeAnalyzer {
        RegimeAnalyzer::with_default_window(Arc::new(ScenarioCatalog::builtin().unwrap()))
    }

    #[test]
    fn test_empty_history() {
        let report = analyzer().compute_context(&[], 5);

        assert!(!report.has_history());
        assert_eq!(report.consecutive_days, 0);
        assert_eq!(report.previous_regime, None);
        assert_eq!(report.lead_lag, None);
        assert_eq!(report.volatility, Volatility::InsufficientData);
        assert_eq!(report.transition, None);
        assert_eq!(report.duration_summary(), "New scenario starting today");
    }

    #[test]
    fn test_streak_zero_when_latest_differs() {
        let report = analyzer().compute_context(&history(&[3, 3, 4]), 3);

        assert_eq!(report.consecutive_days, 0);
        assert_eq!(
            report.previous_regime,
            Some(RegimeRef {
                scenario_id: 4,
                name: "Currency Rotation (FX Flow)".to_string()
            })
        );
    }

    #[test]
    fn test_streak_spans_whole_window() {
        let report = analyzer().compute_context(&history(&[2, 2, 2, 2]), 2);

        assert_eq!(report.consecutive_days, 4);
        assert_eq!(report.previous_regime, None);
        assert_eq!(report.duration_summary(), "4 consecutive days in Scenario 2");
    }

    #[test]
    fn test_only_last_seven_entries_inspected() {
        let ids = [9, 9, 9, 1, 1, 1, 1, 1, 1, 1];
        let report = analyzer().compute_context(&history(&ids), 1);

        assert_eq!(report.window_len, 7);
        assert_eq!(report.consecutive_days, 7);
        assert_eq!(report.previous_regime, None);
        assert_eq!(report.volatility, Volatility::VeryStable);
    }

    #[test]
    fn test_previous_regime_from_entry_before_streak() {
        let report = analyzer().compute_context(&history(&[8, 6, 1, 1]), 1);

        assert_eq!(report.consecutive_days, 2);
        assert_eq!(report.previous_regime.map(|r| r.scenario_id), Some(6));
    }

    #[test]
    fn test_unknown_previous_regime_is_omitted() {
        let report = analyzer().compute_context(&history(&[1, 99, 5]), 5);

        assert_eq!(report.consecutive_days, 1);
        assert_eq!(report.previous_regime, None);
        assert_eq!(report.volatility, Volatility::High);
    }

    #[test]
    fn test_volatility_classification() {
        assert_eq!(volatility(&history(&[1, 1, 1])), Volatility::VeryStable);
        assert_eq!(volatility(&history(&[1, 2, 2])), Volatility::Moderate);
        assert_eq!(volatility(&history(&[1, 2, 3])), Volatility::High);
        assert_eq!(volatility(&history(&[1, 2])), Volatility::InsufficientData);
        assert_eq!(Volatility::Moderate.to_string(), "Moderate - one transition occurred");
    }

    #[test]
    fn test_lead_lag_needs_two_entries() {
        assert_eq!(lead_lag(&[]), None);
        assert_eq!(lead_lag(&history(&[1])), None);
        assert_eq!(lead_lag(&history(&[1, 1])), Some(LeadLag::Stable));
    }

    #[test]
    fn test_lead_lag_single_leader() {
        let today = SignalVector {
            btc: Signal::Down,
            ..ALL_UP
        };
        let recent = vec![entry_with(1, 5, ALL_UP), entry_with(2, 5, today)];

        let result = lead_lag(&recent).unwrap();
        assert_eq!(result, LeadLag::Leader { asset: Asset::Btc });
        assert_eq!(
            result.to_string(),
            "BTC leading the move - watch for other assets to confirm"
        );
    }

    #[test]
    fn test_lead_lag_partial_and_full() {
        let two = SignalVector {
            gold: Signal::Flat,
            eurusd: Signal::Down,
            ..ALL_UP
        };
        let recent = vec![entry_with(1, 5, ALL_UP), entry_with(2, 5, two)];
        assert_eq!(
            lead_lag(&recent),
            Some(LeadLag::PartialConfirmation {
                assets: [Asset::Gold, Asset::EurUsd]
            })
        );

        let three = SignalVector::new(Signal::Down, Signal::Down, Signal::Flat, Signal::Up);
        let recent = vec![entry_with(1, 5, ALL_UP), entry_with(2, 5, three)];
        assert_eq!(lead_lag(&recent), Some(LeadLag::FullRegimeChange));
    }

    #[test]
    fn test_lead_lag_uses_two_most_recent_entries() {
        let moved = SignalVector {
            usdjpy: Signal::Down,
            ..ALL_UP
        };
        let recent = vec![
            entry_with(1, 5, SignalVector::new(Signal::Flat, Signal::Flat, Signal::Flat, Signal::Flat)),
            entry_with(2, 5, ALL_UP),
            entry_with(3, 5, moved),
        ];
        assert_eq!(lead_lag(&recent), Some(LeadLag::Leader { asset: Asset::UsdJpy }));
    }

    #[test]
    fn test_transition_guidance_for_first_transitional() {
        let guidance = analyzer().transition_guidance(11).unwrap();

        let ids: Vec<u32> = guidance.candidates.iter().map(|c| c.scenario_id).collect();
        assert_eq!(ids, vec![2, 7, 3]);
        assert_eq!(guidance.candidates[0].watch_for, "GOLD up");
        assert_eq!(
            guidance.candidates[2].watch_for,
            "BTC up, GOLD down/flat, EURUSD down/flat"
        );
    }

    #[test]
    fn test_transition_guidance_for_second_transitional() {
        let report = analyzer().compute_context(&history(&[12]), 12);
        let guidance = report.transition.unwrap();

        assert_eq!(guidance.from_scenario_id, 12);
        let ids: Vec<u32> = guidance.candidates.iter().map(|c| c.scenario_id).collect();
        assert_eq!(ids, vec![6, 3, 2]);
        assert_eq!(guidance.candidates[0].watch_for, "BTC down, USDJPY down");
    }

    #[test]
    fn test_no_guidance_outside_transitional_scenarios() {
        let analyzer = analyzer();
        for id in 1..=10 {
            assert_eq!(analyzer.transition_guidance(id), None);
        }
    }

    #[test]
    fn test_custom_catalog_and_window() {
        let catalog = ScenarioCatalog::new(
            vec![
                ScenarioDefinition::new(
                    1,
                    "Calm",
                    Constraints::new().with(Asset::Btc, Signal::Flat),
                    Constraints::new(),
                ),
                ScenarioDefinition::new(
                    2,
                    "Drift",
                    Constraints::new().with(Asset::Gold, [Signal::Up, Signal::Flat]),
                    Constraints::new(),
                ),
            ],
            vec![TransitionRule { from: 1, candidates: vec![2] }],
        )
        .unwrap();
        let analyzer = RegimeAnalyzer::new(Arc::new(catalog), 3);

        let report = analyzer.compute_context(&history(&[2, 2, 2, 1, 2, 1]), 1);
        assert_eq!(report.window_len, 3);
        assert_eq!(report.consecutive_days, 1);
        assert_eq!(report.previous_regime.map(|r| r.name), Some("Drift".to_string()));
        assert_eq!(report.volatility, Volatility::Moderate);

        let guidance = report.transition.unwrap();
        assert_eq!(guidance.candidates[0].watch_for, "GOLD up/flat");
    }

    #[test]
    fn test_report_serializes() {
        let report = analyzer().compute_context(&history(&[11, 11]), 11);
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["consecutiveDays"], 2);
        assert_eq!(json["leadLag"]["kind"], "stable");
        assert_eq!(json["volatility"], "insufficient_data");
        assert_eq!(json["transition"]["candidates"][1]["scenarioId"], 7);
    }
}
