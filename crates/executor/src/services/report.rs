use chrono::NaiveDate;
use common::models::{Asset, HistoryEntry, SignalVector};
use serde::Serialize;
use std::fmt;
use strategy::catalog::ScenarioDefinition;
use strategy::services::regime_service::TRANSITION_RECOMMENDATION;
use strategy::services::{Confidence, ContextReport, MatchResult, MatchResultRecord};

/// Everything produced for one classified day.
#[derive(Debug, Clone)]
pub struct DailyReport {
    pub date: NaiveDate,
    pub signals: SignalVector,
    pub result: MatchResult,
    pub context: ContextReport,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DailyReportRecord<'a> {
    date: NaiveDate,
    signals: SignalVector,
    scenario: &'a ScenarioDefinition,
    confidence: Confidence,
    badge: String,
    matches: MatchResultRecord,
    context: &'a ContextReport,
}

impl DailyReport {
    pub fn to_json(&self) -> serde_json::Result<String> {
        let best = &self.result.best_match;
        let record = DailyReportRecord {
            date: self.date,
            signals: self.signals,
            scenario: &best.scenario,
            confidence: best.confidence(),
            badge: best.badge(),
            matches: self.result.to_record(),
            context: &self.context,
        };
        serde_json::to_string_pretty(&record)
    }
}

impl fmt::Display for DailyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let best = &self.result.best_match;
        let scenario = &best.scenario;

        writeln!(f, "{}", self.date)?;
        let signals = Asset::ALL
            .iter()
            .map(|&asset| format!("{} {}", asset.label(), self.signals.get(asset).arrow()))
            .collect::<Vec<_>>()
            .join("  ");
        writeln!(f, "{}", signals)?;
        writeln!(f)?;

        writeln!(f, "Scenario {}: {} [{}]", scenario.id, scenario.name, best.badge())?;
        if !scenario.description.is_empty() {
            writeln!(f, "{}", scenario.description)?;
        }
        if !scenario.hold_time.is_empty() {
            writeln!(f, "Hold Time: {}", scenario.hold_time)?;
        }
        if !scenario.risk_level.is_empty() {
            writeln!(f, "Risk Level: {}", scenario.risk_level)?;
        }

        if !best.missing_signals.is_empty() {
            writeln!(f, "Missing Signals: {}", best.missing_signals.join(", "))?;
        }
        if let Some(alternative) = self.result.alternative_matches.first() {
            writeln!(
                f,
                "Alternative: Scenario {}: {} ({}%)",
                alternative.scenario.id, alternative.scenario.name, alternative.percentage
            )?;
        }

        if !scenario.trades.is_empty() {
            writeln!(f)?;
            writeln!(f, "Trades:")?;
            for asset in Asset::ALL {
                if let Some(trade) = scenario.trade_for(asset) {
                    writeln!(
                        f,
                        "  {:<7} {} - {} (Risk: {})",
                        asset.display_name(),
                        trade.action,
                        trade.details,
                        trade.risk
                    )?;
                }
            }
        }

        if !scenario.key_points.is_empty() {
            writeln!(f)?;
            writeln!(f, "Key Points:")?;
            for point in &scenario.key_points {
                writeln!(f, "  * {}", point)?;
            }
        }

        for section in &scenario.explanation {
            writeln!(f)?;
            writeln!(f, "{}:", section.heading)?;
            for paragraph in &section.paragraphs {
                writeln!(f, "  {}", paragraph)?;
            }
        }

        writeln!(f)?;
        write_context(f, &self.context)
    }
}

fn write_context(f: &mut fmt::Formatter<'_>, context: &ContextReport) -> fmt::Result {
    writeln!(f, "Regime Context:")?;
    if !context.has_history() {
        writeln!(
            f,
            "  No historical data yet. Start tracking daily to build context."
        )?;
    } else {
        writeln!(f, "  Current Regime Duration: {}", context.duration_summary())?;
        if let Some(previous) = &context.previous_regime {
            writeln!(
                f,
                "  Previous Regime: Came from Scenario {}: {}",
                previous.scenario_id, previous.name
            )?;
        }
        if let Some(lead_lag) = &context.lead_lag {
            writeln!(f, "  Lead/Lag Analysis: {}", lead_lag)?;
        }
        writeln!(f, "  Recent Volatility: {}", context.volatility)?;
    }

    if let Some(transition) = &context.transition {
        writeln!(f)?;
        writeln!(
            f,
            "Transition: the market is between regimes. Watch for these resolutions:"
        )?;
        for candidate in &transition.candidates {
            writeln!(
                f,
                "  Scenario {}: {} (watch for: {})",
                candidate.scenario_id, candidate.name, candidate.watch_for
            )?;
        }
        writeln!(f, "  Recommendation: {}", TRANSITION_RECOMMENDATION)?;
    }
    Ok(())
}

/// One line per entry, most recent first.
pub fn render_history(entries: &[HistoryEntry]) -> String {
    if entries.is_empty() {
        return "No history recorded yet.".to_string();
    }

    entries
        .iter()
        .rev()
        .map(|entry| {
            let signals = Asset::ALL
                .iter()
                .map(|&asset| format!("{}{}", asset.label(), entry.signals.get(asset).arrow()))
                .collect::<Vec<_>>()
                .join(" ");
            format!(
                "{}  {}  Scenario {}: {} ({}%)",
                entry.date.format("%b %-d"),
                signals,
                entry.scenario_id,
                entry.scenario_name,
                entry.confidence
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
