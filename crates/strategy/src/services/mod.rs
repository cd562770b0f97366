pub use matcher_service::{
    Confidence, MatchResult, MatchResultRecord, MatchScore, MatchScoreRecord, Matcher,
};
pub use regime_service::{
    ContextReport, LeadLag, RegimeAnalyzer, RegimeRef, TransitionGuidance, Volatility,
};

pub mod matcher_service;
pub mod regime_service;
