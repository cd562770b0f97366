pub mod asset;
pub mod history;
pub mod signal;

pub use asset::Asset;
pub use history::{HistoryEntry, record_entry};
pub use signal::{Signal, SignalError, SignalVector, parse_pair};
