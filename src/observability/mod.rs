//! Observability
//!
//! Structured JSON log lines for discovery, validation, promotion outcomes
//! and reconciliation results.
//!
//! # Principles
//!
//! 1. Observability is read-only
//! 2. Logging never fails a run
//! 3. One line per event, keys in deterministic order
//!
//! # Usage
//!
//! ```ignore
//! use ccr_cutover::observability::{log_event, Event};
//!
//! log_event(Event::PromotionSucceeded, &[("index", "logs"), ("attempts", "1")]);
//! ```

mod events;
mod logger;

pub use events::Event;
pub use logger::{Logger, Severity};

/// Log an event with fields at the event's severity.
pub fn log_event(event: Event, fields: &[(&str, &str)]) {
    Logger::log(event, fields);
}

/// Render a list of index names as a compact JSON array for a log field.
pub fn json_list<I, T>(items: I) -> String
where
    I: IntoIterator<Item = T>,
    T: std::fmt::Display,
{
    let names: Vec<String> = items.into_iter().map(|i| i.to_string()).collect();
    serde_json::to_string(&names).unwrap_or_default()
}
