// Discord layer - commands, event handlers and the audit sink.

#[path = "commands/command_catalog.rs"]
pub mod commands;

#[path = "checkins/checkin_events.rs"]
pub mod checkins;

#[path = "audit/audit_sink.rs"]
pub mod audit;

#[path = "error_handler.rs"]
pub mod error_handler;

#[path = "formatter.rs"]
pub mod formatter;

// Re-export command types for convenience
pub use commands::points::{Context, Data, Error};
