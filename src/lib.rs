pub mod app_state;
pub mod chat_models;
pub mod commands;
pub mod config;
pub mod directory_index;
pub mod error;
pub mod host;
pub mod logging;
pub mod parser;
pub mod reader;
pub mod repl;
pub mod tracker;
pub mod watcher;

pub use chat_models::*;
pub use config::{AppConfig, TrackerConfig};
pub use host::{ActionSink, ConsoleHost, CounterBoard};
pub use parser::parse_line;
pub use tracker::{Action, BreakReason, RunEnd, RunState, RunTracker};
