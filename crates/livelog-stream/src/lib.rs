//! Per-identity live log streaming
//!
//! This crate owns the concurrent side of livelog: a registry of stream
//! handlers keyed by identity, each holding a bounded buffer of formatted
//! lines and a publish channel, plus the engine that routes incoming log
//! events, watches the ambient scope and applies configuration changes.

mod buffer;
mod channel;
mod engine;
mod error;
mod handler;
mod monitor;
mod registry;
#[cfg(test)]
mod testing;

pub use buffer::{BufferedLine, LineBuffer};
pub use channel::{channel_name, Host, PublishChannel, ScopeInfo, WatchChannel, ANCHOR_VARIABLE};
pub use engine::LogStreamEngine;
pub use error::StreamError;
pub use handler::{HandlerState, StreamHandler};
pub use monitor::ScopeMonitor;
pub use registry::HandlerRegistry;

// Re-export types used in our public API
pub use livelog_types::{ColorRole, LogEvent, LogLevel, StreamSettings, Theme};
