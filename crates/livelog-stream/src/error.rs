use thiserror::Error;

/// Errors raised at the handler and registry boundary.
///
/// None of these ever reach the host's log hook; the engine converts them
/// into a diagnostic plus eviction, and the affected stream is recreated on
/// the next log line.
#[derive(Debug, Error)]
pub enum StreamError {
    /// The handler exists but `setup` has not completed
    #[error("log stream handler for {identity} is not initialized; run setup first")]
    NotInitialized { identity: String },

    /// The handler was destroyed; the registry must evict and recreate it
    #[error("log stream handler for {identity} has been destroyed")]
    Destroyed { identity: String },

    /// The host could not allocate a publish channel or anchor resource
    #[error("failed to allocate publish channel: {0}")]
    ChannelSetup(String),

    /// Pushing a value to the publish channel failed
    #[error("failed to publish log update: {0}")]
    Publish(String),

    /// A configuration setter received a malformed color value
    #[error("invalid color value: {0}")]
    InvalidColor(String),
}
