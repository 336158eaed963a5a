use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;

use crate::error::StreamError;

/// Name of the publish channel owned by one identity
pub fn channel_name(identity: &str) -> String {
    format!("{identity}.livelog")
}

/// Name of the per-identity variable that references the published value
pub const ANCHOR_VARIABLE: &str = "User/livelog_stream";

/// Ambient context resolved from the host on every log event
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScopeInfo {
    /// Identifier of the current session scope; a change invalidates every
    /// handler
    pub scope_id: String,

    /// Identity the incoming log line is routed to
    pub identity: String,
}

impl ScopeInfo {
    pub fn new(scope_id: impl Into<String>, identity: impl Into<String>) -> Self {
        Self {
            scope_id: scope_id.into(),
            identity: identity.into(),
        }
    }
}

/// External primitive holding one current string value for remote observers
pub trait PublishChannel: Send + Sync {
    /// Store a new value; it reaches observers according to the update
    /// period
    fn publish(&self, value: &str) -> Result<(), StreamError>;

    /// Push the most recent value regardless of the update period
    fn force_publish(&self) -> Result<(), StreamError>;

    /// 0 pushes every update, n pushes every n-th update
    fn set_update_period(&self, period: u64);

    /// Release the channel; idempotent
    fn destroy(&self);
}

/// Host-side services the engine consumes
pub trait Host: Send + Sync {
    /// Current scope handle and local identity, `None` when no scope is
    /// active
    fn current_scope(&self) -> Option<ScopeInfo>;

    /// Allocate (or reuse) the named publish channel for an identity
    fn open_channel(
        &self,
        identity: &str,
        channel_name: &str,
    ) -> Result<Arc<dyn PublishChannel>, StreamError>;

    /// Create the small named resource pointing observers at the channel
    fn bind_anchor(&self, identity: &str, var_name: &str) -> Result<(), StreamError>;
}

/// In-process publish channel over a tokio watch cell.
///
/// Observers hold the `watch::Receiver`; the latest pushed value is always
/// available to them. Throttling counts updates: with period n only every
/// n-th publish is pushed, the rest stay pending until the next push or a
/// `force_publish`.
pub struct WatchChannel {
    tx: watch::Sender<String>,
    state: Mutex<ChannelState>,
}

struct ChannelState {
    period: u64,
    skipped: u64,
    pending: Option<String>,
    destroyed: bool,
}

impl WatchChannel {
    pub fn new(period: u64) -> (Arc<Self>, watch::Receiver<String>) {
        let (tx, rx) = watch::channel(String::new());
        let channel = Arc::new(Self {
            tx,
            state: Mutex::new(ChannelState {
                period,
                skipped: 0,
                pending: None,
                destroyed: false,
            }),
        });
        (channel, rx)
    }
}

impl PublishChannel for WatchChannel {
    fn publish(&self, value: &str) -> Result<(), StreamError> {
        let mut state = self.state.lock();
        if state.destroyed {
            return Err(StreamError::Publish("channel destroyed".into()));
        }

        if state.period == 0 {
            self.tx.send_replace(value.to_string());
            return Ok(());
        }

        state.skipped += 1;
        if state.skipped >= state.period {
            state.skipped = 0;
            state.pending = None;
            self.tx.send_replace(value.to_string());
        } else {
            state.pending = Some(value.to_string());
        }
        Ok(())
    }

    fn force_publish(&self) -> Result<(), StreamError> {
        let mut state = self.state.lock();
        if state.destroyed {
            return Err(StreamError::Publish("channel destroyed".into()));
        }
        if let Some(value) = state.pending.take() {
            state.skipped = 0;
            self.tx.send_replace(value);
        }
        Ok(())
    }

    fn set_update_period(&self, period: u64) {
        let mut state = self.state.lock();
        state.period = period;
        state.skipped = 0;
    }

    fn destroy(&self) {
        let mut state = self.state.lock();
        state.destroyed = true;
        state.pending = None;
    }
}
