use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;

use livelog_stream::{Host, PublishChannel, ScopeInfo, StreamError, WatchChannel};

/// Single-process host: one ambient scope, publish channels served from
/// memory.
///
/// The channel map always holds the newest channel per identity; observers
/// re-subscribe when a stream is recreated after an eviction.
pub struct LocalHost {
    scope: Mutex<ScopeInfo>,
    channels: Mutex<HashMap<String, (Arc<WatchChannel>, watch::Receiver<String>)>>,
}

impl LocalHost {
    pub fn new(scope_id: &str, identity: &str) -> Self {
        Self {
            scope: Mutex::new(ScopeInfo::new(scope_id, identity)),
            channels: Mutex::new(HashMap::new()),
        }
    }

    /// Receiver for the newest channel published under an identity
    pub fn subscribe(&self, identity: &str) -> Option<watch::Receiver<String>> {
        self.channels
            .lock()
            .get(identity)
            .map(|(_, rx)| rx.clone())
    }
}

impl Host for LocalHost {
    fn current_scope(&self) -> Option<ScopeInfo> {
        Some(self.scope.lock().clone())
    }

    fn open_channel(
        &self,
        identity: &str,
        _channel_name: &str,
    ) -> Result<Arc<dyn PublishChannel>, StreamError> {
        let (channel, rx) = WatchChannel::new(0);
        self.channels
            .lock()
            .insert(identity.to_string(), (channel.clone(), rx));
        Ok(channel)
    }

    fn bind_anchor(&self, _identity: &str, _var_name: &str) -> Result<(), StreamError> {
        Ok(())
    }
}
