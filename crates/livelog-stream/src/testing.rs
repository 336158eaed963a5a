//! Test doubles for the host-side seams.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::channel::{Host, PublishChannel, ScopeInfo};
use crate::error::StreamError;

/// Publish channel that records every value pushed through it
pub(crate) struct RecordingChannel {
    published: Mutex<Vec<String>>,
    period: Mutex<u64>,
    destroyed: AtomicUsize,
    forced: AtomicUsize,
    fail_publish: AtomicBool,
}

impl RecordingChannel {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            published: Mutex::new(Vec::new()),
            period: Mutex::new(0),
            destroyed: AtomicUsize::new(0),
            forced: AtomicUsize::new(0),
            fail_publish: AtomicBool::new(false),
        })
    }

    pub(crate) fn last(&self) -> Option<String> {
        self.published.lock().last().cloned()
    }

    pub(crate) fn publish_count(&self) -> usize {
        self.published.lock().len()
    }

    pub(crate) fn destroy_count(&self) -> usize {
        self.destroyed.load(Ordering::SeqCst)
    }

    pub(crate) fn period(&self) -> u64 {
        *self.period.lock()
    }

    pub(crate) fn force_count(&self) -> usize {
        self.forced.load(Ordering::SeqCst)
    }

    pub(crate) fn fail_publish(&self, fail: bool) {
        self.fail_publish.store(fail, Ordering::SeqCst);
    }
}

impl PublishChannel for RecordingChannel {
    fn publish(&self, value: &str) -> Result<(), StreamError> {
        if self.fail_publish.load(Ordering::SeqCst) {
            return Err(StreamError::Publish("forced test failure".into()));
        }
        self.published.lock().push(value.to_string());
        Ok(())
    }

    fn force_publish(&self) -> Result<(), StreamError> {
        self.forced.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn set_update_period(&self, period: u64) {
        *self.period.lock() = period;
    }

    fn destroy(&self) {
        self.destroyed.fetch_add(1, Ordering::SeqCst);
    }
}

/// In-memory host exposing the knobs the lifecycle tests need
pub(crate) struct MockHost {
    scope: Mutex<Option<ScopeInfo>>,
    channels: Mutex<Vec<(String, Arc<RecordingChannel>)>>,
    anchors: AtomicUsize,
    fail_open: AtomicBool,
    fail_anchor: AtomicBool,
}

impl MockHost {
    pub(crate) fn new(scope_id: &str, identity: &str) -> Arc<Self> {
        Arc::new(Self {
            scope: Mutex::new(Some(ScopeInfo::new(scope_id, identity))),
            channels: Mutex::new(Vec::new()),
            anchors: AtomicUsize::new(0),
            fail_open: AtomicBool::new(false),
            fail_anchor: AtomicBool::new(false),
        })
    }

    pub(crate) fn set_scope(&self, scope_id: &str, identity: &str) {
        *self.scope.lock() = Some(ScopeInfo::new(scope_id, identity));
    }

    pub(crate) fn clear_scope(&self) {
        *self.scope.lock() = None;
    }

    pub(crate) fn fail_open(&self, fail: bool) {
        self.fail_open.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn fail_anchor(&self, fail: bool) {
        self.fail_anchor.store(fail, Ordering::SeqCst);
    }

    /// Toggle publish failures on the newest channel for an identity
    pub(crate) fn fail_publish(&self, identity: &str, fail: bool) {
        if let Some(channel) = self.channel(identity) {
            channel.fail_publish(fail);
        }
    }

    /// Newest channel opened for an identity
    pub(crate) fn channel(&self, identity: &str) -> Option<Arc<RecordingChannel>> {
        self.channels
            .lock()
            .iter()
            .rev()
            .find(|(id, _)| id == identity)
            .map(|(_, channel)| channel.clone())
    }

    pub(crate) fn last_published(&self, identity: &str) -> Option<String> {
        self.channel(identity).and_then(|channel| channel.last())
    }

    pub(crate) fn publish_count(&self, identity: &str) -> usize {
        self.channel(identity)
            .map(|channel| channel.publish_count())
            .unwrap_or(0)
    }

    pub(crate) fn destroy_count(&self, identity: &str) -> usize {
        self.channels
            .lock()
            .iter()
            .filter(|(id, _)| id == identity)
            .map(|(_, channel)| channel.destroy_count())
            .sum()
    }

    pub(crate) fn opened_channels(&self) -> usize {
        self.channels.lock().len()
    }

    /// Channels opened and not yet destroyed
    pub(crate) fn live_channels(&self) -> usize {
        self.channels
            .lock()
            .iter()
            .filter(|(_, channel)| channel.destroy_count() == 0)
            .count()
    }

    pub(crate) fn anchors(&self) -> usize {
        self.anchors.load(Ordering::SeqCst)
    }
}

impl Host for MockHost {
    fn current_scope(&self) -> Option<ScopeInfo> {
        self.scope.lock().clone()
    }

    fn open_channel(
        &self,
        identity: &str,
        _channel_name: &str,
    ) -> Result<Arc<dyn PublishChannel>, StreamError> {
        if self.fail_open.load(Ordering::SeqCst) {
            return Err(StreamError::ChannelSetup("forced test failure".into()));
        }
        let channel = RecordingChannel::new();
        self.channels
            .lock()
            .push((identity.to_string(), channel.clone()));
        Ok(channel)
    }

    fn bind_anchor(&self, _identity: &str, _var_name: &str) -> Result<(), StreamError> {
        if self.fail_anchor.load(Ordering::SeqCst) {
            return Err(StreamError::ChannelSetup("forced anchor failure".into()));
        }
        self.anchors.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
