use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

/// Watches the ambient scope for transitions that invalidate every handler.
///
/// The first observed scope is a baseline, not a change. The teardown flag
/// guards against log lines emitted while a bulk teardown is running; they
/// must not trigger a second, recursive teardown.
pub struct ScopeMonitor {
    last_scope: Mutex<Option<String>>,
    tearing_down: AtomicBool,
}

impl ScopeMonitor {
    pub fn new() -> Self {
        Self {
            last_scope: Mutex::new(None),
            tearing_down: AtomicBool::new(false),
        }
    }

    /// Record the observed scope, reporting whether it replaced a different
    /// previous one
    pub fn observe(&self, scope_id: &str) -> bool {
        let mut last = self.last_scope.lock();
        match last.as_deref() {
            Some(prev) if prev == scope_id => false,
            Some(_) => {
                *last = Some(scope_id.to_string());
                true
            }
            None => {
                *last = Some(scope_id.to_string());
                false
            }
        }
    }

    /// Claim the teardown guard; false when a teardown is already running
    pub fn begin_teardown(&self) -> bool {
        !self.tearing_down.swap(true, Ordering::SeqCst)
    }

    pub fn end_teardown(&self) {
        self.tearing_down.store(false, Ordering::SeqCst);
    }

    pub fn is_tearing_down(&self) -> bool {
        self.tearing_down.load(Ordering::SeqCst)
    }

    /// Forget the last-seen scope (used on explicit shutdown)
    pub fn reset(&self) {
        *self.last_scope.lock() = None;
    }
}

impl Default for ScopeMonitor {
    fn default() -> Self {
        Self::new()
    }
}
