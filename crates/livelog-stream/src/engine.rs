use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};

use livelog_format::LogFormatter;
use livelog_types::{is_hex_color, ColorRole, LogEvent, StreamSettings, Theme};

use crate::buffer::BufferedLine;
use crate::channel::Host;
use crate::error::StreamError;
use crate::handler::StreamHandler;
use crate::monitor::ScopeMonitor;
use crate::registry::HandlerRegistry;

/// The core live-log engine.
///
/// One instance per process owns the formatter, theme, settings, handler
/// registry and scope monitor; there is no ambient static state. The host
/// feeds log events through [`LogStreamEngine::process`] and drives
/// configuration through the setters.
pub struct LogStreamEngine {
    host: Arc<dyn Host>,
    formatter: LogFormatter,
    theme: RwLock<Theme>,
    settings: RwLock<StreamSettings>,
    registry: HandlerRegistry,
    monitor: ScopeMonitor,
    known_identities: Mutex<HashSet<String>>,
    // Event processing holds this for read, scope teardown for write, so a
    // teardown can never interleave with handler creation and the registry
    // is empty before any handler for the new scope reaches Ready.
    scope_gate: RwLock<()>,
}

impl LogStreamEngine {
    pub fn new(host: Arc<dyn Host>) -> Self {
        Self::with_config(host, StreamSettings::default(), Theme::default())
    }

    pub fn with_config(host: Arc<dyn Host>, settings: StreamSettings, theme: Theme) -> Self {
        Self {
            host,
            formatter: LogFormatter::new(),
            theme: RwLock::new(theme),
            settings: RwLock::new(settings),
            registry: HandlerRegistry::new(),
            monitor: ScopeMonitor::new(),
            known_identities: Mutex::new(HashSet::new()),
            scope_gate: RwLock::new(()),
        }
    }

    /// Entry point for the host's log hook.
    ///
    /// Never panics and never surfaces an error: every failure degrades to
    /// a diagnostic plus eviction, and the affected identity's stream is
    /// recreated on its next line.
    pub fn process(&self, event: LogEvent) {
        if event.raw.is_empty() {
            return;
        }
        if self.monitor.is_tearing_down() {
            return;
        }
        let Some(scope) = self.host.current_scope() else {
            return;
        };
        if self.monitor.observe(&scope.scope_id) {
            self.invalidate_scope(&scope.scope_id);
        }

        let theme = self.theme.read().clone();
        let formatted = self.formatter.format(&event.raw, event.level, &theme);
        let line = BufferedLine {
            raw: event.raw,
            level: event.level,
            formatted,
        };

        let _gate = self.scope_gate.read();
        self.dispatch(&scope.identity, line);
    }

    fn invalidate_scope(&self, new_scope: &str) {
        if !self.monitor.begin_teardown() {
            return;
        }
        let _gate = self.scope_gate.write();
        info!(
            scope = new_scope,
            handlers = self.registry.len(),
            "scope changed, destroying all live log streams"
        );
        self.registry.destroy_all();
        self.known_identities.lock().clear();
        self.monitor.end_teardown();
    }

    fn dispatch(&self, identity: &str, line: BufferedLine) {
        if let Some(handler) = self.registry.get(identity) {
            if let Err(e) = handler.update_log(line) {
                warn!(identity, error = %e, "dropping live log stream after failed update");
                self.registry.evict(identity);
            }
            return;
        }

        // First line for this identity: build and set up a candidate before
        // touching the map, then race to insert it.
        let settings = *self.settings.read();
        let candidate = Arc::new(StreamHandler::new(identity, &settings));
        if let Err(e) = candidate.setup(self.host.as_ref()) {
            warn!(identity, error = %e, "failed to set up live log stream");
            candidate.destroy();
            return;
        }

        let handler = self.registry.insert_or_existing(candidate);
        if self.known_identities.lock().insert(identity.to_string()) {
            debug!(identity, "live log stream ready");
        }
        if let Err(e) = handler.update_log(line) {
            warn!(identity, error = %e, "dropping live log stream after failed update");
            self.registry.evict(identity);
        }
    }

    /// Number of identities with a live stream
    pub fn active_streams(&self) -> usize {
        self.registry.len()
    }

    pub fn settings(&self) -> StreamSettings {
        *self.settings.read()
    }

    pub fn theme(&self) -> Theme {
        self.theme.read().clone()
    }

    /// Cap every stream's history, trimming existing buffers when shrinking
    pub fn set_max_lines(&self, max_lines: usize) {
        self.settings.write().max_lines = max_lines;
        self.registry.for_each(|handler| handler.resize(max_lines));
    }

    /// Adjust the publish throttle on every live channel
    pub fn set_update_period(&self, period: u64) {
        self.settings.write().update_period = period;
        self.registry
            .for_each(|handler| handler.set_update_period(period));
    }

    /// Replace one theme color; the value must be `#RRGGBB`
    pub fn set_color(&self, role: ColorRole, value: &str) -> Result<(), StreamError> {
        if !is_hex_color(value) {
            return Err(StreamError::InvalidColor(value.to_string()));
        }
        self.theme.write().set_color(role, value);
        Ok(())
    }

    pub fn set_theme(&self, theme: Theme) {
        *self.theme.write() = theme;
    }

    /// Re-render every buffered line with the current theme and republish;
    /// buffer contents are preserved
    pub fn reload(&self) {
        let theme = self.theme.read().clone();
        self.registry.for_each(|handler| {
            if let Err(e) = handler.reformat(&self.formatter, &theme) {
                debug!(identity = handler.identity(), error = %e, "skipping reload for dead stream");
            }
        });
    }

    /// Empty every buffer and publish the empty value
    pub fn clear(&self) {
        self.registry.for_each(|handler| {
            if let Err(e) = handler.clear_logs() {
                debug!(identity = handler.identity(), error = %e, "skipping clear for dead stream");
            }
        });
    }

    /// Explicit teardown of every handler
    pub fn shutdown(&self) {
        let _gate = self.scope_gate.write();
        info!(handlers = self.registry.len(), "shutting down live log streams");
        self.registry.destroy_all();
        self.known_identities.lock().clear();
        self.monitor.reset();
    }
}
