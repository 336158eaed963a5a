use std::sync::Arc;

use parking_lot::Mutex;

use livelog_format::LogFormatter;
use livelog_types::{StreamSettings, Theme};

use crate::buffer::{BufferedLine, LineBuffer};
use crate::channel::{channel_name, Host, PublishChannel, ANCHOR_VARIABLE};
use crate::error::StreamError;

/// Lifecycle of one identity's handler
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HandlerState {
    /// Constructed, external resources not yet allocated
    Created,
    /// Channel and anchor allocated, accepting updates
    Ready,
    /// Torn down; every further operation is rejected
    Destroyed,
}

/// Owns one identity's bounded line buffer and publish channel.
///
/// All mutation runs under a single internal lock, so append, trim and
/// publish form one critical section even when log lines for the same
/// identity arrive from several threads at once.
pub struct StreamHandler {
    identity: String,
    inner: Mutex<HandlerInner>,
}

struct HandlerInner {
    state: HandlerState,
    buffer: LineBuffer,
    channel: Option<Arc<dyn PublishChannel>>,
    update_period: u64,
}

impl HandlerInner {
    fn ready_channel(&self, identity: &str) -> Result<Arc<dyn PublishChannel>, StreamError> {
        match self.state {
            HandlerState::Created => Err(StreamError::NotInitialized {
                identity: identity.to_string(),
            }),
            HandlerState::Destroyed => Err(StreamError::Destroyed {
                identity: identity.to_string(),
            }),
            HandlerState::Ready => self.channel.clone().ok_or_else(|| {
                StreamError::NotInitialized {
                    identity: identity.to_string(),
                }
            }),
        }
    }
}

impl StreamHandler {
    pub fn new(identity: impl Into<String>, settings: &StreamSettings) -> Self {
        Self {
            identity: identity.into(),
            inner: Mutex::new(HandlerInner {
                state: HandlerState::Created,
                buffer: LineBuffer::new(settings.max_lines),
                channel: None,
                update_period: settings.update_period,
            }),
        }
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn state(&self) -> HandlerState {
        self.inner.lock().state
    }

    /// Allocate the publish channel and anchor resource.
    ///
    /// The handler becomes `Ready` only after every external resource is
    /// confirmed usable; a partial allocation is released before returning
    /// the error.
    pub fn setup(&self, host: &dyn Host) -> Result<(), StreamError> {
        let mut inner = self.inner.lock();
        match inner.state {
            HandlerState::Created => {}
            HandlerState::Ready => return Ok(()),
            HandlerState::Destroyed => {
                return Err(StreamError::Destroyed {
                    identity: self.identity.clone(),
                });
            }
        }

        let channel = host.open_channel(&self.identity, &channel_name(&self.identity))?;
        channel.set_update_period(inner.update_period);
        if let Err(e) = host.bind_anchor(&self.identity, ANCHOR_VARIABLE) {
            channel.destroy();
            return Err(e);
        }

        inner.channel = Some(channel);
        inner.state = HandlerState::Ready;
        Ok(())
    }

    /// Append one formatted line and publish the new concatenated contents
    pub fn update_log(&self, line: BufferedLine) -> Result<(), StreamError> {
        let mut inner = self.inner.lock();
        let channel = inner.ready_channel(&self.identity)?;
        inner.buffer.push(line);
        channel.publish(&inner.buffer.contents())
    }

    /// Empty the buffer and push the empty value through the throttle
    pub fn clear_logs(&self) -> Result<(), StreamError> {
        let mut inner = self.inner.lock();
        let channel = inner.ready_channel(&self.identity)?;
        inner.buffer.clear();
        channel.publish("")?;
        channel.force_publish()
    }

    /// Trim the buffer when the new capacity is smaller; the next update
    /// publishes the trimmed contents
    pub fn resize(&self, max_lines: usize) {
        let mut inner = self.inner.lock();
        if inner.state == HandlerState::Destroyed {
            return;
        }
        inner.buffer.resize(max_lines);
    }

    /// Forward a new update period to the channel; a destroyed handler is
    /// treated as already gone
    pub fn set_update_period(&self, period: u64) {
        let mut inner = self.inner.lock();
        inner.update_period = period;
        if inner.state == HandlerState::Destroyed {
            return;
        }
        if let Some(channel) = &inner.channel {
            channel.set_update_period(period);
        }
    }

    /// Re-render every buffered line with the given theme and republish
    pub fn reformat(&self, formatter: &LogFormatter, theme: &Theme) -> Result<(), StreamError> {
        let mut inner = self.inner.lock();
        let channel = inner.ready_channel(&self.identity)?;
        for line in inner.buffer.lines_mut() {
            line.formatted = formatter.format(&line.raw, line.level, theme);
        }
        channel.publish(&inner.buffer.contents())?;
        channel.force_publish()
    }

    /// Release the publish channel and reject further operations.
    /// Destroying twice is a no-op.
    pub fn destroy(&self) {
        let mut inner = self.inner.lock();
        if inner.state == HandlerState::Destroyed {
            return;
        }
        inner.state = HandlerState::Destroyed;
        inner.buffer.clear();
        if let Some(channel) = inner.channel.take() {
            channel.destroy();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockHost;
    use livelog_types::LogLevel;

    fn line(text: &str) -> BufferedLine {
        BufferedLine {
            raw: text.to_string(),
            level: LogLevel::None,
            formatted: text.to_string(),
        }
    }

    fn settings(max_lines: usize) -> StreamSettings {
        StreamSettings {
            max_lines,
            update_period: 0,
        }
    }

    #[test]
    fn test_update_before_setup_is_rejected() {
        let handler = StreamHandler::new("alice", &settings(5));
        assert!(matches!(
            handler.update_log(line("x")),
            Err(StreamError::NotInitialized { .. })
        ));
    }

    #[test]
    fn test_setup_then_update_publishes_contents() {
        let host = MockHost::new("scope", "alice");
        let handler = StreamHandler::new("alice", &settings(5));
        handler.setup(host.as_ref()).unwrap();
        assert_eq!(handler.state(), HandlerState::Ready);
        assert_eq!(host.anchors(), 1);

        handler.update_log(line("one")).unwrap();
        handler.update_log(line("two")).unwrap();
        assert_eq!(host.last_published("alice"), Some("one\ntwo".to_string()));
    }

    #[test]
    fn test_update_evicts_past_capacity() {
        let host = MockHost::new("scope", "alice");
        let handler = StreamHandler::new("alice", &settings(2));
        handler.setup(host.as_ref()).unwrap();
        for i in 0..4 {
            handler.update_log(line(&format!("line {i}"))).unwrap();
        }
        assert_eq!(
            host.last_published("alice"),
            Some("line 2\nline 3".to_string())
        );
    }

    #[test]
    fn test_resize_trims_without_publishing() {
        let host = MockHost::new("scope", "alice");
        let handler = StreamHandler::new("alice", &settings(500));
        handler.setup(host.as_ref()).unwrap();
        for i in 0..5 {
            handler.update_log(line(&format!("line {i}"))).unwrap();
        }
        let published_before = host.publish_count("alice");
        handler.resize(2);
        assert_eq!(host.publish_count("alice"), published_before);

        handler.update_log(line("line 5")).unwrap();
        assert_eq!(
            host.last_published("alice"),
            Some("line 4\nline 5".to_string())
        );
    }

    #[test]
    fn test_clear_publishes_empty_value() {
        let host = MockHost::new("scope", "alice");
        let handler = StreamHandler::new("alice", &settings(5));
        handler.setup(host.as_ref()).unwrap();
        handler.update_log(line("one")).unwrap();
        handler.clear_logs().unwrap();
        assert_eq!(host.last_published("alice"), Some(String::new()));
        // The empty value is pushed through the throttle immediately.
        assert_eq!(host.channel("alice").unwrap().force_count(), 1);
    }

    #[test]
    fn test_setup_failure_releases_channel() {
        let host = MockHost::new("scope", "alice");
        host.fail_anchor(true);
        let handler = StreamHandler::new("alice", &settings(5));
        assert!(handler.setup(host.as_ref()).is_err());
        assert_eq!(handler.state(), HandlerState::Created);
        assert_eq!(host.live_channels(), 0);
    }

    #[test]
    fn test_destroy_is_idempotent() {
        let host = MockHost::new("scope", "alice");
        let handler = StreamHandler::new("alice", &settings(5));
        handler.setup(host.as_ref()).unwrap();
        handler.destroy();
        handler.destroy();
        assert_eq!(handler.state(), HandlerState::Destroyed);
        assert_eq!(host.destroy_count("alice"), 1);
        assert!(matches!(
            handler.update_log(line("x")),
            Err(StreamError::Destroyed { .. })
        ));
    }

    #[test]
    fn test_reformat_rerenders_history() {
        let host = MockHost::new("scope", "alice");
        let handler = StreamHandler::new("alice", &settings(5));
        handler.setup(host.as_ref()).unwrap();

        let formatter = LogFormatter::new();
        let mut theme = Theme::default();
        handler
            .update_log(BufferedLine {
                raw: "boot ok".to_string(),
                level: LogLevel::Info,
                formatted: formatter.format("boot ok", LogLevel::Info, &theme),
            })
            .unwrap();
        assert!(host.last_published("alice").unwrap().contains("#8FC5AA"));

        theme.info_text = "#123456".to_string();
        handler.reformat(&formatter, &theme).unwrap();
        let value = host.last_published("alice").unwrap();
        assert!(value.contains("#123456"));
        assert!(!value.contains("#8FC5AA"));
    }
}
