//! Shared types for livelog
//!
//! This crate contains data structures used across multiple livelog crates.

use serde::{Deserialize, Serialize};

// ============================================================================
// Log Events
// ============================================================================

/// Log severity level
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LogLevel {
    /// Unleveled line (plain output)
    #[default]
    None,
    Debug,
    Info,
    Warning,
    Error,
}

impl LogLevel {
    /// Parse a level from common tag spellings
    pub fn from_tag(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "DEBUG" | "DBG" => Self::Debug,
            "INFO" | "INF" | "INFORMATION" => Self::Info,
            "WARNING" | "WARN" | "WRN" => Self::Warning,
            "ERROR" | "ERR" => Self::Error,
            _ => Self::None,
        }
    }

    /// Canonical tag text, `None` for unleveled lines
    pub fn tag(&self) -> Option<&'static str> {
        match self {
            Self::None => None,
            Self::Debug => Some("DEBUG"),
            Self::Info => Some("INFO"),
            Self::Warning => Some("WARNING"),
            Self::Error => Some("ERROR"),
        }
    }
}

/// A single raw log event as delivered by the host's log hook
#[derive(Clone, Debug)]
pub struct LogEvent {
    /// Original log text, unformatted
    pub raw: String,

    /// Severity reported by the hook
    pub level: LogLevel,
}

impl LogEvent {
    pub fn new(raw: impl Into<String>, level: LogLevel) -> Self {
        Self {
            raw: raw.into(),
            level,
        }
    }
}

// ============================================================================
// Theme
// ============================================================================

/// Semantic color roles used by the annotation pipeline
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorRole {
    Timestamp,
    DebugTag,
    DebugText,
    InfoTag,
    InfoText,
    WarningTag,
    WarningText,
    ErrorTag,
    ErrorText,
    StackAt,
    StackMethod,
    StackType,
    Fps,
    ElementId,
    ElementType,
    ElementProperty,
    ElementValue,
}

/// Color configuration for the annotation pipeline
///
/// Each role maps to a `#RRGGBB` hex string. Lines are always formatted
/// against a cloned snapshot, so a concurrent color change never produces a
/// line mixing old and new colors.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Theme {
    pub timestamp: String,
    pub debug_tag: String,
    pub debug_text: String,
    pub info_tag: String,
    pub info_text: String,
    pub warning_tag: String,
    pub warning_text: String,
    pub error_tag: String,
    pub error_text: String,
    pub stack_at: String,
    pub stack_method: String,
    pub stack_type: String,
    pub fps: String,
    pub element_id: String,
    pub element_type: String,
    pub element_property: String,
    pub element_value: String,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            timestamp: "#B5B5B5".into(),
            debug_tag: "#C5A3FF".into(),
            debug_text: "#A18DBF".into(),
            info_tag: "#A8E6CF".into(),
            info_text: "#8FC5AA".into(),
            warning_tag: "#FFD3B6".into(),
            warning_text: "#E6B89C".into(),
            error_tag: "#FFAAA5".into(),
            error_text: "#E69B95".into(),
            stack_at: "#B5B5B5".into(),
            stack_method: "#B5C1FF".into(),
            stack_type: "#98D8D8".into(),
            fps: "#A4C2F4".into(),
            element_id: "#F8C8DC".into(),
            element_type: "#98D8D8".into(),
            element_property: "#E0BBE4".into(),
            element_value: "#B5E5FF".into(),
        }
    }
}

impl Theme {
    /// Color for a severity tag prefix, `None` for unleveled lines
    pub fn tag_color(&self, level: LogLevel) -> Option<&str> {
        match level {
            LogLevel::None => None,
            LogLevel::Debug => Some(&self.debug_tag),
            LogLevel::Info => Some(&self.info_tag),
            LogLevel::Warning => Some(&self.warning_tag),
            LogLevel::Error => Some(&self.error_tag),
        }
    }

    /// Color for a line's message text, `None` for unleveled lines
    pub fn text_color(&self, level: LogLevel) -> Option<&str> {
        match level {
            LogLevel::None => None,
            LogLevel::Debug => Some(&self.debug_text),
            LogLevel::Info => Some(&self.info_text),
            LogLevel::Warning => Some(&self.warning_text),
            LogLevel::Error => Some(&self.error_text),
        }
    }

    pub fn color(&self, role: ColorRole) -> &str {
        match role {
            ColorRole::Timestamp => &self.timestamp,
            ColorRole::DebugTag => &self.debug_tag,
            ColorRole::DebugText => &self.debug_text,
            ColorRole::InfoTag => &self.info_tag,
            ColorRole::InfoText => &self.info_text,
            ColorRole::WarningTag => &self.warning_tag,
            ColorRole::WarningText => &self.warning_text,
            ColorRole::ErrorTag => &self.error_tag,
            ColorRole::ErrorText => &self.error_text,
            ColorRole::StackAt => &self.stack_at,
            ColorRole::StackMethod => &self.stack_method,
            ColorRole::StackType => &self.stack_type,
            ColorRole::Fps => &self.fps,
            ColorRole::ElementId => &self.element_id,
            ColorRole::ElementType => &self.element_type,
            ColorRole::ElementProperty => &self.element_property,
            ColorRole::ElementValue => &self.element_value,
        }
    }

    pub fn set_color(&mut self, role: ColorRole, value: impl Into<String>) {
        let slot = match role {
            ColorRole::Timestamp => &mut self.timestamp,
            ColorRole::DebugTag => &mut self.debug_tag,
            ColorRole::DebugText => &mut self.debug_text,
            ColorRole::InfoTag => &mut self.info_tag,
            ColorRole::InfoText => &mut self.info_text,
            ColorRole::WarningTag => &mut self.warning_tag,
            ColorRole::WarningText => &mut self.warning_text,
            ColorRole::ErrorTag => &mut self.error_tag,
            ColorRole::ErrorText => &mut self.error_text,
            ColorRole::StackAt => &mut self.stack_at,
            ColorRole::StackMethod => &mut self.stack_method,
            ColorRole::StackType => &mut self.stack_type,
            ColorRole::Fps => &mut self.fps,
            ColorRole::ElementId => &mut self.element_id,
            ColorRole::ElementType => &mut self.element_type,
            ColorRole::ElementProperty => &mut self.element_property,
            ColorRole::ElementValue => &mut self.element_value,
        };
        *slot = value.into();
    }
}

/// Check that a string is a `#RRGGBB` hex color
pub fn is_hex_color(s: &str) -> bool {
    let Some(digits) = s.strip_prefix('#') else {
        return false;
    };
    digits.len() == 6 && digits.chars().all(|c| c.is_ascii_hexdigit())
}

// ============================================================================
// Stream Settings
// ============================================================================

/// Tunable settings for per-identity log streams
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamSettings {
    /// Maximum number of formatted lines kept per identity
    pub max_lines: usize,

    /// Publish throttle: 0 pushes every update, n pushes every n-th update
    pub update_period: u64,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            max_lines: 500,
            update_period: 0,
        }
    }
}
