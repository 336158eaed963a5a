use regex::Regex;

use livelog_types::{LogLevel, Theme};

use crate::spans::{replace_outside_spans, sanitize};

/// Options for the annotation pipeline
#[derive(Clone, Copy, Debug, Default)]
pub struct FormatOptions {
    /// Also run the stack-trace highlighter (off in the default pipeline)
    pub stack_traces: bool,
}

/// Compiled annotation pipeline
///
/// All patterns are compiled once at construction; `format` is pure and can
/// be called from any thread.
pub struct LogFormatter {
    element_id: Regex,
    element_type: Regex,
    generic_pair: Regex,
    timestamp: Regex,
    fps: Regex,
    bracket: Regex,
    stack_at: Regex,
    stack_method: Regex,
    stack_type: Regex,
}

impl LogFormatter {
    pub fn new() -> Self {
        Self {
            element_id: Regex::new(r"Element:\s*(ID\w+)").unwrap(),
            element_type: Regex::new(r"Type:\s*([\w.]+)").unwrap(),
            // The value runs to the next comma or end of line; the leading
            // and trailing delimiters are captured and re-emitted because
            // this regex dialect has no look-around.
            generic_pair: Regex::new(r"(^|[\s,])([A-Z][\w\s]*?): *([^,\n]+?)(,|$)").unwrap(),
            timestamp: Regex::new(r"^(\d{2}:\d{2}:\d{2}(?:\.\d{3})?)").unwrap(),
            fps: Regex::new(r"\((\s*\d+\s*FPS\s*)\)").unwrap(),
            bracket: Regex::new(r"\[([^\]]*?)\]").unwrap(),
            stack_at: Regex::new(r"\bat\b").unwrap(),
            stack_method: Regex::new(r"([A-Za-z_]\w*)\(").unwrap(),
            stack_type: Regex::new(r"([A-Z]\w*\.\w+)").unwrap(),
        }
    }

    /// Run the default pipeline over one raw log line
    pub fn format(&self, raw: &str, level: LogLevel, theme: &Theme) -> String {
        self.format_with(raw, level, theme, FormatOptions::default())
    }

    /// Run the pipeline with explicit options
    pub fn format_with(
        &self,
        raw: &str,
        level: LogLevel,
        theme: &Theme,
        options: FormatOptions,
    ) -> String {
        if raw.is_empty() {
            return String::new();
        }

        let mut text = self.highlight_fields(raw, theme);
        text = self.highlight_timestamp(&text, theme);
        text = self.highlight_fps(&text, theme);
        text = self.embolden_brackets(&text);
        if options.stack_traces {
            text = self.highlight_stack_trace(&text, theme);
        }
        if let Some(color) = theme.text_color(level) {
            text = format!("<color={color}>{text}</color>");
        }
        if let (Some(tag), Some(tag_color)) = (level.tag(), theme.tag_color(level)) {
            text = format!("<color={tag_color}><b>[{tag}]</b></color> {text}");
        }

        sanitize(&text)
    }

    /// Highlight `Element: ID…`, `Type: Namespace.Type` and generic
    /// `Name: value` fragments
    pub fn highlight_fields(&self, text: &str, theme: &Theme) -> String {
        let text = replace_outside_spans(text, &self.element_id, |caps| {
            format!("Element: <color={}>{}</color>", theme.element_id, &caps[1])
        });
        let text = replace_outside_spans(&text, &self.element_type, |caps| {
            format!("Type: <color={}>{}</color>", theme.element_type, &caps[1])
        });
        replace_outside_spans(&text, &self.generic_pair, |caps| {
            format!(
                "{}<color={}>{}:</color> <color={}>{}</color>{}",
                &caps[1],
                theme.element_property,
                caps[2].trim_end(),
                theme.element_value,
                caps[3].trim(),
                &caps[4],
            )
        })
    }

    /// Wrap a leading `HH:MM:SS` or `HH:MM:SS.mmm` prefix
    pub fn highlight_timestamp(&self, text: &str, theme: &Theme) -> String {
        self.timestamp
            .replace(text, |caps: &regex::Captures| {
                format!("<b><color={}>[{}]</color></b>", theme.timestamp, &caps[1])
            })
            .into_owned()
    }

    /// Wrap `(<n> FPS)` fragments
    pub fn highlight_fps(&self, text: &str, theme: &Theme) -> String {
        replace_outside_spans(text, &self.fps, |caps| {
            format!("<b><color={}>[{}]</color></b>", theme.fps, &caps[1])
        })
    }

    /// Embolden remaining `[...]` fragments
    pub fn embolden_brackets(&self, text: &str) -> String {
        replace_outside_spans(text, &self.bracket, |caps| format!("<b>[{}]</b>", &caps[1]))
    }

    /// Highlight `at`, method calls and dotted type names in a
    /// pre-formatted stack trace
    pub fn highlight_stack_trace(&self, text: &str, theme: &Theme) -> String {
        let text = replace_outside_spans(text, &self.stack_at, |_| {
            format!("<color={}>at</color>", theme.stack_at)
        });
        let text = replace_outside_spans(&text, &self.stack_method, |caps| {
            format!("<color={}>{}</color>(", theme.stack_method, &caps[1])
        });
        replace_outside_spans(&text, &self.stack_type, |caps| {
            format!("<color={}>{}</color>", theme.stack_type, &caps[1])
        })
    }
}

impl Default for LogFormatter {
    fn default() -> Self {
        Self::new()
    }
}
