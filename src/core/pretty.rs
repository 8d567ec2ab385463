//! Human-readable rendering of merged records
//!
//! Renders a flat record mapping into a line of the shape
//! `[time] LEVEL (name/pid on hostname): message`, followed by the
//! remaining fields either as indented `key: value` lines or as one inline
//! JSON object.

use super::log_context::{FieldValue, LogContext};
use super::log_level::LogLevel;
use super::timestamp::RECORD_TIME_FORMAT;
use chrono::NaiveDateTime;
use std::fmt::{self, Write as _};
use std::sync::Arc;

/// Renders a merged mapping; `None` drops the write
pub type Prettifier = Arc<dyn Fn(&LogContext) -> Option<String> + Send + Sync>;

/// Custom message renderer: `(record, message_key) -> message`
pub type MessageFormatFn = Arc<dyn Fn(&LogContext, &str) -> String + Send + Sync>;

/// Default `translate_time` of file output
pub const FILE_TRANSLATE_TIME: &str = "%Y-%m-%d %-H:%M:%S";

const HEADER_KEYS: &[&str] = &["level", "time", "pid", "hostname", "name"];

/// How the message part of a line is rendered
#[derive(Clone, Default)]
pub enum MessageFormat {
    /// Message value as is
    #[default]
    Plain,
    /// Trimmed message followed by a space
    Message,
    /// Message followed by request, user, file and stack details
    ErrorReport,
    Custom(MessageFormatFn),
}

impl fmt::Debug for MessageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageFormat::Plain => write!(f, "Plain"),
            MessageFormat::Message => write!(f, "Message"),
            MessageFormat::ErrorReport => write!(f, "ErrorReport"),
            MessageFormat::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

impl MessageFormat {
    fn render(&self, obj: &LogContext, message_key: &str) -> String {
        let message = obj.get(message_key).map(FieldValue::to_string).unwrap_or_default();
        match self {
            MessageFormat::Plain => message,
            MessageFormat::Message => format!("{} ", message.trim()),
            MessageFormat::ErrorReport => render_error_report(obj, &message),
            MessageFormat::Custom(render) => render(obj, message_key),
        }
    }
}

fn render_error_report(obj: &LogContext, message: &str) -> String {
    if !obj.contains_key("errorType") {
        return format!(" {} ", message);
    }
    let text = |key: &str| obj.get(key).map(FieldValue::to_string).unwrap_or_default();
    let (req, server, user) = match obj.get("reqInfo").and_then(FieldValue::as_object) {
        Some(info) => (
            info.get("req").cloned().unwrap_or(FieldValue::Null),
            info.get("server").cloned().unwrap_or(FieldValue::Null),
            info.get("user").cloned().unwrap_or(FieldValue::Null),
        ),
        None => (
            FieldValue::from(""),
            FieldValue::from(""),
            FieldValue::from(""),
        ),
    };
    format!(
        concat!(
            " {} \n Request= {} \n Server = {} \n User = {} \n Message = {} \n",
            " File = {} {} \n ErrorType = {} \n Stack = {}",
        ),
        message,
        req.to_json_value(),
        server.to_json_value(),
        user,
        message,
        text("fileName"),
        text("lineNumber"),
        text("errorType"),
        text("stack"),
    )
}

/// Options of the default prettifier
#[derive(Debug, Clone)]
pub struct PrettyOptions {
    pub colorize: bool,
    pub single_line: bool,
    pub level_first: bool,
    /// strftime pattern applied to the `time` key; `None` keeps it verbatim
    pub translate_time: Option<String>,
    pub ignore: Vec<String>,
    pub hide_object: bool,
    pub message_key: String,
    pub message_format: MessageFormat,
}

impl Default for PrettyOptions {
    fn default() -> Self {
        Self {
            colorize: false,
            single_line: false,
            level_first: false,
            translate_time: None,
            ignore: Vec::new(),
            hide_object: false,
            message_key: super::instance::DEFAULT_MESSAGE_KEY.to_string(),
            message_format: MessageFormat::Plain,
        }
    }
}

impl PrettyOptions {
    /// Base options of file output
    #[must_use]
    pub fn file_defaults() -> Self {
        Self {
            colorize: true,
            translate_time: Some(FILE_TRANSLATE_TIME.to_string()),
            ignore: vec!["logLevel".to_string(), "logger".to_string()],
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_colorize(mut self, colorize: bool) -> Self {
        self.colorize = colorize;
        self
    }

    #[must_use]
    pub fn with_single_line(mut self, single_line: bool) -> Self {
        self.single_line = single_line;
        self
    }

    #[must_use]
    pub fn with_hide_object(mut self, hide_object: bool) -> Self {
        self.hide_object = hide_object;
        self
    }

    #[must_use]
    pub fn with_message_format(mut self, format: MessageFormat) -> Self {
        self.message_format = format;
        self
    }

    #[must_use]
    pub fn with_ignore<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignore = keys.into_iter().map(Into::into).collect();
        self
    }

    /// Render `obj` into one newline-terminated entry
    pub fn prettify(&self, obj: &LogContext) -> Option<String> {
        let mut line = String::with_capacity(128);

        let time = obj.get("time").map(|t| self.render_time(t));
        let level = obj.get("level").map(|l| self.render_level(l));

        if self.level_first {
            push_part(&mut line, level);
            push_part(&mut line, time.map(|t| format!("[{}]", t)));
        } else {
            push_part(&mut line, time.map(|t| format!("[{}]", t)));
            push_part(&mut line, level);
        }

        if let Some(origin) = render_origin(obj) {
            push_part(&mut line, Some(origin));
        }
        if !line.is_empty() {
            line.push(':');
        }

        let message = self.message_format.render(obj, &self.message_key);
        if !message.is_empty() {
            if !line.is_empty() {
                line.push(' ');
            }
            line.push_str(&message);
        }

        if !self.hide_object {
            let rest: LogContext = obj
                .iter()
                .filter(|(key, _)| self.is_body_key(key))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
            if !rest.is_empty() {
                if self.single_line {
                    line.push(' ');
                    line.push_str(&rest.to_json_value().to_string());
                } else {
                    for (key, value) in rest.iter() {
                        line.push_str("\n    ");
                        line.push_str(key);
                        line.push_str(": ");
                        line.push_str(&render_value(value));
                    }
                }
            }
        }

        line.push('\n');
        Some(line)
    }

    /// Wrap these options into a shareable prettifier
    pub fn into_prettifier(self) -> Prettifier {
        Arc::new(move |obj: &LogContext| self.prettify(obj))
    }

    fn is_body_key(&self, key: &str) -> bool {
        !HEADER_KEYS.contains(&key)
            && key != self.message_key
            && !self.ignore.iter().any(|ignored| ignored == key)
    }

    fn render_time(&self, time: &FieldValue) -> String {
        let raw = time.to_string();
        match self.translate_time {
            Some(ref pattern) => {
                let Ok(parsed) = NaiveDateTime::parse_from_str(&raw, RECORD_TIME_FORMAT) else {
                    return raw;
                };
                // an unrenderable pattern keeps the record time verbatim
                let mut rendered = String::new();
                match write!(rendered, "{}", parsed.format(pattern)) {
                    Ok(()) => rendered,
                    Err(_) => raw,
                }
            }
            None => raw,
        }
    }

    fn render_level(&self, level: &FieldValue) -> String {
        let label = level.to_string().to_uppercase();
        let padded = format!("{:5}", label);
        if !self.colorize {
            return padded;
        }
        #[cfg(feature = "console")]
        {
            use colored::Colorize;
            if let Ok(parsed) = label.parse::<LogLevel>() {
                return padded.color(parsed.color_code()).to_string();
            }
        }
        padded
    }
}

fn push_part(line: &mut String, part: Option<String>) {
    if let Some(part) = part {
        if !line.is_empty() {
            line.push(' ');
        }
        line.push_str(&part);
    }
}

fn render_origin(obj: &LogContext) -> Option<String> {
    let name = obj.get("name").map(FieldValue::to_string);
    let pid = obj.get("pid").map(FieldValue::to_string);
    let hostname = obj.get("hostname").map(FieldValue::to_string);

    let mut origin = match (name, pid) {
        (Some(name), Some(pid)) => format!("{}/{}", name, pid),
        (Some(name), None) => name,
        (None, Some(pid)) => pid,
        (None, None) => String::new(),
    };
    if let Some(hostname) = hostname {
        if origin.is_empty() {
            origin = hostname;
        } else {
            origin = format!("{} on {}", origin, hostname);
        }
    }
    if origin.is_empty() {
        None
    } else {
        Some(format!("({})", origin))
    }
}

fn render_value(value: &FieldValue) -> String {
    match value {
        FieldValue::Object(_) | FieldValue::Array(_) => {
            serde_json::to_string_pretty(&value.to_json_value())
                .unwrap_or_default()
                .replace('\n', "\n    ")
        }
        other => other.to_string(),
    }
}
