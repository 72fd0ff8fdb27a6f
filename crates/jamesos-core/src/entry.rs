use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ids::{LogId, SessionId};

/// Severity / kind tag for a log entry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LogLevel {
    #[default]
    Info,
    Working,
    Success,
    Warn,
    Error,
    LlmRequest,
    LlmResponse,
    ToolCall,
    FileOp,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Working => write!(f, "working"),
            Self::Success => write!(f, "success"),
            Self::Warn => write!(f, "warn"),
            Self::Error => write!(f, "error"),
            Self::LlmRequest => write!(f, "llm-request"),
            Self::LlmResponse => write!(f, "llm-response"),
            Self::ToolCall => write!(f, "tool-call"),
            Self::FileOp => write!(f, "file-op"),
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "info" => Ok(Self::Info),
            "working" => Ok(Self::Working),
            "success" => Ok(Self::Success),
            "warn" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            "llm-request" => Ok(Self::LlmRequest),
            "llm-response" => Ok(Self::LlmResponse),
            "tool-call" => Ok(Self::ToolCall),
            "file-op" => Ok(Self::FileOp),
            other => Err(format!("unknown log level: {other}")),
        }
    }
}

/// What part of the system an entry describes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LogCategory {
    #[default]
    System,
    Task,
    File,
    Command,
    Api,
    Build,
    Llm,
    UserRequest,
    Tool,
    Response,
}

impl std::fmt::Display for LogCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::System => write!(f, "system"),
            Self::Task => write!(f, "task"),
            Self::File => write!(f, "file"),
            Self::Command => write!(f, "command"),
            Self::Api => write!(f, "api"),
            Self::Build => write!(f, "build"),
            Self::Llm => write!(f, "llm"),
            Self::UserRequest => write!(f, "user-request"),
            Self::Tool => write!(f, "tool"),
            Self::Response => write!(f, "response"),
        }
    }
}

impl std::str::FromStr for LogCategory {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "system" => Ok(Self::System),
            "task" => Ok(Self::Task),
            "file" => Ok(Self::File),
            "command" => Ok(Self::Command),
            "api" => Ok(Self::Api),
            "build" => Ok(Self::Build),
            "llm" => Ok(Self::Llm),
            "user-request" => Ok(Self::UserRequest),
            "tool" => Ok(Self::Tool),
            "response" => Ok(Self::Response),
            other => Err(format!("unknown log category: {other}")),
        }
    }
}

/// One recorded activity event.
///
/// Entries are immutable after creation. `parent_id` links children to the
/// entry they elaborate on; the link is a plain back-reference, not an owned
/// tree. `parent_id` is always present on the wire (`null` for top-level
/// entries) so pollers can filter without a missing-key case.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub id: LogId,
    pub session_id: SessionId,
    #[serde(default)]
    pub parent_id: Option<LogId>,
    pub timestamp: String,
    pub level: LogLevel,
    pub category: LogCategory,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
}

/// Insertion payload. Everything is optional except that one of `message` or
/// `content` must be non-empty. Unknown keys and caller-supplied timestamps
/// are ignored; unrecognized level/category strings fall back to the default.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLog {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub session_id: Option<SessionId>,
    #[serde(default)]
    pub parent_id: Option<LogId>,
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub metadata: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub duration: Option<f64>,
}

impl NewLog {
    /// The effective level, defaulting on absence or an unrecognized value.
    pub fn level(&self) -> LogLevel {
        self.level
            .as_deref()
            .and_then(|s| s.parse().ok())
            .unwrap_or_default()
    }

    /// The effective category, defaulting on absence or an unrecognized value.
    pub fn category(&self) -> LogCategory {
        self.category
            .as_deref()
            .and_then(|s| s.parse().ok())
            .unwrap_or_default()
    }

    /// Message text, falling back to `content`. Empty strings count as absent.
    pub fn resolve_message(&self) -> Option<&str> {
        self.message
            .as_deref()
            .filter(|s| !s.is_empty())
            .or_else(|| self.content.as_deref().filter(|s| !s.is_empty()))
    }
}
