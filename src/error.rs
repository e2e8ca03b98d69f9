// Error taxonomy for the API client. The UI layer wraps these in anyhow.

use reqwest::StatusCode;
use serde_json::Value;
use std::fmt;
use std::path::PathBuf;

/// Body of a failed response. Servers usually answer with JSON, but a
/// proxy or a crashed handler may not; in that case the raw text is kept.
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorBody {
    Json(Value),
    Text(String),
}

impl ErrorBody {
    pub fn parse(text: String) -> Self {
        match serde_json::from_str(&text) {
            Ok(value) => ErrorBody::Json(value),
            Err(_) => ErrorBody::Text(text),
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            ErrorBody::Json(v) => Some(v),
            ErrorBody::Text(_) => None,
        }
    }
}

impl fmt::Display for ErrorBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorBody::Json(v) => match serde_json::to_string_pretty(v) {
                Ok(s) => f.write_str(&s),
                Err(_) => write!(f, "{}", v),
            },
            ErrorBody::Text(t) => f.write_str(t),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("server returned {status}:\n{body}")]
    Server { status: StatusCode, body: ErrorBody },

    /// A success status whose body is not the JSON we expected. The raw
    /// text is kept so the caller can still show it.
    #[error("server returned {status} with an unexpected body: {body}")]
    MalformedResponse { status: StatusCode, body: String },

    #[error("failed to read {}: {source}", .path.display())]
    LocalFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid client configuration: {0}")]
    InvalidConfig(String),
}

impl ClientError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, ClientError::Transport(e) if e.is_timeout())
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Server { status, .. } | ClientError::MalformedResponse { status, .. } => {
                Some(*status)
            }
            ClientError::Transport(e) => e.status(),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
