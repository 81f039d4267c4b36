use std::path::PathBuf;

use reqwest::StatusCode;

/// Longest response body echoed back inside an error message.
const MAX_ERROR_BODY_LENGTH: usize = 500;

/// Errors returned by the storage client.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Connection, TLS, or body-read failure from the HTTP transport.
    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The identity service refused the credentials or sent an unusable reply.
    #[error("Authentication failed{}: {message}", status_suffix(.status))]
    Auth {
        status: Option<StatusCode>,
        message: String,
    },

    /// The storage service answered with a status the operation does not accept.
    #[error("Unexpected status {status}: {}", truncate_body(.body))]
    UnexpectedStatus { status: StatusCode, body: String },

    #[error("I/O error on {}: {source}", .path.display())]
    LocalIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file {}: {message}", .path.display())]
    Config { path: PathBuf, message: String },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl StorageError {
    pub(crate) fn auth(status: Option<StatusCode>, message: impl Into<String>) -> Self {
        StorageError::Auth {
            status,
            message: message.into(),
        }
    }

    pub(crate) fn local_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StorageError::LocalIo {
            path: path.into(),
            source,
        }
    }

    /// HTTP status carried by this error, if the server answered at all.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            StorageError::Auth { status, .. } => *status,
            StorageError::UnexpectedStatus { status, .. } => Some(*status),
            StorageError::Transport(e) => e.status(),
            _ => None,
        }
    }
}

fn status_suffix(status: &Option<StatusCode>) -> String {
    match status {
        Some(status) => format!(" ({status})"),
        None => String::new(),
    }
}

fn truncate_body(body: &str) -> String {
    if body.len() <= MAX_ERROR_BODY_LENGTH {
        return body.to_string();
    }
    let mut end = MAX_ERROR_BODY_LENGTH;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
}
