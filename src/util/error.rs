// LogPoller - util/error.rs
//
// Typed error hierarchy with context-preserving error chains.
// Fetch and render failures are per-tick and never stop the poll schedule;
// config and endpoint errors are reported at startup.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Top-level error type for all LogPoller operations.
/// Errors are categorised by the subsystem that produced them.
#[derive(Debug)]
pub enum LogPollerError {
    /// Fetching a snapshot from the endpoint failed.
    Fetch(FetchError),

    /// Writing a snapshot into the display region failed.
    Render(RenderError),

    /// Configuration loading or validation failed.
    Config(ConfigError),
}

impl fmt::Display for LogPollerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fetch(e) => write!(f, "Fetch error: {e}"),
            Self::Render(e) => write!(f, "Render error: {e}"),
            Self::Config(e) => write!(f, "Configuration error: {e}"),
        }
    }
}

impl std::error::Error for LogPollerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Fetch(e) => Some(e),
            Self::Render(e) => Some(e),
            Self::Config(e) => Some(e),
        }
    }
}

// ---------------------------------------------------------------------------
// Fetch errors
// ---------------------------------------------------------------------------

/// Errors produced by one fetch of the log snapshot.
///
/// Every variant except `InvalidEndpoint` is recovered locally: the tick
/// skips its render and the next tick retries unconditionally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The endpoint string is not a usable http(s) URL.
    InvalidEndpoint { endpoint: String, reason: String },

    /// The request could not be sent or the connection failed.
    Network { endpoint: String, reason: String },

    /// No response arrived within the request timeout.
    Timeout { endpoint: String, timeout_ms: u64 },

    /// The server answered with a non-2xx status.
    Server { endpoint: String, status: u16 },

    /// The response body could not be read or decoded.
    Body { endpoint: String, reason: String },

    /// The response body exceeds the snapshot size cap.
    BodyTooLarge {
        endpoint: String,
        size: usize,
        max_size: usize,
    },
}

impl FetchError {
    /// Short label shown in the status bar ("log unavailable: <label>").
    pub fn label(&self) -> String {
        match self {
            Self::InvalidEndpoint { .. } => "invalid endpoint".to_string(),
            Self::Network { .. } => "network error".to_string(),
            Self::Timeout { .. } => "request timed out".to_string(),
            Self::Server { status, .. } => format!("HTTP {status}"),
            Self::Body { .. } => "unreadable response".to_string(),
            Self::BodyTooLarge { .. } => "response too large".to_string(),
        }
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidEndpoint { endpoint, reason } => {
                write!(f, "Invalid endpoint '{endpoint}': {reason}")
            }
            Self::Network { endpoint, reason } => {
                write!(f, "Request to '{endpoint}' failed: {reason}")
            }
            Self::Timeout {
                endpoint,
                timeout_ms,
            } => write!(
                f,
                "Request to '{endpoint}' timed out after {timeout_ms} ms"
            ),
            Self::Server { endpoint, status } => {
                write!(f, "'{endpoint}' answered with HTTP status {status}")
            }
            Self::Body { endpoint, reason } => {
                write!(f, "Could not read response body from '{endpoint}': {reason}")
            }
            Self::BodyTooLarge {
                endpoint,
                size,
                max_size,
            } => write!(
                f,
                "Response from '{endpoint}' is {size} bytes, exceeds maximum of {max_size} bytes"
            ),
        }
    }
}

impl std::error::Error for FetchError {}

impl From<FetchError> for LogPollerError {
    fn from(e: FetchError) -> Self {
        Self::Fetch(e)
    }
}

// ---------------------------------------------------------------------------
// Render errors
// ---------------------------------------------------------------------------

/// Errors produced while reading or replacing a display region's content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// The region no longer exists (window closed, receiver dropped).
    Detached { region: String },

    /// Writing to the region's output failed.
    Write { region: String, reason: String },
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Detached { region } => {
                write!(f, "Display region '{region}' is detached")
            }
            Self::Write { region, reason } => {
                write!(f, "Could not write to display region '{region}': {reason}")
            }
        }
    }
}

impl std::error::Error for RenderError {}

impl From<RenderError> for LogPollerError {
    fn from(e: RenderError) -> Self {
        Self::Render(e)
    }
}

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

/// Errors related to configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    /// TOML parsing failed.
    TomlParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// A config value is out of the allowed range.
    ValueOutOfRange {
        field: String,
        value: String,
        expected: String,
    },

    /// I/O error reading config file.
    Io { path: PathBuf, source: io::Error },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TomlParse { path, source } => {
                write!(f, "Config parse error '{}': {source}", path.display())
            }
            Self::ValueOutOfRange {
                field,
                value,
                expected,
            } => write!(
                f,
                "Config '{field}' = '{value}' is out of range. Expected: {expected}"
            ),
            Self::Io { path, source } => {
                write!(f, "Config I/O error '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::TomlParse { source, .. } => Some(source),
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<ConfigError> for LogPollerError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

/// Convenience type alias for LogPoller results.
pub type Result<T> = std::result::Result<T, LogPollerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_error_label_includes_status() {
        let e = FetchError::Server {
            endpoint: "http://localhost/log_stream".to_string(),
            status: 503,
        };
        assert_eq!(e.label(), "HTTP 503");
        assert!(e.to_string().contains("503"));
    }

    #[test]
    fn test_top_level_error_preserves_source() {
        use std::error::Error;
        let e: LogPollerError = RenderError::Detached {
            region: "log view".to_string(),
        }
        .into();
        assert!(e.to_string().starts_with("Render error:"));
        assert!(e.source().is_some());
    }
}
