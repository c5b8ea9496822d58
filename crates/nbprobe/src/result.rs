//! Result and error types for nbprobe.

use thiserror::Error;

/// Result type for nbprobe operations
pub type LabResult<T> = Result<T, LabError>;

/// Errors that can occur while driving the notebook UI
#[derive(Debug, Error)]
pub enum LabError {
    /// A single element was required but the selector matched nothing
    #[error("No element matches selector {selector}")]
    NotFound {
        /// Selector (and index, when one was requested) that failed
        selector: String,
    },

    /// A wait predicate never became true within its budget
    #[error("Timed out after {ms}ms: {message}")]
    Timeout {
        /// Budget in milliseconds
        ms: u64,
        /// Caller-supplied or default diagnostic
        message: String,
    },

    /// Element handle no longer refers to a node in the page
    #[error("Stale element handle {id}")]
    StaleElement {
        /// Handle id
        id: String,
    },

    /// The driver cannot evaluate this kind of selector in this position
    #[error("Unsupported selector {selector}")]
    UnsupportedSelector {
        /// Selector text
        selector: String,
    },

    /// Transport or protocol error reported by the browser driver
    #[error("Driver error: {message}")]
    Driver {
        /// Error message
        message: String,
    },

    /// Browser launch error
    #[error("Failed to launch browser: {message}")]
    BrowserLaunchError {
        /// Error message
        message: String,
    },

    /// Navigation error
    #[error("Navigation to {url} failed: {message}")]
    NavigationError {
        /// URL that failed
        url: String,
        /// Error message
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl LabError {
    /// Create a not-found error
    #[must_use]
    pub fn not_found(selector: impl std::fmt::Display) -> Self {
        Self::NotFound {
            selector: selector.to_string(),
        }
    }

    /// Create a driver error
    #[must_use]
    pub fn driver(message: impl Into<String>) -> Self {
        Self::Driver {
            message: message.into(),
        }
    }

    /// Lookup failures that a later poll may resolve on its own.
    ///
    /// Transport errors are not transient: a lost connection will not come
    /// back by polling again.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::StaleElement { .. })
    }

    /// Check if this is a timeout
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
