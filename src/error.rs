//! Error types for frame-aware selector resolution.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use frame_selectors::{Error, Result};
//!
//! async fn example(selectors: &FrameSelectors) -> Result<()> {
//!     if let Some(button) = selectors.query("#submit", None, None).await? {
//!         button.dispose().await?;
//!     }
//!     Ok(())
//! }
//! ```
//!
//! A query that finds nothing is not an error: it returns `None` or an empty
//! list so callers can poll again. Errors mean a malformed request or a
//! broken environment.
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Selector | [`Error::InvalidSelector`], [`Error::InvalidFrameUsage`], [`Error::UnexpectedNonFrameElement`] |
//! | Resolution | [`Error::FrameNotFound`], [`Error::SessionNotFound`] |
//! | Configuration | [`Error::Config`] |
//! | Connection | [`Error::Connection`], [`Error::ConnectionTimeout`], [`Error::ConnectionClosed`] |
//! | Protocol | [`Error::Protocol`], [`Error::ScriptError`], [`Error::RequestTimeout`] |
//! | External | [`Error::Io`], [`Error::Json`], [`Error::WebSocket`], [`Error::Url`] |

// ============================================================================
// Imports
// ============================================================================

use std::io::Error as IoError;
use std::result::Result as StdResult;

use thiserror::Error;
use tokio::sync::oneshot::error::RecvError;
use tokio_tungstenite::tungstenite::Error as WsError;

use crate::identifiers::{FrameId, RequestId};

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// Each variant includes relevant context for debugging.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Selector Errors
    // ========================================================================
    /// Selector grammar violation.
    ///
    /// Raised at parse time, never retried.
    #[error("Invalid selector: {message}")]
    InvalidSelector {
        /// Description of the grammar violation.
        message: String,
    },

    /// Frame-crossing marker nested inside a composite selector.
    ///
    /// Raised before any remote command is issued.
    #[error("Frame locators are not allowed inside composite locators, while querying \"{selector}\"")]
    InvalidFrameUsage {
        /// The full original selector.
        selector: String,
    },

    /// An intermediate frame chunk matched something other than a frame.
    #[error("Selector \"{selector}\" resolved to {preview}, <iframe> was expected")]
    UnexpectedNonFrameElement {
        /// The chunk that was resolved.
        selector: String,
        /// Human-readable preview of the matched element.
        preview: String,
    },

    // ========================================================================
    // Resolution Errors
    // ========================================================================
    /// The frame chain of a selector could not be resolved.
    ///
    /// Returned only by APIs that cannot express "nothing yet" as a value.
    #[error("Failed to find frame for selector \"{selector}\"")]
    FrameNotFound {
        /// The full original selector.
        selector: String,
    },

    /// No session for a frame, even after the main-frame fallback.
    #[error("No session for frame {frame_id}")]
    SessionNotFound {
        /// The frame whose session was looked up.
        frame_id: FrameId,
    },

    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when engine or transport configuration is invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    // ========================================================================
    // Connection Errors
    // ========================================================================
    /// WebSocket connection failed.
    #[error("Connection failed: {message}")]
    Connection {
        /// Description of the connection error.
        message: String,
    },

    /// Connection timeout.
    #[error("Connection timeout after {timeout_ms}ms")]
    ConnectionTimeout {
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    /// WebSocket connection closed unexpectedly.
    #[error("Connection closed")]
    ConnectionClosed,

    // ========================================================================
    // Protocol Errors
    // ========================================================================
    /// Protocol violation or unexpected response.
    #[error("Protocol error: {message}")]
    Protocol {
        /// Description of the protocol violation.
        message: String,
    },

    /// Evaluation inside a page context threw.
    #[error("Script error: {message}")]
    ScriptError {
        /// Error message from script execution.
        message: String,
    },

    /// Command request timeout.
    #[error("Request {request_id} timed out after {timeout_ms}ms")]
    RequestTimeout {
        /// The request ID that timed out.
        request_id: RequestId,
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] WsError),

    /// Endpoint URL could not be parsed.
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// Channel receive error.
    #[error("Channel closed")]
    ChannelClosed(#[from] RecvError),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates an invalid selector error.
    #[inline]
    pub fn invalid_selector(message: impl Into<String>) -> Self {
        Self::InvalidSelector {
            message: message.into(),
        }
    }

    /// Creates an invalid frame usage error.
    #[inline]
    pub fn invalid_frame_usage(selector: impl Into<String>) -> Self {
        Self::InvalidFrameUsage {
            selector: selector.into(),
        }
    }

    /// Creates an unexpected non-frame element error.
    #[inline]
    pub fn unexpected_non_frame(selector: impl Into<String>, preview: impl Into<String>) -> Self {
        Self::UnexpectedNonFrameElement {
            selector: selector.into(),
            preview: preview.into(),
        }
    }

    /// Creates a frame not found error.
    #[inline]
    pub fn frame_not_found(selector: impl Into<String>) -> Self {
        Self::FrameNotFound {
            selector: selector.into(),
        }
    }

    /// Creates a session not found error.
    #[inline]
    pub fn session_not_found(frame_id: FrameId) -> Self {
        Self::SessionNotFound { frame_id }
    }

    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a connection error.
    #[inline]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates a connection timeout error.
    #[inline]
    pub fn connection_timeout(timeout_ms: u64) -> Self {
        Self::ConnectionTimeout { timeout_ms }
    }

    /// Creates a protocol error.
    #[inline]
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Creates a script error.
    #[inline]
    pub fn script_error(message: impl Into<String>) -> Self {
        Self::ScriptError {
            message: message.into(),
        }
    }

    /// Creates a request timeout error.
    #[inline]
    pub fn request_timeout(request_id: RequestId, timeout_ms: u64) -> Self {
        Self::RequestTimeout {
            request_id,
            timeout_ms,
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if the caller built a bad selector.
    #[inline]
    #[must_use]
    pub fn is_selector_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidSelector { .. }
                | Self::InvalidFrameUsage { .. }
                | Self::UnexpectedNonFrameElement { .. }
        )
    }

    /// Returns `true` if this is a timeout error.
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::ConnectionTimeout { .. } | Self::RequestTimeout { .. }
        )
    }

    /// Returns `true` if this is a connection error.
    #[inline]
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::Connection { .. }
                | Self::ConnectionTimeout { .. }
                | Self::ConnectionClosed
                | Self::WebSocket(_)
        )
    }

    /// Returns `true` if this error is recoverable.
    ///
    /// Recoverable errors may succeed on retry.
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::ConnectionTimeout { .. } | Self::RequestTimeout { .. } | Self::FrameNotFound { .. }
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
