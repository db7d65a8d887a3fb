//! Frame Selectors - frame-aware, shadow-piercing selector resolution.
//!
//! This library resolves chained selectors against a live page through a
//! remote DevTools session. Selectors may cross `<iframe>` boundaries and,
//! when the page's own query engine comes back empty, reach elements inside
//! closed shadow roots that page scripts cannot see.
//!
//! # Architecture
//!
//! The engine sits between a caller and a remote browsing session:
//!
//! - **Selector layer**: parses `a >> internal:control=enter-frame >> b`
//!   into per-frame chunks and validates them before any remote call
//! - **Frame resolver**: walks the chunks hop by hop, entering each frame
//! - **Shadow traversal**: re-evaluates the chain outside the page using
//!   `DOM.describeNode` (pierce) and `DOM.resolveNode`, keying nodes by
//!   backend id
//! - **Adoption**: hands every result back in the frame's main context
//!
//! The host supplies the browser through four traits in [`runtime`]; the
//! [`transport`] module provides a WebSocket [`Connection`] that implements
//! the session side.
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//!
//! use frame_selectors::{FrameSelectors, QueryOptions, Result, SelectorRegistry};
//!
//! async fn click_target(frame: Arc<dyn Frame>, page: Arc<dyn PageDelegate>) -> Result<()> {
//!     let selectors = FrameSelectors::new(frame, page, Arc::new(SelectorRegistry::new()));
//!
//!     let button = selectors
//!         .query(
//!             "#outer-frame >> internal:control=enter-frame >> #inner-button",
//!             &QueryOptions::new(),
//!             None,
//!         )
//!         .await?;
//!
//!     if let Some(button) = button {
//!         // ... use the handle ...
//!         button.dispose().await?;
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`engine`] | [`FrameSelectors`], frame resolution, shadow traversal |
//! | [`selector`] | Selector grammar, frame chunking, engine registry |
//! | [`runtime`] | Collaborator traits, handles, gateway |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Type-safe ID wrappers |
//! | [`protocol`] | DevTools message types |
//! | [`transport`] | WebSocket transport layer |

// ============================================================================
// Modules
// ============================================================================

/// Frame-aware selector resolution.
///
/// - [`FrameSelectors`] - Query entry point
/// - [`ShadowTraversal`](engine::ShadowTraversal) - Closed-shadow-root traversal
pub mod engine;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Type-safe identifiers for remote entities.
///
/// Newtype wrappers prevent mixing incompatible IDs at compile time.
pub mod identifiers;

/// DevTools protocol message types.
pub mod protocol;

/// Remote session capabilities and handles.
pub mod runtime;

/// Selector grammar and partitioning.
pub mod selector;

/// WebSocket transport layer.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Engine types
pub use engine::{EngineOptions, FrameSelectors, QueryOptions, ResolvedFrame};

// Runtime types
pub use runtime::{
    ElementHandle, ExecutionContext, Frame, Gateway, Handle, JsHandle, PageDelegate,
    RemoteSession, ScriptCall, World,
};

// Selector types
pub use selector::{ParsedSelector, SelectorInfo, SelectorRegistry};

// Transport types
pub use transport::{Connection, ConnectionOptions};

// Error types
pub use error::{Error, Result};

// Identifier types
pub use identifiers::{BackendNodeId, ContextId, FrameId, ObjectId, RequestId, SessionId};
