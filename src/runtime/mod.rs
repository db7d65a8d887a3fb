//! Remote browsing-session capabilities consumed by the engine.
//!
//! The engine never talks to a browser directly. It goes through four
//! collaborator traits that a host (a DevTools client, a test double, ...)
//! implements:
//!
//! | Trait | Role |
//! |-------|------|
//! | [`RemoteSession`] | Sends introspection commands (`DOM.describeNode`, ...) |
//! | [`ExecutionContext`] | One JS world of one frame; evaluates [`ScriptCall`]s |
//! | [`Frame`] | Hands out the contexts of a frame |
//! | [`PageDelegate`] | Frame lookup, handle adoption, session lookup |
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `gateway` | Typed wrapper around a session with fallback lookup |
//! | `handle` | Owned remote handles |

// ============================================================================
// Submodules
// ============================================================================

/// Typed session commands.
pub mod gateway;

/// Remote object handles.
pub mod handle;

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::error::Result;
use crate::identifiers::{ContextId, FrameId, ObjectId};
use crate::protocol::Command;
use crate::selector::ParsedSelector;

// ============================================================================
// Re-exports
// ============================================================================

pub use gateway::Gateway;
pub use handle::{ElementHandle, Handle, JsHandle};

// ============================================================================
// World
// ============================================================================

/// JavaScript world of an execution context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum World {
    /// The page's own world.
    Main,
    /// Isolated world hidden from page scripts.
    Utility,
}

impl fmt::Display for World {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Main => f.write_str("main"),
            Self::Utility => f.write_str("utility"),
        }
    }
}

// ============================================================================
// ScriptCall
// ============================================================================

/// An invocation of the injected query engine.
///
/// `scope` is an object of the evaluating context; `None` means `document`.
/// The injected engine cannot see into closed shadow roots.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "method", content = "params", rename_all = "camelCase")]
pub enum ScriptCall {
    /// First match or `null`; throws on multiple matches when `strict`.
    QuerySelector {
        /// Selector to match.
        parsed: ParsedSelector,
        /// Scope node.
        #[serde(skip_serializing_if = "Option::is_none")]
        scope: Option<ObjectId>,
        /// Fail on more than one match.
        strict: bool,
    },

    /// Array of all matches.
    QuerySelectorAll {
        /// Selector to match.
        parsed: ParsedSelector,
        /// Scope node.
        #[serde(skip_serializing_if = "Option::is_none")]
        scope: Option<ObjectId>,
    },

    /// Number of matches in the whole document.
    QueryCount {
        /// Selector to match.
        parsed: ParsedSelector,
    },
}

// ============================================================================
// Collaborator Traits
// ============================================================================

/// Long-lived command channel to the browser.
#[async_trait]
pub trait RemoteSession: Send + Sync {
    /// Sends a command and returns its `result` payload.
    async fn send(&self, command: Command) -> Result<Value>;
}

/// One JavaScript execution environment bound to one frame.
///
/// Objects created by a context are only valid in that context and must be
/// released through [`release_object`](Self::release_object).
#[async_trait]
pub trait ExecutionContext: Send + Sync + fmt::Debug {
    /// Returns the context id.
    fn id(&self) -> ContextId;

    /// Returns the world of this context.
    fn world(&self) -> World;

    /// Returns the frame this context belongs to.
    fn frame_id(&self) -> FrameId;

    /// Evaluates an injected-engine call and returns a handle to the result.
    async fn evaluate_handle(&self, call: ScriptCall) -> Result<Handle>;

    /// Evaluates an injected-engine call and returns the result by value.
    async fn evaluate(&self, call: ScriptCall) -> Result<Value>;

    /// Returns handles to the own indexed properties of an object.
    async fn properties(&self, object_id: &ObjectId) -> Result<Vec<Handle>>;

    /// Returns an object serialized by value.
    async fn json_value(&self, object_id: &ObjectId) -> Result<Value>;

    /// Releases a remote object.
    async fn release_object(&self, object_id: &ObjectId) -> Result<()>;
}

/// A frame of the page.
#[async_trait]
pub trait Frame: Send + Sync + fmt::Debug {
    /// Returns the frame id.
    fn id(&self) -> FrameId;

    /// Returns the execution context for a world.
    async fn context(&self, world: World) -> Result<Arc<dyn ExecutionContext>>;
}

/// Page-level capabilities.
#[async_trait]
pub trait PageDelegate: Send + Sync {
    /// Returns the frame whose owner element is `element`, if any.
    async fn content_frame(&self, element: &ElementHandle) -> Result<Option<Arc<dyn Frame>>>;

    /// Re-materializes `handle` inside `context`.
    ///
    /// The original handle is left untouched.
    async fn adopt_element_handle(
        &self,
        handle: &ElementHandle,
        context: &Arc<dyn ExecutionContext>,
    ) -> Result<ElementHandle>;

    /// Returns the session attached to a frame, if known.
    fn session_for_frame(&self, frame_id: &FrameId) -> Option<Arc<dyn RemoteSession>>;

    /// Returns the main frame's session, if attached.
    fn main_frame_session(&self) -> Option<Arc<dyn RemoteSession>>;
}

// ============================================================================
// Tests
// ============================================================================
