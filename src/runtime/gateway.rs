//! Typed introspection commands over a remote session.
//!
//! The gateway issues the out-of-page commands the in-page engine cannot
//! perform: describing subtrees across closed shadow boundaries and
//! materializing nodes by backend id.
//!
//! Every handle it returns is owned by the caller.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::{Value, from_value};
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::identifiers::{BackendNodeId, FrameId, ObjectId};
use crate::protocol::node::DescribeNodeResult;
use crate::protocol::{DomCommand, NodeDescription, RuntimeCommand, SerializationOptions};

use super::{ElementHandle, ExecutionContext, PageDelegate, RemoteSession};

// ============================================================================
// Wire Types
// ============================================================================

/// Remote object as returned by `DOM.resolveNode` and `Runtime.evaluate`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemoteObject {
    #[serde(default)]
    object_id: Option<ObjectId>,
}

/// `DOM.resolveNode` result.
#[derive(Debug, Deserialize)]
struct ResolveNodeResult {
    object: RemoteObject,
}

/// `Runtime.evaluate` result.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EvaluateResult {
    result: RemoteObject,
    #[serde(default)]
    exception_details: Option<Value>,
}

// ============================================================================
// Gateway
// ============================================================================

/// Command gateway bound to one session.
#[derive(Clone)]
pub struct Gateway {
    session: Arc<dyn RemoteSession>,
}

impl fmt::Debug for Gateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Gateway").finish_non_exhaustive()
    }
}

impl Gateway {
    /// Wraps a session.
    pub fn new(session: Arc<dyn RemoteSession>) -> Self {
        Self { session }
    }

    /// Finds the session serving a frame.
    ///
    /// Looks up the frame's own session first and falls back to the main
    /// frame's session.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SessionNotFound`] if neither is available.
    pub fn for_frame(page: &dyn PageDelegate, frame_id: &FrameId) -> Result<Self> {
        if let Some(session) = page.session_for_frame(frame_id) {
            return Ok(Self::new(session));
        }

        debug!(%frame_id, "No session for frame, using main frame session");
        page.main_frame_session()
            .map(Self::new)
            .ok_or_else(|| Error::session_not_found(frame_id.clone()))
    }

    /// Returns the underlying session.
    #[inline]
    #[must_use]
    pub fn session(&self) -> &Arc<dyn RemoteSession> {
        &self.session
    }

    /// Describes a node.
    ///
    /// # Arguments
    ///
    /// * `object_id` - Node object to describe
    /// * `depth` - Subtree depth, `-1` for everything
    /// * `pierce` - Include shadow roots of every mode
    ///
    /// # Errors
    ///
    /// Returns the session's error, or [`Error::Json`] on a malformed reply.
    pub async fn describe_node(
        &self,
        object_id: &ObjectId,
        depth: i32,
        pierce: bool,
    ) -> Result<NodeDescription> {
        trace!(%object_id, depth, pierce, "DOM.describeNode");
        let value = self
            .session
            .send(
                DomCommand::DescribeNode {
                    object_id: object_id.clone(),
                    depth,
                    pierce,
                }
                .into(),
            )
            .await?;
        let result: DescribeNodeResult = from_value(value)?;
        Ok(result.node)
    }

    /// Materializes a node inside `context`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`] if the browser returns no object.
    pub async fn resolve_backend_id(
        &self,
        backend_node_id: BackendNodeId,
        context: &Arc<dyn ExecutionContext>,
    ) -> Result<ElementHandle> {
        trace!(%backend_node_id, context_id = %context.id(), "DOM.resolveNode");
        let value = self
            .session
            .send(
                DomCommand::ResolveNode {
                    backend_node_id,
                    execution_context_id: context.id(),
                }
                .into(),
            )
            .await?;
        let result: ResolveNodeResult = from_value(value)?;
        let object_id = result.object.object_id.ok_or_else(|| {
            Error::protocol(format!("Node {backend_node_id} resolved without object id"))
        })?;
        Ok(ElementHandle::new(object_id, Arc::clone(context)))
    }

    /// Evaluates `document` in `context` and returns a handle to it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ScriptError`] if evaluation threw, or
    /// [`Error::Protocol`] if no object came back.
    pub async fn evaluate_document(
        &self,
        context: &Arc<dyn ExecutionContext>,
    ) -> Result<ElementHandle> {
        trace!(context_id = %context.id(), "Runtime.evaluate document");
        let value = self
            .session
            .send(
                RuntimeCommand::Evaluate {
                    expression: "document".to_string(),
                    context_id: context.id(),
                    serialization_options: Some(SerializationOptions::id_only()),
                }
                .into(),
            )
            .await?;
        let result: EvaluateResult = from_value(value)?;
        if let Some(details) = result.exception_details {
            return Err(Error::script_error(details.to_string()));
        }
        let object_id = result
            .result
            .object_id
            .ok_or_else(|| Error::protocol("Document evaluated without object id"))?;
        Ok(ElementHandle::new(object_id, Arc::clone(context)))
    }
}
