//! Command definitions organized by domain.
//!
//! Commands follow the DevTools `Domain.methodName` format.
//!
//! # Command Domains
//!
//! | Domain | Commands |
//! |--------|----------|
//! | `DOM` | `describeNode`, `resolveNode` |
//! | `Runtime` | `evaluate`, `releaseObject` |

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};

use crate::identifiers::{BackendNodeId, ContextId, ObjectId};

// ============================================================================
// Command Wrapper
// ============================================================================

/// All protocol commands organized by domain.
///
/// This enum wraps domain-specific command enums for unified serialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Command {
    /// DOM domain commands.
    Dom(DomCommand),
    /// Runtime domain commands.
    Runtime(RuntimeCommand),
}

impl Command {
    /// Returns the wire method name.
    #[must_use]
    pub fn method(&self) -> &'static str {
        match self {
            Self::Dom(DomCommand::DescribeNode { .. }) => "DOM.describeNode",
            Self::Dom(DomCommand::ResolveNode { .. }) => "DOM.resolveNode",
            Self::Runtime(RuntimeCommand::Evaluate { .. }) => "Runtime.evaluate",
            Self::Runtime(RuntimeCommand::ReleaseObject { .. }) => "Runtime.releaseObject",
        }
    }
}

impl From<DomCommand> for Command {
    fn from(command: DomCommand) -> Self {
        Self::Dom(command)
    }
}

impl From<RuntimeCommand> for Command {
    fn from(command: RuntimeCommand) -> Self {
        Self::Runtime(command)
    }
}

// ============================================================================
// DOM Commands
// ============================================================================

/// DOM domain commands for out-of-page node introspection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", content = "params")]
pub enum DomCommand {
    /// Describe a node and, with `depth`, its subtree.
    ///
    /// With `pierce`, the description includes shadow roots of every mode,
    /// closed ones included.
    #[serde(rename = "DOM.describeNode")]
    DescribeNode {
        /// Node to describe.
        #[serde(rename = "objectId")]
        object_id: ObjectId,
        /// Subtree depth; `-1` for the whole subtree.
        depth: i32,
        /// Traverse shadow roots and iframe documents.
        pierce: bool,
    },

    /// Materialize a node as a remote object in a context.
    #[serde(rename = "DOM.resolveNode")]
    ResolveNode {
        /// Node to resolve.
        #[serde(rename = "backendNodeId")]
        backend_node_id: BackendNodeId,
        /// Context that will own the new object.
        #[serde(rename = "executionContextId")]
        execution_context_id: ContextId,
    },
}

// ============================================================================
// Runtime Commands
// ============================================================================

/// Runtime domain commands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", content = "params")]
pub enum RuntimeCommand {
    /// Evaluate an expression in a context.
    #[serde(rename = "Runtime.evaluate")]
    Evaluate {
        /// Expression source.
        expression: String,
        /// Context to evaluate in.
        #[serde(rename = "contextId")]
        context_id: ContextId,
        /// How to serialize the result.
        #[serde(
            rename = "serializationOptions",
            skip_serializing_if = "Option::is_none",
            default
        )]
        serialization_options: Option<SerializationOptions>,
    },

    /// Release a remote object.
    #[serde(rename = "Runtime.releaseObject")]
    ReleaseObject {
        /// Object to release.
        #[serde(rename = "objectId")]
        object_id: ObjectId,
    },
}

// ============================================================================
// SerializationOptions
// ============================================================================

/// Result serialization requested from `Runtime.evaluate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializationOptions {
    /// Serialization mode.
    pub serialization: Serialization,
}

impl SerializationOptions {
    /// Only return a remote object id.
    #[inline]
    #[must_use]
    pub const fn id_only() -> Self {
        Self {
            serialization: Serialization::IdOnly,
        }
    }
}

/// Serialization mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Serialization {
    /// Remote object id only.
    IdOnly,
    /// JSON value.
    Json,
    /// Deep structured serialization.
    Deep,
}

// ============================================================================
// Tests
// ============================================================================
