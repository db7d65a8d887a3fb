//! DevTools protocol message types.
//!
//! This module defines the message format for communication between the
//! local end (Rust) and a browser's DevTools endpoint.
//!
//! # Protocol Overview
//!
//! | Message Type | Direction | Purpose |
//! |--------------|-----------|---------|
//! | `Request` | Local → Remote | Command request |
//! | `Response` | Remote → Local | Command response |
//! | `Event` | Remote → Local | Browser notification |
//!
//! # Command Naming
//!
//! Commands follow `Domain.methodName` format:
//!
//! - `DOM.describeNode`
//! - `DOM.resolveNode`
//! - `Runtime.evaluate`
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `command` | Command definitions by domain |
//! | `node` | `DOM.describeNode` payloads |
//! | `request` | Request, Response and Event types |

// ============================================================================
// Submodules
// ============================================================================

/// Command definitions organized by domain.
pub mod command;

/// Node descriptions.
pub mod node;

/// Request, Response and Event message types.
pub mod request;

// ============================================================================
// Re-exports
// ============================================================================

pub use command::{Command, DomCommand, RuntimeCommand, Serialization, SerializationOptions};
pub use node::{NodeDescription, ShadowRootType};
pub use request::{Event, Request, Response, ResponseError};
