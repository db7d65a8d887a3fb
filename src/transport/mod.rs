//! WebSocket transport layer.
//!
//! This module handles communication with a browser's DevTools endpoint
//! over WebSocket. [`Connection`] implements
//! [`RemoteSession`](crate::runtime::RemoteSession), so it can back a
//! [`Gateway`](crate::runtime::Gateway) directly.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐                              ┌─────────────────┐
//! │  Gateway (Rust) │         WebSocket            │  Browser        │
//! │                 │◄────────────────────────────►│  DevTools       │
//! │  Connection     │   ws://host:port/devtools    │  endpoint       │
//! └─────────────────┘                              └─────────────────┘
//! ```
//!
//! # Connection Lifecycle
//!
//! 1. `Connection::connect` - Open the WebSocket
//! 2. `Connection::session` - Address a flattened target session
//! 3. `RemoteSession::send` - Send commands, receive responses/events
//! 4. `Connection::shutdown` - Close the socket, failing pending requests
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `connection` | WebSocket connection and event loop |

// ============================================================================
// Submodules
// ============================================================================

/// WebSocket connection and event loop.
pub mod connection;

// ============================================================================
// Re-exports
// ============================================================================

pub use connection::{Connection, ConnectionOptions, EventHandler};
