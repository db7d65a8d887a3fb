//! Frame-aware selector resolution.
//!
//! [`FrameSelectors`] resolves selectors that may cross frame boundaries
//! and, when the page's own engine comes back empty, pierces closed shadow
//! roots from outside the page.
//!
//! # Module Structure
//!
//! | Module | Description |
//! |--------|-------------|
//! | `core` | FrameSelectors struct and accessors |
//! | `frames` | Frame chain resolution |
//! | `query` | Public query methods |
//! | `shadow` | Closed-shadow-root traversal |
//! | `scoping` | Backend-id keyed node sets |
//! | `adopt` | Handle adoption across contexts |
//! | `options` | Engine and query options |
//!
//! # Example
//!
//! ```ignore
//! let selectors = FrameSelectors::new(frame, page, Arc::new(SelectorRegistry::new()));
//!
//! let count = selectors.query_count("li.item").await?;
//! if let Some(button) = selectors
//!     .query("#outer-frame >> internal:control=enter-frame >> #inner-button", &QueryOptions::new(), None)
//!     .await?
//! {
//!     button.dispose().await?;
//! }
//! ```

// ============================================================================
// Submodules
// ============================================================================

mod adopt;
mod core;
mod frames;
mod options;
mod query;
mod scoping;
mod shadow;

// ============================================================================
// Re-exports
// ============================================================================

pub use adopt::{adopt_all, adopt_if_needed};
pub use self::core::FrameSelectors;
pub use frames::ResolvedFrame;
pub use options::{EngineOptions, QueryOptions};
pub use scoping::{ScopeOrigin, ScopingElement, ScopingSet};
pub use shadow::{ShadowTraversal, Traversal};
