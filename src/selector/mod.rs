//! Selector parsing and partitioning.
//!
//! | Module | Description |
//! |--------|-------------|
//! | `parser` | Selector grammar, stringification |
//! | `frames` | Splitting at frame boundaries, nested-frame validation |
//! | `registry` | Engine registry, world selection |
//!
//! # Example
//!
//! ```
//! use frame_selectors::selector::{split_selector_by_frame, ensure_no_nested_frames};
//!
//! let selector = "#outer >> internal:control=enter-frame >> #inner-button";
//! let chunks = split_selector_by_frame(selector).unwrap();
//! ensure_no_nested_frames(&chunks, selector).unwrap();
//! assert_eq!(chunks.len(), 2);
//! ```

// ============================================================================
// Submodules
// ============================================================================

/// Frame chunking and validation.
pub mod frames;

/// Selector grammar.
pub mod parser;

/// Engine registry.
pub mod registry;

// ============================================================================
// Re-exports
// ============================================================================

pub use frames::{ensure_no_nested_frames, split_selector_by_frame, visit_all_parts};
pub use parser::{
    NestedSelector, ParsedSelector, PartBody, SelectorPart, parse_selector, stringify_selector,
};
pub use registry::{SelectorInfo, SelectorRegistry};
