//! Engine and per-query configuration.
//!
//! # Example
//!
//! ```
//! use frame_selectors::{EngineOptions, QueryOptions};
//!
//! let engine = EngineOptions::new().with_strict_selectors(true);
//! let query = QueryOptions::new().with_strict(false);
//!
//! assert!(!engine.strictness(&query));
//! assert!(engine.strictness(&QueryOptions::new()));
//! ```

// ============================================================================
// EngineOptions
// ============================================================================

/// Engine-wide resolution settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    /// Default strictness for queries that do not set one.
    pub strict_selectors: bool,

    /// Retry empty queries with the closed-shadow-root traversal.
    pub pierce_closed_shadow_roots: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Constructors
// ============================================================================

impl EngineOptions {
    /// Creates options with default settings.
    ///
    /// Non-strict, closed shadow roots pierced.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            strict_selectors: false,
            pierce_closed_shadow_roots: true,
        }
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl EngineOptions {
    /// Sets the default strictness.
    #[inline]
    #[must_use]
    pub const fn with_strict_selectors(mut self, strict: bool) -> Self {
        self.strict_selectors = strict;
        self
    }

    /// Enables or disables the closed-shadow-root fallback.
    #[inline]
    #[must_use]
    pub const fn with_closed_shadow_roots(mut self, pierce: bool) -> Self {
        self.pierce_closed_shadow_roots = pierce;
        self
    }

    /// Resolves the strictness of one query.
    #[inline]
    #[must_use]
    pub const fn strictness(&self, options: &QueryOptions) -> bool {
        match options.strict {
            Some(strict) => strict,
            None => self.strict_selectors,
        }
    }
}

// ============================================================================
// QueryOptions
// ============================================================================

/// Per-call query settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueryOptions {
    /// Fail when more than one element matches. `None` uses the engine default.
    pub strict: Option<bool>,

    /// Evaluate in the main world even for utility-world selectors.
    pub main_world: bool,
}

impl QueryOptions {
    /// Creates options with default settings.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            strict: None,
            main_world: false,
        }
    }

    /// Sets strictness for this call.
    #[inline]
    #[must_use]
    pub const fn with_strict(mut self, strict: bool) -> Self {
        self.strict = Some(strict);
        self
    }

    /// Forces main-world evaluation.
    #[inline]
    #[must_use]
    pub const fn with_main_world(mut self) -> Self {
        self.main_world = true;
        self
    }
}

// ============================================================================
// Tests
// ============================================================================
