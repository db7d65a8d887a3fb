//! FrameSelectors struct and shared helpers.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use crate::error::Result;
use crate::identifiers::{FrameId, ObjectId};
use crate::runtime::handle::HandleScope;
use crate::runtime::{ElementHandle, ExecutionContext, Frame, Gateway, PageDelegate};
use crate::selector::{ParsedSelector, SelectorInfo, SelectorRegistry};

use super::{EngineOptions, QueryOptions};

// ============================================================================
// FrameSelectors
// ============================================================================

/// Selector resolution rooted at one frame.
///
/// Cheap to clone; all collaborators are shared.
#[derive(Clone)]
pub struct FrameSelectors {
    /// Frame that selectors are resolved from.
    pub(crate) frame: Arc<dyn Frame>,
    /// Page capabilities.
    pub(crate) page: Arc<dyn PageDelegate>,
    /// Known selector engines.
    pub(crate) selectors: Arc<SelectorRegistry>,
    /// Engine settings.
    pub(crate) options: EngineOptions,
}

impl fmt::Debug for FrameSelectors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameSelectors")
            .field("frame_id", &self.frame.id())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// FrameSelectors - Constructors
// ============================================================================

impl FrameSelectors {
    /// Creates a resolver for `frame` with default options.
    pub fn new(
        frame: Arc<dyn Frame>,
        page: Arc<dyn PageDelegate>,
        selectors: Arc<SelectorRegistry>,
    ) -> Self {
        Self {
            frame,
            page,
            selectors,
            options: EngineOptions::default(),
        }
    }

    /// Sets engine options.
    #[inline]
    #[must_use]
    pub fn with_options(mut self, options: EngineOptions) -> Self {
        self.options = options;
        self
    }
}

// ============================================================================
// FrameSelectors - Accessors
// ============================================================================

impl FrameSelectors {
    /// Returns the starting frame.
    #[inline]
    #[must_use]
    pub fn frame(&self) -> &Arc<dyn Frame> {
        &self.frame
    }

    /// Returns the engine options.
    #[inline]
    #[must_use]
    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Returns the engine registry.
    #[inline]
    #[must_use]
    pub fn selectors(&self) -> &Arc<SelectorRegistry> {
        &self.selectors
    }
}

// ============================================================================
// FrameSelectors - Internal Helpers
// ============================================================================

impl FrameSelectors {
    /// Resolves world and strictness of one chunk.
    pub(crate) fn parse(&self, chunk: ParsedSelector, options: &QueryOptions) -> Result<SelectorInfo> {
        self.selectors
            .resolve(chunk, self.options.strictness(options))
    }

    /// Returns the gateway serving a frame.
    pub(crate) fn gateway(&self, frame_id: &FrameId) -> Result<Gateway> {
        Gateway::for_frame(self.page.as_ref(), frame_id)
    }

    /// Returns an object id for `scope` that is valid in `context`.
    ///
    /// A scope from another context is adopted; the adopted copy is tracked
    /// in `temps` and the caller's handle is left untouched.
    pub(crate) async fn scope_in(
        &self,
        scope: Option<&ElementHandle>,
        context: &Arc<dyn ExecutionContext>,
        temps: &mut HandleScope,
    ) -> Result<Option<ObjectId>> {
        match scope {
            None => Ok(None),
            Some(scope) if scope.belongs_to(context) => Ok(Some(scope.object_id().clone())),
            Some(scope) => {
                let adopted = self.page.adopt_element_handle(scope, context).await?;
                let object_id = adopted.object_id().clone();
                temps.track(adopted);
                Ok(Some(object_id))
            }
        }
    }
}
