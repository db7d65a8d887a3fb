//! Frame chain resolution.
//!
//! A selector such as `#outer >> internal:control=enter-frame >> #inner`
//! is resolved hop by hop: every chunk but the last must match an
//! `<iframe>`/`<frame>` in the current frame, whose content frame becomes the
//! next current frame. The last chunk is returned unresolved together with
//! the frame it applies to.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::error::{Error, Result};
use crate::runtime::handle::{HandleScope, release};
use crate::runtime::{ElementHandle, Frame, ScriptCall, World};
use crate::selector::{
    ParsedSelector, SelectorInfo, ensure_no_nested_frames, split_selector_by_frame,
    stringify_selector,
};

use super::scoping::ScopingElement;
use super::shadow::{ShadowTraversal, Traversal};
use super::{FrameSelectors, QueryOptions};

// ============================================================================
// ResolvedFrame
// ============================================================================

/// The frame a selector's last chunk applies to.
pub struct ResolvedFrame<'a> {
    /// Frame holding the target elements.
    pub frame: Arc<dyn Frame>,
    /// Last chunk with its world and strictness.
    pub info: SelectorInfo,
    /// Caller's scope, kept only if no frame was crossed.
    pub scope: Option<&'a ElementHandle>,
}

impl fmt::Debug for ResolvedFrame<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedFrame")
            .field("frame_id", &self.frame.id())
            .field("info", &self.info)
            .field("scope", &self.scope)
            .finish()
    }
}

// ============================================================================
// FrameSelectors - Frame Resolution
// ============================================================================

impl FrameSelectors {
    /// Resolves the frame chain of a selector.
    ///
    /// `scope` restricts the first chunk. It is dropped from the result when
    /// the final frame differs from the starting frame.
    ///
    /// Returns `Ok(None)` when a hop matches nothing or its element has no
    /// content frame; the caller may poll again.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidSelector`] on grammar errors or unknown engines
    /// - [`Error::InvalidFrameUsage`] for a frame marker inside a composite
    ///   part, before any remote command
    /// - [`Error::UnexpectedNonFrameElement`] if a hop matches a non-frame
    /// - Session and evaluation errors
    pub async fn resolve_frame<'a>(
        &self,
        selector: &str,
        options: &QueryOptions,
        scope: Option<&'a ElementHandle>,
    ) -> Result<Option<ResolvedFrame<'a>>> {
        let chunks = split_selector_by_frame(selector)?;
        ensure_no_nested_frames(&chunks, selector)?;
        let mut infos = chunks
            .into_iter()
            .map(|chunk| self.parse(chunk, options))
            .collect::<Result<Vec<_>>>()?;
        let Some(info) = infos.pop() else {
            return Err(Error::invalid_selector("Selector cannot be empty"));
        };

        let mut frame = Arc::clone(&self.frame);
        for (i, hop) in infos.iter().enumerate() {
            let hop_scope = if i == 0 { scope } else { None };
            let Some(element) = self.find_frame_element(&frame, hop, hop_scope).await? else {
                debug!(frame_id = %frame.id(), hop = i, "Frame element not found");
                return Ok(None);
            };

            let content = self.page.content_frame(&element).await;
            release(element).await;
            match content? {
                Some(next) => {
                    debug!(from = %frame.id(), to = %next.id(), "Entered frame");
                    frame = next;
                }
                None => {
                    debug!(frame_id = %frame.id(), hop = i, "Element has no content frame");
                    return Ok(None);
                }
            }
        }

        let scope = if frame.id() == self.frame.id() {
            scope
        } else {
            None
        };
        Ok(Some(ResolvedFrame { frame, info, scope }))
    }

    /// Finds the frame owner element of one hop.
    async fn find_frame_element(
        &self,
        frame: &Arc<dyn Frame>,
        info: &SelectorInfo,
        scope: Option<&ElementHandle>,
    ) -> Result<Option<ElementHandle>> {
        let context = frame.context(info.world).await?;
        let mut temps = HandleScope::new();
        let scope_id = self.scope_in(scope, &context, &mut temps).await?;
        let handle = context
            .evaluate_handle(ScriptCall::QuerySelector {
                parsed: info.parsed.clone(),
                scope: scope_id,
                strict: info.strict,
            })
            .await;
        temps.release().await;

        match handle?.into_element() {
            Ok(element) => match self.ensure_frame_owner(frame, &element, &info.parsed).await {
                Ok(()) => Ok(Some(element)),
                Err(e) => {
                    release(element).await;
                    Err(e)
                }
            },
            Err(raw) => {
                release(raw).await;
                if !self.options.pierce_closed_shadow_roots {
                    return Ok(None);
                }
                debug!(frame_id = %frame.id(), "Frame element not found in page, piercing shadow roots");
                let mut found = self.pierce(frame, &info.parsed, None).await?.into_iter();
                let first = found.next();
                for extra in found {
                    release(extra).await;
                }
                Ok(first)
            }
        }
    }

    /// Fails unless `element` is an `<iframe>` or `<frame>`.
    async fn ensure_frame_owner(
        &self,
        frame: &Arc<dyn Frame>,
        element: &ElementHandle,
        parsed: &ParsedSelector,
    ) -> Result<()> {
        let node = self
            .gateway(&frame.id())?
            .describe_node(element.object_id(), 0, false)
            .await?;
        if node.is_frame_owner() {
            Ok(())
        } else {
            Err(Error::unexpected_non_frame(
                stringify_selector(parsed),
                node.preview(),
            ))
        }
    }

    /// Evaluates `parsed` with the shadow-piercing traversal.
    ///
    /// Starts from `scope` if given, otherwise from the frame's document.
    /// Returned handles live in the frame's main context, in ascending
    /// backend id order. They never share a remote object with `scope`: a
    /// match on the scope node itself is resolved to a new handle.
    pub(crate) async fn pierce(
        &self,
        frame: &Arc<dyn Frame>,
        parsed: &ParsedSelector,
        scope: Option<&ElementHandle>,
    ) -> Result<Vec<ElementHandle>> {
        let gateway = self.gateway(&frame.id())?;
        let main = frame.context(World::Main).await?;

        let (root, owned) = match scope {
            Some(scope) if scope.belongs_to(&main) => (scope.clone(), false),
            Some(scope) => (self.page.adopt_element_handle(scope, &main).await?, true),
            None => (gateway.evaluate_document(&main).await?, true),
        };

        let outcome = ShadowTraversal::new(&gateway, Arc::clone(&main))
            .find(&root, parsed)
            .await;
        let elements = match outcome {
            Ok(Traversal::Matched(set)) => set.into_elements(),
            Ok(Traversal::ContinuePolling) => Vec::new(),
            Err(e) => {
                if owned {
                    release(root).await;
                }
                return Err(e);
            }
        };

        if owned && !elements.iter().any(ScopingElement::is_root) {
            release(root).await;
        }

        let mut handles = Vec::with_capacity(elements.len());
        let mut pending = elements.into_iter();
        while let Some(element) = pending.next() {
            if owned || !element.is_root() {
                handles.push(element.into_handle());
                continue;
            }
            // The scope stays with the caller.
            match gateway
                .resolve_backend_id(element.backend_node_id(), &main)
                .await
            {
                Ok(handle) => handles.push(handle),
                Err(e) => {
                    for handle in handles {
                        release(handle).await;
                    }
                    for element in pending {
                        element.release().await;
                    }
                    return Err(e);
                }
            }
        }
        debug!(frame_id = %frame.id(), matches = handles.len(), "Shadow traversal finished");
        Ok(handles)
    }
}
