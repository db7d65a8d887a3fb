//! Public query methods.
//!
//! | Method | Returns | Unresolvable frame |
//! |--------|---------|--------------------|
//! | [`query`](FrameSelectors::query) | First match | `Ok(None)` |
//! | [`query_all`](FrameSelectors::query_all) | All matches | `Ok(vec![])` |
//! | [`query_count`](FrameSelectors::query_count) | Match count | [`Error::FrameNotFound`] |
//! | [`query_array_in_main_world`](FrameSelectors::query_array_in_main_world) | Array handle | [`Error::FrameNotFound`] |
//!
//! Element results are adopted into the main context of their frame.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use tracing::debug;

use crate::error::{Error, Result};
use crate::runtime::handle::{HandleScope, release};
use crate::runtime::{ElementHandle, ExecutionContext, Frame, JsHandle, ScriptCall, World};
use crate::selector::SelectorInfo;

use super::adopt::{adopt_all, adopt_if_needed};
use super::{FrameSelectors, QueryOptions};

// ============================================================================
// ResolvedInjected
// ============================================================================

/// A resolved frame plus the context the last chunk runs in.
struct ResolvedInjected<'a> {
    frame: Arc<dyn Frame>,
    context: Arc<dyn ExecutionContext>,
    info: SelectorInfo,
    scope: Option<&'a ElementHandle>,
}

// ============================================================================
// FrameSelectors - Queries
// ============================================================================

impl FrameSelectors {
    /// Returns the first element matching `selector`.
    ///
    /// When the page engine finds nothing and closed shadow roots are
    /// pierced, the selector is retried through them.
    ///
    /// # Arguments
    ///
    /// * `selector` - Selector, possibly crossing frames
    /// * `options` - Strictness and world overrides
    /// * `scope` - Element restricting the search; only used if no frame is crossed
    ///
    /// # Errors
    ///
    /// Selector errors, strict mode violations and session errors.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let button = selectors
    ///     .query("#outer-frame >> internal:control=enter-frame >> #inner-button", &QueryOptions::new(), None)
    ///     .await?;
    /// ```
    pub async fn query(
        &self,
        selector: &str,
        options: &QueryOptions,
        scope: Option<&ElementHandle>,
    ) -> Result<Option<ElementHandle>> {
        let Some(resolved) = self.resolve_injected(selector, options, scope).await? else {
            return Ok(None);
        };

        let mut temps = HandleScope::new();
        let scope_id = self
            .scope_in(resolved.scope, &resolved.context, &mut temps)
            .await?;
        let handle = resolved
            .context
            .evaluate_handle(ScriptCall::QuerySelector {
                parsed: resolved.info.parsed.clone(),
                scope: scope_id,
                strict: resolved.info.strict,
            })
            .await;
        temps.release().await;

        let element = match handle?.into_element() {
            Ok(element) => element,
            Err(raw) => {
                release(raw).await;
                if !self.options.pierce_closed_shadow_roots {
                    return Ok(None);
                }
                let found = self
                    .pierce(&resolved.frame, &resolved.info.parsed, resolved.scope)
                    .await?;
                match self.single(selector, &resolved.info, found).await? {
                    Some(element) => element,
                    None => return Ok(None),
                }
            }
        };

        let main = resolved.frame.context(World::Main).await?;
        adopt_if_needed(self.page.as_ref(), element, &main)
            .await
            .map(Some)
    }

    /// Returns every element matching `selector`.
    ///
    /// Falls back to piercing closed shadow roots like [`query`](Self::query).
    ///
    /// # Errors
    ///
    /// Selector errors and session errors.
    pub async fn query_all(
        &self,
        selector: &str,
        scope: Option<&ElementHandle>,
    ) -> Result<Vec<ElementHandle>> {
        let Some(resolved) = self
            .resolve_injected(selector, &QueryOptions::new(), scope)
            .await?
        else {
            return Ok(Vec::new());
        };

        let array = self.query_array(&resolved).await?;
        let properties = array.properties().await;
        release(array).await;

        let mut elements = Vec::new();
        for property in properties? {
            match property.into_element() {
                Ok(element) => elements.push(element),
                Err(raw) => release(raw).await,
            }
        }

        if elements.is_empty() && self.options.pierce_closed_shadow_roots {
            elements = self
                .pierce(&resolved.frame, &resolved.info.parsed, resolved.scope)
                .await?;
        }

        let main = resolved.frame.context(World::Main).await?;
        adopt_all(self.page.as_ref(), elements, &main).await
    }

    /// Counts elements matching `selector` in its frame's document.
    ///
    /// # Errors
    ///
    /// - [`Error::FrameNotFound`] if the frame chain cannot be resolved
    /// - [`Error::Protocol`] if the page engine returns a non-count
    pub async fn query_count(&self, selector: &str) -> Result<usize> {
        let resolved = self
            .resolve_injected(selector, &QueryOptions::new(), None)
            .await?
            .ok_or_else(|| Error::frame_not_found(selector))?;

        let value = resolved
            .context
            .evaluate(ScriptCall::QueryCount {
                parsed: resolved.info.parsed,
            })
            .await?;
        value
            .as_u64()
            .and_then(|count| usize::try_from(count).ok())
            .ok_or_else(|| Error::protocol(format!("Expected a match count, got {value}")))
    }

    /// Returns a handle to the array of all matches.
    ///
    /// Evaluates in the main world unless `isolated` is set, in which case
    /// the selector's own world is used.
    ///
    /// # Errors
    ///
    /// - [`Error::FrameNotFound`] if the frame chain cannot be resolved
    /// - Selector and session errors
    pub async fn query_array_in_main_world(
        &self,
        selector: &str,
        scope: Option<&ElementHandle>,
        isolated: bool,
    ) -> Result<JsHandle> {
        let options = QueryOptions {
            main_world: !isolated,
            ..QueryOptions::new()
        };
        let resolved = self
            .resolve_injected(selector, &options, scope)
            .await?
            .ok_or_else(|| Error::frame_not_found(selector))?;
        self.query_array(&resolved).await
    }
}

// ============================================================================
// FrameSelectors - Query Helpers
// ============================================================================

impl FrameSelectors {
    /// Resolves the frame chain and picks the evaluation context.
    async fn resolve_injected<'a>(
        &self,
        selector: &str,
        options: &QueryOptions,
        scope: Option<&'a ElementHandle>,
    ) -> Result<Option<ResolvedInjected<'a>>> {
        let Some(resolved) = self.resolve_frame(selector, options, scope).await? else {
            return Ok(None);
        };
        let world = if options.main_world {
            World::Main
        } else {
            resolved.info.world
        };
        let context = resolved.frame.context(world).await?;
        debug!(frame_id = %resolved.frame.id(), %world, "Resolved selector frame");
        Ok(Some(ResolvedInjected {
            frame: resolved.frame,
            context,
            info: resolved.info,
            scope: resolved.scope,
        }))
    }

    /// Evaluates `querySelectorAll` and returns the array handle.
    async fn query_array(&self, resolved: &ResolvedInjected<'_>) -> Result<JsHandle> {
        let mut temps = HandleScope::new();
        let scope_id = self
            .scope_in(resolved.scope, &resolved.context, &mut temps)
            .await?;
        let array = resolved
            .context
            .evaluate_handle(ScriptCall::QuerySelectorAll {
                parsed: resolved.info.parsed.clone(),
                scope: scope_id,
            })
            .await;
        temps.release().await;
        Ok(array?.into())
    }

    /// Reduces traversal matches to one element, honoring strictness.
    async fn single(
        &self,
        selector: &str,
        info: &SelectorInfo,
        found: Vec<ElementHandle>,
    ) -> Result<Option<ElementHandle>> {
        let count = found.len();
        let mut found = found.into_iter();
        let first = found.next();

        if info.strict && count > 1 {
            for handle in first.into_iter().chain(found) {
                release(handle).await;
            }
            return Err(Error::script_error(format!(
                "strict mode violation: \"{selector}\" resolved to {count} elements"
            )));
        }

        for extra in found {
            release(extra).await;
        }
        Ok(first)
    }
}
