//! Selector evaluation that reaches into closed shadow roots.
//!
//! The in-page engine cannot see inside closed shadow roots. This traversal
//! re-implements the selector chain outside the page: each plain part is
//! run by the in-page engine against every scope *and* every closed shadow
//! root below it (found with a piercing `DOM.describeNode`), while `nth`,
//! `internal:or` and `internal:and` are evaluated here over node sets keyed
//! by backend id.
//!
//! | Part | Evaluation |
//! |------|------------|
//! | `nth=N` | 1-based position (negative from the end, `0` first) in the current set |
//! | `internal:or` | Union with the nested selector's matches |
//! | `internal:and` | Intersection with the nested selector's matches |
//! | anything else | In-page `querySelectorAll` per scope and closed shadow root |
//!
//! Nested `or`/`and` selectors start again from the traversal's root.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use futures_util::future::BoxFuture;
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::protocol::NodeDescription;
use crate::runtime::handle::{HandleScope, release_detached};
use crate::runtime::{ElementHandle, ExecutionContext, Gateway, JsHandle, ScriptCall};
use crate::selector::{ParsedSelector, SelectorPart};

use super::scoping::{ScopeOrigin, ScopingElement, ScopingSet};

// ============================================================================
// Constants
// ============================================================================

/// `describeNode` depth covering the whole subtree.
const WHOLE_SUBTREE: i32 = -1;

// ============================================================================
// Traversal
// ============================================================================

/// Outcome of a traversal.
#[derive(Debug)]
pub enum Traversal {
    /// The chain was evaluated; the set may be empty.
    Matched(ScopingSet),
    /// An `nth` position was out of range. The page may still change, so the
    /// caller should poll again rather than fail.
    ContinuePolling,
}

impl Traversal {
    /// Returns the matched handles in ascending backend id order.
    ///
    /// `ContinuePolling` yields an empty list.
    #[must_use]
    pub fn into_handles(self) -> Vec<ElementHandle> {
        match self {
            Self::Matched(set) => set
                .into_elements()
                .into_iter()
                .map(ScopingElement::into_handle)
                .collect(),
            Self::ContinuePolling => Vec::new(),
        }
    }
}

// ============================================================================
// ShadowTraversal
// ============================================================================

/// Shadow-piercing selector evaluation in one execution context.
///
/// All node handles, queries and resolutions use the same context.
#[derive(Debug)]
pub struct ShadowTraversal<'a> {
    gateway: &'a Gateway,
    context: Arc<dyn ExecutionContext>,
}

impl<'a> ShadowTraversal<'a> {
    /// Creates a traversal.
    pub fn new(gateway: &'a Gateway, context: Arc<dyn ExecutionContext>) -> Self {
        Self { gateway, context }
    }

    /// Evaluates `parsed` starting from `root`.
    ///
    /// `root` stays owned by the caller. If it is itself part of the result
    /// (e.g. `nth=1` as the only part) the result holds a clone of it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSelector`] for a composite part without a
    /// nested body, or any session error. Handles acquired before the error
    /// are released.
    pub fn find<'s>(
        &'s self,
        root: &'s ElementHandle,
        parsed: &'s ParsedSelector,
    ) -> BoxFuture<'s, Result<Traversal>> {
        Box::pin(async move {
            let root_id = self.describe(root).await?.backend_node_id;
            let mut current = ScopingSet::with_root(root.clone(), root_id);

            for part in &parsed.parts {
                trace!(engine = %part.name, scopes = current.len(), "Traversal step");
                match part.name.as_str() {
                    "nth" => {
                        let position = part.nth_index().ok_or_else(|| {
                            Error::invalid_selector(format!("Malformed selector: nth={}", part.source))
                        })?;
                        match current.retain_nth(position) {
                            Some(discarded) => release_all(discarded).await,
                            None => {
                                debug!(position, len = current.len(), "nth out of range");
                                current.release().await;
                                return Ok(Traversal::ContinuePolling);
                            }
                        }
                    }

                    "internal:or" => {
                        let nested = nested_of(part)?;
                        match self.find(root, nested).await? {
                            Traversal::Matched(other) => {
                                release_all(current.absorb(other)).await;
                            }
                            Traversal::ContinuePolling => {
                                current.release().await;
                                return Ok(Traversal::ContinuePolling);
                            }
                        }
                    }

                    "internal:and" => {
                        let nested = nested_of(part)?;
                        match self.find(root, nested).await? {
                            Traversal::Matched(other) => {
                                let ids = other.ids();
                                other.release().await;
                                release_all(current.retain_ids(&ids)).await;
                            }
                            Traversal::ContinuePolling => {
                                current.release().await;
                                return Ok(Traversal::ContinuePolling);
                            }
                        }
                    }

                    _ => {
                        current = self.step(current, part).await?;
                    }
                }
            }

            Ok(Traversal::Matched(current))
        })
    }

    /// Runs one plain part against every scope of `current`.
    async fn step(&self, current: ScopingSet, part: &SelectorPart) -> Result<ScopingSet> {
        let single = ParsedSelector {
            parts: vec![part.clone()],
            capture: None,
        };

        // Scopes are replaced by their matches and released after the step.
        let mut retired = HandleScope::new();
        let mut scopes = Vec::with_capacity(current.len());
        for element in current.into_elements() {
            scopes.push((element.handle().clone(), element.origin()));
            if !element.is_root() {
                retired.track(element.into_handle());
            }
        }

        let mut found: Vec<(ElementHandle, ScopeOrigin)> = Vec::new();
        let mut intermediates = HandleScope::new();
        for (scope, origin) in &scopes {
            if let Err(e) = self
                .collect_matches(scope, *origin, &single, &mut found, &mut intermediates)
                .await
            {
                release_detached(found.into_iter().map(|(handle, _)| handle.into()).collect());
                return Err(e);
            }
        }
        intermediates.release().await;
        retired.release().await;

        let mut next = ScopingSet::new();
        let mut pending = found.into_iter();
        while let Some((handle, origin)) = pending.next() {
            let node = match self.describe(&handle).await {
                Ok(node) => node,
                Err(e) => {
                    let rest = std::iter::once(handle)
                        .chain(pending.map(|(handle, _)| handle))
                        .map(Into::into)
                        .collect();
                    release_detached(rest);
                    return Err(e);
                }
            };
            let element = ScopingElement::new(handle, node.backend_node_id, origin);
            if let Some(duplicate) = next.insert(element) {
                trace!(backend_node_id = %duplicate.backend_node_id(), "Dropping duplicate match");
                duplicate.release().await;
            }
        }

        trace!(engine = %part.name, matches = next.len(), "Traversal step done");
        Ok(next)
    }

    /// Queries the closed shadow roots below `scope`, then `scope` itself.
    async fn collect_matches(
        &self,
        scope: &ElementHandle,
        origin: ScopeOrigin,
        single: &ParsedSelector,
        found: &mut Vec<(ElementHandle, ScopeOrigin)>,
        intermediates: &mut HandleScope,
    ) -> Result<()> {
        let subtree = self
            .gateway
            .describe_node(scope.object_id(), WHOLE_SUBTREE, true)
            .await?;

        for shadow_id in subtree.closed_shadow_roots() {
            let shadow_root = self
                .gateway
                .resolve_backend_id(shadow_id, &self.context)
                .await?;
            intermediates.track(shadow_root.clone());
            for handle in self.query_all(&shadow_root, single, intermediates).await? {
                found.push((handle, ScopeOrigin::ShadowRoot(shadow_id)));
            }
        }

        // Matches directly under a shadow-root match stay in that shadow tree.
        let inherited = match origin {
            ScopeOrigin::ShadowRoot(id) => ScopeOrigin::ShadowRoot(id),
            ScopeOrigin::DocumentRoot | ScopeOrigin::Document => ScopeOrigin::Document,
        };
        for handle in self.query_all(scope, single, intermediates).await? {
            found.push((handle, inherited));
        }
        Ok(())
    }

    /// Runs the in-page `querySelectorAll` under `scope`.
    async fn query_all(
        &self,
        scope: &ElementHandle,
        single: &ParsedSelector,
        intermediates: &mut HandleScope,
    ) -> Result<Vec<ElementHandle>> {
        let array: JsHandle = self
            .context
            .evaluate_handle(ScriptCall::QuerySelectorAll {
                parsed: single.clone(),
                scope: Some(scope.object_id().clone()),
            })
            .await?
            .into();
        intermediates.track(array.clone());

        let mut elements = Vec::new();
        for property in array.properties().await? {
            match property.into_element() {
                Ok(element) => elements.push(element),
                Err(other) => intermediates.track(other),
            }
        }
        Ok(elements)
    }

    /// Describes a single node.
    async fn describe(&self, handle: &ElementHandle) -> Result<NodeDescription> {
        self.gateway.describe_node(handle.object_id(), 0, false).await
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Returns the nested selector of a composite part.
fn nested_of(part: &SelectorPart) -> Result<&ParsedSelector> {
    part.nested()
        .map(|nested| &nested.parsed)
        .ok_or_else(|| Error::invalid_selector(format!("Malformed selector: {}={}", part.name, part.source)))
}

/// Releases discarded elements.
async fn release_all(elements: Vec<ScopingElement>) {
    for element in elements {
        element.release().await;
    }
}
