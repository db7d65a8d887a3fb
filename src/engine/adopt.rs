//! Moving element handles between execution contexts.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use tracing::trace;

use crate::error::Result;
use crate::runtime::handle::{release, release_detached};
use crate::runtime::{ElementHandle, ExecutionContext, PageDelegate};

// ============================================================================
// Adoption
// ============================================================================

/// Returns `handle` re-materialized in `target`.
///
/// A handle already living in `target` is returned as is, without any
/// remote call. Otherwise the page adopts it and the original is released;
/// since `handle` is taken by value it cannot be used afterwards.
///
/// # Errors
///
/// Returns the page delegate's error. The original handle is released in
/// that case too.
pub async fn adopt_if_needed(
    page: &dyn PageDelegate,
    handle: ElementHandle,
    target: &Arc<dyn ExecutionContext>,
) -> Result<ElementHandle> {
    if handle.belongs_to(target) {
        return Ok(handle);
    }

    trace!(
        object_id = %handle.object_id(),
        from = %handle.context().id(),
        to = %target.id(),
        "Adopting handle"
    );
    let adopted = page.adopt_element_handle(&handle, target).await;
    release(handle).await;
    adopted
}

/// Adopts every handle into `target`, preserving order.
///
/// # Errors
///
/// Returns the first adoption error. Handles not yet adopted, and those
/// already adopted, are released.
pub async fn adopt_all(
    page: &dyn PageDelegate,
    handles: Vec<ElementHandle>,
    target: &Arc<dyn ExecutionContext>,
) -> Result<Vec<ElementHandle>> {
    let mut adopted = Vec::with_capacity(handles.len());
    let mut pending = handles.into_iter();
    while let Some(handle) = pending.next() {
        match adopt_if_needed(page, handle, target).await {
            Ok(handle) => adopted.push(handle),
            Err(e) => {
                release_detached(adopted.into_iter().chain(pending).map(Into::into).collect());
                return Err(e);
            }
        }
    }
    Ok(adopted)
}
