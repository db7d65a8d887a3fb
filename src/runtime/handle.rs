//! Owned handles to remote objects.
//!
//! A handle pins a remote object inside one execution context. Handles are
//! released explicitly with `dispose`, which consumes them, so a released
//! handle cannot be used again.
//!
//! Whether a handle points at a DOM node is decided when it is created
//! ([`Handle::Element`] vs [`Handle::Raw`]), never inferred later.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::mem;
use std::sync::Arc;

use serde_json::Value;
use tracing::{trace, warn};

use crate::error::Result;
use crate::identifiers::{ContextId, ObjectId};

use super::ExecutionContext;

// ============================================================================
// JsHandle
// ============================================================================

/// Internal shared state for a handle.
struct HandleInner {
    /// Remote object id.
    object_id: ObjectId,
    /// Context owning the object.
    context: Arc<dyn ExecutionContext>,
}

/// Handle to an arbitrary remote object.
#[derive(Clone)]
pub struct JsHandle {
    inner: Arc<HandleInner>,
}

impl fmt::Debug for JsHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsHandle")
            .field("object_id", &self.inner.object_id)
            .field("context_id", &self.inner.context.id())
            .finish()
    }
}

impl JsHandle {
    /// Creates a handle for an object of `context`.
    pub fn new(object_id: ObjectId, context: Arc<dyn ExecutionContext>) -> Self {
        Self {
            inner: Arc::new(HandleInner { object_id, context }),
        }
    }

    /// Returns the remote object id.
    #[inline]
    #[must_use]
    pub fn object_id(&self) -> &ObjectId {
        &self.inner.object_id
    }

    /// Returns the owning context.
    #[inline]
    #[must_use]
    pub fn context(&self) -> &Arc<dyn ExecutionContext> {
        &self.inner.context
    }

    /// Returns the owning context's id.
    #[inline]
    #[must_use]
    pub fn context_id(&self) -> ContextId {
        self.inner.context.id()
    }

    /// Returns `true` if the object lives in `context`.
    #[inline]
    #[must_use]
    pub fn belongs_to(&self, context: &Arc<dyn ExecutionContext>) -> bool {
        self.context_id() == context.id()
    }

    /// Returns handles to the object's indexed properties.
    pub async fn properties(&self) -> Result<Vec<Handle>> {
        self.inner.context.properties(&self.inner.object_id).await
    }

    /// Returns the object serialized by value.
    pub async fn json_value(&self) -> Result<Value> {
        self.inner.context.json_value(&self.inner.object_id).await
    }

    /// Releases the remote object.
    pub async fn dispose(self) -> Result<()> {
        trace!(object_id = %self.inner.object_id, "Disposing handle");
        self.inner
            .context
            .release_object(&self.inner.object_id)
            .await
    }
}

// ============================================================================
// ElementHandle
// ============================================================================

/// Handle to a DOM node (element, document or shadow root).
#[derive(Clone)]
pub struct ElementHandle {
    handle: JsHandle,
}

impl fmt::Debug for ElementHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElementHandle")
            .field("object_id", self.handle.object_id())
            .field("context_id", &self.handle.context_id())
            .finish()
    }
}

impl ElementHandle {
    /// Creates an element handle for a node object of `context`.
    pub fn new(object_id: ObjectId, context: Arc<dyn ExecutionContext>) -> Self {
        Self {
            handle: JsHandle::new(object_id, context),
        }
    }

    /// Returns the remote object id.
    #[inline]
    #[must_use]
    pub fn object_id(&self) -> &ObjectId {
        self.handle.object_id()
    }

    /// Returns the owning context.
    #[inline]
    #[must_use]
    pub fn context(&self) -> &Arc<dyn ExecutionContext> {
        self.handle.context()
    }

    /// Returns `true` if the node handle lives in `context`.
    #[inline]
    #[must_use]
    pub fn belongs_to(&self, context: &Arc<dyn ExecutionContext>) -> bool {
        self.handle.belongs_to(context)
    }

    /// Returns the underlying object handle.
    #[inline]
    #[must_use]
    pub fn as_js(&self) -> &JsHandle {
        &self.handle
    }

    /// Releases the remote node object.
    pub async fn dispose(self) -> Result<()> {
        self.handle.dispose().await
    }
}

impl From<ElementHandle> for JsHandle {
    fn from(element: ElementHandle) -> Self {
        element.handle
    }
}

// ============================================================================
// Handle
// ============================================================================

/// A handle tagged with what it points at.
#[derive(Debug, Clone)]
pub enum Handle {
    /// A DOM node.
    Element(ElementHandle),
    /// Any other value (arrays, primitives, `null`).
    Raw(JsHandle),
}

impl Handle {
    /// Returns the element handle, or gives back the raw handle.
    pub fn into_element(self) -> std::result::Result<ElementHandle, JsHandle> {
        match self {
            Self::Element(element) => Ok(element),
            Self::Raw(raw) => Err(raw),
        }
    }

    /// Returns the remote object id.
    #[must_use]
    pub fn object_id(&self) -> &ObjectId {
        match self {
            Self::Element(element) => element.object_id(),
            Self::Raw(raw) => raw.object_id(),
        }
    }

    /// Releases the remote object.
    pub async fn dispose(self) -> Result<()> {
        JsHandle::from(self).dispose().await
    }
}

impl From<Handle> for JsHandle {
    fn from(handle: Handle) -> Self {
        match handle {
            Handle::Element(element) => element.into(),
            Handle::Raw(raw) => raw,
        }
    }
}

// ============================================================================
// Release Helpers
// ============================================================================

/// Disposes a handle, logging instead of failing.
pub(crate) async fn release(handle: impl Into<JsHandle>) {
    let handle = handle.into();
    let object_id = handle.object_id().clone();
    if let Err(e) = handle.dispose().await {
        warn!(%object_id, error = %e, "Failed to release remote object");
    }
}

/// Disposes handles on a background task.
///
/// Used when an owner is dropped before it could release its handles, e.g.
/// when the caller abandons an in-flight resolution. Best effort: without a
/// tokio runtime the objects stay alive until the page goes away.
pub(crate) fn release_detached(handles: Vec<JsHandle>) {
    if handles.is_empty() {
        return;
    }
    match tokio::runtime::Handle::try_current() {
        Ok(runtime) => {
            trace!(count = handles.len(), "Releasing abandoned handles");
            runtime.spawn(async move {
                for handle in handles {
                    release(handle).await;
                }
            });
        }
        Err(_) => {
            warn!(
                count = handles.len(),
                "No runtime to release abandoned handles"
            );
        }
    }
}

// ============================================================================
// HandleScope
// ============================================================================

/// Collects intermediate handles so they are released on every path.
///
/// Call [`release`](Self::release) on the success path. If the scope is
/// dropped with handles still tracked (early `?` return, cancellation) they
/// are released in the background.
#[derive(Default)]
pub(crate) struct HandleScope {
    handles: Vec<JsHandle>,
}

impl HandleScope {
    /// Creates an empty scope.
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Tracks a handle for release.
    pub(crate) fn track(&mut self, handle: impl Into<JsHandle>) {
        self.handles.push(handle.into());
    }

    /// Releases every tracked handle, in tracking order.
    pub(crate) async fn release(mut self) {
        for handle in mem::take(&mut self.handles) {
            release(handle).await;
        }
    }
}

impl Drop for HandleScope {
    fn drop(&mut self) {
        release_detached(mem::take(&mut self.handles));
    }
}
