//! Node sets keyed by backend id.
//!
//! A [`ScopingSet`] holds element handles ordered by ascending
//! [`BackendNodeId`] and never holds two handles to the same node, even when
//! they came from different shadow roots or different `or` branches.
//!
//! Every handle in a set is owned by it, except the traversal's starting
//! node ([`ScopeOrigin::DocumentRoot`]), which belongs to the caller.

// ============================================================================
// Imports
// ============================================================================

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};
use std::mem;

use crate::identifiers::BackendNodeId;
use crate::runtime::ElementHandle;
use crate::runtime::handle::{release, release_detached};

// ============================================================================
// ScopeOrigin
// ============================================================================

/// Where a scoping element was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeOrigin {
    /// The traversal's starting node. Borrowed, never released by the set.
    DocumentRoot,
    /// Matched in the light tree.
    Document,
    /// Matched inside the closed shadow root with this id.
    ShadowRoot(BackendNodeId),
}

// ============================================================================
// ScopingElement
// ============================================================================

/// An element handle with its node identity.
#[derive(Debug)]
pub struct ScopingElement {
    handle: ElementHandle,
    backend_node_id: BackendNodeId,
    origin: ScopeOrigin,
}

impl ScopingElement {
    /// Creates a scoping element.
    pub fn new(handle: ElementHandle, backend_node_id: BackendNodeId, origin: ScopeOrigin) -> Self {
        Self {
            handle,
            backend_node_id,
            origin,
        }
    }

    /// Returns the handle.
    #[inline]
    #[must_use]
    pub fn handle(&self) -> &ElementHandle {
        &self.handle
    }

    /// Returns the node identity.
    #[inline]
    #[must_use]
    pub fn backend_node_id(&self) -> BackendNodeId {
        self.backend_node_id
    }

    /// Returns where the element was found.
    #[inline]
    #[must_use]
    pub fn origin(&self) -> ScopeOrigin {
        self.origin
    }

    /// Returns `true` for the borrowed starting node.
    #[inline]
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.origin == ScopeOrigin::DocumentRoot
    }

    /// Unwraps the handle.
    #[inline]
    #[must_use]
    pub fn into_handle(self) -> ElementHandle {
        self.handle
    }

    /// Releases the handle unless it is the borrowed starting node.
    pub async fn release(self) {
        if !self.is_root() {
            release(self.handle).await;
        }
    }
}

// ============================================================================
// ScopingSet
// ============================================================================

/// Ordered, duplicate-free set of scoping elements.
#[derive(Debug, Default)]
pub struct ScopingSet {
    elements: BTreeMap<BackendNodeId, ScopingElement>,
}

impl ScopingSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a set holding only the starting node.
    #[must_use]
    pub fn with_root(handle: ElementHandle, backend_node_id: BackendNodeId) -> Self {
        let mut set = Self::new();
        set.elements.insert(
            backend_node_id,
            ScopingElement::new(handle, backend_node_id, ScopeOrigin::DocumentRoot),
        );
        set
    }

    /// Returns the number of elements.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Returns `true` if the set is empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Returns `true` if a node is in the set.
    #[inline]
    #[must_use]
    pub fn contains(&self, backend_node_id: BackendNodeId) -> bool {
        self.elements.contains_key(&backend_node_id)
    }

    /// Returns the node identities in order.
    #[must_use]
    pub fn ids(&self) -> BTreeSet<BackendNodeId> {
        self.elements.keys().copied().collect()
    }

    /// Iterates elements in ascending backend id order.
    pub fn iter(&self) -> impl Iterator<Item = &ScopingElement> {
        self.elements.values()
    }

    /// Inserts an element.
    ///
    /// Returns the element back if its node is already present; the first
    /// handle seen for a node wins.
    pub fn insert(&mut self, element: ScopingElement) -> Option<ScopingElement> {
        match self.elements.entry(element.backend_node_id) {
            Entry::Vacant(slot) => {
                slot.insert(element);
                None
            }
            Entry::Occupied(_) => Some(element),
        }
    }

    /// Moves every element of `other` into this set.
    ///
    /// Returns the elements of `other` whose node was already present.
    pub fn absorb(&mut self, mut other: ScopingSet) -> Vec<ScopingElement> {
        mem::take(&mut other.elements)
            .into_values()
            .filter_map(|element| self.insert(element))
            .collect()
    }

    /// Keeps only the element at a 1-based position.
    ///
    /// Negative positions count from the end (`-1` is the last element).
    /// `0` also selects the first element, as emitted for "first match".
    /// Returns the removed elements, or `None` (set untouched) when the
    /// position is out of range.
    pub fn retain_nth(&mut self, position: i64) -> Option<Vec<ScopingElement>> {
        let len = i64::try_from(self.elements.len()).ok()?;
        let index = match position {
            0 => 0,
            p if p > 0 => p - 1,
            p => len + p,
        };
        if !(0..len).contains(&index) {
            return None;
        }

        let key = *self.elements.keys().nth(usize::try_from(index).ok()?)?;
        let kept = self.elements.remove(&key)?;
        let discarded = mem::take(&mut self.elements).into_values().collect();
        self.elements.insert(key, kept);
        Some(discarded)
    }

    /// Keeps only elements whose node is in `ids`.
    ///
    /// Returns the removed elements.
    pub fn retain_ids(&mut self, ids: &BTreeSet<BackendNodeId>) -> Vec<ScopingElement> {
        let (kept, discarded): (BTreeMap<_, _>, BTreeMap<_, _>) = mem::take(&mut self.elements)
            .into_iter()
            .partition(|(id, _)| ids.contains(id));
        self.elements = kept;
        discarded.into_values().collect()
    }

    /// Takes the elements out in ascending backend id order.
    #[must_use]
    pub fn into_elements(mut self) -> Vec<ScopingElement> {
        mem::take(&mut self.elements).into_values().collect()
    }

    /// Releases every owned handle.
    pub async fn release(self) {
        for element in self.into_elements() {
            element.release().await;
        }
    }
}

impl Drop for ScopingSet {
    fn drop(&mut self) {
        let owned = mem::take(&mut self.elements)
            .into_values()
            .filter(|element| !element.is_root())
            .map(|element| element.handle.into())
            .collect();
        release_detached(owned);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    use async_trait::async_trait;
    use proptest::prelude::*;
    use serde_json::Value;

    use crate::error::{Error, Result};
    use crate::identifiers::{ContextId, FrameId, ObjectId};
    use crate::runtime::{ExecutionContext, Handle, ScriptCall, World};

    #[derive(Debug)]
    struct InertContext;

    #[async_trait]
    impl ExecutionContext for InertContext {
        fn id(&self) -> ContextId {
            ContextId::new(1)
        }

        fn world(&self) -> World {
            World::Main
        }

        fn frame_id(&self) -> FrameId {
            FrameId::new("main")
        }

        async fn evaluate_handle(&self, _call: ScriptCall) -> Result<Handle> {
            Err(Error::script_error("inert"))
        }

        async fn evaluate(&self, _call: ScriptCall) -> Result<Value> {
            Err(Error::script_error("inert"))
        }

        async fn properties(&self, _object_id: &ObjectId) -> Result<Vec<Handle>> {
            Ok(Vec::new())
        }

        async fn json_value(&self, _object_id: &ObjectId) -> Result<Value> {
            Ok(Value::Null)
        }

        async fn release_object(&self, _object_id: &ObjectId) -> Result<()> {
            Ok(())
        }
    }

    fn element(id: i64, tag: &str) -> ScopingElement {
        let context: Arc<dyn ExecutionContext> = Arc::new(InertContext);
        ScopingElement::new(
            ElementHandle::new(ObjectId::new(format!("{tag}-{id}")), context),
            BackendNodeId::new(id),
            ScopeOrigin::Document,
        )
    }

    fn set_of(ids: &[i64]) -> ScopingSet {
        let mut set = ScopingSet::new();
        for &id in ids {
            let _ = set.insert(element(id, "e"));
        }
        set
    }

    fn ids_of(set: &ScopingSet) -> Vec<i64> {
        set.iter().map(|e| e.backend_node_id().get()).collect()
    }

    #[test]
    fn test_insert_keeps_first_duplicate() {
        let mut set = ScopingSet::new();
        assert!(set.insert(element(5, "first")).is_none());
        let rejected = set.insert(element(5, "second")).expect("duplicate rejected");
        assert_eq!(rejected.handle().object_id().as_str(), "second-5");
        assert_eq!(set.len(), 1);
        assert_eq!(
            set.iter().next().map(|e| e.handle().object_id().as_str()),
            Some("first-5")
        );
    }

    #[test]
    fn test_retain_nth_positive_and_negative() {
        let mut set = set_of(&[30, 10, 20]);
        let discarded = set.retain_nth(1).expect("in range");
        assert_eq!(ids_of(&set), [10]);
        assert_eq!(discarded.len(), 2);

        let mut set = set_of(&[30, 10, 20]);
        set.retain_nth(-1).expect("in range");
        assert_eq!(ids_of(&set), [30]);

        let mut set = set_of(&[30, 10, 20]);
        set.retain_nth(-3).expect("in range");
        assert_eq!(ids_of(&set), [10]);
    }

    #[test]
    fn test_retain_nth_zero_is_first() {
        let mut set = set_of(&[30, 10, 20]);
        let discarded = set.retain_nth(0).expect("in range");
        assert_eq!(ids_of(&set), [10]);
        assert_eq!(discarded.len(), 2);

        assert!(ScopingSet::new().retain_nth(0).is_none());
    }

    #[test]
    fn test_retain_nth_out_of_range_leaves_set() {
        let mut set = set_of(&[1, 2]);
        assert!(set.retain_nth(3).is_none());
        assert!(set.retain_nth(-3).is_none());
        assert_eq!(ids_of(&set), [1, 2]);

        assert!(ScopingSet::new().retain_nth(1).is_none());
    }

    #[test]
    fn test_retain_ids() {
        let mut set = set_of(&[1, 2, 3, 4]);
        let filter: BTreeSet<_> = [2, 4, 9].into_iter().map(BackendNodeId::new).collect();
        let discarded = set.retain_ids(&filter);
        assert_eq!(ids_of(&set), [2, 4]);
        let mut gone: Vec<_> = discarded.iter().map(|e| e.backend_node_id().get()).collect();
        gone.sort_unstable();
        assert_eq!(gone, [1, 3]);
    }

    #[test]
    fn test_absorb_returns_duplicates() {
        let mut set = set_of(&[1, 3]);
        let duplicates = set.absorb(set_of(&[2, 3]));
        assert_eq!(ids_of(&set), [1, 2, 3]);
        assert_eq!(duplicates.len(), 1);
        assert_eq!(duplicates[0].backend_node_id().get(), 3);
    }

    #[test]
    fn test_root_is_flagged() {
        let context: Arc<dyn ExecutionContext> = Arc::new(InertContext);
        let handle = ElementHandle::new(ObjectId::new("doc"), context);
        let set = ScopingSet::with_root(handle, BackendNodeId::new(1));
        assert!(set.iter().all(ScopingElement::is_root));
        assert!(set.contains(BackendNodeId::new(1)));
    }

    proptest! {
        #[test]
        fn prop_set_is_sorted_and_unique(ids in prop::collection::vec(-50i64..50, 0..40)) {
            let set = set_of(&ids);
            let got = ids_of(&set);

            let mut expected = ids.clone();
            expected.sort_unstable();
            expected.dedup();
            prop_assert_eq!(got, expected);
        }

        #[test]
        fn prop_absorb_is_union(a in prop::collection::vec(0i64..30, 0..20), b in prop::collection::vec(0i64..30, 0..20)) {
            let mut left = set_of(&a);
            let right = set_of(&b);
            let before = left.len() + right.len();
            let duplicates = left.absorb(right);

            let union: BTreeSet<i64> = a.iter().chain(&b).copied().collect();
            prop_assert_eq!(ids_of(&left), union.into_iter().collect::<Vec<_>>());
            prop_assert_eq!(left.len() + duplicates.len(), before);
        }

        #[test]
        fn prop_retain_nth_picks_sorted_position(ids in prop::collection::vec(0i64..100, 1..20), pick in 1usize..20) {
            let mut set = set_of(&ids);
            let sorted = ids_of(&set);
            let position = i64::try_from(pick).unwrap_or(i64::MAX);
            match set.retain_nth(position) {
                Some(_) => prop_assert_eq!(ids_of(&set), vec![sorted[pick - 1]]),
                None => prop_assert!(pick > sorted.len()),
            }
        }
    }
}
