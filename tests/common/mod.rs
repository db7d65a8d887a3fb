//! Shared utilities for integration tests.
//!
//! Provides an in-memory page that stands in for a browser:
//! - A DOM arena with shadow roots and iframes
//! - Execution contexts running a small in-page selector engine
//! - A DevTools session answering `DOM.*` and `Runtime.*` commands
//! - A page delegate with handle adoption and session lookup
//!
//! The in-page engine behaves like a real one with respect to shadow DOM:
//! it descends into open shadow roots but never into closed ones, and never
//! into child frames. Every remote object is tracked so tests can assert
//! nothing leaked.

#![allow(dead_code)]

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::{Arc, Weak};

use async_trait::async_trait;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde_json::{Value, json};
use tracing_subscriber::EnvFilter;

use frame_selectors::protocol::{
    Command, DomCommand, NodeDescription, RuntimeCommand, ShadowRootType,
};
use frame_selectors::{
    BackendNodeId, ContextId, ElementHandle, Error, ExecutionContext, Frame, FrameId,
    FrameSelectors, Handle, JsHandle, ObjectId, PageDelegate, ParsedSelector, RemoteSession,
    Result, ScriptCall, SelectorRegistry, World,
};

// ============================================================================
// Logging
// ============================================================================

/// Initializes test logging, honoring `RUST_LOG`.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

// ============================================================================
// DOM Arena
// ============================================================================

/// Index of a node in the arena.
pub type NodeId = usize;

#[derive(Debug, Clone)]
enum NodeKind {
    Document,
    Element {
        tag: String,
        attributes: Vec<(String, String)>,
    },
    ShadowRoot(ShadowRootType),
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    shadow_root: Option<NodeId>,
    content_document: Option<NodeId>,
    /// Content frame of an iframe.
    frame_id: Option<FrameId>,
}

impl Node {
    fn new(kind: NodeKind, parent: Option<NodeId>) -> Self {
        Self {
            kind,
            parent,
            children: Vec::new(),
            shadow_root: None,
            content_document: None,
            frame_id: None,
        }
    }
}

#[derive(Debug, Clone)]
enum ObjectValue {
    Node(NodeId),
    Array(Vec<NodeId>),
    Null,
}

#[derive(Debug)]
struct RemoteObject {
    context: ContextId,
    value: ObjectValue,
}

// ============================================================================
// PageState
// ============================================================================

#[derive(Debug, Default)]
struct PageState {
    nodes: Vec<Node>,
    objects: FxHashMap<String, RemoteObject>,
    next_object: u64,
    next_context: i64,
    /// Frame of each context.
    contexts: FxHashMap<ContextId, FrameId>,
    /// Document node of each frame.
    documents: FxHashMap<FrameId, NodeId>,
    /// Every remote call, in order.
    calls: Vec<String>,
}

impl PageState {
    fn add_node(&mut self, kind: NodeKind, parent: Option<NodeId>) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(Node::new(kind, parent));
        id
    }

    fn backend(id: NodeId) -> BackendNodeId {
        BackendNodeId::new(id as i64 + 1)
    }

    fn node_of_backend(&self, id: BackendNodeId) -> Option<NodeId> {
        usize::try_from(id.get() - 1)
            .ok()
            .filter(|&index| index < self.nodes.len())
    }

    fn alloc(&mut self, context: ContextId, value: ObjectValue) -> ObjectId {
        self.next_object += 1;
        let id = format!("obj-{}", self.next_object);
        self.objects
            .insert(id.clone(), RemoteObject { context, value });
        ObjectId::new(id)
    }

    fn object(&self, object_id: &ObjectId, context: Option<ContextId>) -> Result<&RemoteObject> {
        let object = self
            .objects
            .get(object_id.as_str())
            .ok_or_else(|| Error::protocol(format!("Could not find object {object_id}")))?;
        match context {
            Some(context) if context != object.context => Err(Error::protocol(format!(
                "Object {object_id} belongs to context {}, not {context}",
                object.context
            ))),
            _ => Ok(object),
        }
    }

    fn node_of(&self, object_id: &ObjectId, context: Option<ContextId>) -> Result<NodeId> {
        match self.object(object_id, context)?.value {
            ObjectValue::Node(node) => Ok(node),
            _ => Err(Error::protocol(format!("Object {object_id} is not a node"))),
        }
    }

    fn release(&mut self, object_id: &ObjectId) -> Result<()> {
        self.objects
            .remove(object_id.as_str())
            .map(|_| ())
            .ok_or_else(|| Error::protocol(format!("Could not find object {object_id}")))
    }

    fn document_of(&self, context: ContextId) -> Result<NodeId> {
        self.contexts
            .get(&context)
            .and_then(|frame_id| self.documents.get(frame_id))
            .copied()
            .ok_or_else(|| Error::protocol(format!("Cannot find context with id {context}")))
    }

    fn scope_node(&self, context: ContextId, scope: Option<&ObjectId>) -> Result<NodeId> {
        match scope {
            Some(scope) => self.node_of(scope, Some(context)),
            None => self.document_of(context),
        }
    }

    // ------------------------------------------------------------------------
    // Introspection
    // ------------------------------------------------------------------------

    fn describe(&self, id: NodeId, depth: i32, pierce: bool) -> NodeDescription {
        let node = &self.nodes[id];
        let mut out = match &node.kind {
            NodeKind::Document => NodeDescription::new(Self::backend(id), 9, "#document"),
            NodeKind::Element { tag, attributes } => {
                let mut out =
                    NodeDescription::new(Self::backend(id), 1, tag.to_ascii_uppercase());
                out.attributes = attributes
                    .iter()
                    .flat_map(|(name, value)| [name.clone(), value.clone()])
                    .collect();
                out
            }
            NodeKind::ShadowRoot(mode) => {
                let mut out = NodeDescription::new(Self::backend(id), 11, "#document-fragment");
                out.shadow_root_type = Some(*mode);
                out
            }
        };
        out.frame_id = node.frame_id.clone();

        if depth != 0 {
            let next = if depth < 0 { depth } else { depth - 1 };
            out.children = node
                .children
                .iter()
                .map(|&child| self.describe(child, next, pierce))
                .collect();
            if pierce {
                if let Some(root) = node.shadow_root {
                    out.shadow_roots = vec![self.describe(root, next, pierce)];
                }
                if let Some(document) = node.content_document {
                    out.content_document = Some(Box::new(self.describe(document, next, pierce)));
                }
            }
        }
        out
    }

    // ------------------------------------------------------------------------
    // In-page engine
    // ------------------------------------------------------------------------

    /// Descendants visible to page script: light DOM and open shadow roots.
    fn page_descendants(&self, id: NodeId, out: &mut Vec<NodeId>) {
        let node = &self.nodes[id];
        if let Some(root) = node.shadow_root
            && matches!(
                self.nodes[root].kind,
                NodeKind::ShadowRoot(ShadowRootType::Open)
            )
        {
            self.page_descendants(root, out);
        }
        for &child in &node.children {
            out.push(child);
            self.page_descendants(child, out);
        }
    }

    /// Matches `tag#id.class` compounds; `*` or an empty tag matches any.
    fn matches_compound(&self, id: NodeId, compound: &str) -> bool {
        let NodeKind::Element { tag, attributes } = &self.nodes[id].kind else {
            return false;
        };
        let attribute = |name: &str| {
            attributes
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.as_str())
        };

        let tag_len = compound.find(['#', '.']).unwrap_or(compound.len());
        let wanted = &compound[..tag_len];
        if !wanted.is_empty() && wanted != "*" && !wanted.eq_ignore_ascii_case(tag) {
            return false;
        }

        let mut rest = &compound[tag_len..];
        while let Some(marker) = rest.chars().next() {
            let body = &rest[1..];
            let len = body.find(['#', '.']).unwrap_or(body.len());
            let value = &body[..len];
            let matched = match marker {
                '#' => attribute("id") == Some(value),
                _ => attribute("class")
                    .is_some_and(|classes| classes.split_whitespace().any(|c| c == value)),
            };
            if !matched {
                return false;
            }
            rest = &body[len..];
        }
        true
    }

    /// Runs a whitespace-separated chain of compounds below `scope`.
    fn query_css(&self, scope: NodeId, css: &str) -> Vec<NodeId> {
        let mut current = vec![scope];
        for compound in css.split_whitespace() {
            let mut next = Vec::new();
            for &node in &current {
                let mut below = Vec::new();
                self.page_descendants(node, &mut below);
                for candidate in below {
                    if self.matches_compound(candidate, compound) && !next.contains(&candidate) {
                        next.push(candidate);
                    }
                }
            }
            current = next;
        }
        current
    }

    fn run(&self, scope: NodeId, parsed: &ParsedSelector) -> Result<Vec<NodeId>> {
        let mut current = vec![scope];
        for part in &parsed.parts {
            current = match part.name.as_str() {
                "css" => {
                    let css = part.text_body().unwrap_or_default();
                    let mut next = Vec::new();
                    for &node in &current {
                        for found in self.query_css(node, css) {
                            if !next.contains(&found) {
                                next.push(found);
                            }
                        }
                    }
                    next
                }
                // The in-page engine counts from zero.
                "nth" => {
                    let index = part.nth_index().unwrap_or_default();
                    let index = if index < 0 {
                        current.len() as i64 + index
                    } else {
                        index
                    };
                    usize::try_from(index)
                        .ok()
                        .and_then(|index| current.get(index).copied())
                        .into_iter()
                        .collect()
                }
                "internal:or" | "internal:and" => {
                    let nested = part
                        .nested()
                        .ok_or_else(|| Error::script_error("Malformed composite selector"))?;
                    let other = self.run(scope, &nested.parsed)?;
                    let mut merged: Vec<NodeId> = if part.name == "internal:or" {
                        current.iter().chain(&other).copied().collect()
                    } else {
                        current.into_iter().filter(|n| other.contains(n)).collect()
                    };
                    merged.sort_unstable();
                    merged.dedup();
                    merged
                }
                other => {
                    return Err(Error::script_error(format!(
                        "Unknown engine \"{other}\" while parsing selector"
                    )));
                }
            };
        }
        Ok(current)
    }
}

// ============================================================================
// FakeContext
// ============================================================================

/// An execution context of a fake frame.
pub struct FakeContext {
    id: ContextId,
    world: World,
    frame_id: FrameId,
    state: Arc<Mutex<PageState>>,
    this: Weak<FakeContext>,
}

impl fmt::Debug for FakeContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FakeContext")
            .field("id", &self.id)
            .field("world", &self.world)
            .field("frame_id", &self.frame_id)
            .finish()
    }
}

impl FakeContext {
    fn shared(&self) -> Arc<dyn ExecutionContext> {
        self.this.upgrade().expect("context outlives its handles")
    }
}

#[async_trait]
impl ExecutionContext for FakeContext {
    fn id(&self) -> ContextId {
        self.id
    }

    fn world(&self) -> World {
        self.world
    }

    fn frame_id(&self) -> FrameId {
        self.frame_id.clone()
    }

    async fn evaluate_handle(&self, call: ScriptCall) -> Result<Handle> {
        let mut state = self.state.lock();
        match call {
            ScriptCall::QuerySelector {
                parsed,
                scope,
                strict,
            } => {
                state.calls.push("evaluate:querySelector".to_string());
                let root = state.scope_node(self.id, scope.as_ref())?;
                let found = state.run(root, &parsed)?;
                if strict && found.len() > 1 {
                    return Err(Error::script_error(format!(
                        "strict mode violation: selector resolved to {} elements",
                        found.len()
                    )));
                }
                Ok(match found.first() {
                    Some(&node) => Handle::Element(ElementHandle::new(
                        state.alloc(self.id, ObjectValue::Node(node)),
                        self.shared(),
                    )),
                    None => Handle::Raw(JsHandle::new(
                        state.alloc(self.id, ObjectValue::Null),
                        self.shared(),
                    )),
                })
            }
            ScriptCall::QuerySelectorAll { parsed, scope } => {
                state.calls.push("evaluate:querySelectorAll".to_string());
                let root = state.scope_node(self.id, scope.as_ref())?;
                let found = state.run(root, &parsed)?;
                Ok(Handle::Raw(JsHandle::new(
                    state.alloc(self.id, ObjectValue::Array(found)),
                    self.shared(),
                )))
            }
            ScriptCall::QueryCount { .. } => Err(Error::script_error(
                "queryCount returns a value, not a handle",
            )),
        }
    }

    async fn evaluate(&self, call: ScriptCall) -> Result<Value> {
        let mut state = self.state.lock();
        state.calls.push("evaluate:queryCount".to_string());
        match call {
            ScriptCall::QueryCount { parsed } => {
                let document = state.document_of(self.id)?;
                Ok(json!(state.run(document, &parsed)?.len()))
            }
            _ => Err(Error::script_error("Only queryCount returns a value")),
        }
    }

    async fn properties(&self, object_id: &ObjectId) -> Result<Vec<Handle>> {
        let mut state = self.state.lock();
        state.calls.push("properties".to_string());
        let nodes = match &state.object(object_id, Some(self.id))?.value {
            ObjectValue::Array(nodes) => nodes.clone(),
            _ => Vec::new(),
        };
        Ok(nodes
            .into_iter()
            .map(|node| {
                Handle::Element(ElementHandle::new(
                    state.alloc(self.id, ObjectValue::Node(node)),
                    self.shared(),
                ))
            })
            .collect())
    }

    async fn json_value(&self, object_id: &ObjectId) -> Result<Value> {
        let state = self.state.lock();
        Ok(match &state.object(object_id, Some(self.id))?.value {
            ObjectValue::Array(nodes) => nodes
                .iter()
                .map(|&node| json!(PageState::backend(node)))
                .collect(),
            ObjectValue::Node(_) => json!({}),
            ObjectValue::Null => Value::Null,
        })
    }

    async fn release_object(&self, object_id: &ObjectId) -> Result<()> {
        let mut state = self.state.lock();
        state.calls.push("release".to_string());
        state.release(object_id)
    }
}

// ============================================================================
// FakeFrame
// ============================================================================

/// A frame with a main and a utility context.
#[derive(Debug)]
pub struct FakeFrame {
    id: FrameId,
    main: Arc<FakeContext>,
    utility: Arc<FakeContext>,
}

impl FakeFrame {
    /// Returns the context of a world.
    pub fn context_of(&self, world: World) -> Arc<dyn ExecutionContext> {
        match world {
            World::Main => self.main.clone(),
            World::Utility => self.utility.clone(),
        }
    }
}

#[async_trait]
impl Frame for FakeFrame {
    fn id(&self) -> FrameId {
        self.id.clone()
    }

    async fn context(&self, world: World) -> Result<Arc<dyn ExecutionContext>> {
        Ok(self.context_of(world))
    }
}

// ============================================================================
// FakeSession
// ============================================================================

/// A DevTools session over the shared page state.
pub struct FakeSession {
    name: String,
    state: Arc<Mutex<PageState>>,
    sent: Mutex<Vec<&'static str>>,
}

impl FakeSession {
    /// Returns the methods sent through this session.
    pub fn sent(&self) -> Vec<&'static str> {
        self.sent.lock().clone()
    }

    /// Returns the session's name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

#[async_trait]
impl RemoteSession for FakeSession {
    async fn send(&self, command: Command) -> Result<Value> {
        self.sent.lock().push(command.method());
        let mut state = self.state.lock();
        state.calls.push(command.method().to_string());

        match command {
            Command::Dom(DomCommand::DescribeNode {
                object_id,
                depth,
                pierce,
            }) => {
                let node = state.node_of(&object_id, None)?;
                Ok(json!({ "node": state.describe(node, depth, pierce) }))
            }
            Command::Dom(DomCommand::ResolveNode {
                backend_node_id,
                execution_context_id,
            }) => {
                let node = state
                    .node_of_backend(backend_node_id)
                    .ok_or_else(|| Error::protocol("No node with given id found"))?;
                state.document_of(execution_context_id)?;
                let object_id = state.alloc(execution_context_id, ObjectValue::Node(node));
                Ok(json!({ "object": { "objectId": object_id.as_str() } }))
            }
            Command::Runtime(RuntimeCommand::Evaluate {
                expression,
                context_id,
                ..
            }) => {
                if expression != "document" {
                    return Ok(json!({
                        "result": { "type": "undefined" },
                        "exceptionDetails": { "text": format!("Cannot evaluate {expression}") }
                    }));
                }
                let document = state.document_of(context_id)?;
                let object_id = state.alloc(context_id, ObjectValue::Node(document));
                Ok(json!({ "result": { "objectId": object_id.as_str() } }))
            }
            Command::Runtime(RuntimeCommand::ReleaseObject { object_id }) => {
                state.release(&object_id)?;
                Ok(json!({}))
            }
        }
    }
}

// ============================================================================
// FakePage
// ============================================================================

/// An in-memory page implementing every collaborator trait.
pub struct FakePage {
    state: Arc<Mutex<PageState>>,
    frames: Mutex<FxHashMap<FrameId, Arc<FakeFrame>>>,
    main_frame: FrameId,
    main_session: Mutex<Option<Arc<FakeSession>>>,
    frame_sessions: Mutex<FxHashMap<FrameId, Arc<FakeSession>>>,
}

impl FakePage {
    /// Creates a page with an empty main document and a main session.
    pub fn new() -> Arc<Self> {
        let state = Arc::new(Mutex::new(PageState::default()));
        let main_frame = FrameId::new("main-frame");
        let page = Self {
            state: Arc::clone(&state),
            frames: Mutex::new(FxHashMap::default()),
            main_frame: main_frame.clone(),
            main_session: Mutex::new(Some(Arc::new(FakeSession {
                name: "main".to_string(),
                state,
                sent: Mutex::new(Vec::new()),
            }))),
            frame_sessions: Mutex::new(FxHashMap::default()),
        };
        let document = page.state.lock().add_node(NodeKind::Document, None);
        page.add_frame(main_frame, document);
        Arc::new(page)
    }

    fn add_frame(&self, id: FrameId, document: NodeId) -> Arc<FakeFrame> {
        let mut state = self.state.lock();
        let mut context = |world: World| {
            state.next_context += 1;
            let context_id = ContextId::new(state.next_context);
            state.contexts.insert(context_id, id.clone());
            Arc::new_cyclic(|this| FakeContext {
                id: context_id,
                world,
                frame_id: id.clone(),
                state: Arc::clone(&self.state),
                this: this.clone(),
            })
        };
        let main = context(World::Main);
        let utility = context(World::Utility);
        state.documents.insert(id.clone(), document);

        let frame = Arc::new(FakeFrame {
            id: id.clone(),
            main,
            utility,
        });
        self.frames.lock().insert(id, Arc::clone(&frame));
        frame
    }

    // ------------------------------------------------------------------------
    // Building
    // ------------------------------------------------------------------------

    /// Returns the main document node.
    pub fn document(&self) -> NodeId {
        self.document_of(&self.main_frame)
    }

    /// Returns the document node of a frame.
    pub fn document_of(&self, frame_id: &FrameId) -> NodeId {
        self.state.lock().documents[frame_id]
    }

    /// Appends an element under `parent`.
    pub fn append(&self, parent: NodeId, tag: &str, attributes: &[(&str, &str)]) -> NodeId {
        let mut state = self.state.lock();
        let kind = NodeKind::Element {
            tag: tag.to_string(),
            attributes: attributes
                .iter()
                .map(|(name, value)| ((*name).to_string(), (*value).to_string()))
                .collect(),
        };
        let id = state.add_node(kind, Some(parent));
        state.nodes[parent].children.push(id);
        id
    }

    /// Attaches a shadow root to `host`.
    pub fn attach_shadow(&self, host: NodeId, mode: ShadowRootType) -> NodeId {
        let mut state = self.state.lock();
        let id = state.add_node(NodeKind::ShadowRoot(mode), Some(host));
        state.nodes[host].shadow_root = Some(id);
        id
    }

    /// Appends an `<iframe>` whose content frame is `frame_id`.
    ///
    /// Returns the iframe element and the child frame's document.
    pub fn append_frame(
        &self,
        parent: NodeId,
        frame_id: &str,
        attributes: &[(&str, &str)],
    ) -> (NodeId, NodeId) {
        let iframe = self.append(parent, "iframe", attributes);
        let frame_id = FrameId::new(frame_id);
        let document = {
            let mut state = self.state.lock();
            let document = state.add_node(NodeKind::Document, None);
            state.nodes[iframe].content_document = Some(document);
            state.nodes[iframe].frame_id = Some(frame_id.clone());
            document
        };
        self.add_frame(frame_id, document);
        (iframe, document)
    }

    // ------------------------------------------------------------------------
    // Sessions
    // ------------------------------------------------------------------------

    /// Returns the main session, if attached.
    pub fn main_session(&self) -> Option<Arc<FakeSession>> {
        self.main_session.lock().clone()
    }

    /// Gives a frame its own session.
    pub fn attach_session(&self, frame_id: &FrameId) -> Arc<FakeSession> {
        let session = Arc::new(FakeSession {
            name: frame_id.to_string(),
            state: Arc::clone(&self.state),
            sent: Mutex::new(Vec::new()),
        });
        self.frame_sessions
            .lock()
            .insert(frame_id.clone(), Arc::clone(&session));
        session
    }

    /// Removes the main session.
    pub fn detach_main_session(&self) {
        *self.main_session.lock() = None;
    }

    // ------------------------------------------------------------------------
    // Frames and handles
    // ------------------------------------------------------------------------

    /// Returns the main frame.
    pub fn main_frame(&self) -> Arc<FakeFrame> {
        self.frame(&self.main_frame)
    }

    /// Returns a frame by id.
    pub fn frame(&self, frame_id: &FrameId) -> Arc<FakeFrame> {
        Arc::clone(&self.frames.lock()[frame_id])
    }

    /// Returns a resolver rooted at the main frame.
    pub fn selectors(self: &Arc<Self>) -> FrameSelectors {
        FrameSelectors::new(
            self.main_frame(),
            Arc::clone(self) as Arc<dyn PageDelegate>,
            Arc::new(SelectorRegistry::new()),
        )
    }

    /// Creates a handle to `node` in a context.
    pub fn handle(&self, node: NodeId, context: &Arc<dyn ExecutionContext>) -> ElementHandle {
        let object_id = self
            .state
            .lock()
            .alloc(context.id(), ObjectValue::Node(node));
        ElementHandle::new(object_id, Arc::clone(context))
    }

    /// Returns the node a live handle points at.
    pub fn node_of(&self, handle: &ElementHandle) -> NodeId {
        self.state
            .lock()
            .node_of(handle.object_id(), Some(handle.context().id()))
            .expect("handle is live")
    }

    /// Returns the backend id of a node.
    pub fn backend_id(&self, node: NodeId) -> BackendNodeId {
        PageState::backend(node)
    }

    // ------------------------------------------------------------------------
    // Bookkeeping
    // ------------------------------------------------------------------------

    /// Returns the number of unreleased remote objects.
    pub fn live_objects(&self) -> usize {
        self.state.lock().objects.len()
    }

    /// Returns every remote call so far.
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().calls.clone()
    }

    /// Counts remote calls named `name`.
    pub fn call_count(&self, name: &str) -> usize {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|call| *call == name)
            .count()
    }

    /// Forgets recorded calls.
    pub fn reset_calls(&self) {
        self.state.lock().calls.clear();
    }
}

#[async_trait]
impl PageDelegate for FakePage {
    async fn content_frame(&self, element: &ElementHandle) -> Result<Option<Arc<dyn Frame>>> {
        let frame_id = {
            let mut state = self.state.lock();
            state.calls.push("contentFrame".to_string());
            let node = state.node_of(element.object_id(), Some(element.context().id()))?;
            state.nodes[node].frame_id.clone()
        };
        Ok(frame_id.map(|id| self.frame(&id) as Arc<dyn Frame>))
    }

    async fn adopt_element_handle(
        &self,
        handle: &ElementHandle,
        context: &Arc<dyn ExecutionContext>,
    ) -> Result<ElementHandle> {
        let mut state = self.state.lock();
        state.calls.push("adopt".to_string());
        let node = state.node_of(handle.object_id(), Some(handle.context().id()))?;
        let object_id = state.alloc(context.id(), ObjectValue::Node(node));
        Ok(ElementHandle::new(object_id, Arc::clone(context)))
    }

    fn session_for_frame(&self, frame_id: &FrameId) -> Option<Arc<dyn RemoteSession>> {
        self.frame_sessions
            .lock()
            .get(frame_id)
            .map(|session| Arc::clone(session) as Arc<dyn RemoteSession>)
    }

    fn main_frame_session(&self) -> Option<Arc<dyn RemoteSession>> {
        self.main_session
            .lock()
            .as_ref()
            .map(|session| Arc::clone(session) as Arc<dyn RemoteSession>)
    }
}
