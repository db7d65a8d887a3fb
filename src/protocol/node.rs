//! Node descriptions returned by `DOM.describeNode`.
//!
//! With `pierce: true` the description includes every shadow root, closed
//! ones included, which the in-page script cannot reach.

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};

use crate::identifiers::{BackendNodeId, FrameId};

// ============================================================================
// Constants
// ============================================================================

/// Node names whose children belong to another document.
const FRAME_NODE_NAMES: &[&str] = &["IFRAME", "FRAME"];

/// Maximum attribute value length shown in previews.
const PREVIEW_VALUE_LIMIT: usize = 50;

// ============================================================================
// Types
// ============================================================================

/// Mode of a shadow root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ShadowRootType {
    /// Browser-internal shadow root.
    UserAgent,
    /// `attachShadow({ mode: "open" })`.
    Open,
    /// `attachShadow({ mode: "closed" })`.
    Closed,
}

/// A described DOM node and, depending on depth, its subtree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDescription {
    /// Stable node identity.
    pub backend_node_id: BackendNodeId,

    /// DOM `nodeType` (1 element, 9 document, 11 fragment).
    #[serde(default)]
    pub node_type: u32,

    /// Upper-cased node name for elements (`DIV`, `#document`, ...).
    #[serde(default)]
    pub node_name: String,

    /// Flat `[name, value, name, value, ...]` attribute list.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<String>,

    /// Light DOM children.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeDescription>,

    /// Shadow roots hosted by this element.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub shadow_roots: Vec<NodeDescription>,

    /// Mode, when this node is a shadow root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shadow_root_type: Option<ShadowRootType>,

    /// Frame owned by this element, for frame owners.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_id: Option<FrameId>,

    /// Document of a frame owner.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_document: Option<Box<NodeDescription>>,
}

/// Envelope of the `DOM.describeNode` result.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct DescribeNodeResult {
    pub(crate) node: NodeDescription,
}

// ============================================================================
// NodeDescription
// ============================================================================

impl NodeDescription {
    /// Creates a bare description.
    pub fn new(backend_node_id: BackendNodeId, node_type: u32, node_name: impl Into<String>) -> Self {
        Self {
            backend_node_id,
            node_type,
            node_name: node_name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
            shadow_roots: Vec::new(),
            shadow_root_type: None,
            frame_id: None,
            content_document: None,
        }
    }

    /// Returns `true` for `<iframe>` and `<frame>` elements.
    #[inline]
    #[must_use]
    pub fn is_frame_owner(&self) -> bool {
        FRAME_NODE_NAMES
            .iter()
            .any(|name| self.node_name.eq_ignore_ascii_case(name))
    }

    /// Returns the value of an attribute.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .chunks_exact(2)
            .find(|pair| pair[0] == name)
            .map(|pair| pair[1].as_str())
    }

    /// Collects closed shadow roots in the subtree.
    ///
    /// Depth-first. A host's shadow roots (and everything below them) come
    /// before its children. Children of frame owners are skipped: they live
    /// in another document.
    #[must_use]
    pub fn closed_shadow_roots(&self) -> Vec<BackendNodeId> {
        fn collect(node: &NodeDescription, out: &mut Vec<BackendNodeId>) {
            for root in &node.shadow_roots {
                if root.shadow_root_type == Some(ShadowRootType::Closed) {
                    out.push(root.backend_node_id);
                }
                collect(root, out);
            }
            if !node.is_frame_owner() {
                for child in &node.children {
                    collect(child, out);
                }
            }
        }

        let mut out = Vec::new();
        collect(self, &mut out);
        out
    }

    /// Renders a short opening-tag preview for diagnostics.
    #[must_use]
    pub fn preview(&self) -> String {
        if self.node_type != 1 {
            return self.node_name.clone();
        }

        let mut out = format!("<{}", self.node_name.to_ascii_lowercase());
        for pair in self.attributes.chunks_exact(2) {
            let value = &pair[1];
            if value.is_empty() {
                out.push_str(&format!(" {}", pair[0]));
                continue;
            }
            let shown: String = value.chars().take(PREVIEW_VALUE_LIMIT).collect();
            let ellipsis = if shown.len() < value.len() { "…" } else { "" };
            out.push_str(&format!(" {}=\"{shown}{ellipsis}\"", pair[0]));
        }
        out.push('>');
        out
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn element(id: i64, name: &str) -> NodeDescription {
        NodeDescription::new(BackendNodeId::new(id), 1, name)
    }

    fn shadow(id: i64, kind: ShadowRootType) -> NodeDescription {
        let mut root = NodeDescription::new(BackendNodeId::new(id), 11, "#document-fragment");
        root.shadow_root_type = Some(kind);
        root
    }

    #[test]
    fn test_parse_describe_node_payload() {
        let json = r##"{
            "node": {
                "nodeId": 0,
                "backendNodeId": 7,
                "nodeType": 1,
                "nodeName": "DIV",
                "localName": "div",
                "attributes": ["id", "host"],
                "shadowRoots": [{
                    "backendNodeId": 8,
                    "nodeType": 11,
                    "nodeName": "#document-fragment",
                    "shadowRootType": "closed"
                }]
            }
        }"##;
        let result: DescribeNodeResult = serde_json::from_str(json).expect("parse");
        assert_eq!(result.node.backend_node_id, BackendNodeId::new(7));
        assert_eq!(result.node.attribute("id"), Some("host"));
        assert_eq!(
            result.node.shadow_roots[0].shadow_root_type,
            Some(ShadowRootType::Closed)
        );
    }

    #[test]
    fn test_user_agent_shadow_root_type() {
        let kind: ShadowRootType = serde_json::from_str("\"user-agent\"").expect("parse");
        assert_eq!(kind, ShadowRootType::UserAgent);
    }

    #[test]
    fn test_closed_shadow_roots_order() {
        // body
        //   host1 [closed 10 -> host2 [closed 20]] [open 11 -> host3 [closed 30]]
        //   div
        //     host4 [closed 40]
        let mut host2 = element(3, "X-B");
        host2.shadow_roots.push(shadow(20, ShadowRootType::Closed));
        let mut closed10 = shadow(10, ShadowRootType::Closed);
        closed10.children.push(host2);

        let mut host3 = element(4, "X-C");
        host3.shadow_roots.push(shadow(30, ShadowRootType::Closed));
        let mut open11 = shadow(11, ShadowRootType::Open);
        open11.children.push(host3);

        let mut host1 = element(2, "X-A");
        host1.shadow_roots.push(closed10);
        host1.shadow_roots.push(open11);

        let mut host4 = element(6, "X-D");
        host4.shadow_roots.push(shadow(40, ShadowRootType::Closed));
        let mut div = element(5, "DIV");
        div.children.push(host4);

        let mut body = element(1, "BODY");
        body.children.push(host1);
        body.children.push(div);

        let ids: Vec<i64> = body.closed_shadow_roots().into_iter().map(BackendNodeId::get).collect();
        assert_eq!(ids, [10, 20, 30, 40]);
    }

    #[test]
    fn test_closed_shadow_roots_skip_iframe_children() {
        let mut inner_host = element(3, "X-A");
        inner_host.shadow_roots.push(shadow(30, ShadowRootType::Closed));
        let mut iframe = element(2, "IFRAME");
        iframe.children.push(inner_host);
        let mut body = element(1, "BODY");
        body.children.push(iframe);

        assert!(body.closed_shadow_roots().is_empty());
    }

    #[test]
    fn test_user_agent_roots_are_not_collected() {
        let mut input = element(2, "INPUT");
        input.shadow_roots.push(shadow(9, ShadowRootType::UserAgent));
        assert!(input.closed_shadow_roots().is_empty());
    }

    #[test]
    fn test_preview() {
        let mut div = element(1, "DIV");
        div.attributes = vec!["id".into(), "main".into(), "hidden".into(), String::new()];
        assert_eq!(div.preview(), "<div id=\"main\" hidden>");

        let doc = NodeDescription::new(BackendNodeId::new(2), 9, "#document");
        assert_eq!(doc.preview(), "#document");
    }

    #[test]
    fn test_is_frame_owner() {
        assert!(element(1, "IFRAME").is_frame_owner());
        assert!(element(1, "FRAME").is_frame_owner());
        assert!(!element(1, "DIV").is_frame_owner());
    }
}
