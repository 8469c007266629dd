// src/render/remote_dom.rs
// Remote-DOM Renderer (C7): materialize a serialized component tree as a
// host-side DOM mirror and reconcile it against later versions.
//
// There is no real DOM on the host side of this crate (the actual DOM
// lives inside the sandboxed guest), so `VirtualElement` stands in for
// `HTMLElement`: enough structure to assert the reconciliation invariants
// and to bind event-handler names to host-owned emitters.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{CoreError, Result};
use crate::guest::GuestBridge;
use crate::protocol::NotifyLevel;

/// A node in the serialized component tree. `id` is unique within a tree;
/// `children` is either text or an ordered list of child nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteNode {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default)]
    pub props: HashMap<String, Value>,
    pub children: NodeChildren,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NodeChildren {
    Text(String),
    Nodes(Vec<RemoteNode>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffOp {
    Insert,
    Update,
    Remove,
}

#[derive(Debug, Clone)]
pub struct DomDiff {
    pub op: DiffOp,
    pub id: String,
    pub node: Option<RemoteNode>,
}

/// Host-side mirror of one `RemoteNode`: the thing a real renderer would
/// turn into an `HTMLElement`.
#[derive(Debug, Clone, PartialEq)]
pub struct VirtualElement {
    pub tag: String,
    pub class_name: Option<String>,
    pub style: HashMap<String, String>,
    /// event name (`onClick` -> `click`) -> handler name bound from props.
    pub handlers: HashMap<String, String>,
    pub attributes: HashMap<String, String>,
    pub children: ElementChildren,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ElementChildren {
    Text(String),
    Ids(Vec<String>),
}

fn flatten(node: &RemoteNode, out: &mut HashMap<String, RemoteNode>, depth: usize, max_depth: usize) -> Result<()> {
    if depth > max_depth {
        return Err(CoreError::RemoteDomTooDeep(max_depth));
    }
    if out.contains_key(&node.id) {
        return Err(CoreError::RemoteDomDecode(format!("duplicate node id: {}", node.id)));
    }
    out.insert(node.id.clone(), node.clone());
    if let NodeChildren::Nodes(children) = &node.children {
        for child in children {
            flatten(child, out, depth + 1, max_depth)?;
        }
    }
    Ok(())
}

/// Whether `new` differs from `old` in a way that should surface as an
/// `Update` diff for this id specifically. Deliberately ignores the
/// *set of child ids* under `Nodes(...)`: a container's children appearing
/// or disappearing is already reported as separate insert/remove diffs for
/// those child ids, so comparing full (deep-cloned) subtrees here would
/// mark every ancestor of a changed descendant as updated too. Text
/// children are compared directly since that text is the node's own
/// content, not a reference to another id in the flat map.
fn node_changed_shallow(old: &RemoteNode, new: &RemoteNode) -> bool {
    if old.node_type != new.node_type || old.props != new.props {
        return true;
    }
    match (&old.children, &new.children) {
        (NodeChildren::Text(a), NodeChildren::Text(b)) => a != b,
        (NodeChildren::Nodes(_), NodeChildren::Nodes(_)) => false,
        _ => true,
    }
}

fn materialize_element(node: &RemoteNode) -> VirtualElement {
    let mut class_name = None;
    let mut style = HashMap::new();
    let mut handlers = HashMap::new();
    let mut attributes = HashMap::new();

    for (key, value) in &node.props {
        if value.is_null() {
            continue;
        }
        if key == "className" || key == "class" {
            class_name = value.as_str().map(|s| s.to_string());
        } else if key == "style" {
            if let Value::Object(map) = value {
                for (prop, v) in map {
                    if let Some(s) = v.as_str() {
                        style.insert(prop.clone(), s.to_string());
                    } else {
                        style.insert(prop.clone(), v.to_string());
                    }
                }
            }
        } else if let Some(event) = key.strip_prefix("on") {
            if let Some(handler_name) = value.as_str() {
                handlers.insert(event.to_ascii_lowercase(), handler_name.to_string());
            }
        } else if let Some(s) = value.as_str() {
            attributes.insert(key.clone(), s.to_string());
        } else {
            attributes.insert(key.clone(), value.to_string());
        }
    }

    let children = match &node.children {
        NodeChildren::Text(text) => ElementChildren::Text(text.clone()),
        NodeChildren::Nodes(nodes) => ElementChildren::Ids(nodes.iter().map(|n| n.id.clone()).collect()),
    };

    VirtualElement {
        tag: node.node_type.clone(),
        class_name,
        style,
        handlers,
        attributes,
        children,
    }
}

/// Owns the `id -> RemoteNode` map and its `id -> VirtualElement` mirror
/// for one mounted remote-dom resource.
pub struct RemoteDomRenderer {
    nodes: HashMap<String, RemoteNode>,
    elements: HashMap<String, VirtualElement>,
    root_id: Option<String>,
    max_depth: usize,
    bridge: Option<GuestBridge>,
    disposed: bool,
}

impl RemoteDomRenderer {
    pub fn new(max_depth: usize, bridge: Option<GuestBridge>) -> Self {
        Self {
            nodes: HashMap::new(),
            elements: HashMap::new(),
            root_id: None,
            max_depth,
            bridge,
            disposed: false,
        }
    }

    fn check_alive(&self) -> Result<()> {
        if self.disposed {
            Err(CoreError::Disposed)
        } else {
            Ok(())
        }
    }

    pub fn materialize(&mut self, root: RemoteNode) -> Result<()> {
        self.check_alive()?;
        let mut nodes = HashMap::new();
        flatten(&root, &mut nodes, 0, self.max_depth)?;

        let elements = nodes
            .iter()
            .map(|(id, node)| (id.clone(), materialize_element(node)))
            .collect();

        self.root_id = Some(root.id.clone());
        self.nodes = nodes;
        self.elements = elements;
        Ok(())
    }

    /// Flat id-indexed diff: removes for ids dropped, updates for ids whose
    /// own type/props/text changed, inserts for newly appearing ids.
    /// Structural moves surface as remove+insert, which is fine at the
    /// tree sizes this protocol expects. A container's child set changing
    /// is represented entirely by the child ids' own insert/remove
    /// entries, not by marking the container itself updated.
    pub fn reconcile(&self, new_root: &RemoteNode) -> Result<Vec<DomDiff>> {
        self.check_alive()?;
        let mut new_nodes = HashMap::new();
        flatten(new_root, &mut new_nodes, 0, self.max_depth)?;

        let mut removes = Vec::new();
        let mut updates = Vec::new();
        let mut inserts = Vec::new();

        for (id, old_node) in &self.nodes {
            match new_nodes.get(id) {
                None => removes.push(DomDiff {
                    op: DiffOp::Remove,
                    id: id.clone(),
                    node: None,
                }),
                Some(new_node) => {
                    if node_changed_shallow(old_node, new_node) {
                        updates.push(DomDiff {
                            op: DiffOp::Update,
                            id: id.clone(),
                            node: Some(new_node.clone()),
                        });
                    }
                }
            }
        }

        for (id, node) in &new_nodes {
            if !self.nodes.contains_key(id) {
                inserts.push(DomDiff {
                    op: DiffOp::Insert,
                    id: id.clone(),
                    node: Some(node.clone()),
                });
            }
        }

        removes.extend(updates);
        removes.extend(inserts);
        Ok(removes)
    }

    /// Apply a diff set produced by `reconcile`. Resyncs both maps from
    /// `new_root` directly rather than patching per diff entry: a
    /// container whose own type/props are unchanged has no `Update` entry
    /// even when its child set changed, so patching strictly by diff would
    /// leave its mirrored children list stale. `diffs` is accepted for
    /// symmetry with `reconcile` and because a caller forwarding both to a
    /// guest only needs the diffs; this renderer's own state always ends
    /// up exactly matching `new_root`.
    pub fn apply_diff(&mut self, diffs: Vec<DomDiff>, new_root: &RemoteNode) -> Result<()> {
        let _ = diffs;
        self.materialize(new_root.clone())
    }

    pub fn node(&self, id: &str) -> Option<&RemoteNode> {
        self.nodes.get(id)
    }

    pub fn element(&self, id: &str) -> Option<&VirtualElement> {
        self.elements.get(id)
    }

    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    /// Fire a bound handler: posts a `tool` or `intent` message through the
    /// guest bridge depending on handler-name convention, keeping the
    /// invariant that untrusted input never becomes executable code
    /// host-side (only handler *names* ever cross this boundary).
    pub async fn fire_handler(&self, node_id: &str, event: &str, payload: Option<Value>) -> Result<()> {
        self.check_alive()?;
        let Some(element) = self.elements.get(node_id) else {
            return Err(CoreError::RemoteDomDecode(format!("unknown node id: {node_id}")));
        };
        let Some(handler_name) = element.handlers.get(event) else {
            return Ok(());
        };
        let Some(bridge) = &self.bridge else {
            return Ok(());
        };

        if let Some(tool_name) = handler_name.strip_prefix("tool:") {
            let _ = bridge.call_tool(tool_name, payload.unwrap_or(Value::Null)).await;
        } else {
            bridge.trigger_intent(handler_name.clone(), payload).await;
        }
        Ok(())
    }

    pub async fn notify_disposed_warning(&self) {
        if let Some(bridge) = &self.bridge {
            bridge.notify(NotifyLevel::Warning, "remote-dom renderer disposed").await;
        }
    }

    /// Clears both maps and their subscribers. Synchronous; further
    /// operations on a disposed renderer fail with `Disposed`.
    pub fn dispose(&mut self) {
        self.nodes.clear();
        self.elements.clear();
        self.root_id = None;
        self.disposed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn leaf(id: &str, text: &str) -> RemoteNode {
        RemoteNode {
            id: id.to_string(),
            node_type: "span".to_string(),
            props: HashMap::new(),
            children: NodeChildren::Text(text.to_string()),
        }
    }

    fn tree_with(children: Vec<RemoteNode>) -> RemoteNode {
        RemoteNode {
            id: "root".to_string(),
            node_type: "div".to_string(),
            props: HashMap::new(),
            children: NodeChildren::Nodes(children),
        }
    }

    #[test]
    fn materialize_builds_mirrored_maps() {
        let mut renderer = RemoteDomRenderer::new(64, None);
        let tree = tree_with(vec![leaf("a", "1")]);
        renderer.materialize(tree).unwrap();
        assert_eq!(renderer.element_count(), 2);
        assert!(renderer.element("root").is_some());
        assert!(renderer.element("a").is_some());
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let mut renderer = RemoteDomRenderer::new(64, None);
        let tree = tree_with(vec![leaf("a", "1"), leaf("a", "2")]);
        assert!(renderer.materialize(tree).is_err());
    }

    #[test]
    fn reconcile_orders_removes_updates_inserts() {
        let mut renderer = RemoteDomRenderer::new(64, None);
        let old = tree_with(vec![leaf("a", "1"), leaf("gone", "x")]);
        renderer.materialize(old).unwrap();

        let new_root = tree_with(vec![leaf("a", "2"), leaf("b", "3")]);
        let diffs = renderer.reconcile(&new_root).unwrap();

        assert_eq!(diffs[0].id, "gone");
        assert_eq!(diffs[0].op, DiffOp::Remove);
        assert_eq!(diffs[1].id, "a");
        assert_eq!(diffs[1].op, DiffOp::Update);
        assert_eq!(diffs[2].id, "b");
        assert_eq!(diffs[2].op, DiffOp::Insert);

        renderer.apply_diff(diffs, &new_root).unwrap();
        assert_eq!(renderer.element_count(), 3);
        assert!(renderer.element("gone").is_none());
        match &renderer.node("a").unwrap().children {
            NodeChildren::Text(t) => assert_eq!(t, "2"),
            _ => panic!("expected text child"),
        }
    }

    #[test]
    fn mirror_exactly_matches_new_tree_after_apply() {
        let mut renderer = RemoteDomRenderer::new(64, None);
        renderer.materialize(tree_with(vec![leaf("a", "1")])).unwrap();
        let new_root = tree_with(vec![leaf("a", "2"), leaf("b", "3")]);
        let diffs = renderer.reconcile(&new_root).unwrap();
        renderer.apply_diff(diffs, &new_root).unwrap();

        let mut new_flat = HashMap::new();
        flatten(&new_root, &mut new_flat, 0, 64).unwrap();
        assert_eq!(renderer.nodes.len(), new_flat.len());
        for id in new_flat.keys() {
            assert!(renderer.elements.contains_key(id));
        }
    }

    #[test]
    fn depth_limit_rejects_deep_trees() {
        let mut leaf_node = leaf("deep0", "x");
        for i in 1..10 {
            leaf_node = RemoteNode {
                id: format!("deep{i}"),
                node_type: "div".to_string(),
                props: HashMap::new(),
                children: NodeChildren::Nodes(vec![leaf_node]),
            };
        }
        let mut renderer = RemoteDomRenderer::new(3, None);
        assert!(matches!(
            renderer.materialize(leaf_node),
            Err(CoreError::RemoteDomTooDeep(3))
        ));
    }

    #[test]
    fn props_become_class_style_attrs_and_handlers() {
        let mut props = HashMap::new();
        props.insert("className".to_string(), json!("card"));
        props.insert("style".to_string(), json!({"color": "red"}));
        props.insert("onClick".to_string(), json!("tool:add"));
        props.insert("data-id".to_string(), json!("42"));
        props.insert("hidden".to_string(), Value::Null);

        let node = RemoteNode {
            id: "root".to_string(),
            node_type: "button".to_string(),
            props,
            children: NodeChildren::Text("go".to_string()),
        };

        let element = materialize_element(&node);
        assert_eq!(element.class_name.as_deref(), Some("card"));
        assert_eq!(element.style.get("color"), Some(&"red".to_string()));
        assert_eq!(element.handlers.get("click"), Some(&"tool:add".to_string()));
        assert_eq!(element.attributes.get("data-id"), Some(&"42".to_string()));
        assert!(!element.attributes.contains_key("hidden"));
    }

    #[tokio::test]
    async fn operations_on_disposed_renderer_fail() {
        let mut renderer = RemoteDomRenderer::new(64, None);
        renderer.materialize(tree_with(vec![])).unwrap();
        renderer.dispose();
        assert_eq!(renderer.element_count(), 0);
        assert!(matches!(
            renderer.materialize(tree_with(vec![])),
            Err(CoreError::Disposed)
        ));
        assert!(renderer.fire_handler("root", "click", None).await.is_err());
    }
}
