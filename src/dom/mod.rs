//! Retained element tree standing in for the host document.
//!
//! The overlay primitives only need a handful of host capabilities: bounding
//! rectangles, hit-testing, a single focused node, document/window/node
//! level listeners and a body to attach detached layers to. `Document`
//! provides all of them for a terminal surface. Nodes live in an arena and
//! are never freed; removing a node only detaches it, so a `NodeId` stays
//! valid for the lifetime of its document.

pub mod event;
pub mod focusable;

use std::collections::BTreeMap;

pub use event::{
    DispatchOutcome, DomEvent, EventKind, EventPayload, Handler, ListenerId, ListenerTarget, Phase,
};

use crate::layout::{Bounds, Position, Viewport};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Whether the document backs an interactive surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderEnv {
    Client,
    /// Headless documents (pre-rendering, snapshots). Portals render nothing.
    Server,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Text,
    Checkbox,
    Radio,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Role {
    Root,
    Container,
    Text,
    Button,
    Link { href: Option<String> },
    TextArea,
    Input(InputKind),
    Select,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodePosition {
    /// Offset from the parent's origin (after the parent's scroll offset).
    Flow { dx: i32, dy: i32 },
    /// Absolute viewport coordinates; escapes ancestor scroll clipping.
    Fixed(Position),
}

impl Default for NodePosition {
    fn default() -> Self {
        NodePosition::Flow { dx: 0, dy: 0 }
    }
}

#[derive(Debug, Clone)]
pub struct Node {
    role: Role,
    label: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    event_parent: Option<NodeId>,
    attrs: BTreeMap<String, String>,
    tab_index: Option<i32>,
    disabled: bool,
    hidden: bool,
    bordered: bool,
    scrollable: bool,
    scroll_top: i32,
    width: u16,
    height: u16,
    position: NodePosition,
}

impl Node {
    fn new(role: Role, label: String) -> Self {
        Self {
            role,
            label,
            parent: None,
            children: Vec::new(),
            event_parent: None,
            attrs: BTreeMap::new(),
            tab_index: None,
            disabled: false,
            hidden: false,
            bordered: false,
            scrollable: false,
            scroll_top: 0,
            width: 0,
            height: 0,
            position: NodePosition::default(),
        }
    }

    pub fn role(&self) -> &Role {
        &self.role
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn event_parent(&self) -> Option<NodeId> {
        self.event_parent
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    pub fn tab_index(&self) -> Option<i32> {
        self.tab_index
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn is_bordered(&self) -> bool {
        self.bordered
    }

    pub fn is_scrollable(&self) -> bool {
        self.scrollable
    }

    pub fn scroll_top(&self) -> i32 {
        self.scroll_top
    }

    pub fn size(&self) -> (u16, u16) {
        (self.width, self.height)
    }

    pub fn position(&self) -> NodePosition {
        self.position
    }
}

pub struct Document {
    env: RenderEnv,
    nodes: Vec<Node>,
    body: NodeId,
    focused: Option<NodeId>,
    pressed: Option<NodeId>,
    viewport: Viewport,
    listeners: event::Listeners,
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("env", &self.env)
            .field("nodes", &self.nodes.len())
            .field("focused", &self.focused)
            .field("viewport", &self.viewport)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl Document {
    pub fn new(viewport: Viewport) -> Self {
        Self::with_env(RenderEnv::Client, viewport)
    }

    pub fn headless(viewport: Viewport) -> Self {
        Self::with_env(RenderEnv::Server, viewport)
    }

    fn with_env(env: RenderEnv, viewport: Viewport) -> Self {
        let mut body = Node::new(Role::Root, String::from("body"));
        body.width = viewport.width;
        body.height = viewport.height;
        Self {
            env,
            nodes: vec![body],
            body: NodeId(0),
            focused: None,
            pressed: None,
            viewport,
            listeners: event::Listeners::default(),
        }
    }

    pub fn env(&self) -> RenderEnv {
        self.env
    }

    pub fn body(&self) -> NodeId {
        self.body
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub(crate) fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        if let Some(body) = self.nodes.get_mut(self.body.0) {
            body.width = viewport.width;
            body.height = viewport.height;
        }
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0)
    }

    /// Create a detached node.
    pub fn create(&mut self, role: Role, label: impl Into<String>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::new(role, label.into()));
        id
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        self.insert_before(parent, child, None)
    }

    /// Insert `child` under `parent` before `reference` (or last).
    ///
    /// The child is detached from its previous parent first. Inserting the
    /// body or an ancestor of `parent` is refused.
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> bool {
        if child == self.body
            || self.node(parent).is_none()
            || self.node(child).is_none()
            || self.contains(child, parent)
        {
            return false;
        }
        self.remove(child);
        let Some(parent_node) = self.node_mut(parent) else {
            return false;
        };
        let index = reference
            .and_then(|r| parent_node.children.iter().position(|c| *c == r))
            .unwrap_or(parent_node.children.len());
        parent_node.children.insert(index, child);
        if let Some(node) = self.node_mut(child) {
            node.parent = Some(parent);
        }
        true
    }

    /// Detach `child` from its parent. Returns `false` if it was not attached.
    pub fn remove(&mut self, child: NodeId) -> bool {
        let Some(parent) = self.node(child).and_then(|n| n.parent) else {
            return false;
        };
        if let Some(parent_node) = self.node_mut(parent) {
            parent_node.children.retain(|c| *c != child);
        }
        if let Some(node) = self.node_mut(child) {
            node.parent = None;
        }
        true
    }

    pub fn set_label(&mut self, id: NodeId, label: impl Into<String>) {
        if let Some(node) = self.node_mut(id) {
            node.label = label.into();
        }
    }

    pub fn set_attr(&mut self, id: NodeId, name: &str, value: impl Into<String>) {
        if let Some(node) = self.node_mut(id) {
            node.attrs.insert(name.to_string(), value.into());
        }
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.node(id).and_then(|n| n.attr(name))
    }

    pub fn set_tab_index(&mut self, id: NodeId, tab_index: Option<i32>) {
        if let Some(node) = self.node_mut(id) {
            node.tab_index = tab_index;
        }
    }

    pub fn set_disabled(&mut self, id: NodeId, disabled: bool) {
        if let Some(node) = self.node_mut(id) {
            node.disabled = disabled;
        }
    }

    pub fn set_hidden(&mut self, id: NodeId, hidden: bool) {
        if let Some(node) = self.node_mut(id) {
            node.hidden = hidden;
        }
    }

    pub fn set_bordered(&mut self, id: NodeId, bordered: bool) {
        if let Some(node) = self.node_mut(id) {
            node.bordered = bordered;
        }
    }

    pub fn set_scrollable(&mut self, id: NodeId, scrollable: bool) {
        if let Some(node) = self.node_mut(id) {
            node.scrollable = scrollable;
        }
    }

    pub fn set_size(&mut self, id: NodeId, width: u16, height: u16) {
        if let Some(node) = self.node_mut(id) {
            node.width = width;
            node.height = height;
        }
    }

    pub fn set_position(&mut self, id: NodeId, position: NodePosition) {
        if let Some(node) = self.node_mut(id) {
            node.position = position;
        }
    }

    /// Route event propagation from `id` through `parent` instead of its
    /// tree parent. Used by portal containers so events keep following the
    /// consumer's ancestry.
    pub fn set_event_parent(&mut self, id: NodeId, parent: Option<NodeId>) {
        if let Some(node) = self.node_mut(id) {
            node.event_parent = parent;
        }
    }

    pub fn is_connected(&self, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(cur) = current {
            if cur == self.body {
                return true;
            }
            current = self.node(cur).and_then(|n| n.parent);
        }
        false
    }

    /// Connected and neither the node nor any ancestor is hidden.
    pub fn is_rendered(&self, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(cur) = current {
            let Some(node) = self.node(cur) else {
                return false;
            };
            if node.hidden {
                return false;
            }
            if cur == self.body {
                return true;
            }
            current = node.parent;
        }
        false
    }

    /// Tree containment, inclusive of `ancestor` itself.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(cur) = current {
            if cur == ancestor {
                return true;
            }
            current = self.node(cur).and_then(|n| n.parent);
        }
        false
    }

    /// Containment along the propagation path, which crosses portal
    /// boundaries through event parents.
    pub fn contains_logical(&self, ancestor: NodeId, node: NodeId) -> bool {
        self.propagation_path(node).contains(&ancestor)
    }

    /// `target` followed by every node an event visits while bubbling.
    pub fn propagation_path(&self, target: NodeId) -> Vec<NodeId> {
        let mut path = Vec::new();
        let mut current = Some(target);
        while let Some(cur) = current {
            if path.contains(&cur) {
                break;
            }
            path.push(cur);
            current = self.node(cur).and_then(|n| n.event_parent.or(n.parent));
        }
        path
    }

    fn common_ancestor(&self, a: NodeId, b: NodeId) -> Option<NodeId> {
        let path = self.propagation_path(a);
        self.propagation_path(b)
            .into_iter()
            .find(|node| path.contains(node))
    }

    /// Pre-order descendants of `id`, excluding `id`.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self
            .node(id)
            .map(|n| n.children.iter().rev().copied().collect())
            .unwrap_or_default();
        while let Some(next) = stack.pop() {
            out.push(next);
            if let Some(node) = self.node(next) {
                stack.extend(node.children.iter().rev().copied());
            }
        }
        out
    }

    /// Find a node by label, preferring nodes attached to the document.
    pub fn find_by_label(&self, label: &str) -> Option<NodeId> {
        self.descendants(self.body)
            .into_iter()
            .find(|id| self.node(*id).is_some_and(|n| n.label == label))
            .or_else(|| {
                self.nodes
                    .iter()
                    .position(|n| n.label == label)
                    .map(NodeId)
            })
    }

    fn origin(&self, id: NodeId) -> (i32, i32) {
        let Some(node) = self.node(id) else {
            return (0, 0);
        };
        match node.position {
            NodePosition::Fixed(pos) => (pos.top, pos.left),
            NodePosition::Flow { dx, dy } => match node.parent.and_then(|p| self.node(p)) {
                Some(parent_node) => {
                    let parent = node.parent.map(|p| self.origin(p)).unwrap_or((0, 0));
                    let scroll = if parent_node.scrollable {
                        parent_node.scroll_top
                    } else {
                        0
                    };
                    (parent.0 + dy - scroll, parent.1 + dx)
                }
                None => (dy, dx),
            },
        }
    }

    /// Geometry regardless of visibility.
    pub fn layout_rect(&self, id: NodeId) -> Bounds {
        let (top, left) = self.origin(id);
        let (width, height) = self.node(id).map(Node::size).unwrap_or((0, 0));
        Bounds::new(top, left, width, height)
    }

    /// Measured rectangle; the zero rect for detached or hidden nodes.
    pub fn bounding_rect(&self, id: NodeId) -> Bounds {
        if !self.is_rendered(id) {
            return Bounds::ZERO;
        }
        self.layout_rect(id)
    }

    /// Deepest rendered node under the cell; later siblings win. Falls
    /// back to the body.
    pub fn hit_test(&self, column: u16, row: u16) -> NodeId {
        self.hit_node(self.body, i32::from(column), i32::from(row), None)
            .unwrap_or(self.body)
    }

    fn hit_node(&self, id: NodeId, col: i32, row: i32, clip: Option<Bounds>) -> Option<NodeId> {
        let node = self.node(id)?;
        if node.hidden {
            return None;
        }
        let rect = self.layout_rect(id);
        let clip = match node.position {
            NodePosition::Fixed(_) => None,
            NodePosition::Flow { .. } => clip,
        };
        let visible = clip.map_or(rect, |c| rect.intersection(&c));
        let child_clip = if node.scrollable { Some(visible) } else { clip };
        for child in node.children.iter().rev() {
            if let Some(hit) = self.hit_node(*child, col, row, child_clip) {
                return Some(hit);
            }
        }
        (id != self.body && visible.contains(col, row)).then_some(id)
    }

    /// The focused node if it is still rendered, otherwise the body.
    pub fn active_element(&self) -> NodeId {
        self.focused().unwrap_or(self.body)
    }

    pub fn focused(&self) -> Option<NodeId> {
        self.focused.filter(|id| self.is_rendered(*id))
    }

    /// Move focus to `id` if it is rendered and can take focus.
    pub fn focus(&mut self, id: NodeId) -> bool {
        if !self.is_rendered(id) || !focusable::can_take_focus(self, id) {
            return false;
        }
        self.focused = Some(id);
        true
    }

    pub fn blur(&mut self) {
        self.focused = None;
    }

    /// Scroll the nearest scrollable ancestor of `target` by `delta` rows.
    pub(crate) fn scroll_by(&mut self, target: NodeId, delta: i32) -> bool {
        let Some(container) = self
            .propagation_path(target)
            .into_iter()
            .find(|id| self.node(*id).is_some_and(|n| n.scrollable))
        else {
            return false;
        };
        let extent = self.content_extent(container);
        let Some(node) = self.node_mut(container) else {
            return false;
        };
        let max = (extent - i32::from(node.height)).max(0);
        let next = (node.scroll_top + delta).clamp(0, max);
        let changed = next != node.scroll_top;
        node.scroll_top = next;
        changed
    }

    fn content_extent(&self, id: NodeId) -> i32 {
        let Some(node) = self.node(id) else {
            return 0;
        };
        node.children
            .iter()
            .filter_map(|child| self.node(*child))
            .filter_map(|child| match child.position {
                NodePosition::Flow { dy, .. } => Some(dy + i32::from(child.height)),
                NodePosition::Fixed(_) => None,
            })
            .max()
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc() -> Document {
        Document::new(Viewport::new(80, 24))
    }

    #[test]
    fn append_and_remove_keep_tree_consistent() {
        let mut d = doc();
        let a = d.create(Role::Container, "a");
        let b = d.create(Role::Button, "b");
        assert!(d.append_child(d.body(), a));
        assert!(d.append_child(a, b));
        assert!(d.is_connected(b));
        assert!(d.contains(a, b));
        // cycles are refused
        assert!(!d.append_child(b, a));
        assert!(d.remove(b));
        assert!(!d.remove(b));
        assert!(!d.is_connected(b));
    }

    #[test]
    fn detached_and_hidden_nodes_measure_zero() {
        let mut d = doc();
        let a = d.create(Role::Container, "a");
        d.set_size(a, 10, 3);
        assert_eq!(d.bounding_rect(a), Bounds::ZERO);
        d.append_child(d.body(), a);
        d.set_position(a, NodePosition::Flow { dx: 2, dy: 1 });
        assert_eq!(d.bounding_rect(a), Bounds::new(1, 2, 10, 3));
        d.set_hidden(a, true);
        assert_eq!(d.bounding_rect(a), Bounds::ZERO);
    }

    #[test]
    fn flow_children_follow_parent_and_scroll() {
        let mut d = doc();
        let list = d.create(Role::Container, "list");
        d.set_size(list, 20, 3);
        d.set_scrollable(list, true);
        d.set_position(list, NodePosition::Flow { dx: 5, dy: 5 });
        d.append_child(d.body(), list);
        let mut rows = Vec::new();
        for i in 0..6 {
            let row = d.create(Role::Text, format!("row{i}"));
            d.set_size(row, 10, 1);
            d.set_position(row, NodePosition::Flow { dx: 0, dy: i });
            d.append_child(list, row);
            rows.push(row);
        }
        assert_eq!(d.bounding_rect(rows[2]).top, 7);
        assert!(d.scroll_by(rows[0], 2));
        assert_eq!(d.bounding_rect(rows[2]).top, 5);
        // clamped to content extent
        d.scroll_by(rows[0], 100);
        assert_eq!(d.node(list).unwrap().scroll_top(), 3);
        // rows scrolled out of the list are not hit
        assert_eq!(d.hit_test(5, 5), rows[3]);
        assert_eq!(d.hit_test(5, 4), d.body());
    }

    #[test]
    fn hit_test_prefers_later_siblings() {
        let mut d = doc();
        let under = d.create(Role::Button, "under");
        d.set_size(under, 10, 1);
        d.append_child(d.body(), under);
        let over = d.create(Role::Container, "over");
        d.set_size(over, 5, 5);
        d.set_position(over, NodePosition::Fixed(Position::new(0, 0)));
        d.append_child(d.body(), over);
        assert_eq!(d.hit_test(2, 0), over);
        assert_eq!(d.hit_test(7, 0), under);
        d.set_hidden(over, true);
        assert_eq!(d.hit_test(2, 0), under);
    }

    #[test]
    fn propagation_follows_event_parent() {
        let mut d = doc();
        let host = d.create(Role::Container, "host");
        d.append_child(d.body(), host);
        let layer = d.create(Role::Container, "layer");
        d.append_child(d.body(), layer);
        d.set_event_parent(layer, Some(host));
        let inner = d.create(Role::Button, "inner");
        d.append_child(layer, inner);
        assert!(!d.contains(host, inner));
        assert!(d.contains_logical(host, inner));
        assert_eq!(d.propagation_path(inner), vec![inner, layer, host, d.body()]);
    }

    #[test]
    fn focus_requires_rendered_focusable_node() {
        let mut d = doc();
        let text = d.create(Role::Text, "t");
        let button = d.create(Role::Button, "b");
        d.append_child(d.body(), text);
        assert!(!d.focus(button));
        d.append_child(d.body(), button);
        assert!(!d.focus(text));
        assert!(d.focus(button));
        assert_eq!(d.active_element(), button);
        d.set_hidden(button, true);
        assert_eq!(d.active_element(), d.body());
    }

    #[test]
    fn find_by_label_prefers_attached_nodes() {
        let mut d = doc();
        let detached = d.create(Role::Button, "same");
        let attached = d.create(Role::Button, "same");
        d.append_child(d.body(), attached);
        assert_eq!(d.find_by_label("same"), Some(attached));
        d.remove(attached);
        assert_eq!(d.find_by_label("same"), Some(detached));
    }
}
