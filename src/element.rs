//! Declarative element trees and their mounting into a [`Document`].
//!
//! ```text
//! Element::node(NodeSpec::container().stack_vertical())
//!     .child(Element::popover(PopoverProps::new("menu"))
//!         .child(Element::trigger("Menu"))
//!         .child(Element::content(ContentOptions::new())
//!             .child(Element::node(NodeSpec::button("Save")))))
//! ```
//!
//! Popover roots render no node of their own; the trigger lands in the
//! surrounding node and the content is held back for the portal.

use std::fmt;

use tracing::debug;

use crate::constants::{BUTTON_CHROME, CONTENT_INSET};
use crate::dom::{Document, InputKind, NodeId, NodePosition, Role};
use crate::error::OverlayError;
use crate::layout::{Align, GeometryConfig, Placement, Position, Side};
use crate::overlay::{
    AdoptedTrigger, ContentOptions, OpenChangeHandler, OverlayDeps, OverlayStateMachine, Popover,
    TriggerButton, TriggerSurface,
};

const ROOT: &str = "Popover";
const TRIGGER: &str = "PopoverTrigger";
const CONTENT: &str = "PopoverContent";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Stack {
    /// Children keep their own offsets.
    #[default]
    None,
    Vertical,
    Horizontal,
}

/// A plain node and how to lay out its children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeSpec {
    pub role: Role,
    pub label: String,
    /// `None` sizes the node to its children (or its label).
    pub size: Option<(u16, u16)>,
    pub position: NodePosition,
    pub tab_index: Option<i32>,
    pub disabled: bool,
    pub hidden: bool,
    pub bordered: bool,
    pub scrollable: bool,
    pub stack: Stack,
    pub inset: u16,
    pub gap: u16,
    pub attrs: Vec<(String, String)>,
}

impl NodeSpec {
    pub fn new(role: Role, label: impl Into<String>) -> Self {
        Self {
            role,
            label: label.into(),
            size: None,
            position: NodePosition::default(),
            tab_index: None,
            disabled: false,
            hidden: false,
            bordered: false,
            scrollable: false,
            stack: Stack::None,
            inset: 0,
            gap: 0,
            attrs: Vec::new(),
        }
    }

    pub fn container() -> Self {
        Self::new(Role::Container, "")
    }

    pub fn text(label: impl Into<String>) -> Self {
        Self::new(Role::Text, label)
    }

    pub fn button(label: impl Into<String>) -> Self {
        Self::new(Role::Button, label)
    }

    pub fn link(label: impl Into<String>, href: impl Into<String>) -> Self {
        Self::new(
            Role::Link {
                href: Some(href.into()),
            },
            label,
        )
    }

    pub fn input(kind: InputKind, label: impl Into<String>) -> Self {
        Self::new(Role::Input(kind), label)
    }

    pub fn text_area(label: impl Into<String>) -> Self {
        Self::new(Role::TextArea, label)
    }

    pub fn select(label: impl Into<String>) -> Self {
        Self::new(Role::Select, label)
    }

    pub fn size(mut self, width: u16, height: u16) -> Self {
        self.size = Some((width, height));
        self
    }

    pub fn at(mut self, dx: i32, dy: i32) -> Self {
        self.position = NodePosition::Flow { dx, dy };
        self
    }

    pub fn fixed(mut self, top: i32, left: i32) -> Self {
        self.position = NodePosition::Fixed(Position::new(top, left));
        self
    }

    pub fn tab_index(mut self, tab_index: i32) -> Self {
        self.tab_index = Some(tab_index);
        self
    }

    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn bordered(mut self) -> Self {
        self.bordered = true;
        self
    }

    pub fn scrollable(mut self) -> Self {
        self.scrollable = true;
        self
    }

    pub fn stack_vertical(mut self) -> Self {
        self.stack = Stack::Vertical;
        self
    }

    pub fn stack_horizontal(mut self) -> Self {
        self.stack = Stack::Horizontal;
        self
    }

    pub fn inset(mut self, inset: u16) -> Self {
        self.inset = inset;
        self
    }

    pub fn gap(mut self, gap: u16) -> Self {
        self.gap = gap;
        self
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.push((name.into(), value.into()));
        self
    }

    fn intrinsic_size(&self) -> (u16, u16) {
        let label = u16::try_from(self.label.chars().count()).unwrap_or(u16::MAX);
        match self.role {
            Role::Button => (label.saturating_add(BUTTON_CHROME), 1),
            Role::Container | Role::Root => (0, 0),
            _ => (label.max(1), 1),
        }
    }
}

/// Root props: ownership of the open state and default placement.
pub struct PopoverProps {
    pub id: String,
    pub open: Option<bool>,
    pub default_open: bool,
    pub on_open_change: Option<OpenChangeHandler>,
    pub side: Side,
    pub align: Align,
    pub side_offset: i32,
    pub geometry: GeometryConfig,
}

impl fmt::Debug for PopoverProps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PopoverProps")
            .field("id", &self.id)
            .field("open", &self.open)
            .field("default_open", &self.default_open)
            .field("side", &self.side)
            .field("align", &self.align)
            .field("side_offset", &self.side_offset)
            .field("geometry", &self.geometry)
            .finish_non_exhaustive()
    }
}

impl PopoverProps {
    pub fn new(id: impl Into<String>) -> Self {
        let placement = Placement::default();
        Self {
            id: id.into(),
            open: None,
            default_open: false,
            on_open_change: None,
            side: placement.side,
            align: placement.align,
            side_offset: placement.offset,
            geometry: GeometryConfig::default(),
        }
    }

    /// Controlled mode: the consumer owns the open state.
    pub fn open(mut self, open: bool) -> Self {
        self.open = Some(open);
        self
    }

    pub fn default_open(mut self, default_open: bool) -> Self {
        self.default_open = default_open;
        self
    }

    pub fn on_open_change(mut self, handler: impl FnMut(bool) + 'static) -> Self {
        self.on_open_change = Some(Box::new(handler));
        self
    }

    pub fn side(mut self, side: Side) -> Self {
        self.side = side;
        self
    }

    pub fn align(mut self, align: Align) -> Self {
        self.align = align;
        self
    }

    pub fn side_offset(mut self, offset: i32) -> Self {
        self.side_offset = offset;
        self
    }

    pub fn geometry(mut self, geometry: GeometryConfig) -> Self {
        self.geometry = geometry;
        self
    }

    fn into_popover(self) -> Popover {
        let placement = Placement::new(self.side, self.align, self.side_offset);
        let state = OverlayStateMachine::new(self.open, self.default_open, self.on_open_change);
        let deps = OverlayDeps::new(state).with_geometry(self.geometry);
        Popover::new(self.id, deps, placement)
    }
}

#[derive(Debug)]
pub enum ElementKind {
    Node(NodeSpec),
    Popover(PopoverProps),
    Trigger(String),
    /// Wraps its single child node as the trigger.
    TriggerAsChild,
    Content(ContentOptions),
}

#[derive(Debug)]
pub struct Element {
    kind: ElementKind,
    children: Vec<Element>,
}

impl Element {
    fn new(kind: ElementKind) -> Self {
        Self {
            kind,
            children: Vec::new(),
        }
    }

    pub fn node(spec: NodeSpec) -> Self {
        Self::new(ElementKind::Node(spec))
    }

    pub fn popover(props: PopoverProps) -> Self {
        Self::new(ElementKind::Popover(props))
    }

    pub fn trigger(label: impl Into<String>) -> Self {
        Self::new(ElementKind::Trigger(label.into()))
    }

    pub fn trigger_as_child(child: Element) -> Self {
        Self::new(ElementKind::TriggerAsChild).child(child)
    }

    pub fn content(options: ContentOptions) -> Self {
        Self::new(ElementKind::Content(options))
    }

    pub fn child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    pub fn children(mut self, children: impl IntoIterator<Item = Element>) -> Self {
        self.children.extend(children);
        self
    }

    pub fn kind(&self) -> &ElementKind {
        &self.kind
    }
}

/// Walks an element tree, creating nodes and popovers.
pub(crate) struct Mounter<'a> {
    doc: &'a mut Document,
    popovers: &'a mut Vec<Popover>,
    // Indexes into `popovers` for the enclosing popover roots.
    context: Vec<usize>,
}

impl<'a> Mounter<'a> {
    pub(crate) fn new(doc: &'a mut Document, popovers: &'a mut Vec<Popover>) -> Self {
        Self {
            doc,
            popovers,
            context: Vec::new(),
        }
    }

    /// Mount `element` under `parent`, returning the nodes added to it.
    pub(crate) fn mount(
        &mut self,
        element: Element,
        parent: NodeId,
    ) -> Result<Vec<NodeId>, OverlayError> {
        let Element { kind, children } = element;
        match kind {
            ElementKind::Node(spec) => {
                let node = self.mount_node(spec, children, parent)?;
                Ok(vec![node])
            }
            ElementKind::Popover(props) => {
                let mut popover = props.into_popover();
                popover.set_owner(self.doc, parent);
                debug!(popover = popover.id(), "popover mounted");
                self.popovers.push(popover);
                self.context.push(self.popovers.len() - 1);
                let mounted = self.mount_children(children, parent);
                self.context.pop();
                mounted
            }
            ElementKind::Trigger(label) => {
                let index = self.require(TRIGGER)?;
                if self.popovers[index].trigger().is_some() {
                    return Err(duplicate(TRIGGER));
                }
                let button = TriggerButton::create(self.doc, &label);
                let node = button.surface();
                self.doc.append_child(parent, node);
                self.mount_children(children, node)?;
                self.popovers[index].attach_trigger(self.doc, &button);
                Ok(vec![node])
            }
            ElementKind::TriggerAsChild => {
                let index = self.require(TRIGGER)?;
                if self.popovers[index].trigger().is_some() {
                    return Err(duplicate(TRIGGER));
                }
                let mut nodes = self.mount_children(children, parent)?;
                let Some(node) = nodes.pop().filter(|_| nodes.is_empty()) else {
                    return Err(OverlayError::DuplicatePart {
                        part: "child",
                        root: TRIGGER,
                    });
                };
                let surface = AdoptedTrigger::adopt(self.doc, node)?;
                self.popovers[index].attach_trigger(self.doc, &surface);
                Ok(vec![node])
            }
            ElementKind::Content(options) => {
                let index = self.require(CONTENT)?;
                if self.popovers[index].content().is_some() {
                    return Err(duplicate(CONTENT));
                }
                let fit = options.width == 0 || options.height == 0;
                let content = self.popovers[index].attach_content(self.doc, options);
                self.mount_children(children, content)?;
                arrange(self.doc, content, Stack::Vertical, CONTENT_INSET, 0);
                if fit {
                    let (width, height) = fitted_size(self.doc, content, CONTENT_INSET);
                    self.doc.set_size(content, width, height);
                }
                // Held for the portal; nothing lands in `parent`.
                Ok(Vec::new())
            }
        }
    }

    fn mount_children(
        &mut self,
        children: Vec<Element>,
        parent: NodeId,
    ) -> Result<Vec<NodeId>, OverlayError> {
        let mut mounted = Vec::new();
        for child in children {
            mounted.extend(self.mount(child, parent)?);
        }
        Ok(mounted)
    }

    fn mount_node(
        &mut self,
        spec: NodeSpec,
        children: Vec<Element>,
        parent: NodeId,
    ) -> Result<NodeId, OverlayError> {
        let doc = &mut *self.doc;
        let node = doc.create(spec.role.clone(), spec.label.clone());
        let (width, height) = spec.size.unwrap_or_else(|| spec.intrinsic_size());
        doc.set_size(node, width, height);
        doc.set_position(node, spec.position);
        doc.set_tab_index(node, spec.tab_index);
        doc.set_disabled(node, spec.disabled);
        doc.set_hidden(node, spec.hidden);
        doc.set_bordered(node, spec.bordered);
        doc.set_scrollable(node, spec.scrollable);
        for (name, value) in &spec.attrs {
            doc.set_attr(node, name, value.clone());
        }
        doc.append_child(parent, node);

        self.mount_children(children, node)?;
        arrange(self.doc, node, spec.stack, spec.inset, spec.gap);
        if spec.size.is_none() && spec.role == Role::Container {
            let (width, height) = fitted_size(self.doc, node, spec.inset);
            self.doc.set_size(node, width, height);
        }
        Ok(node)
    }

    fn require(&self, part: &'static str) -> Result<usize, OverlayError> {
        match self.context.last() {
            Some(index) => Ok(*index),
            None => {
                let err = OverlayError::MissingRoot { part, root: ROOT };
                debug!(%err, "invalid popover composition");
                Err(err)
            }
        }
    }
}

fn duplicate(part: &'static str) -> OverlayError {
    OverlayError::DuplicatePart { part, root: ROOT }
}

fn flow_children(doc: &Document, node: NodeId) -> Vec<NodeId> {
    doc.node(node)
        .map(|n| {
            n.children()
                .iter()
                .copied()
                .filter(|c| {
                    doc.node(*c)
                        .is_some_and(|c| matches!(c.position(), NodePosition::Flow { .. }))
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Position flow children one after another along `stack`.
fn arrange(doc: &mut Document, node: NodeId, stack: Stack, inset: u16, gap: u16) {
    if stack == Stack::None {
        return;
    }
    let inset = i32::from(inset);
    let mut cursor = inset;
    for child in flow_children(doc, node) {
        let (width, height) = doc.node(child).map(|n| n.size()).unwrap_or((0, 0));
        let (dx, dy, advance) = match stack {
            Stack::Vertical => (inset, cursor, height),
            Stack::Horizontal => (cursor, inset, width),
            Stack::None => continue,
        };
        doc.set_position(child, NodePosition::Flow { dx, dy });
        cursor += i32::from(advance) + i32::from(gap);
    }
}

/// Smallest size that holds every flow child plus `inset` on the far edges.
fn fitted_size(doc: &Document, node: NodeId, inset: u16) -> (u16, u16) {
    let (mut right, mut bottom) = (0i32, 0i32);
    for child in flow_children(doc, node) {
        let Some(n) = doc.node(child) else {
            continue;
        };
        if let NodePosition::Flow { dx, dy } = n.position() {
            let (width, height) = n.size();
            right = right.max(dx + i32::from(width));
            bottom = bottom.max(dy + i32::from(height));
        }
    }
    let to_u16 = |v: i32| u16::try_from((v + i32::from(inset)).max(0)).unwrap_or(u16::MAX);
    (to_u16(right), to_u16(bottom))
}
