//! Composition of state, portal, placement, focus trap and dismissal.
//!
//! Listeners registered by a popover never touch it directly; they post an
//! [`OverlayCommand`] into its mailbox and [`Popover::pump`] applies the
//! commands once the dispatch that produced them has finished. Arming the
//! dismissal listeners therefore always happens after the interaction that
//! opened the popover, never during it.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use tracing::{debug, trace};

use super::dismiss::{ArmedDismissal, DismissReason, DismissalController};
use super::focus_trap::{ActiveTrap, FocusTrap};
use super::portal::Portal;
use super::state::{OverlayRefs, OverlayStateMachine, Transition};
use super::trigger::{TriggerSurface, set_expanded};
use crate::dom::{Document, EventKind, ListenerId, ListenerTarget, NodeId, NodePosition, Phase, Role};
use crate::layout::{
    Align, GeometryConfig, Placement, Position, Side, arrow_position, compute_position_with,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayCommand {
    Toggle,
    Dismiss(DismissReason),
    Reposition,
}

type Mailbox = Rc<RefCell<VecDeque<OverlayCommand>>>;

/// Collaborators handed to a popover at construction.
#[derive(Debug, Default)]
pub struct OverlayDeps {
    pub state: OverlayStateMachine,
    pub geometry: GeometryConfig,
    pub portal: Portal,
}

impl OverlayDeps {
    pub fn new(state: OverlayStateMachine) -> Self {
        Self {
            state,
            geometry: GeometryConfig::default(),
            portal: Portal::new(),
        }
    }

    pub fn with_geometry(mut self, geometry: GeometryConfig) -> Self {
        self.geometry = geometry;
        self
    }
}

/// Content panel options. Placement fields override the popover root's.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentOptions {
    pub side: Option<Side>,
    pub align: Option<Align>,
    pub side_offset: Option<i32>,
    pub show_arrow: bool,
    /// Zero means "fit the children".
    pub width: u16,
    pub height: u16,
    pub label: String,
}

impl Default for ContentOptions {
    fn default() -> Self {
        Self {
            side: None,
            align: None,
            side_offset: None,
            show_arrow: true,
            width: 0,
            height: 0,
            label: String::new(),
        }
    }
}

impl ContentOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn side(mut self, side: Side) -> Self {
        self.side = Some(side);
        self
    }

    pub fn align(mut self, align: Align) -> Self {
        self.align = Some(align);
        self
    }

    pub fn side_offset(mut self, offset: i32) -> Self {
        self.side_offset = Some(offset);
        self
    }

    pub fn arrow(mut self, show: bool) -> Self {
        self.show_arrow = show;
        self
    }

    pub fn size(mut self, width: u16, height: u16) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }
}

#[derive(Debug, Clone)]
struct ContentParts {
    content: NodeId,
    backdrop: NodeId,
    arrow: Option<NodeId>,
    options: ContentOptions,
}

pub struct Popover {
    id: String,
    deps: OverlayDeps,
    placement: Placement,
    trigger: Option<NodeId>,
    trigger_listener: Option<ListenerId>,
    parts: Option<ContentParts>,
    // Whether the open-side resources are currently held.
    active: bool,
    trap: Option<ActiveTrap>,
    dismissal: Option<ArmedDismissal>,
    viewport_listeners: Vec<ListenerId>,
    pending_placement: bool,
    last_position: Option<Position>,
    mailbox: Mailbox,
    torn_down: bool,
}

impl std::fmt::Debug for Popover {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Popover")
            .field("id", &self.id)
            .field("open", &self.is_open())
            .field("active", &self.active)
            .field("placement", &self.placement)
            .field("trigger", &self.trigger)
            .field("content", &self.content())
            .finish_non_exhaustive()
    }
}

impl Popover {
    pub fn new(id: impl Into<String>, deps: OverlayDeps, placement: Placement) -> Self {
        Self {
            id: id.into(),
            deps,
            placement,
            trigger: None,
            trigger_listener: None,
            parts: None,
            active: false,
            trap: None,
            dismissal: None,
            viewport_listeners: Vec::new(),
            pending_placement: false,
            last_position: None,
            mailbox: Mailbox::default(),
            torn_down: false,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn content_id(&self) -> String {
        format!("{}-content", self.id)
    }

    pub fn is_open(&self) -> bool {
        self.deps.state.is_open()
    }

    pub fn is_controlled(&self) -> bool {
        self.deps.state.is_controlled()
    }

    /// Whether the trap, dismissal and viewport subscriptions are held.
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn trigger(&self) -> Option<NodeId> {
        self.trigger
    }

    pub fn content(&self) -> Option<NodeId> {
        self.parts.as_ref().map(|p| p.content)
    }

    pub fn backdrop(&self) -> Option<NodeId> {
        self.parts.as_ref().map(|p| p.backdrop)
    }

    pub fn arrow(&self) -> Option<NodeId> {
        self.parts.as_ref().and_then(|p| p.arrow)
    }

    pub fn portal_container(&self) -> Option<NodeId> {
        self.deps.portal.container()
    }

    pub fn trap_active(&self) -> bool {
        self.trap.as_ref().is_some_and(ActiveTrap::is_active)
    }

    pub fn dismissal_armed(&self) -> bool {
        self.dismissal.as_ref().is_some_and(ArmedDismissal::is_armed)
    }

    pub fn has_pending_placement(&self) -> bool {
        self.pending_placement
    }

    pub fn last_position(&self) -> Option<Position> {
        self.last_position
    }

    /// Root placement with the content's overrides applied.
    pub fn placement(&self) -> Placement {
        let Some(options) = self.parts.as_ref().map(|p| &p.options) else {
            return self.placement;
        };
        Placement {
            side: options.side.unwrap_or(self.placement.side),
            align: options.align.unwrap_or(self.placement.align),
            offset: options.side_offset.unwrap_or(self.placement.offset),
        }
    }

    /// Node the popover was declared under; portaled events bubble through it.
    pub fn set_owner(&mut self, doc: &mut Document, owner: NodeId) {
        self.deps.portal.set_owner(doc, owner);
    }

    pub fn attach_trigger(&mut self, doc: &mut Document, surface: &impl TriggerSurface) {
        if let Some(previous) = self.trigger_listener.take() {
            doc.remove_listener(previous);
        }
        let node = surface.surface();
        surface.link_content(doc, &self.content_id(), self.is_open());
        let mailbox = Rc::clone(&self.mailbox);
        let listener = doc.add_listener(
            ListenerTarget::Node(node),
            surface.activation(),
            Phase::Bubble,
            move |_, _| mailbox.borrow_mut().push_back(OverlayCommand::Toggle),
        );
        self.trigger = Some(node);
        self.trigger_listener = Some(listener);
        self.sync_refs();
    }

    /// Create the content panel, its backdrop and arrow. They stay detached
    /// until the first open.
    pub fn attach_content(&mut self, doc: &mut Document, options: ContentOptions) -> NodeId {
        let content = doc.create(Role::Container, options.label.clone());
        doc.set_attr(content, "role", "dialog");
        doc.set_attr(content, "aria-modal", "false");
        doc.set_attr(content, "id", self.content_id());
        doc.set_tab_index(content, Some(-1));
        doc.set_bordered(content, true);
        doc.set_size(content, options.width, options.height);
        doc.set_position(content, NodePosition::Fixed(Position::default()));
        doc.set_hidden(content, true);

        let backdrop = doc.create(Role::Container, "backdrop");
        doc.set_attr(backdrop, "aria-hidden", "true");
        doc.set_position(backdrop, NodePosition::Fixed(Position::default()));
        doc.set_hidden(backdrop, true);

        let arrow = options.show_arrow.then(|| {
            let arrow = doc.create(Role::Text, self.placement().side.arrow_glyph());
            doc.set_attr(arrow, "aria-hidden", "true");
            doc.set_size(arrow, 1, 1);
            doc.set_position(arrow, NodePosition::Fixed(Position::default()));
            doc.set_hidden(arrow, true);
            arrow
        });

        self.parts = Some(ContentParts {
            content,
            backdrop,
            arrow,
            options,
        });
        self.sync_refs();
        content
    }

    fn sync_refs(&mut self) {
        self.deps.state.set_refs(OverlayRefs {
            trigger: self.trigger,
            content: self.content(),
        });
    }

    pub fn post(&self, command: OverlayCommand) {
        self.mailbox.borrow_mut().push_back(command);
    }

    fn next_command(&self) -> Option<OverlayCommand> {
        self.mailbox.borrow_mut().pop_front()
    }

    /// Apply queued commands and reconcile. Returns whether anything ran.
    pub fn pump(&mut self, doc: &mut Document) -> bool {
        let mut handled = false;
        while let Some(command) = self.next_command() {
            handled = true;
            match command {
                OverlayCommand::Toggle => {
                    self.deps.state.toggle(doc);
                }
                OverlayCommand::Dismiss(reason) => {
                    debug!(popover = %self.id, %reason, "popover dismissed");
                    self.deps.state.close(doc);
                }
                OverlayCommand::Reposition => {
                    if self.active {
                        self.pending_placement = true;
                    }
                }
            }
            self.sync(doc);
        }
        handled
    }

    pub fn open(&mut self, doc: &mut Document) -> Option<Transition> {
        let transition = self.deps.state.open(doc);
        self.sync(doc);
        transition
    }

    pub fn close(&mut self, doc: &mut Document) -> Option<Transition> {
        let transition = self.deps.state.close(doc);
        self.sync(doc);
        transition
    }

    pub fn toggle(&mut self, doc: &mut Document) -> Option<Transition> {
        let transition = self.deps.state.toggle(doc);
        self.sync(doc);
        transition
    }

    /// Consumer re-render with a new controlled value.
    pub fn set_controlled(&mut self, doc: &mut Document, open: Option<bool>) -> Option<Transition> {
        let transition = self.deps.state.set_controlled(doc, open);
        self.sync(doc);
        transition
    }

    /// Bring the held resources in line with the state machine. Each open
    /// is matched by exactly one close, however often this runs.
    pub fn sync(&mut self, doc: &mut Document) {
        let open = self.deps.state.is_open() && !self.torn_down;
        if open == self.active {
            return;
        }
        if open {
            self.activate(doc);
        } else {
            self.deactivate(doc);
        }
    }

    fn activate(&mut self, doc: &mut Document) {
        self.active = true;
        if let Some(trigger) = self.trigger {
            set_expanded(doc, trigger, true);
        }
        let Some(parts) = self.parts.clone() else {
            debug!(popover = %self.id, "popover opened without content");
            return;
        };
        let mut layer = vec![parts.backdrop, parts.content];
        layer.extend(parts.arrow);
        if self.deps.portal.mount(doc, &layer).is_none() {
            debug!(popover = %self.id, "no interactive surface; content not rendered");
            return;
        }
        doc.set_hidden(parts.backdrop, false);
        doc.set_hidden(parts.content, false);
        self.place(doc);

        self.trap = Some(FocusTrap::activate(doc, parts.content));
        let mailbox = Rc::clone(&self.mailbox);
        self.dismissal = Some(
            DismissalController::new(self.trigger, parts.content)
                .with_backdrop(parts.backdrop)
                .arm(doc, move |reason| {
                    mailbox
                        .borrow_mut()
                        .push_back(OverlayCommand::Dismiss(reason))
                }),
        );
        let scroll = {
            let mailbox = Rc::clone(&self.mailbox);
            doc.add_listener(
                ListenerTarget::Document,
                EventKind::Scroll,
                Phase::Capture,
                move |_, _| mailbox.borrow_mut().push_back(OverlayCommand::Reposition),
            )
        };
        let resize = {
            let mailbox = Rc::clone(&self.mailbox);
            doc.add_listener(
                ListenerTarget::Window,
                EventKind::Resize,
                Phase::Bubble,
                move |_, _| mailbox.borrow_mut().push_back(OverlayCommand::Reposition),
            )
        };
        self.viewport_listeners = vec![scroll, resize];
        debug!(popover = %self.id, "popover opened");
    }

    fn deactivate(&mut self, doc: &mut Document) {
        self.active = false;
        if let Some(mut dismissal) = self.dismissal.take() {
            dismissal.disarm(doc);
        }
        if let Some(mut trap) = self.trap.take() {
            trap.deactivate(doc);
        }
        for id in self.viewport_listeners.drain(..) {
            doc.remove_listener(id);
        }
        self.pending_placement = false;
        if let Some(parts) = &self.parts {
            doc.set_hidden(parts.content, true);
            doc.set_hidden(parts.backdrop, true);
            if let Some(arrow) = parts.arrow {
                doc.set_hidden(arrow, true);
            }
        }
        if let Some(trigger) = self.trigger {
            set_expanded(doc, trigger, false);
        }
        debug!(popover = %self.id, "popover closed");
    }

    /// Run a placement pass requested by scroll or resize. Discarded when
    /// the popover closed in the meantime.
    pub fn frame(&mut self, doc: &mut Document) -> bool {
        if !std::mem::take(&mut self.pending_placement) || !self.active {
            return false;
        }
        self.place(doc).is_some()
    }

    /// Measure trigger and content and move the content (and arrow).
    pub fn place(&mut self, doc: &mut Document) -> Option<Position> {
        let parts = self.parts.as_ref()?;
        if !doc.is_rendered(parts.content) {
            return None;
        }
        let placement = self.placement();
        let viewport = doc.viewport();
        let trigger = self
            .trigger
            .map(|t| doc.bounding_rect(t))
            .unwrap_or_default();
        let content = doc.bounding_rect(parts.content);
        let position =
            compute_position_with(self.deps.geometry, trigger, content, placement, viewport);
        doc.set_position(parts.content, NodePosition::Fixed(position));
        doc.set_size(parts.backdrop, viewport.width, viewport.height);
        if let Some(arrow) = parts.arrow {
            let cell = arrow_position(trigger, content.with_position(position), placement.side);
            doc.set_position(arrow, NodePosition::Fixed(cell));
            doc.set_label(arrow, placement.side.arrow_glyph());
            doc.set_hidden(arrow, false);
        }
        trace!(
            popover = %self.id,
            side = %placement.side,
            align = %placement.align,
            top = position.top,
            left = position.left,
            "popover placed"
        );
        self.last_position = Some(position);
        Some(position)
    }

    /// Release everything without notifying the consumer. Idempotent.
    pub fn teardown(&mut self, doc: &mut Document) -> bool {
        if self.torn_down {
            return false;
        }
        self.torn_down = true;
        if self.active {
            self.deactivate(doc);
        }
        if let Some(listener) = self.trigger_listener.take() {
            doc.remove_listener(listener);
        }
        self.deps.portal.unmount(doc);
        self.mailbox.borrow_mut().clear();
        debug!(popover = %self.id, "popover torn down");
        true
    }
}
