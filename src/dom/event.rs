//! Listener registry and event dispatch for [`Document`].
//!
//! Dispatch runs document capture listeners, then capture listeners along
//! the propagation path from the outermost ancestor down to the target,
//! then bubble listeners back up, then document bubble listeners. Listeners
//! are snapshotted per step; one removed by an earlier listener in the same
//! dispatch is skipped.

use std::fmt;
use std::rc::Rc;

use crossterm::event::KeyEvent;

use super::{Document, NodeId, Role, focusable};
use crate::keybindings::{Action, KeyBindings};
use crate::layout::Viewport;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    KeyDown,
    PointerDown,
    PointerUp,
    Click,
    Scroll,
    Resize,
}

impl EventKind {
    pub fn bubbles(self) -> bool {
        !matches!(self, EventKind::Scroll | EventKind::Resize)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Capture,
    Bubble,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerTarget {
    Window,
    Document,
    Node(NodeId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventPayload {
    None,
    Key(KeyEvent),
    Pointer { column: u16, row: u16 },
    Scroll { column: u16, row: u16, delta: i32 },
    Resize(Viewport),
}

#[derive(Debug, Clone)]
pub struct DomEvent {
    kind: EventKind,
    payload: EventPayload,
    target: NodeId,
    current: ListenerTarget,
    phase: Phase,
    propagation_stopped: bool,
    default_prevented: bool,
}

impl DomEvent {
    fn new(kind: EventKind, payload: EventPayload, target: NodeId) -> Self {
        Self {
            kind,
            payload,
            target,
            current: ListenerTarget::Document,
            phase: Phase::Capture,
            propagation_stopped: false,
            default_prevented: false,
        }
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }

    pub fn payload(&self) -> EventPayload {
        self.payload
    }

    pub fn key(&self) -> Option<&KeyEvent> {
        match &self.payload {
            EventPayload::Key(key) => Some(key),
            _ => None,
        }
    }

    pub fn target(&self) -> NodeId {
        self.target
    }

    pub fn current_target(&self) -> ListenerTarget {
        self.current
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn is_propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }

    pub fn is_default_prevented(&self) -> bool {
        self.default_prevented
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchOutcome {
    pub target: NodeId,
    pub default_prevented: bool,
    pub propagation_stopped: bool,
}

pub type Handler = Rc<dyn Fn(&mut Document, &mut DomEvent)>;

struct Listener {
    id: ListenerId,
    target: ListenerTarget,
    kind: EventKind,
    phase: Phase,
    handler: Handler,
}

#[derive(Default)]
pub(crate) struct Listeners {
    next_id: u64,
    entries: Vec<Listener>,
}

impl fmt::Debug for Listeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Listeners({})", self.entries.len())
    }
}

impl Listeners {
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    fn contains(&self, id: ListenerId) -> bool {
        self.entries.iter().any(|l| l.id == id)
    }

    fn matching(
        &self,
        target: ListenerTarget,
        kind: EventKind,
        phase: Phase,
    ) -> Vec<(ListenerId, Handler)> {
        self.entries
            .iter()
            .filter(|l| l.target == target && l.kind == kind)
            .filter(|l| target == ListenerTarget::Window || l.phase == phase)
            .map(|l| (l.id, Rc::clone(&l.handler)))
            .collect()
    }
}

impl Document {
    pub fn add_listener(
        &mut self,
        target: ListenerTarget,
        kind: EventKind,
        phase: Phase,
        handler: impl Fn(&mut Document, &mut DomEvent) + 'static,
    ) -> ListenerId {
        let id = ListenerId(self.listeners.next_id);
        self.listeners.next_id += 1;
        self.listeners.entries.push(Listener {
            id,
            target,
            kind,
            phase,
            handler: Rc::new(handler),
        });
        id
    }

    /// Returns `false` if the listener was already removed.
    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.entries.len();
        self.listeners.entries.retain(|l| l.id != id);
        before != self.listeners.entries.len()
    }

    pub fn has_listener(&self, id: ListenerId) -> bool {
        self.listeners.contains(id)
    }

    pub fn listener_count(&self, target: ListenerTarget, kind: EventKind) -> usize {
        self.listeners
            .entries
            .iter()
            .filter(|l| l.target == target && l.kind == kind)
            .count()
    }

    /// Run listeners for an event without any default action.
    pub fn dispatch(
        &mut self,
        kind: EventKind,
        payload: EventPayload,
        target: NodeId,
    ) -> DispatchOutcome {
        let mut event = DomEvent::new(kind, payload, target);
        if kind == EventKind::Resize {
            self.invoke(ListenerTarget::Window, Phase::Bubble, &mut event);
            return outcome(&event);
        }
        let path = self.propagation_path(target);
        'dispatch: {
            self.invoke(ListenerTarget::Document, Phase::Capture, &mut event);
            if event.propagation_stopped {
                break 'dispatch;
            }
            for node in path.iter().rev() {
                self.invoke(ListenerTarget::Node(*node), Phase::Capture, &mut event);
                if *node == target && !event.propagation_stopped {
                    self.invoke(ListenerTarget::Node(*node), Phase::Bubble, &mut event);
                }
                if event.propagation_stopped {
                    break 'dispatch;
                }
            }
            if !kind.bubbles() {
                break 'dispatch;
            }
            for node in path.iter().skip(1) {
                self.invoke(ListenerTarget::Node(*node), Phase::Bubble, &mut event);
                if event.propagation_stopped {
                    break 'dispatch;
                }
            }
            self.invoke(ListenerTarget::Document, Phase::Bubble, &mut event);
        }
        outcome(&event)
    }

    fn invoke(&mut self, target: ListenerTarget, phase: Phase, event: &mut DomEvent) {
        let snapshot = self.listeners.matching(target, event.kind, phase);
        event.current = target;
        event.phase = phase;
        for (id, handler) in snapshot {
            if !self.listeners.contains(id) {
                continue;
            }
            handler(self, event);
        }
    }

    /// Deliver a key press to the focused node (or the body), then run the
    /// default action: sequential focus navigation for Tab/Shift+Tab and
    /// activation of buttons and links.
    pub fn key_down(&mut self, key: KeyEvent) -> DispatchOutcome {
        let target = self.active_element();
        let result = self.dispatch(EventKind::KeyDown, EventPayload::Key(key), target);
        if result.default_prevented {
            return result;
        }
        let bindings = KeyBindings::global();
        if bindings.matches(Action::FocusNext, &key) {
            self.move_focus(true);
        } else if bindings.matches(Action::FocusPrev, &key) {
            self.move_focus(false);
        } else if bindings.matches(Action::Activate, &key) && self.is_activatable(target) {
            self.dispatch(EventKind::Click, EventPayload::None, target);
        }
        result
    }

    /// Press at a cell. The default action focuses the nearest focusable
    /// node under the pointer, or blurs when there is none.
    pub fn pointer_down(&mut self, column: u16, row: u16) -> DispatchOutcome {
        let target = self.hit_test(column, row);
        self.pressed = Some(target);
        let result = self.dispatch(
            EventKind::PointerDown,
            EventPayload::Pointer { column, row },
            target,
        );
        if !result.default_prevented {
            match focusable::pointer_focus_target(self, target) {
                Some(node) => {
                    self.focus(node);
                }
                None => self.blur(),
            }
        }
        result
    }

    /// Release at a cell. A click follows on the nearest common ancestor of
    /// the pressed and released nodes.
    pub fn pointer_up(&mut self, column: u16, row: u16) -> DispatchOutcome {
        let target = self.hit_test(column, row);
        let result = self.dispatch(
            EventKind::PointerUp,
            EventPayload::Pointer { column, row },
            target,
        );
        if let Some(pressed) = self.pressed.take()
            && let Some(common) = self.common_ancestor(pressed, target)
        {
            self.dispatch(EventKind::Click, EventPayload::Pointer { column, row }, common);
        }
        result
    }

    /// Programmatic activation.
    pub fn click(&mut self, node: NodeId) -> DispatchOutcome {
        self.dispatch(EventKind::Click, EventPayload::None, node)
    }

    /// Wheel input. Scroll events do not bubble; document capture listeners
    /// still observe every one.
    pub fn scroll(&mut self, column: u16, row: u16, delta: i32) -> DispatchOutcome {
        let target = self.hit_test(column, row);
        let result = self.dispatch(
            EventKind::Scroll,
            EventPayload::Scroll { column, row, delta },
            target,
        );
        if !result.default_prevented {
            self.scroll_by(target, delta);
        }
        result
    }

    pub fn resize(&mut self, viewport: Viewport) -> DispatchOutcome {
        self.set_viewport(viewport);
        let body = self.body;
        self.dispatch(EventKind::Resize, EventPayload::Resize(viewport), body)
    }

    fn is_activatable(&self, id: NodeId) -> bool {
        self.node(id).is_some_and(|n| {
            !n.is_disabled() && matches!(n.role(), Role::Button | Role::Link { .. })
        })
    }

    fn move_focus(&mut self, forward: bool) {
        let order = focusable::tabbable_descendants(self, self.body);
        if order.is_empty() {
            return;
        }
        let current = self.focused().and_then(|f| order.iter().position(|n| *n == f));
        let next = match (current, forward) {
            (Some(i), true) => (i + 1) % order.len(),
            (Some(i), false) => (i + order.len() - 1) % order.len(),
            (None, true) => 0,
            (None, false) => order.len() - 1,
        };
        self.focus(order[next]);
    }
}

fn outcome(event: &DomEvent) -> DispatchOutcome {
    DispatchOutcome {
        target: event.target,
        default_prevented: event.default_prevented,
        propagation_stopped: event.propagation_stopped,
    }
}
