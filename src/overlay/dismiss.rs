//! Outside pointer-down and Escape handling for an open overlay.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use crate::dom::{Document, DomEvent, EventKind, ListenerId, ListenerTarget, NodeId, Phase};
use crate::keybindings::{Action, KeyBindings};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DismissReason {
    PointerDownOutside,
    EscapeKey,
}

impl fmt::Display for DismissReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DismissReason::PointerDownOutside => "pointer down outside",
            DismissReason::EscapeKey => "escape key",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DismissalController {
    trigger: Option<NodeId>,
    content: NodeId,
    backdrop: Option<NodeId>,
}

impl DismissalController {
    pub fn new(trigger: Option<NodeId>, content: NodeId) -> Self {
        Self {
            trigger,
            content,
            backdrop: None,
        }
    }

    /// Layer that catches outside presses. A press on it keeps focus where
    /// it was instead of blurring.
    pub fn with_backdrop(mut self, backdrop: NodeId) -> Self {
        self.backdrop = Some(backdrop);
        self
    }

    /// Register the listeners. `on_dismiss` runs once per dismissing
    /// gesture until [`ArmedDismissal::disarm`].
    ///
    /// Pointer-downs inside the trigger or content, including content of
    /// overlays portaled from inside them, are not outside. Escape is taken
    /// at the content node and stops there, so an enclosing overlay never
    /// sees the same key. When focus is elsewhere, Escape reaches the
    /// document and dismisses the innermost open overlay.
    pub fn arm(
        self,
        doc: &mut Document,
        on_dismiss: impl Fn(DismissReason) + 'static,
    ) -> ArmedDismissal {
        let armed = Rc::new(Cell::new(true));
        let on_dismiss: Rc<dyn Fn(DismissReason)> = Rc::new(on_dismiss);
        let Self {
            trigger,
            content,
            backdrop,
        } = self;

        let pointer = {
            let armed = Rc::clone(&armed);
            let on_dismiss = Rc::clone(&on_dismiss);
            doc.add_listener(
                ListenerTarget::Document,
                EventKind::PointerDown,
                Phase::Capture,
                move |doc, event| {
                    if !armed.get() {
                        return;
                    }
                    let target = event.target();
                    let inside = doc.contains_logical(content, target)
                        || trigger.is_some_and(|t| doc.contains_logical(t, target));
                    if inside {
                        return;
                    }
                    if backdrop == Some(target) {
                        event.prevent_default();
                    }
                    on_dismiss(DismissReason::PointerDownOutside);
                },
            )
        };

        let escape = {
            let armed = Rc::clone(&armed);
            let on_dismiss = Rc::clone(&on_dismiss);
            doc.add_listener(
                ListenerTarget::Node(content),
                EventKind::KeyDown,
                Phase::Bubble,
                move |_, event| {
                    if !armed.get() || !is_dismiss_key(event) {
                        return;
                    }
                    event.stop_propagation();
                    event.prevent_default();
                    on_dismiss(DismissReason::EscapeKey);
                },
            )
        };

        let stray_escape = {
            let armed = Rc::clone(&armed);
            doc.add_listener(
                ListenerTarget::Document,
                EventKind::KeyDown,
                Phase::Bubble,
                move |doc, event| {
                    if !armed.get() || !is_dismiss_key(event) {
                        return;
                    }
                    if doc.contains_logical(content, event.target())
                        || nested_dialog_open(doc, content)
                    {
                        return;
                    }
                    event.stop_propagation();
                    event.prevent_default();
                    on_dismiss(DismissReason::EscapeKey);
                },
            )
        };

        ArmedDismissal {
            armed,
            listeners: vec![pointer, escape, stray_escape],
        }
    }
}

fn is_dismiss_key(event: &DomEvent) -> bool {
    event
        .key()
        .is_some_and(|key| KeyBindings::global().matches(Action::Dismiss, key))
}

// An open dialog portaled from inside `content` owns Escape while it is up.
fn nested_dialog_open(doc: &Document, content: NodeId) -> bool {
    doc.descendants(doc.body()).into_iter().any(|node| {
        node != content
            && doc.attr(node, "role") == Some("dialog")
            && doc.is_rendered(node)
            && doc.contains_logical(content, node)
    })
}

#[derive(Debug)]
pub struct ArmedDismissal {
    armed: Rc<Cell<bool>>,
    listeners: Vec<ListenerId>,
}

impl ArmedDismissal {
    pub fn is_armed(&self) -> bool {
        self.armed.get()
    }

    /// Remove every listener. Later calls do nothing and return `false`.
    pub fn disarm(&mut self, doc: &mut Document) -> bool {
        if !self.armed.replace(false) {
            return false;
        }
        for id in self.listeners.drain(..) {
            doc.remove_listener(id);
        }
        true
    }
}

impl Drop for ArmedDismissal {
    fn drop(&mut self) {
        self.armed.set(false);
    }
}
