//! Keeps Tab and Shift+Tab cycling inside a container.

use tracing::trace;

use crate::dom::focusable::tabbable_descendants;
use crate::dom::{Document, DomEvent, EventKind, ListenerId, ListenerTarget, NodeId, Phase};
use crate::keybindings::{Action, KeyBindings};

pub struct FocusTrap;

impl FocusTrap {
    /// Focus the first tabbable descendant of `container` (or the container
    /// itself) and start constraining Tab navigation to it.
    pub fn activate(doc: &mut Document, container: NodeId) -> ActiveTrap {
        if doc.node(container).is_some_and(|n| n.tab_index().is_none()) {
            doc.set_tab_index(container, Some(-1));
        }
        let initial = tabbable_descendants(doc, container)
            .first()
            .copied()
            .unwrap_or(container);
        doc.focus(initial);
        let wrap = doc.add_listener(
            ListenerTarget::Node(container),
            EventKind::KeyDown,
            Phase::Bubble,
            move |doc, event| cycle(doc, event, container),
        );
        let stray = doc.add_listener(
            ListenerTarget::Document,
            EventKind::KeyDown,
            Phase::Capture,
            move |doc, event| reclaim(doc, event, container),
        );
        ActiveTrap {
            container,
            listeners: vec![wrap, stray],
        }
    }
}

/// Handle to an active trap. Dropping it without `deactivate` leaves the
/// listeners registered.
#[derive(Debug)]
pub struct ActiveTrap {
    container: NodeId,
    listeners: Vec<ListenerId>,
}

impl ActiveTrap {
    pub fn container(&self) -> NodeId {
        self.container
    }

    pub fn is_active(&self) -> bool {
        !self.listeners.is_empty()
    }

    /// Stop constraining focus. Focus stays where it is.
    pub fn deactivate(&mut self, doc: &mut Document) -> bool {
        if self.listeners.is_empty() {
            return false;
        }
        for id in self.listeners.drain(..) {
            doc.remove_listener(id);
        }
        true
    }
}

fn direction(event: &DomEvent) -> Option<bool> {
    let key = event.key()?;
    let bindings = KeyBindings::global();
    if bindings.matches(Action::FocusNext, key) {
        Some(true)
    } else if bindings.matches(Action::FocusPrev, key) {
        Some(false)
    } else {
        None
    }
}

// Runs before any node sees the key. Traps activated later run later, so the
// innermost open trap gets the final say even if an outer one moved focus.
fn reclaim(doc: &mut Document, event: &mut DomEvent, container: NodeId) {
    let Some(forward) = direction(event) else {
        return;
    };
    if doc
        .focused()
        .is_some_and(|focused| doc.contains_logical(container, focused))
    {
        return;
    }
    let set = tabbable_descendants(doc, container);
    let target = if forward { set.first() } else { set.last() };
    let target = target.copied().unwrap_or(container);
    event.prevent_default();
    doc.focus(target);
    trace!(target = target.index(), forward, "focus trap reclaimed focus");
}

fn cycle(doc: &mut Document, event: &mut DomEvent, container: NodeId) {
    // A nested trap already moved focus for this key.
    if event.is_default_prevented() {
        return;
    }
    let Some(forward) = direction(event) else {
        return;
    };

    let set = tabbable_descendants(doc, container);
    let (Some(&first), Some(&last)) = (set.first(), set.last()) else {
        event.prevent_default();
        doc.focus(container);
        return;
    };
    let current = doc
        .focused()
        .and_then(|focused| set.iter().position(|n| *n == focused));
    let wrap_to = match (current, forward) {
        (None, true) => Some(first),
        (None, false) => Some(last),
        (Some(i), true) if i + 1 == set.len() => Some(first),
        (Some(0), false) => Some(last),
        _ => None,
    };
    if let Some(target) = wrap_to {
        event.prevent_default();
        doc.focus(target);
        trace!(target = target.index(), forward, "focus trap wrapped");
    }
}
