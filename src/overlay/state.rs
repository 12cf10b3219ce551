//! Open/closed state with controlled and uncontrolled ownership.
//!
//! Exactly one source of truth backs `is_open`: the consumer's value when
//! one is supplied, the internal flag otherwise. Requests in controlled
//! mode only notify; the rendered state follows the next value handed to
//! [`OverlayStateMachine::set_controlled`].

use std::fmt;

use tracing::debug;

use crate::dom::{Document, NodeId};

pub type OpenChangeHandler = Box<dyn FnMut(bool)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayPhase {
    Closed,
    Open,
}

impl From<bool> for OverlayPhase {
    fn from(open: bool) -> Self {
        if open {
            OverlayPhase::Open
        } else {
            OverlayPhase::Closed
        }
    }
}

/// A change of the rendered state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: OverlayPhase,
    pub to: OverlayPhase,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OverlayRefs {
    pub trigger: Option<NodeId>,
    pub content: Option<NodeId>,
}

pub struct OverlayStateMachine {
    internal_open: bool,
    controlled: Option<bool>,
    on_open_change: Option<OpenChangeHandler>,
    refs: OverlayRefs,
}

impl fmt::Debug for OverlayStateMachine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OverlayStateMachine")
            .field("internal_open", &self.internal_open)
            .field("controlled", &self.controlled)
            .field("refs", &self.refs)
            .finish_non_exhaustive()
    }
}

impl Default for OverlayStateMachine {
    fn default() -> Self {
        Self::new(None, false, None)
    }
}

impl OverlayStateMachine {
    pub fn new(
        controlled: Option<bool>,
        default_open: bool,
        on_open_change: Option<OpenChangeHandler>,
    ) -> Self {
        Self {
            internal_open: default_open,
            controlled,
            on_open_change,
            refs: OverlayRefs::default(),
        }
    }

    pub fn uncontrolled(default_open: bool) -> Self {
        Self::new(None, default_open, None)
    }

    pub fn controlled(open: bool) -> Self {
        Self::new(Some(open), false, None)
    }

    pub fn with_handler(mut self, handler: impl FnMut(bool) + 'static) -> Self {
        self.on_open_change = Some(Box::new(handler));
        self
    }

    pub fn is_open(&self) -> bool {
        self.controlled.unwrap_or(self.internal_open)
    }

    pub fn is_controlled(&self) -> bool {
        self.controlled.is_some()
    }

    pub fn phase(&self) -> OverlayPhase {
        OverlayPhase::from(self.is_open())
    }

    pub fn refs(&self) -> OverlayRefs {
        self.refs
    }

    pub fn set_refs(&mut self, refs: OverlayRefs) {
        self.refs = refs;
    }

    pub fn open(&mut self, doc: &mut Document) -> Option<Transition> {
        self.request(doc, true)
    }

    pub fn close(&mut self, doc: &mut Document) -> Option<Transition> {
        self.request(doc, false)
    }

    pub fn toggle(&mut self, doc: &mut Document) -> Option<Transition> {
        let next = !self.is_open();
        self.request(doc, next)
    }

    /// Apply the consumer's value (`None` hands ownership back to the
    /// internal flag, seeded with the currently rendered state).
    pub fn set_controlled(
        &mut self,
        doc: &mut Document,
        controlled: Option<bool>,
    ) -> Option<Transition> {
        let before = self.phase();
        let focus_inside = self.focus_inside(doc);
        if controlled.is_none() && self.controlled.is_some() {
            self.internal_open = self.is_open();
        }
        self.controlled = controlled;
        self.commit(doc, before, focus_inside)
    }

    fn request(&mut self, doc: &mut Document, open: bool) -> Option<Transition> {
        if self.controlled.is_some() {
            // Every gesture notifies; the consumer may keep its value.
            if open == self.is_open() {
                return None;
            }
            debug!(open, "controlled popover requested open change");
            self.notify(open);
            return None;
        }
        if open == self.internal_open {
            return None;
        }
        let before = self.phase();
        let focus_inside = self.focus_inside(doc);
        self.internal_open = open;
        self.notify(open);
        self.commit(doc, before, focus_inside)
    }

    fn notify(&mut self, open: bool) {
        if let Some(handler) = self.on_open_change.as_mut() {
            handler(open);
        }
    }

    fn commit(
        &mut self,
        doc: &mut Document,
        before: OverlayPhase,
        focus_inside: bool,
    ) -> Option<Transition> {
        let after = self.phase();
        if before == after {
            return None;
        }
        if after == OverlayPhase::Closed
            && focus_inside
            && let Some(trigger) = self.refs.trigger
        {
            doc.focus(trigger);
        }
        debug!(?before, ?after, "popover state committed");
        Some(Transition {
            from: before,
            to: after,
        })
    }

    fn focus_inside(&self, doc: &Document) -> bool {
        match (self.refs.content, doc.focused()) {
            (Some(content), Some(focused)) => doc.contains_logical(content, focused),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::dom::Role;
    use crate::layout::Viewport;

    fn recorder() -> (Rc<RefCell<Vec<bool>>>, impl FnMut(bool) + 'static) {
        let calls: Rc<RefCell<Vec<bool>>> = Rc::default();
        let sink = Rc::clone(&calls);
        (calls, move |open| sink.borrow_mut().push(open))
    }

    fn doc_with_refs() -> (Document, OverlayRefs) {
        let mut doc = Document::new(Viewport::new(80, 24));
        let trigger = doc.create(Role::Button, "trigger");
        let content = doc.create(Role::Container, "content");
        let field = doc.create(Role::Input(crate::dom::InputKind::Text), "field");
        doc.append_child(doc.body(), trigger);
        doc.append_child(doc.body(), content);
        doc.append_child(content, field);
        (
            doc,
            OverlayRefs {
                trigger: Some(trigger),
                content: Some(content),
            },
        )
    }

    #[test]
    fn uncontrolled_toggle_round_trip() {
        let (mut doc, _) = doc_with_refs();
        let (calls, handler) = recorder();
        let mut state = OverlayStateMachine::uncontrolled(false).with_handler(handler);
        assert_eq!(
            state.toggle(&mut doc),
            Some(Transition {
                from: OverlayPhase::Closed,
                to: OverlayPhase::Open
            })
        );
        assert!(state.is_open());
        assert!(state.toggle(&mut doc).is_some());
        assert!(!state.is_open());
        assert_eq!(*calls.borrow(), vec![true, false]);
    }

    #[test]
    fn redundant_requests_do_not_notify() {
        let (mut doc, _) = doc_with_refs();
        let (calls, handler) = recorder();
        let mut state = OverlayStateMachine::uncontrolled(true).with_handler(handler);
        assert!(state.open(&mut doc).is_none());
        assert!(state.close(&mut doc).is_some());
        assert!(state.close(&mut doc).is_none());
        assert_eq!(*calls.borrow(), vec![false]);
    }

    #[test]
    fn controlled_requests_only_notify() {
        let (mut doc, _) = doc_with_refs();
        let (calls, handler) = recorder();
        let mut state = OverlayStateMachine::controlled(true).with_handler(handler);
        for _ in 0..3 {
            assert!(state.toggle(&mut doc).is_none());
            assert!(state.is_open());
        }
        assert_eq!(*calls.borrow(), vec![false, false, false]);
        assert!(state.open(&mut doc).is_none());
        assert_eq!(calls.borrow().len(), 3);
        let transition = state.set_controlled(&mut doc, Some(false));
        assert_eq!(transition.map(|t| t.to), Some(OverlayPhase::Closed));
        assert!(state.toggle(&mut doc).is_none());
        assert_eq!(*calls.borrow(), vec![false, false, false, true]);
    }

    #[test]
    fn closing_returns_focus_from_content_to_trigger() {
        let (mut doc, refs) = doc_with_refs();
        let mut state = OverlayStateMachine::uncontrolled(true);
        state.set_refs(refs);
        let field = doc.find_by_label("field").unwrap();
        assert!(doc.focus(field));
        state.close(&mut doc);
        assert_eq!(doc.focused(), refs.trigger);
    }

    #[test]
    fn closing_leaves_focus_outside_content_alone() {
        let (mut doc, refs) = doc_with_refs();
        let outside = doc.create(Role::Button, "outside");
        doc.append_child(doc.body(), outside);
        let mut state = OverlayStateMachine::uncontrolled(true);
        state.set_refs(refs);
        doc.focus(outside);
        state.close(&mut doc);
        assert_eq!(doc.focused(), Some(outside));
    }

    #[test]
    fn releasing_control_keeps_rendered_state() {
        let (mut doc, _) = doc_with_refs();
        let mut state = OverlayStateMachine::controlled(true);
        assert!(state.set_controlled(&mut doc, None).is_none());
        assert!(state.is_open());
        assert!(!state.is_controlled());
    }
}
