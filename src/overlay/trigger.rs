//! The element that opens and closes a popover.
//!
//! A popover either renders its own button or adopts an existing
//! interactive node. Both go through [`TriggerSurface`], so the composition
//! layer never inspects what it was handed.

use crate::constants::BUTTON_CHROME;
use crate::dom::{Document, EventKind, NodeId, Role, focusable};
use crate::error::OverlayError;

pub trait TriggerSurface {
    /// Node that takes focus and receives activation.
    fn surface(&self) -> NodeId;

    /// Event that toggles the popover.
    fn activation(&self) -> EventKind {
        EventKind::Click
    }

    /// Merge the popover's accessibility attributes onto the surface.
    fn link_content(&self, doc: &mut Document, content_id: &str, expanded: bool) {
        let node = self.surface();
        doc.set_attr(node, "aria-haspopup", "dialog");
        doc.set_attr(node, "aria-controls", content_id);
        set_expanded(doc, node, expanded);
    }
}

pub(crate) fn set_expanded(doc: &mut Document, node: NodeId, expanded: bool) {
    doc.set_attr(node, "aria-expanded", if expanded { "true" } else { "false" });
}

/// A button rendered by the popover itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerButton {
    node: NodeId,
}

impl TriggerButton {
    /// Create a detached button sized to fit `label`.
    pub fn create(doc: &mut Document, label: &str) -> Self {
        let node = doc.create(Role::Button, label);
        let width = u16::try_from(label.chars().count())
            .unwrap_or(u16::MAX)
            .saturating_add(BUTTON_CHROME);
        doc.set_size(node, width, 1);
        Self { node }
    }
}

impl TriggerSurface for TriggerButton {
    fn surface(&self) -> NodeId {
        self.node
    }
}

/// An existing node wrapped as the trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdoptedTrigger {
    node: NodeId,
}

impl AdoptedTrigger {
    /// Adopt `node`, which must be able to take focus and not be disabled.
    pub fn adopt(doc: &Document, node: NodeId) -> Result<Self, OverlayError> {
        if !focusable::can_take_focus(doc, node) {
            return Err(OverlayError::NotInteractive(node));
        }
        Ok(Self { node })
    }
}

impl TriggerSurface for AdoptedTrigger {
    fn surface(&self) -> NodeId {
        self.node
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::Viewport;

    #[test]
    fn button_is_sized_for_its_label() {
        let mut doc = Document::new(Viewport::new(80, 24));
        let button = TriggerButton::create(&mut doc, "Open");
        assert_eq!(doc.node(button.surface()).unwrap().size(), (8, 1));
    }

    #[test]
    fn adopt_rejects_inert_nodes() {
        let mut doc = Document::new(Viewport::new(80, 24));
        let text = doc.create(Role::Text, "label");
        let link = doc.create(Role::Link { href: Some("/x".into()) }, "link");
        assert_eq!(
            AdoptedTrigger::adopt(&doc, text),
            Err(OverlayError::NotInteractive(text))
        );
        let trigger = AdoptedTrigger::adopt(&doc, link).unwrap();
        assert_eq!(trigger.activation(), EventKind::Click);
    }

    #[test]
    fn link_content_merges_aria_attributes() {
        let mut doc = Document::new(Viewport::new(80, 24));
        let node = doc.create(Role::Button, "menu");
        doc.set_attr(node, "data-test", "kept");
        let trigger = AdoptedTrigger::adopt(&doc, node).unwrap();
        trigger.link_content(&mut doc, "menu-content", false);
        assert_eq!(doc.attr(node, "aria-haspopup"), Some("dialog"));
        assert_eq!(doc.attr(node, "aria-controls"), Some("menu-content"));
        assert_eq!(doc.attr(node, "aria-expanded"), Some("false"));
        assert_eq!(doc.attr(node, "data-test"), Some("kept"));
    }
}
