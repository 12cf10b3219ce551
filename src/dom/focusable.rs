//! Which nodes take part in sequential keyboard navigation.

use super::{Document, InputKind, NodeId, Role};

fn natively_focusable(role: &Role) -> bool {
    match role {
        Role::Link { href } => href.is_some(),
        Role::Button | Role::TextArea | Role::Select => true,
        Role::Input(kind) => *kind == InputKind::Text,
        Role::Root | Role::Container | Role::Text => false,
    }
}

/// Reachable with Tab: links with a target, enabled buttons, text areas,
/// text inputs, selects and anything with a non-negative tab index.
/// Disabled, `aria-hidden` and unrendered nodes never are.
pub fn is_tabbable(doc: &Document, id: NodeId) -> bool {
    let Some(node) = doc.node(id) else {
        return false;
    };
    if node.is_disabled() || node.attr("aria-hidden") == Some("true") {
        return false;
    }
    if !doc.is_rendered(id) {
        return false;
    }
    natively_focusable(node.role()) || node.tab_index().is_some_and(|t| t >= 0)
}

/// Focusable by script or pointer, which also admits negative tab indexes.
pub fn can_take_focus(doc: &Document, id: NodeId) -> bool {
    doc.node(id).is_some_and(|node| {
        !node.is_disabled() && (natively_focusable(node.role()) || node.tab_index().is_some())
    })
}

/// Tabbable descendants of `container` in document order.
pub fn tabbable_descendants(doc: &Document, container: NodeId) -> Vec<NodeId> {
    doc.descendants(container)
        .into_iter()
        .filter(|id| is_tabbable(doc, *id))
        .collect()
}

/// Nearest node on the propagation path from `target` that accepts focus.
pub fn pointer_focus_target(doc: &Document, target: NodeId) -> Option<NodeId> {
    doc.propagation_path(target)
        .into_iter()
        .filter(|id| *id != doc.body())
        .find(|id| can_take_focus(doc, *id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::Viewport;

    #[test]
    fn tabbable_set_follows_role_and_state() {
        let mut doc = Document::new(Viewport::new(40, 10));
        let body = doc.body();
        let plain = doc.create(Role::Container, "plain");
        let indexed = doc.create(Role::Container, "indexed");
        let negative = doc.create(Role::Button, "negative");
        let disabled = doc.create(Role::Button, "disabled");
        let anchor = doc.create(Role::Link { href: None }, "anchor");
        let link = doc.create(Role::Link { href: Some("#".into()) }, "link");
        let checkbox = doc.create(Role::Input(InputKind::Checkbox), "checkbox");
        let text = doc.create(Role::Input(InputKind::Text), "text");
        let hidden_from_at = doc.create(Role::Select, "select");
        for id in [plain, indexed, negative, disabled, anchor, link, checkbox, text, hidden_from_at] {
            doc.append_child(body, id);
        }
        doc.set_tab_index(indexed, Some(0));
        doc.set_tab_index(negative, Some(-1));
        doc.set_disabled(disabled, true);
        doc.set_attr(hidden_from_at, "aria-hidden", "true");

        assert_eq!(
            tabbable_descendants(&doc, body),
            vec![indexed, negative, link, text]
        );
    }

    #[test]
    fn hidden_ancestor_removes_descendants() {
        let mut doc = Document::new(Viewport::new(40, 10));
        let group = doc.create(Role::Container, "group");
        let button = doc.create(Role::Button, "b");
        doc.append_child(doc.body(), group);
        doc.append_child(group, button);
        assert!(is_tabbable(&doc, button));
        doc.set_hidden(group, true);
        assert!(!is_tabbable(&doc, button));
    }

    #[test]
    fn pointer_focus_walks_up_to_focusable_ancestor() {
        let mut doc = Document::new(Viewport::new(40, 10));
        let panel = doc.create(Role::Container, "panel");
        let label = doc.create(Role::Text, "label");
        doc.append_child(doc.body(), panel);
        doc.append_child(panel, label);
        assert_eq!(pointer_focus_target(&doc, label), None);
        doc.set_tab_index(panel, Some(-1));
        assert_eq!(pointer_focus_target(&doc, label), Some(panel));
    }
}
