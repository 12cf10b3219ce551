//! Detached rendering layer appended to the document body.

use tracing::debug;

use crate::dom::{Document, NodeId, RenderEnv, Role};

/// Owns one container node under the body.
///
/// The container is created on the first `mount` and keeps its identity
/// until `unmount`; opening and closing only toggles what is inside it.
/// Events from inside the container propagate through `owner`, the node the
/// overlay was declared under, as if the content were rendered in place.
#[derive(Debug, Default)]
pub struct Portal {
    owner: Option<NodeId>,
    container: Option<NodeId>,
}

impl Portal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_owner(owner: NodeId) -> Self {
        Self {
            owner: Some(owner),
            container: None,
        }
    }

    pub fn owner(&self) -> Option<NodeId> {
        self.owner
    }

    pub fn set_owner(&mut self, doc: &mut Document, owner: NodeId) {
        self.owner = Some(owner);
        if let Some(container) = self.container {
            doc.set_event_parent(container, Some(owner));
        }
    }

    pub fn container(&self) -> Option<NodeId> {
        self.container
    }

    pub fn is_mounted(&self) -> bool {
        self.container.is_some()
    }

    /// Ensure the container exists and holds `children`, in order.
    ///
    /// Renders nothing and returns `None` in a headless document.
    pub fn mount(&mut self, doc: &mut Document, children: &[NodeId]) -> Option<NodeId> {
        if doc.env() == RenderEnv::Server {
            return None;
        }
        let container = match self.container {
            Some(container) => container,
            None => {
                let container = doc.create(Role::Container, "portal");
                doc.set_event_parent(container, self.owner);
                doc.append_child(doc.body(), container);
                debug!(container = container.index(), "portal container created");
                self.container = Some(container);
                container
            }
        };
        for child in children {
            let attached = doc.node(*child).and_then(|n| n.parent()) == Some(container);
            if !attached {
                doc.append_child(container, *child);
            }
        }
        Some(container)
    }

    /// Remove the container from the body. Only the first call does work.
    pub fn unmount(&mut self, doc: &mut Document) -> bool {
        let Some(container) = self.container.take() else {
            return false;
        };
        doc.remove(container);
        debug!(container = container.index(), "portal container removed");
        true
    }
}
