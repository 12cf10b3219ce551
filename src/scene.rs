//! The document plus every popover mounted into it.
//!
//! A [`Scene`] is the single entry point for input: it turns terminal
//! events into document dispatches and then drains each popover's mailbox
//! until nothing is left to apply.

use crossterm::event::{Event, KeyEvent, KeyEventKind, MouseButton, MouseEventKind};
use tracing::debug;

use crate::dom::{DispatchOutcome, Document, NodeId};
use crate::element::{Element, Mounter};
use crate::error::OverlayError;
use crate::layout::Viewport;
use crate::overlay::{Popover, Transition};

// Upper bound on pump rounds per input; a round that posts nothing ends early.
const MAX_PUMP_ROUNDS: usize = 8;

#[derive(Debug)]
pub struct Scene {
    doc: Document,
    popovers: Vec<Popover>,
}

impl Scene {
    pub fn new(viewport: Viewport) -> Self {
        Self::with_document(Document::new(viewport))
    }

    /// Scene whose popovers keep state but never render content.
    pub fn headless(viewport: Viewport) -> Self {
        Self::with_document(Document::headless(viewport))
    }

    fn with_document(doc: Document) -> Self {
        Self {
            doc,
            popovers: Vec::new(),
        }
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.doc
    }

    pub fn popovers(&self) -> &[Popover] {
        &self.popovers
    }

    pub fn popover(&self, id: &str) -> Option<&Popover> {
        self.popovers.iter().find(|p| p.id() == id)
    }

    pub fn find_by_label(&self, label: &str) -> Option<NodeId> {
        self.doc.find_by_label(label)
    }

    /// Mount `element` under the body. Returns the first node it added, or
    /// the body when it added none.
    ///
    /// On error, popovers created by this call are torn down again.
    pub fn mount(&mut self, element: Element) -> Result<NodeId, OverlayError> {
        let before = self.popovers.len();
        let body = self.doc.body();
        let result = Mounter::new(&mut self.doc, &mut self.popovers).mount(element, body);
        match result {
            Ok(nodes) => {
                for popover in &mut self.popovers[before..] {
                    popover.sync(&mut self.doc);
                }
                Ok(nodes.first().copied().unwrap_or(body))
            }
            Err(err) => {
                for mut popover in self.popovers.drain(before..) {
                    popover.teardown(&mut self.doc);
                }
                debug!(%err, "mount failed");
                Err(err)
            }
        }
    }

    /// Route a terminal event. Returns whether it mapped to a dispatch.
    pub fn handle_event(&mut self, event: &Event) -> bool {
        match event {
            Event::Key(key) if key.kind != KeyEventKind::Release => {
                self.key(*key);
                true
            }
            Event::Mouse(mouse) => match mouse.kind {
                MouseEventKind::Down(MouseButton::Left) => {
                    self.pointer_down(mouse.column, mouse.row);
                    true
                }
                MouseEventKind::Up(MouseButton::Left) => {
                    self.pointer_up(mouse.column, mouse.row);
                    true
                }
                MouseEventKind::ScrollDown => {
                    self.scroll(mouse.column, mouse.row, 1);
                    true
                }
                MouseEventKind::ScrollUp => {
                    self.scroll(mouse.column, mouse.row, -1);
                    true
                }
                _ => false,
            },
            Event::Resize(width, height) => {
                self.resize(Viewport::new(*width, *height));
                true
            }
            _ => false,
        }
    }

    pub fn key(&mut self, key: KeyEvent) -> DispatchOutcome {
        let outcome = self.doc.key_down(key);
        self.pump();
        outcome
    }

    pub fn pointer_down(&mut self, column: u16, row: u16) -> DispatchOutcome {
        let outcome = self.doc.pointer_down(column, row);
        self.pump();
        outcome
    }

    pub fn pointer_up(&mut self, column: u16, row: u16) -> DispatchOutcome {
        let outcome = self.doc.pointer_up(column, row);
        self.pump();
        outcome
    }

    /// Full press and release over `node`'s top-left cell.
    pub fn tap(&mut self, node: NodeId) -> DispatchOutcome {
        let rect = self.doc.bounding_rect(node);
        let column = u16::try_from(rect.left.max(0)).unwrap_or(u16::MAX);
        let row = u16::try_from(rect.top.max(0)).unwrap_or(u16::MAX);
        self.pointer_down(column, row);
        self.pointer_up(column, row)
    }

    /// Synthetic activation, as a keyboard or assistive client would send.
    pub fn click(&mut self, node: NodeId) -> DispatchOutcome {
        let outcome = self.doc.click(node);
        self.pump();
        outcome
    }

    pub fn scroll(&mut self, column: u16, row: u16, delta: i32) -> DispatchOutcome {
        let outcome = self.doc.scroll(column, row, delta);
        self.pump();
        outcome
    }

    pub fn resize(&mut self, viewport: Viewport) -> DispatchOutcome {
        let outcome = self.doc.resize(viewport);
        self.pump();
        outcome
    }

    /// Drain every mailbox. Returns whether any command ran.
    pub fn pump(&mut self) -> bool {
        let mut handled = false;
        for _ in 0..MAX_PUMP_ROUNDS {
            let mut round = false;
            for popover in &mut self.popovers {
                round |= popover.pump(&mut self.doc);
            }
            if !round {
                break;
            }
            handled = true;
        }
        handled
    }

    /// Run pending placement passes. Returns whether anything moved.
    pub fn frame(&mut self) -> bool {
        let mut placed = false;
        for popover in &mut self.popovers {
            placed |= popover.frame(&mut self.doc);
        }
        placed
    }

    /// Consumer re-render of a popover's controlled value.
    pub fn set_open(&mut self, id: &str, open: Option<bool>) -> Option<Transition> {
        let popover = self.popovers.iter_mut().find(|p| p.id() == id)?;
        popover.set_controlled(&mut self.doc, open)
    }

    pub fn open(&mut self, id: &str) -> Option<Transition> {
        let popover = self.popovers.iter_mut().find(|p| p.id() == id)?;
        popover.open(&mut self.doc)
    }

    pub fn close(&mut self, id: &str) -> Option<Transition> {
        let popover = self.popovers.iter_mut().find(|p| p.id() == id)?;
        popover.close(&mut self.doc)
    }

    pub fn toggle(&mut self, id: &str) -> Option<Transition> {
        let popover = self.popovers.iter_mut().find(|p| p.id() == id)?;
        popover.toggle(&mut self.doc)
    }

    /// Tear a popover down and forget it. Returns `false` for unknown ids.
    pub fn unmount_popover(&mut self, id: &str) -> bool {
        let Some(index) = self.popovers.iter().position(|p| p.id() == id) else {
            return false;
        };
        let mut popover = self.popovers.remove(index);
        popover.teardown(&mut self.doc);
        if let Some(trigger) = popover.trigger() {
            self.doc.remove(trigger);
        }
        true
    }

    /// Whether focus sits inside the content of the popover `id`.
    pub fn focus_within(&self, id: &str) -> bool {
        let Some(content) = self.popover(id).and_then(Popover::content) else {
            return false;
        };
        self.doc
            .focused()
            .is_some_and(|f| self.doc.contains_logical(content, f))
    }

    /// The open popover whose content was portaled last.
    pub fn topmost_open(&self) -> Option<&Popover> {
        self.popovers
            .iter()
            .filter(|p| p.is_active())
            .max_by_key(|p| p.portal_container().map(NodeId::index))
    }
}

#[cfg(test)]
mod tests {
    use crossterm::event::{KeyCode, KeyModifiers, MouseEvent};

    use super::*;
    use crate::element::{NodeSpec, PopoverProps};
    use crate::overlay::ContentOptions;

    fn scene() -> Scene {
        let mut scene = Scene::new(Viewport::new(60, 20));
        scene
            .mount(
                Element::node(NodeSpec::container().size(60, 20).inset(1)).child(
                    Element::popover(PopoverProps::new("menu"))
                        .child(Element::trigger("Menu"))
                        .child(
                            Element::content(ContentOptions::new())
                                .child(Element::node(NodeSpec::button("Save"))),
                        ),
                ),
            )
            .unwrap();
        scene
    }

    fn mouse(kind: MouseEventKind, column: u16, row: u16) -> Event {
        Event::Mouse(MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        })
    }

    #[test]
    fn mouse_click_on_trigger_opens() {
        let mut scene = scene();
        assert!(scene.handle_event(&mouse(MouseEventKind::Down(MouseButton::Left), 0, 0)));
        assert!(scene.handle_event(&mouse(MouseEventKind::Up(MouseButton::Left), 0, 0)));
        assert!(scene.popover("menu").unwrap().is_open());
        assert!(scene.focus_within("menu"));
    }

    #[test]
    fn key_release_and_moves_are_ignored() {
        let mut scene = scene();
        let mut release = KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE);
        release.kind = KeyEventKind::Release;
        assert!(!scene.handle_event(&Event::Key(release)));
        assert!(!scene.handle_event(&mouse(MouseEventKind::Moved, 3, 3)));
        assert!(!scene.handle_event(&Event::FocusGained));
    }

    #[test]
    fn resize_event_updates_viewport() {
        let mut scene = scene();
        scene.open("menu");
        assert!(scene.handle_event(&Event::Resize(40, 10)));
        assert_eq!(scene.document().viewport(), Viewport::new(40, 10));
        assert!(scene.frame());
        assert!(!scene.frame());
    }

    #[test]
    fn failed_mount_leaves_no_popover_behind() {
        let mut scene = Scene::new(Viewport::new(60, 20));
        let result = scene.mount(
            Element::popover(PopoverProps::new("broken"))
                .child(Element::trigger("a"))
                .child(Element::trigger("b")),
        );
        assert!(result.is_err());
        assert!(scene.popover("broken").is_none());
    }

    #[test]
    fn unmount_popover_forgets_it() {
        let mut scene = scene();
        scene.open("menu");
        assert!(scene.unmount_popover("menu"));
        assert!(!scene.unmount_popover("menu"));
        assert!(scene.topmost_open().is_none());
        assert!(scene.find_by_label("Menu").is_none_or(|n| !scene.document().is_connected(n)));
    }

    #[test]
    fn default_open_popover_opens_on_mount() {
        let mut scene = Scene::new(Viewport::new(60, 20));
        scene
            .mount(
                Element::popover(PopoverProps::new("p").default_open(true))
                    .child(Element::trigger("Open"))
                    .child(Element::content(ContentOptions::new().size(10, 3))),
            )
            .unwrap();
        let popover = scene.popover("p").unwrap();
        assert!(popover.is_active());
        assert_eq!(scene.topmost_open().map(Popover::id), Some("p"));
    }
}
