//! Draws a [`Document`] into a frame.
//!
//! Nodes are painted in document order so later siblings, and portaled
//! layers appended to the body, land on top. Clipping follows hit-testing:
//! a scrollable node clips its descendants and a fixed node escapes every
//! clip but the viewport.

use ratatui::style::{Modifier, Style};
use ratatui::widgets::{Block, BorderType};

use crate::dom::{Document, InputKind, NodeId, NodePosition, Role};
use crate::layout::Bounds;
use crate::theme;
use crate::ui::UiFrame;

pub fn paint(doc: &Document, frame: &mut UiFrame<'_>) {
    let area = Bounds::from(frame.area());
    frame.fill(area, Style::default().bg(theme::page_bg()).fg(theme::page_fg()));
    let viewport = doc.viewport().bounds().intersection(&area);
    let base = Style::default().fg(theme::page_fg());
    let body = doc.body();
    if let Some(node) = doc.node(body) {
        for child in node.children() {
            paint_node(doc, frame, *child, viewport, viewport, base);
        }
    }
}

fn paint_node(
    doc: &Document,
    frame: &mut UiFrame<'_>,
    id: NodeId,
    viewport: Bounds,
    clip: Bounds,
    base: Style,
) {
    let Some(node) = doc.node(id) else {
        return;
    };
    if node.is_hidden() {
        return;
    }
    let clip = match node.position() {
        NodePosition::Fixed(_) => viewport,
        NodePosition::Flow { .. } => clip,
    };
    let rect = doc.layout_rect(id);
    let visible = rect.intersection(&clip);
    let mut inherited = base;

    match node.role() {
        Role::Container | Role::Root => {
            if node.attr("role") == Some("dialog") {
                let surface = Style::default()
                    .bg(theme::popover_bg())
                    .fg(theme::popover_fg());
                frame.fill(visible, surface);
                let block = Block::bordered()
                    .border_type(BorderType::Rounded)
                    .border_style(Style::default().fg(theme::popover_border()))
                    .style(surface);
                let block = match node.label() {
                    "" => block,
                    title => block.title(format!(" {title} ")),
                };
                frame.render_widget(block, visible);
                inherited = surface;
            } else if node.is_bordered() {
                let mut block =
                    Block::bordered().border_style(Style::default().fg(theme::container_border()));
                if !node.label().is_empty() {
                    block = block.title(node.label().to_string());
                }
                frame.render_widget(block, visible);
            }
        }
        role => {
            let focused = doc.focused() == Some(id);
            let text = control_text(role, node.label());
            let style = control_style(role, base, node.is_disabled(), focused);
            if focused {
                frame.fill(rect.intersection(&clip), style);
            }
            frame.set_string(rect.left, rect.top, &text, style, visible);
        }
    }

    let child_clip = if node.is_scrollable() { visible } else { clip };
    for child in node.children() {
        paint_node(doc, frame, *child, viewport, child_clip, inherited);
    }
}

fn control_text(role: &Role, label: &str) -> String {
    match role {
        Role::Button => format!("[ {label} ]"),
        Role::Input(InputKind::Checkbox) => format!("[ ] {label}"),
        Role::Input(InputKind::Radio) => format!("( ) {label}"),
        Role::Select => format!("{label} ▾"),
        _ => label.to_string(),
    }
}

fn control_style(role: &Role, base: Style, disabled: bool, focused: bool) -> Style {
    if focused {
        return theme::focused_style();
    }
    let style = match role {
        Role::Text => base,
        Role::Link { .. } => base
            .fg(theme::accent_alt())
            .add_modifier(Modifier::UNDERLINED),
        Role::Input(InputKind::Text) | Role::TextArea => base
            .fg(theme::control_fg())
            .add_modifier(Modifier::UNDERLINED),
        _ => base.fg(theme::control_fg()),
    };
    if disabled {
        style.fg(theme::control_disabled_fg())
    } else {
        style
    }
}

#[cfg(test)]
mod tests {
    use ratatui::buffer::Buffer;
    use ratatui::layout::Rect;

    use super::*;
    use crate::layout::{Position, Viewport};

    fn render(doc: &Document) -> Buffer {
        let viewport = doc.viewport();
        let area = Rect::new(0, 0, viewport.width, viewport.height);
        let mut buffer = Buffer::empty(area);
        let mut frame = UiFrame::from_parts(area, &mut buffer);
        paint(doc, &mut frame);
        buffer
    }

    fn row(buffer: &Buffer, y: u16) -> String {
        (0..buffer.area.width)
            .map(|x| buffer[(x, y)].symbol())
            .collect::<String>()
    }

    fn button(doc: &mut Document, parent: NodeId, label: &str, dx: i32, dy: i32) -> NodeId {
        let id = doc.create(Role::Button, label);
        let width = u16::try_from(label.len()).unwrap() + 4;
        doc.set_size(id, width, 1);
        doc.set_position(id, NodePosition::Flow { dx, dy });
        doc.append_child(parent, id);
        id
    }

    #[test]
    fn buttons_render_with_brackets() {
        let mut doc = Document::new(Viewport::new(20, 3));
        let body = doc.body();
        button(&mut doc, body, "Save", 2, 1);
        let buffer = render(&doc);
        assert_eq!(row(&buffer, 1).trim_end(), "  [ Save ]");
    }

    #[test]
    fn focused_control_uses_focus_style() {
        let mut doc = Document::new(Viewport::new(20, 3));
        let body = doc.body();
        let save = button(&mut doc, body, "Save", 0, 0);
        doc.focus(save);
        let buffer = render(&doc);
        assert_eq!(buffer[(0, 0)].bg, theme::accent_alt());
        assert_eq!(buffer[(9, 0)].bg, theme::page_bg());
    }

    #[test]
    fn hidden_subtrees_are_skipped() {
        let mut doc = Document::new(Viewport::new(20, 3));
        let body = doc.body();
        let panel = doc.create(Role::Container, "panel");
        doc.set_size(panel, 20, 3);
        doc.set_hidden(panel, true);
        doc.append_child(body, panel);
        button(&mut doc, panel, "Gone", 0, 0);
        let buffer = render(&doc);
        assert_eq!(row(&buffer, 0).trim(), "");
    }

    #[test]
    fn dialog_draws_border_even_when_partly_offscreen() {
        let mut doc = Document::new(Viewport::new(12, 4));
        let dialog = doc.create(Role::Container, "");
        doc.set_attr(dialog, "role", "dialog");
        doc.set_size(dialog, 10, 3);
        doc.set_position(dialog, NodePosition::Fixed(Position::new(0, 6)));
        let body = doc.body();
        doc.append_child(body, dialog);
        let buffer = render(&doc);
        assert_eq!(buffer[(6, 0)].symbol(), "╭");
        assert_eq!(buffer[(6, 0)].fg, theme::popover_border());
    }

    #[test]
    fn scrolled_children_are_clipped_to_the_container() {
        let mut doc = Document::new(Viewport::new(20, 6));
        let body = doc.body();
        let list = doc.create(Role::Container, "list");
        doc.set_size(list, 20, 2);
        doc.set_scrollable(list, true);
        doc.append_child(body, list);
        let first = button(&mut doc, list, "One", 0, 0);
        button(&mut doc, list, "Two", 0, 1);
        button(&mut doc, list, "Three", 0, 2);
        doc.scroll_by(first, 1);
        let buffer = render(&doc);
        assert_eq!(row(&buffer, 0).trim_end(), "[ Two ]");
        assert_eq!(row(&buffer, 1).trim_end(), "[ Three ]");
        assert_eq!(row(&buffer, 2).trim(), "");
    }
}
