//! UiFrame: a thin wrapper around `ratatui::Frame` that clamps drawing to the
//! visible area.
//!
//! Popover content is positioned with signed coordinates and may sit partly
//! outside the terminal (for example when the viewport is smaller than the
//! content). Writing out-of-bounds into the underlying `Buffer` panics, so
//! every paint call goes through `UiFrame`, which takes signed `Bounds` and
//! clips them to the visible area.
use ratatui::Frame;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::widgets::Widget;

use crate::layout::{Bounds, clip_bounds};

pub struct UiFrame<'a> {
    area: Rect,
    buffer: &'a mut Buffer,
}

impl<'a> UiFrame<'a> {
    pub fn new(frame: &'a mut Frame<'_>) -> Self {
        let area = frame.area();
        let buffer = frame.buffer_mut();
        Self { area, buffer }
    }

    /// Construct a `UiFrame` directly from an area and buffer, for painting
    /// into an offscreen `Buffer`.
    pub fn from_parts(area: Rect, buffer: &'a mut Buffer) -> Self {
        Self { area, buffer }
    }

    pub fn area(&self) -> Rect {
        self.area
    }

    pub fn buffer_mut(&mut self) -> &mut Buffer {
        self.buffer
    }

    /// The part of `bounds` that is on screen, if any.
    pub fn clip(&self, bounds: Bounds) -> Option<Rect> {
        clip_bounds(bounds, self.area)
    }

    /// Render `widget` into the visible part of `bounds`.
    ///
    /// Widgets see the clipped rect, so a bordered block cut off at the top
    /// edge draws its remaining border on the first visible row.
    pub fn render_widget<W>(&mut self, widget: W, bounds: Bounds)
    where
        W: Widget,
    {
        if let Some(clipped) = self.clip(bounds) {
            widget.render(clipped, self.buffer);
        }
    }

    pub fn fill(&mut self, bounds: Bounds, style: Style) {
        if let Some(clipped) = self.clip(bounds) {
            self.buffer.set_style(clipped, style);
        }
    }

    /// Write `text` starting at a signed cell, dropping every character that
    /// falls outside `clip` or the frame.
    pub fn set_string(&mut self, column: i32, row: i32, text: &str, style: Style, clip: Bounds) {
        let Some(bounds) = self.clip(clip) else {
            return;
        };
        let skip = (i32::from(bounds.x) - column).max(0);
        let Ok(skip) = usize::try_from(skip) else {
            return;
        };
        let visible: String = text.chars().skip(skip).collect();
        let (Ok(x), Ok(y)) = (u16::try_from(column.max(0)), u16::try_from(row)) else {
            return;
        };
        safe_set_string(self.buffer, bounds, x.max(bounds.x), y, &visible, style);
    }
}

pub(crate) fn safe_set_string(
    buffer: &mut Buffer,
    bounds: Rect,
    x: u16,
    y: u16,
    text: &str,
    style: Style,
) {
    if bounds.width == 0 || bounds.height == 0 {
        return;
    }
    let max_x = bounds.x.saturating_add(bounds.width);
    let max_y = bounds.y.saturating_add(bounds.height);
    if x < bounds.x || x >= max_x || y < bounds.y || y >= max_y {
        return;
    }
    let available = max_x.saturating_sub(x);
    if available == 0 {
        return;
    }
    let text = truncate_to_width(text, available as usize);
    buffer.set_string(x, y, text, style);
}

pub(crate) fn truncate_to_width(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        return value.to_string();
    }
    value.chars().take(width).collect()
}
