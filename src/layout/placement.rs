//! Anchored placement of a floating panel relative to a trigger.
//!
//! Everything in here is a pure function of its inputs. Callers measure the
//! trigger and the content, build a [`Placement`] and hand the result to the
//! rendering surface; nothing is cached between passes because layout can
//! change between two opens.

use std::fmt;

use ratatui::prelude::Rect;

use crate::constants::{DEFAULT_SIDE_OFFSET, VIEWPORT_PADDING};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Side {
    Top,
    Right,
    #[default]
    Bottom,
    Left,
}

impl Side {
    /// Glyph for the directional indicator, pointing back at the trigger.
    pub fn arrow_glyph(self) -> &'static str {
        match self {
            Side::Top => "▼",
            Side::Right => "◀",
            Side::Bottom => "▲",
            Side::Left => "▶",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Side::Top => "top",
            Side::Right => "right",
            Side::Bottom => "bottom",
            Side::Left => "left",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Align {
    Start,
    #[default]
    Center,
    End,
}

impl fmt::Display for Align {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Align::Start => "start",
            Align::Center => "center",
            Align::End => "end",
        };
        write!(f, "{}", s)
    }
}

/// Where the content goes relative to the trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub side: Side,
    pub align: Align,
    pub offset: i32,
}

impl Placement {
    pub const fn new(side: Side, align: Align, offset: i32) -> Self {
        Self {
            side,
            align,
            offset,
        }
    }
}

impl Default for Placement {
    fn default() -> Self {
        Self::new(Side::Bottom, Align::Center, DEFAULT_SIDE_OFFSET)
    }
}

/// Signed rectangle snapshot in viewport cells.
///
/// The origin may sit off-screen (negative or past the viewport) while the
/// size stays unsigned, mirroring the floating-window rects of the window
/// layer. A zero size is what a detached or hidden node measures as.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Bounds {
    pub top: i32,
    pub left: i32,
    pub width: u16,
    pub height: u16,
}

impl Bounds {
    pub const ZERO: Bounds = Bounds {
        top: 0,
        left: 0,
        width: 0,
        height: 0,
    };

    pub const fn new(top: i32, left: i32, width: u16, height: u16) -> Self {
        Self {
            top,
            left,
            width,
            height,
        }
    }

    pub fn bottom(&self) -> i32 {
        self.top + i32::from(self.height)
    }

    pub fn right(&self) -> i32 {
        self.left + i32::from(self.width)
    }

    pub fn is_degenerate(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn contains(&self, column: i32, row: i32) -> bool {
        if self.is_degenerate() {
            return false;
        }
        column >= self.left && column < self.right() && row >= self.top && row < self.bottom()
    }

    pub fn intersection(&self, other: &Bounds) -> Bounds {
        let top = self.top.max(other.top);
        let left = self.left.max(other.left);
        let bottom = self.bottom().min(other.bottom());
        let right = self.right().min(other.right());
        if bottom <= top || right <= left {
            return Bounds::new(top, left, 0, 0);
        }
        Bounds::new(
            top,
            left,
            (right - left).min(i32::from(u16::MAX)) as u16,
            (bottom - top).min(i32::from(u16::MAX)) as u16,
        )
    }

    pub fn with_position(self, position: Position) -> Self {
        Self {
            top: position.top,
            left: position.left,
            ..self
        }
    }
}

impl From<Rect> for Bounds {
    fn from(rect: Rect) -> Self {
        Self {
            top: i32::from(rect.y),
            left: i32::from(rect.x),
            width: rect.width,
            height: rect.height,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Viewport {
    pub width: u16,
    pub height: u16,
}

impl Viewport {
    pub const fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }

    pub fn bounds(&self) -> Bounds {
        Bounds::new(0, 0, self.width, self.height)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Position {
    pub top: i32,
    pub left: i32,
}

impl Position {
    pub const fn new(top: i32, left: i32) -> Self {
        Self { top, left }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeometryConfig {
    /// Minimum distance kept between the content and every viewport edge.
    pub viewport_padding: i32,
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            viewport_padding: VIEWPORT_PADDING,
        }
    }
}

/// Compute the content origin with the default [`GeometryConfig`].
pub fn compute_position(
    trigger: Bounds,
    content: Bounds,
    placement: Placement,
    viewport: Viewport,
) -> Position {
    compute_position_with(GeometryConfig::default(), trigger, content, placement, viewport)
}

/// Compute the content origin for `placement`, clamped into `viewport`.
///
/// Content that measures as degenerate (not attached yet) gets the unclamped
/// primary-axis position for a zero-sized panel; the next placement pass with
/// real dimensions corrects it.
pub fn compute_position_with(
    config: GeometryConfig,
    trigger: Bounds,
    content: Bounds,
    placement: Placement,
    viewport: Viewport,
) -> Position {
    if content.is_degenerate() {
        return unclamped(trigger, 0, 0, placement);
    }
    let width = i32::from(content.width);
    let height = i32::from(content.height);
    let raw = unclamped(trigger, width, height, placement);
    let pad = config.viewport_padding;
    Position {
        top: clamp_axis(raw.top, height, i32::from(viewport.height), pad),
        left: clamp_axis(raw.left, width, i32::from(viewport.width), pad),
    }
}

fn unclamped(trigger: Bounds, width: i32, height: i32, placement: Placement) -> Position {
    let offset = placement.offset;
    let trigger_width = i32::from(trigger.width);
    let trigger_height = i32::from(trigger.height);
    match placement.side {
        Side::Bottom | Side::Top => {
            let top = if placement.side == Side::Bottom {
                trigger.bottom() + offset
            } else {
                trigger.top - height - offset
            };
            let left = match placement.align {
                Align::Start => trigger.left,
                Align::Center => trigger.left + (trigger_width - width).div_euclid(2),
                Align::End => trigger.right() - width,
            };
            Position { top, left }
        }
        Side::Left | Side::Right => {
            // Cross-axis alignment only applies to top/bottom; side panels
            // always centre on the trigger.
            let top = trigger.top + (trigger_height - height).div_euclid(2);
            let left = if placement.side == Side::Left {
                trigger.left - width - offset
            } else {
                trigger.right() + offset
            };
            Position { top, left }
        }
    }
}

// max(pad, min(value, extent - size - pad)); unlike `i32::clamp` this stays
// defined when the panel is larger than the viewport.
fn clamp_axis(value: i32, size: i32, extent: i32, pad: i32) -> i32 {
    value.min(extent - size - pad).max(pad)
}

/// Cell for the directional indicator of a panel placed at `content`.
///
/// The arrow sits in the row or column just outside the content on the
/// trigger's side, aligned with the trigger centre but never past the
/// content's own span on the cross axis.
pub fn arrow_position(trigger: Bounds, content: Bounds, side: Side) -> Position {
    let center_col = trigger.left + i32::from(trigger.width).div_euclid(2);
    let center_row = trigger.top + i32::from(trigger.height).div_euclid(2);
    let span_col = |col: i32| {
        let last = content.right() - 1;
        col.min(last).max(content.left)
    };
    let span_row = |row: i32| {
        let last = content.bottom() - 1;
        row.min(last).max(content.top)
    };
    match side {
        Side::Bottom => Position::new(content.top - 1, span_col(center_col)),
        Side::Top => Position::new(content.bottom(), span_col(center_col)),
        Side::Right => Position::new(span_row(center_row), content.left - 1),
        Side::Left => Position::new(span_row(center_row), content.right()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trigger() -> Bounds {
        Bounds::new(100, 100, 40, 20)
    }

    fn content() -> Bounds {
        Bounds::new(0, 0, 200, 100)
    }

    #[test]
    fn bottom_center_inside_viewport() {
        let pos = compute_position(
            trigger(),
            content(),
            Placement::new(Side::Bottom, Align::Center, 8),
            Viewport::new(800, 600),
        );
        assert_eq!(pos, Position::new(128, 20));
    }

    #[test]
    fn narrow_viewport_clamps_left_to_padding() {
        let pos = compute_position(
            trigger(),
            content(),
            Placement::default(),
            Viewport::new(150, 600),
        );
        assert_eq!(pos.left, 8);
        assert_eq!(pos.top, 128);
    }

    #[test]
    fn top_side_places_above_trigger() {
        let pos = compute_position(
            Bounds::new(300, 100, 40, 20),
            content(),
            Placement::new(Side::Top, Align::Start, 4),
            Viewport::new(800, 600),
        );
        assert_eq!(pos, Position::new(300 - 100 - 4, 100));
    }

    #[test]
    fn end_alignment_lines_up_right_edges() {
        let pos = compute_position(
            Bounds::new(100, 300, 40, 20),
            content(),
            Placement::new(Side::Bottom, Align::End, 0),
            Viewport::new(800, 600),
        );
        assert_eq!(pos.left, 340 - 200);
    }

    #[test]
    fn side_panels_center_vertically_and_ignore_align() {
        let t = Bounds::new(200, 300, 40, 20);
        let right = compute_position(
            t,
            content(),
            Placement::new(Side::Right, Align::Start, 8),
            Viewport::new(800, 600),
        );
        assert_eq!(right, Position::new(200 + (20 - 100) / 2, 348));
        let left = compute_position(
            t,
            content(),
            Placement::new(Side::Left, Align::End, 8),
            Viewport::new(800, 600),
        );
        assert_eq!(left, Position::new(160, 300 - 200 - 8));
    }

    #[test]
    fn odd_centering_floors() {
        let pos = compute_position(
            Bounds::new(10, 20, 3, 1),
            Bounds::new(0, 0, 6, 2),
            Placement::new(Side::Bottom, Align::Center, 0),
            Viewport::new(80, 24),
        );
        // (3 - 6) / 2 = -1.5 -> -2
        assert_eq!(pos.left, 18);
    }

    #[test]
    fn degenerate_content_skips_clamping() {
        let pos = compute_position(
            Bounds::new(2, 2, 4, 1),
            Bounds::ZERO,
            Placement::new(Side::Bottom, Align::Center, 1),
            Viewport::new(80, 24),
        );
        // zero-sized content is centered on the trigger, no padding applied
        assert_eq!(pos, Position::new(4, 4));
    }

    #[test]
    fn clamping_holds_for_fitting_content() {
        let viewports = [Viewport::new(80, 24), Viewport::new(200, 60)];
        let sides = [Side::Top, Side::Right, Side::Bottom, Side::Left];
        let aligns = [Align::Start, Align::Center, Align::End];
        for viewport in viewports {
            for side in sides {
                for align in aligns {
                    for top in (-10..70).step_by(7) {
                        for left in (-10..210).step_by(13) {
                            let t = Bounds::new(top, left, 9, 3);
                            let c = Bounds::new(0, 0, 20, 6);
                            let pos = compute_position(
                                t,
                                c,
                                Placement::new(side, align, 2),
                                viewport,
                            );
                            let max_top = i32::from(viewport.height) - 6 - 8;
                            let max_left = i32::from(viewport.width) - 20 - 8;
                            assert!(pos.top >= 8 && pos.top <= max_top, "{pos:?}");
                            assert!(pos.left >= 8 && pos.left <= max_left, "{pos:?}");
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn custom_padding_is_respected() {
        let config = GeometryConfig {
            viewport_padding: 1,
        };
        let pos = compute_position_with(
            config,
            Bounds::new(0, 0, 4, 1),
            Bounds::new(0, 0, 10, 3),
            Placement::new(Side::Top, Align::Start, 1),
            Viewport::new(80, 24),
        );
        assert_eq!(pos, Position::new(1, 1));
    }

    #[test]
    fn arrow_sits_between_trigger_and_content() {
        let t = Bounds::new(4, 10, 6, 1);
        let c = Bounds::new(6, 2, 12, 4);
        let arrow = arrow_position(t, c, Side::Bottom);
        assert_eq!(arrow, Position::new(5, 13));
        // trigger far to the right: arrow stays on the content's last column
        let far = Bounds::new(4, 60, 6, 1);
        assert_eq!(arrow_position(far, c, Side::Bottom).left, 13);
        assert_eq!(arrow_position(t, c, Side::Top).top, 10);
    }

    #[test]
    fn bounds_intersection_and_contains() {
        let a = Bounds::new(0, 0, 10, 5);
        let b = Bounds::new(3, -2, 4, 10);
        let i = a.intersection(&b);
        assert_eq!(i, Bounds::new(3, 0, 2, 2));
        assert!(a.contains(9, 4));
        assert!(!a.contains(10, 4));
        assert!(!Bounds::ZERO.contains(0, 0));
    }
}
