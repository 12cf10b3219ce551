pub mod placement;

pub use placement::*;

use ratatui::prelude::Rect;

/// Clip signed `bounds` to the visible `area`, returning the drawable part.
pub fn clip_bounds(bounds: Bounds, area: Rect) -> Option<Rect> {
    let visible = bounds.intersection(&Bounds::from(area));
    if visible.is_degenerate() || visible.top < 0 || visible.left < 0 {
        return None;
    }
    Some(Rect {
        x: u16::try_from(visible.left).ok()?,
        y: u16::try_from(visible.top).ok()?,
        width: visible.width,
        height: visible.height,
    })
}
