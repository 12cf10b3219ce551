//! Shared crate-wide constants.

/// Gap, in cells, between the trigger and the content when neither the
/// popover root nor the content overrides it.
pub const DEFAULT_SIDE_OFFSET: i32 = 8;

/// Minimum distance, in cells, kept between a placed panel and every
/// viewport edge.
///
/// Panels larger than the viewport still pin to this inset on the leading
/// edge, which may overlap the trigger; that is accepted over rendering the
/// panel off-screen.
pub const VIEWPORT_PADDING: i32 = 8;

/// Width of a rendered button in cells beyond its label (`[ ` and ` ]`).
pub const BUTTON_CHROME: u16 = 4;

/// Border plus padding applied around content children when stacking.
pub const CONTENT_INSET: u16 = 1;

/// Maximum number of lines retained by the in-memory log buffer.
pub const LOG_BUFFER_LINES: usize = 500;
