//! Anchored popovers for terminal user interfaces.
//!
//! The crate models a small retained document (nodes, focus, hit-testing
//! and DOM-style event dispatch) in [`dom`], and builds the popover
//! primitive on top of it in [`overlay`]: placement, a portal layer, a
//! focus trap, outside-click and Escape dismissal, and a controlled or
//! uncontrolled open state. [`element`] and [`scene`] are the declarative
//! consumer surface; [`paint`] draws a document with ratatui.

pub mod constants;
pub mod dom;
pub mod drivers;
pub mod element;
pub mod error;
pub mod event_loop;
pub mod keybindings;
pub mod layout;
pub mod log_buffer;
pub mod overlay;
pub mod paint;
pub mod runner;
pub mod scene;
pub mod theme;
pub mod tracing_sub;
pub mod ui;

pub use error::OverlayError;
