//! Errors surfaced to consumers of the overlay primitives.
//!
//! Only composition mistakes are reported. Interaction (open, close,
//! dismiss, teardown) never fails.

use thiserror::Error;

use crate::dom::NodeId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OverlayError {
    #[error("`{part}` must be used within `{root}`")]
    MissingRoot {
        part: &'static str,
        root: &'static str,
    },
    #[error("`{root}` accepts a single `{part}`")]
    DuplicatePart {
        part: &'static str,
        root: &'static str,
    },
    #[error("`PopoverTrigger` can only wrap an interactive element ({0:?} cannot take focus)")]
    NotInteractive(NodeId),
}
