//! Anchored popover primitives and their composition.

pub mod dismiss;
pub mod focus_trap;
pub mod popover;
pub mod portal;
pub mod state;
pub mod trigger;

pub use dismiss::{ArmedDismissal, DismissReason, DismissalController};
pub use focus_trap::{ActiveTrap, FocusTrap};
pub use popover::{ContentOptions, OverlayCommand, OverlayDeps, Popover};
pub use portal::Portal;
pub use state::{
    OpenChangeHandler, OverlayPhase, OverlayRefs, OverlayStateMachine, Transition,
};
pub use trigger::{AdoptedTrigger, TriggerButton, TriggerSurface};
