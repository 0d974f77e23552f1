//! Control surface: four directional press/release signals mapped to typed
//! camera actions.
//!
//! # Invariants
//! - Consumers receive `Action`s, never raw GUI events or string tags.
//! - Released signals never move the camera; they only update held state.

pub mod action;
mod control;

pub use action::{Action, ActionSink};
pub use control::{ControlSignal, ControlSurface, Direction, SignalKind};

pub fn crate_info() -> &'static str {
    "glcanvas-input v0.1.0"
}
