use crate::Direction;

/// A camera action produced by a control surface or a host key binding.
///
/// The render session consumes actions, never raw input events, so the
/// on-screen d-pad and keyboard bindings drive the camera the same way.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    /// Translate the camera along one of its own axes.
    Move { direction: Direction, distance: f32 },
    /// Turn the camera; yaw then pitch, radians.
    Rotate { yaw: f32, pitch: f32 },
    /// No-op (used for input mapping that hasn't been bound yet).
    Noop,
}

/// Anything that can carry out camera actions.
pub trait ActionSink {
    type Error: std::error::Error;

    fn apply(&mut self, action: Action) -> Result<(), Self::Error>;
}
