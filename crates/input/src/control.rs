use glcanvas_common::config::CAMERA_STEP;

use crate::{Action, ActionSink};

/// One of the four d-pad directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [Self::Up, Self::Down, Self::Left, Self::Right];

    fn index(self) -> usize {
        match self {
            Self::Up => 0,
            Self::Down => 1,
            Self::Left => 2,
            Self::Right => 3,
        }
    }

    /// Arrow glyph for button labels.
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Up => "\u{25B2}",
            Self::Down => "\u{25BC}",
            Self::Left => "\u{25C0}",
            Self::Right => "\u{25B6}",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Up => "Up",
            Self::Down => "Down",
            Self::Left => "Left",
            Self::Right => "Right",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalKind {
    Pressed,
    Released,
}

/// A button edge delivered by the GUI toolkit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlSignal {
    pub direction: Direction,
    pub kind: SignalKind,
}

impl ControlSignal {
    pub fn pressed(direction: Direction) -> Self {
        Self {
            direction,
            kind: SignalKind::Pressed,
        }
    }

    pub fn released(direction: Direction) -> Self {
        Self {
            direction,
            kind: SignalKind::Released,
        }
    }
}

/// Maps d-pad signals onto camera moves of a fixed step.
///
/// Tracks which buttons are held so a GUI can highlight them.
#[derive(Debug, Clone)]
pub struct ControlSurface {
    step: f32,
    held: [bool; 4],
}

impl Default for ControlSurface {
    fn default() -> Self {
        Self::new(CAMERA_STEP)
    }
}

impl ControlSurface {
    pub fn new(step: f32) -> Self {
        Self {
            step,
            held: [false; 4],
        }
    }

    pub fn step(&self) -> f32 {
        self.step
    }

    /// The action a signal stands for; `None` for releases.
    pub fn map(&self, signal: ControlSignal) -> Option<Action> {
        match signal.kind {
            SignalKind::Pressed => Some(Action::Move {
                direction: signal.direction,
                distance: self.step,
            }),
            SignalKind::Released => None,
        }
    }

    /// Record the signal and apply its action, if any, to `sink`.
    pub fn dispatch<S: ActionSink>(
        &mut self,
        signal: ControlSignal,
        sink: &mut S,
    ) -> Result<Option<Action>, S::Error> {
        self.held[signal.direction.index()] = signal.kind == SignalKind::Pressed;
        tracing::debug!(direction = %signal.direction, kind = ?signal.kind, "control signal");

        let Some(action) = self.map(signal) else {
            return Ok(None);
        };
        sink.apply(action)?;
        Ok(Some(action))
    }

    pub fn is_held(&self, direction: Direction) -> bool {
        self.held[direction.index()]
    }
}
