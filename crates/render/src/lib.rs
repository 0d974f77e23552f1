//! Render session: owns the rasterizer context, the camera and the frame
//! timing, and produces one native framebuffer per frame.
//!
//! # Invariants
//! - The camera's view matrix is always derived from its pose.
//! - Every temporary matrix override is restored before a frame returns.
//! - The framebuffer is only lent out read-only, and only while open.

mod camera;
mod overlay;
mod scene;
mod session;
mod timing;

pub use camera::{Camera, CameraError};
pub use overlay::{overlay_text, with_screen_space};
pub use scene::{ExampleTriangle, Scene};
pub use session::{FrameStats, RenderConfig, RenderError, RenderSession, SessionSummary};
pub use timing::{Clock, FrameTimer, FrameTiming, ManualClock, MonotonicClock};

pub fn crate_info() -> &'static str {
    "glcanvas-render v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("render"));
    }
}
