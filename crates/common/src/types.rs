/// Why a frame was not produced or not displayed.
///
/// A skip is recoverable: the frame is dropped and the next loop iteration
/// tries again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The render session is closed, so there is no native framebuffer.
    FramebufferUnavailable,
    /// The canvas has not been initialized or was already cleaned up.
    CanvasUnavailable,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FramebufferUnavailable => write!(f, "framebuffer unavailable"),
            Self::CanvasUnavailable => write!(f, "canvas unavailable"),
        }
    }
}

/// Outcome of one render step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStatus {
    Rendered,
    Skipped(SkipReason),
}

impl FrameStatus {
    pub fn is_rendered(self) -> bool {
        matches!(self, Self::Rendered)
    }
}
