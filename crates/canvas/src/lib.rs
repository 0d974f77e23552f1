//! Canvas bridge: moves each finished frame from the rasterizer's native
//! framebuffer into the GUI's true-color canvas.
//!
//! # Invariants
//! - The native framebuffer is only read, never written or retained.
//! - 32-bit frames are copied verbatim; 16-bit 5:6:5 frames are widened
//!   per pixel and always come out opaque.
//! - When sizes differ only the overlapping top-left rectangle is written.
//! - A missing framebuffer or canvas skips the frame; it is not an error.

mod bridge;
mod color;
mod display;

pub use bridge::{CanvasBridge, CanvasConfig, CanvasError, CanvasUpdate};
pub use color::{CanvasColor, ConversionMode, rgb565_to_canvas};
pub use display::{Area, DisplayFlush, NullDisplay};

pub fn crate_info() -> &'static str {
    "glcanvas-canvas v0.1.0"
}
