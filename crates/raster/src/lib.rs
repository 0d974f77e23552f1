//! Rasterizer boundary: the native framebuffer and the calls the render
//! session makes into a rasterizer.
//!
//! # Invariants
//! - The framebuffer is owned by the rasterizer and only lent out read-only.
//! - Framebuffer storage is 16-byte aligned and exactly
//!   `width * height * bytes_per_pixel` bytes long.
//! - Matrices are loaded column-major.
//!
//! `SoftRasterizer` is a small reference implementation: flat matrix
//! stacks, Gouraud-shaded depth-tested triangles and an 8x8 bitmap font.
//! Swap in another backend by implementing `Rasterizer`.

mod error;
mod font;
mod format;
mod framebuffer;
mod rasterizer;
mod soft;

pub use error::RasterError;
pub use format::PixelFormat;
pub use framebuffer::{Framebuffer, Pixels};
pub use rasterizer::{ClearMask, MatrixMode, Primitive, Rasterizer, TextSize};
pub use soft::{MAX_MATRIX_DEPTH, SoftRasterizer};

pub fn crate_info() -> &'static str {
    "glcanvas-raster v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("raster"));
    }
}
