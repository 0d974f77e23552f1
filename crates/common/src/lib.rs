//! Shared math, constants and types for the framebuffer bridge.
//!
//! # Invariants
//! - Matrices crossing the rasterizer boundary are column-major.
//! - Degenerate math never yields NaN; it yields a `MathError`.

pub mod config;
pub mod math;
mod types;

pub use math::MathError;
pub use types::{FrameStatus, SkipReason};

pub fn crate_info() -> &'static str {
    "glcanvas-common v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("common"));
    }
}
