use glam::{Mat4, Vec3};

use crate::{Framebuffer, PixelFormat, RasterError};

/// Which matrix stack the matrix calls operate on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatrixMode {
    Projection,
    ModelView,
}

/// Primitive assembled from the vertices between `begin` and `end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    /// Every three vertices form one triangle.
    Triangles,
}

/// Glyph cell size for `draw_text`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextSize {
    #[default]
    Size8x8,
    Size16x16,
    Size24x24,
    Size32x32,
}

impl TextSize {
    /// Edge length of one glyph cell in pixels.
    pub fn pixels(self) -> u32 {
        match self {
            Self::Size8x8 => 8,
            Self::Size16x16 => 16,
            Self::Size24x24 => 24,
            Self::Size32x32 => 32,
        }
    }
}

/// Buffers touched by `clear`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClearMask {
    pub color: bool,
    pub depth: bool,
}

impl ClearMask {
    pub const COLOR_DEPTH: Self = Self {
        color: true,
        depth: true,
    };
}

/// The calls a render session makes into a rasterizer.
///
/// The rasterizer owns its framebuffer; callers only ever see it through
/// `framebuffer()`.
pub trait Rasterizer {
    /// Open a context with a freshly allocated framebuffer.
    fn open(width: u32, height: u32, format: PixelFormat) -> Result<Self, RasterError>
    where
        Self: Sized;

    fn set_clear_color(&mut self, rgba: [f32; 4]);
    fn clear(&mut self, mask: ClearMask);
    fn viewport(&mut self, x: i32, y: i32, width: u32, height: u32);
    fn set_depth_test(&mut self, enabled: bool);

    fn matrix_mode(&mut self, mode: MatrixMode);
    fn load_identity(&mut self);
    /// Replace the top of the current stack with a column-major matrix.
    fn load_matrix(&mut self, m: &Mat4);
    fn push_matrix(&mut self) -> Result<(), RasterError>;
    fn pop_matrix(&mut self) -> Result<(), RasterError>;

    fn begin(&mut self, primitive: Primitive);
    fn color(&mut self, rgb: Vec3);
    fn vertex(&mut self, position: Vec3);
    fn end(&mut self);
    fn flush(&mut self);

    fn set_text_size(&mut self, size: TextSize);
    /// Draw text in screen pixels from the top-left corner at (x, y).
    /// `color` is `0x??RRGGBB`; the alpha byte is ignored.
    fn draw_text(&mut self, text: &str, x: i32, y: i32, color: u32);

    fn framebuffer(&self) -> &Framebuffer;
}
