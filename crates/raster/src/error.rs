/// Errors from opening or driving a rasterizer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RasterError {
    #[error("unsupported pixel format: {0} bits per pixel")]
    UnsupportedFormat(u32),
    #[error("invalid framebuffer size {width}x{height}")]
    InvalidSize { width: u32, height: u32 },
    #[error("failed to allocate {bytes} bytes of framebuffer memory")]
    Allocation { bytes: usize },
    #[error("matrix stack overflow (max depth {max})")]
    MatrixStackOverflow { max: usize },
    #[error("matrix stack underflow")]
    MatrixStackUnderflow,
}
