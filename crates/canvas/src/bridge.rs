use glcanvas_common::SkipReason;
use glcanvas_common::config::{DISPLAY_HEIGHT, DISPLAY_WIDTH};
use glcanvas_raster::{Framebuffer, Pixels};

use crate::{Area, CanvasColor, ConversionMode, DisplayFlush, NullDisplay, rgb565_to_canvas};

/// Errors from setting up the canvas.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CanvasError {
    #[error("invalid canvas size {width}x{height}")]
    InvalidSize { width: u32, height: u32 },
    #[error("failed to allocate {cells} canvas cells")]
    Allocation { cells: usize },
}

/// Canvas geometry and pixel widening.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanvasConfig {
    pub width: u32,
    pub height: u32,
    pub mode: ConversionMode,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: DISPLAY_WIDTH,
            height: DISPLAY_HEIGHT,
            mode: ConversionMode::default(),
        }
    }
}

/// What one `update` did with the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CanvasUpdate {
    /// 32-bit rows copied verbatim.
    Copied,
    /// 16-bit pixels widened one by one.
    Converted,
    Skipped(SkipReason),
}

struct Buffers {
    front: Vec<CanvasColor>,
    back: Vec<CanvasColor>,
}

fn allocate(cells: usize) -> Result<Vec<CanvasColor>, CanvasError> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(cells)
        .map_err(|_| CanvasError::Allocation { cells })?;
    buf.resize(cells, CanvasColor::BLACK);
    Ok(buf)
}

/// Owns the GUI canvas buffers and fills them from native frames.
///
/// Frames are written into the back buffer and swapped to the front, so
/// `pixels()` never shows a half-written frame.
pub struct CanvasBridge<D: DisplayFlush = NullDisplay> {
    width: u32,
    height: u32,
    mode: ConversionMode,
    buffers: Option<Buffers>,
    dirty: Option<Area>,
    display: D,
    frames: u64,
}

impl<D: DisplayFlush> CanvasBridge<D> {
    /// Allocate a black `width` x `height` canvas presenting to `display`.
    pub fn init(width: u32, height: u32, display: D) -> Result<Self, CanvasError> {
        Self::init_with(
            CanvasConfig {
                width,
                height,
                ..CanvasConfig::default()
            },
            display,
        )
    }

    pub fn init_with(config: CanvasConfig, display: D) -> Result<Self, CanvasError> {
        let CanvasConfig {
            width,
            height,
            mode,
        } = config;
        if width == 0 || height == 0 {
            return Err(CanvasError::InvalidSize { width, height });
        }
        let cells = (width as usize)
            .checked_mul(height as usize)
            .ok_or(CanvasError::InvalidSize { width, height })?;

        let buffers = Buffers {
            front: allocate(cells)?,
            back: allocate(cells)?,
        };
        tracing::info!(width, height, ?mode, "canvas initialized");

        Ok(Self {
            width,
            height,
            mode,
            buffers: Some(buffers),
            dirty: None,
            display,
            frames: 0,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn mode(&self) -> ConversionMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: ConversionMode) {
        self.mode = mode;
    }

    pub fn is_ready(&self) -> bool {
        self.buffers.is_some()
    }

    /// Frames written since init.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Front buffer, row-major with `width()` cells per row.
    pub fn pixels(&self) -> Option<&[CanvasColor]> {
        self.buffers.as_ref().map(|b| b.front.as_slice())
    }

    pub fn get(&self, x: u32, y: u32) -> Option<CanvasColor> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = y as usize * self.width as usize + x as usize;
        self.pixels().map(|p| p[idx])
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn display_mut(&mut self) -> &mut D {
        &mut self.display
    }

    /// Take the latest native frame, if any, and mark the canvas dirty.
    pub fn update(&mut self, framebuffer: Option<&Framebuffer>) -> CanvasUpdate {
        let _span = tracing::info_span!("canvas_update", frame = self.frames).entered();

        let Some(fb) = framebuffer else {
            return skip(SkipReason::FramebufferUnavailable);
        };
        let Some(buffers) = self.buffers.as_mut() else {
            return skip(SkipReason::CanvasUnavailable);
        };

        let w = fb.width().min(self.width) as usize;
        let h = fb.height().min(self.height) as usize;
        if (w as u32, h as u32) != (self.width, self.height) {
            tracing::trace!(
                native_width = fb.width(),
                native_height = fb.height(),
                "frame size differs from canvas; writing overlap"
            );
        }
        let src_stride = fb.width() as usize;
        let dst_stride = self.width as usize;
        let back = &mut buffers.back;

        let result = match fb.pixels() {
            Pixels::Rgba32(src) => {
                for y in 0..h {
                    let row = &src[y * src_stride..y * src_stride + w];
                    back[y * dst_stride..y * dst_stride + w]
                        .copy_from_slice(bytemuck::cast_slice(row));
                }
                CanvasUpdate::Copied
            }
            Pixels::Rgb565(src) => {
                let mode = self.mode;
                for y in 0..h {
                    let row = &src[y * src_stride..y * src_stride + w];
                    let out = &mut back[y * dst_stride..y * dst_stride + w];
                    for (dst, &p) in out.iter_mut().zip(row) {
                        *dst = rgb565_to_canvas(p, mode);
                    }
                }
                CanvasUpdate::Converted
            }
        };

        std::mem::swap(&mut buffers.front, &mut buffers.back);
        self.dirty = Some(Area {
            x: 0,
            y: 0,
            width: w as u32,
            height: h as u32,
        });
        self.frames += 1;
        result
    }

    /// Hand the front buffer to the display if a new frame arrived since
    /// the last call. Returns whether anything was flushed.
    pub fn present(&mut self) -> bool {
        let Some(buffers) = self.buffers.as_ref() else {
            return false;
        };
        let Some(area) = self.dirty.take() else {
            return false;
        };
        self.display
            .flush(area, &buffers.front, self.width as usize);
        true
    }

    /// Release both buffers. Safe to call twice.
    pub fn cleanup(&mut self) {
        self.dirty = None;
        if self.buffers.take().is_some() {
            tracing::info!(frames = self.frames, "canvas released");
        }
    }
}

fn skip(reason: SkipReason) -> CanvasUpdate {
    tracing::debug!(%reason, "canvas update skipped");
    CanvasUpdate::Skipped(reason)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glcanvas_raster::PixelFormat;

    #[derive(Default)]
    struct Recorder {
        flushes: Vec<(Area, usize, usize)>,
    }

    impl DisplayFlush for Recorder {
        fn flush(&mut self, area: Area, pixels: &[CanvasColor], stride: usize) {
            self.flushes.push((area, pixels.len(), stride));
        }
    }

    fn fb(width: u32, height: u32, format: PixelFormat, fill: u32) -> Framebuffer {
        let mut fb = Framebuffer::new(width, height, format).unwrap();
        fb.fill(fill);
        fb
    }

    #[test]
    fn init_fills_black() {
        let canvas = CanvasBridge::init(4, 3, NullDisplay).unwrap();
        let pixels = canvas.pixels().unwrap();
        assert_eq!(pixels.len(), 12);
        assert!(pixels.iter().all(|&c| c == CanvasColor::BLACK));
    }

    #[test]
    fn zero_size_is_rejected() {
        let err = CanvasBridge::init(0, 3, NullDisplay).err().unwrap();
        assert_eq!(err, CanvasError::InvalidSize { width: 0, height: 3 });
    }

    #[test]
    fn rgba32_is_copied_verbatim() {
        let mut canvas = CanvasBridge::init(4, 4, NullDisplay).unwrap();
        let native = fb(4, 4, PixelFormat::Rgba32, 0x8012_3456);
        assert_eq!(canvas.update(Some(&native)), CanvasUpdate::Copied);
        assert!(canvas.pixels().unwrap().iter().all(|c| c.0 == 0x8012_3456));
    }

    #[test]
    fn rgb565_is_converted() {
        let mut canvas = CanvasBridge::init(4, 4, NullDisplay).unwrap();
        let native = fb(4, 4, PixelFormat::Rgb565, 0xF800);
        assert_eq!(canvas.update(Some(&native)), CanvasUpdate::Converted);
        assert_eq!(canvas.get(3, 3).unwrap().rgb(), [0xF8, 0, 0]);
    }

    #[test]
    fn replicate_mode_is_honored() {
        let config = CanvasConfig {
            width: 2,
            height: 2,
            mode: ConversionMode::Replicate,
        };
        let mut canvas = CanvasBridge::init_with(config, NullDisplay).unwrap();
        canvas.update(Some(&fb(2, 2, PixelFormat::Rgb565, 0xFFFF)));
        assert_eq!(canvas.get(0, 0), Some(CanvasColor::WHITE));
    }

    #[test]
    fn smaller_frame_fills_top_left() {
        // A 240-wide frame on a 320-wide panel, scaled down.
        let mut canvas = CanvasBridge::init(8, 4, NullDisplay).unwrap();
        canvas.update(Some(&fb(6, 4, PixelFormat::Rgb565, 0x07E0)));
        assert_eq!(canvas.get(5, 3).unwrap().rgb(), [0, 0xFC, 0]);
        assert_eq!(canvas.get(6, 0), Some(CanvasColor::BLACK));
        assert_eq!(canvas.get(7, 3), Some(CanvasColor::BLACK));
    }

    #[test]
    fn larger_frame_is_clipped() {
        let mut canvas = CanvasBridge::init(2, 2, NullDisplay).unwrap();
        let mut native = fb(4, 4, PixelFormat::Rgba32, 0xFF00_00FF);
        native.put(1, 1, 0xFFFF_0000);
        canvas.update(Some(&native));
        assert_eq!(canvas.get(0, 0), Some(CanvasColor(0xFF00_00FF)));
        assert_eq!(canvas.get(1, 1), Some(CanvasColor(0xFFFF_0000)));
    }

    #[test]
    fn missing_inputs_skip() {
        let mut canvas = CanvasBridge::init(2, 2, NullDisplay).unwrap();
        assert_eq!(
            canvas.update(None),
            CanvasUpdate::Skipped(SkipReason::FramebufferUnavailable)
        );
        canvas.cleanup();
        canvas.cleanup();
        assert!(!canvas.is_ready());
        let native = fb(2, 2, PixelFormat::Rgb565, 0);
        assert_eq!(
            canvas.update(Some(&native)),
            CanvasUpdate::Skipped(SkipReason::CanvasUnavailable)
        );
        assert!(canvas.pixels().is_none());
        assert_eq!(canvas.frames(), 0);
    }

    #[test]
    fn present_flushes_once_per_frame() {
        let mut canvas = CanvasBridge::init(3, 2, Recorder::default()).unwrap();
        assert!(!canvas.present());

        canvas.update(Some(&fb(3, 2, PixelFormat::Rgb565, 0x001F)));
        assert!(canvas.present());
        assert!(!canvas.present());

        let expected = Area {
            x: 0,
            y: 0,
            width: 3,
            height: 2,
        };
        assert_eq!(canvas.display().flushes, vec![(expected, 6, 3)]);
    }

    #[test]
    fn front_buffer_holds_latest_frame() {
        let mut canvas = CanvasBridge::init(2, 1, NullDisplay).unwrap();
        canvas.update(Some(&fb(2, 1, PixelFormat::Rgba32, 1)));
        canvas.update(Some(&fb(2, 1, PixelFormat::Rgba32, 2)));
        assert_eq!(canvas.get(1, 0), Some(CanvasColor(2)));
        assert_eq!(canvas.frames(), 2);
    }
}
