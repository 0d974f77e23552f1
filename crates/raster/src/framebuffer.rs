use bytemuck::{Pod, Zeroable};

use crate::{PixelFormat, RasterError};

/// Storage unit that gives the pixel memory its 16-byte alignment.
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
#[repr(C, align(16))]
struct Block([u8; 16]);

/// Native pixel buffer written by a rasterizer.
///
/// Pixels are row-major with row 0 at the top.
#[derive(Debug, Clone)]
pub struct Framebuffer {
    width: u32,
    height: u32,
    format: PixelFormat,
    len: usize,
    storage: Vec<Block>,
}

/// Typed read-only view of the pixels.
#[derive(Debug, Clone, Copy)]
pub enum Pixels<'a> {
    Rgba32(&'a [u32]),
    Rgb565(&'a [u16]),
}

impl Framebuffer {
    /// Allocate a zeroed buffer. Fails instead of aborting when the
    /// allocation cannot be satisfied.
    pub fn new(width: u32, height: u32, format: PixelFormat) -> Result<Self, RasterError> {
        if width == 0 || height == 0 {
            return Err(RasterError::InvalidSize { width, height });
        }
        let len = (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(format.bytes_per_pixel()))
            .ok_or(RasterError::InvalidSize { width, height })?;

        let blocks = len.div_ceil(std::mem::size_of::<Block>());
        let mut storage = Vec::new();
        storage
            .try_reserve_exact(blocks)
            .map_err(|_| RasterError::Allocation { bytes: len })?;
        storage.resize(blocks, Block::zeroed());

        Ok(Self {
            width,
            height,
            format,
            len,
            storage,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Raw bytes, exactly `width * height * bytes_per_pixel` long.
    pub fn as_bytes(&self) -> &[u8] {
        &bytemuck::cast_slice::<Block, u8>(&self.storage)[..self.len]
    }

    fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut bytemuck::cast_slice_mut::<Block, u8>(&mut self.storage)[..self.len]
    }

    pub fn pixels(&self) -> Pixels<'_> {
        let bytes = self.as_bytes();
        match self.format {
            PixelFormat::Rgba32 => Pixels::Rgba32(bytemuck::cast_slice(bytes)),
            PixelFormat::Rgb565 => Pixels::Rgb565(bytemuck::cast_slice(bytes)),
        }
    }

    /// Read one packed pixel.
    pub fn get(&self, x: u32, y: u32) -> Option<u32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = (y * self.width + x) as usize;
        Some(match self.pixels() {
            Pixels::Rgba32(p) => p[idx],
            Pixels::Rgb565(p) => p[idx] as u32,
        })
    }

    /// Write one packed pixel; out-of-bounds writes are ignored.
    #[inline]
    pub fn put(&mut self, x: i32, y: i32, packed: u32) {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return;
        }
        let idx = y as usize * self.width as usize + x as usize;
        self.put_index(idx, packed);
    }

    #[inline]
    pub(crate) fn put_index(&mut self, idx: usize, packed: u32) {
        let format = self.format;
        let bytes = self.as_bytes_mut();
        match format {
            PixelFormat::Rgba32 => bytemuck::cast_slice_mut::<u8, u32>(bytes)[idx] = packed,
            PixelFormat::Rgb565 => bytemuck::cast_slice_mut::<u8, u16>(bytes)[idx] = packed as u16,
        }
    }

    /// Set every pixel to `packed`.
    pub fn fill(&mut self, packed: u32) {
        let format = self.format;
        let bytes = self.as_bytes_mut();
        match format {
            PixelFormat::Rgba32 => bytemuck::cast_slice_mut::<u8, u32>(bytes).fill(packed),
            PixelFormat::Rgb565 => bytemuck::cast_slice_mut::<u8, u16>(bytes).fill(packed as u16),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_matches_format() {
        let fb = Framebuffer::new(64, 64, PixelFormat::Rgb565).unwrap();
        assert_eq!(fb.as_bytes().len(), 64 * 64 * 2);
        let fb = Framebuffer::new(3, 5, PixelFormat::Rgba32).unwrap();
        assert_eq!(fb.as_bytes().len(), 3 * 5 * 4);
    }

    #[test]
    fn storage_is_16_byte_aligned() {
        let fb = Framebuffer::new(7, 3, PixelFormat::Rgb565).unwrap();
        assert_eq!(fb.as_bytes().as_ptr() as usize % 16, 0);
    }

    #[test]
    fn zero_size_is_rejected() {
        let err = Framebuffer::new(0, 10, PixelFormat::Rgba32).unwrap_err();
        assert_eq!(err, RasterError::InvalidSize { width: 0, height: 10 });
    }

    #[test]
    fn huge_size_is_rejected() {
        assert!(Framebuffer::new(u32::MAX, u32::MAX, PixelFormat::Rgba32).is_err());
    }

    #[test]
    fn put_get_and_bounds() {
        let mut fb = Framebuffer::new(4, 4, PixelFormat::Rgb565).unwrap();
        fb.put(1, 2, 0xF800);
        fb.put(-1, 0, 0xFFFF);
        fb.put(4, 0, 0xFFFF);
        assert_eq!(fb.get(1, 2), Some(0xF800));
        assert_eq!(fb.get(0, 0), Some(0));
        assert_eq!(fb.get(4, 0), None);
    }

    #[test]
    fn fill_and_typed_view() {
        let mut fb = Framebuffer::new(2, 2, PixelFormat::Rgba32).unwrap();
        fb.fill(0xFF00_FF00);
        match fb.pixels() {
            Pixels::Rgba32(p) => assert!(p.iter().all(|&px| px == 0xFF00_FF00)),
            Pixels::Rgb565(_) => panic!("wrong view"),
        }
    }
}
