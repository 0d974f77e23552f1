use crate::RasterError;

/// Encoding of one native framebuffer pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// One native-endian `u32` per pixel laid out as `0xAARRGGBB`.
    Rgba32,
    /// One native-endian `u16` per pixel laid out as `RRRRRGGGGGGBBBBB`.
    Rgb565,
}

impl PixelFormat {
    /// Select a format from its bit depth (32 or 16).
    pub fn from_bits(bits: u32) -> Result<Self, RasterError> {
        match bits {
            32 => Ok(Self::Rgba32),
            16 => Ok(Self::Rgb565),
            other => Err(RasterError::UnsupportedFormat(other)),
        }
    }

    pub fn bits(self) -> u32 {
        match self {
            Self::Rgba32 => 32,
            Self::Rgb565 => 16,
        }
    }

    pub fn bytes_per_pixel(self) -> usize {
        self.bits() as usize / 8
    }

    /// Pack 8-bit channels into this format. Alpha is dropped for 565.
    pub fn pack(self, r: u8, g: u8, b: u8, a: u8) -> u32 {
        match self {
            Self::Rgba32 => {
                (a as u32) << 24 | (r as u32) << 16 | (g as u32) << 8 | b as u32
            }
            Self::Rgb565 => {
                ((r as u32 >> 3) << 11) | ((g as u32 >> 2) << 5) | (b as u32 >> 3)
            }
        }
    }

    /// Pack a floating-point color with channels in [0, 1].
    pub fn pack_f32(self, rgba: [f32; 4]) -> u32 {
        let [r, g, b, a] = rgba.map(unit_to_u8);
        self.pack(r, g, b, a)
    }
}

impl std::fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rgba32 => write!(f, "RGBA 32-bit"),
            Self::Rgb565 => write!(f, "RGB 5:6:5 16-bit"),
        }
    }
}

fn unit_to_u8(c: f32) -> u8 {
    // NaN saturates to 0 through the cast.
    (c.clamp(0.0, 1.0) * 255.0 + 0.5) as u8
}
