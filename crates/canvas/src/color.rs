use bytemuck::{Pod, Zeroable};

/// One canvas cell, `0xAARRGGBB`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Pod, Zeroable)]
#[repr(transparent)]
pub struct CanvasColor(pub u32);

impl CanvasColor {
    pub const BLACK: Self = Self::from_rgb(0, 0, 0);
    pub const WHITE: Self = Self::from_rgb(0xFF, 0xFF, 0xFF);

    /// Opaque color from 8-bit channels.
    pub const fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self(0xFF00_0000 | (r as u32) << 16 | (g as u32) << 8 | b as u32)
    }

    pub const fn a(self) -> u8 {
        (self.0 >> 24) as u8
    }

    pub const fn r(self) -> u8 {
        (self.0 >> 16) as u8
    }

    pub const fn g(self) -> u8 {
        (self.0 >> 8) as u8
    }

    pub const fn b(self) -> u8 {
        self.0 as u8
    }

    pub const fn rgb(self) -> [u8; 3] {
        [self.r(), self.g(), self.b()]
    }
}

/// How 5- and 6-bit channels are widened to 8 bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConversionMode {
    /// Plain left shift; the low bits stay zero, so full white is
    /// (0xF8, 0xFC, 0xF8).
    #[default]
    Shift,
    /// Replicate the high bits into the low bits so 0x1F maps to 0xFF.
    Replicate,
}

impl std::str::FromStr for ConversionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "shift" => Ok(Self::Shift),
            "replicate" => Ok(Self::Replicate),
            other => Err(format!("unknown conversion mode '{other}' (expected shift or replicate)")),
        }
    }
}

/// Widen one RGB 5:6:5 pixel to an opaque canvas color.
#[inline]
pub fn rgb565_to_canvas(pixel: u16, mode: ConversionMode) -> CanvasColor {
    let r5 = (pixel >> 11) & 0x1F;
    let g6 = (pixel >> 5) & 0x3F;
    let b5 = pixel & 0x1F;
    let (r, g, b) = match mode {
        ConversionMode::Shift => (r5 << 3, g6 << 2, b5 << 3),
        ConversionMode::Replicate => (
            (r5 << 3) | (r5 >> 2),
            (g6 << 2) | (g6 >> 4),
            (b5 << 3) | (b5 >> 2),
        ),
    };
    CanvasColor::from_rgb(r as u8, g as u8, b as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pure_red() {
        let c = rgb565_to_canvas(0xF800, ConversionMode::Shift);
        assert_eq!(c.rgb(), [0xF8, 0x00, 0x00]);
        assert_eq!(c.a(), 0xFF);
    }

    #[test]
    fn primaries_and_white() {
        assert_eq!(rgb565_to_canvas(0x07E0, ConversionMode::Shift).rgb(), [0, 0xFC, 0]);
        assert_eq!(rgb565_to_canvas(0x001F, ConversionMode::Shift).rgb(), [0, 0, 0xF8]);
        assert_eq!(rgb565_to_canvas(0xFFFF, ConversionMode::Shift).rgb(), [0xF8, 0xFC, 0xF8]);
        assert_eq!(rgb565_to_canvas(0, ConversionMode::Shift), CanvasColor::BLACK);
    }

    #[test]
    fn replicate_reaches_full_range() {
        assert_eq!(rgb565_to_canvas(0xFFFF, ConversionMode::Replicate), CanvasColor::WHITE);
        assert_eq!(rgb565_to_canvas(0, ConversionMode::Replicate), CanvasColor::BLACK);
    }

    #[test]
    fn whole_domain_matches_formula() {
        for p in 0..=u16::MAX {
            let c = rgb565_to_canvas(p, ConversionMode::Shift);
            let p = p as u32;
            let expected = 0xFF00_0000
                | (((p >> 11) & 0x1F) << 3) << 16
                | (((p >> 5) & 0x3F) << 2) << 8
                | ((p & 0x1F) << 3);
            assert_eq!(c.0, expected);

            let r = rgb565_to_canvas(p as u16, ConversionMode::Replicate);
            assert_eq!(r.a(), 0xFF);
            // Replication only ever fills the low bits the shift left empty.
            assert_eq!(r.r() & 0xF8, c.r());
            assert_eq!(r.g() & 0xFC, c.g());
            assert_eq!(r.b() & 0xF8, c.b());
        }
    }

    #[test]
    fn mode_parses() {
        assert_eq!("shift".parse::<ConversionMode>(), Ok(ConversionMode::Shift));
        assert_eq!("replicate".parse::<ConversionMode>(), Ok(ConversionMode::Replicate));
        assert!("dither".parse::<ConversionMode>().is_err());
    }
}
