use crate::CanvasColor;

/// Rectangle of canvas cells, top-left origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Area {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Where presented canvas pixels go: a GUI texture, a panel driver, a file.
pub trait DisplayFlush {
    /// `pixels` is the whole canvas, `stride` cells per row; only `area`
    /// changed since the last flush.
    fn flush(&mut self, area: Area, pixels: &[CanvasColor], stride: usize);
}

/// Display that discards every flush.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullDisplay;

impl DisplayFlush for NullDisplay {
    fn flush(&mut self, _area: Area, _pixels: &[CanvasColor], _stride: usize) {}
}
