use glam::{Mat4, Vec3, Vec4};

use crate::font::{self, GLYPH_SIZE};
use crate::{
    ClearMask, Framebuffer, MatrixMode, PixelFormat, Primitive, RasterError, Rasterizer,
    TextSize,
};

/// Deepest either matrix stack may grow.
pub const MAX_MATRIX_DEPTH: usize = 32;

/// Vertices with clip-space w at or below this are behind the eye.
const W_EPSILON: f32 = 1e-5;

#[derive(Debug, Clone, Copy)]
struct Vertex {
    clip: Vec4,
    color: Vec3,
}

#[derive(Debug, Clone, Copy)]
struct Viewport {
    x: i32,
    y: i32,
    width: u32,
    height: u32,
}

/// A vertex after perspective divide and viewport mapping.
#[derive(Debug, Clone, Copy)]
struct ScreenVertex {
    x: f32,
    y: f32,
    z: f32,
    inv_w: f32,
    color: Vec3,
}

/// Immediate-mode software rasterizer with a z-buffer.
///
/// Triangles are not clipped against the near plane: a triangle with any
/// vertex at or behind the eye is dropped whole, and fragments outside the
/// depth range are discarded.
pub struct SoftRasterizer {
    framebuffer: Framebuffer,
    depth: Vec<f32>,
    clear_color: [f32; 4],
    viewport: Viewport,
    depth_test: bool,
    mode: MatrixMode,
    projection: Vec<Mat4>,
    modelview: Vec<Mat4>,
    current_color: Vec3,
    primitive: Option<Primitive>,
    vertices: Vec<Vertex>,
    text_size: TextSize,
    triangles_drawn: u64,
}

impl SoftRasterizer {
    /// Depth of the given matrix stack (1 when nothing is pushed).
    pub fn matrix_depth(&self, mode: MatrixMode) -> usize {
        match mode {
            MatrixMode::Projection => self.projection.len(),
            MatrixMode::ModelView => self.modelview.len(),
        }
    }

    /// Top of the given matrix stack.
    pub fn current_matrix(&self, mode: MatrixMode) -> Mat4 {
        let stack = match mode {
            MatrixMode::Projection => &self.projection,
            MatrixMode::ModelView => &self.modelview,
        };
        top(stack)
    }

    pub fn current_mode(&self) -> MatrixMode {
        self.mode
    }

    /// Triangles rasterized since the last flush.
    pub fn triangles_drawn(&self) -> u64 {
        self.triangles_drawn
    }

    fn stack_mut(&mut self) -> &mut Vec<Mat4> {
        match self.mode {
            MatrixMode::Projection => &mut self.projection,
            MatrixMode::ModelView => &mut self.modelview,
        }
    }

    fn set_top(&mut self, m: Mat4) {
        if let Some(t) = self.stack_mut().last_mut() {
            *t = m;
        }
    }

    fn to_screen(&self, v: Vertex) -> ScreenVertex {
        let inv_w = 1.0 / v.clip.w;
        let ndc = v.clip.truncate() * inv_w;
        let vp = self.viewport;
        // Viewport y is measured from the bottom; framebuffer row 0 is the top.
        let top = self.framebuffer.height() as i32 - vp.y - vp.height as i32;
        ScreenVertex {
            x: vp.x as f32 + (ndc.x + 1.0) * 0.5 * vp.width as f32,
            y: top as f32 + (1.0 - ndc.y) * 0.5 * vp.height as f32,
            z: ndc.z,
            inv_w,
            color: v.color,
        }
    }

    fn draw_triangle(&mut self, tri: [Vertex; 3]) {
        if tri
            .iter()
            .any(|v| !v.clip.is_finite() || v.clip.w <= W_EPSILON)
        {
            tracing::trace!("triangle at or behind the eye plane dropped");
            return;
        }
        let [s0, s1, s2] = tri.map(|v| self.to_screen(v));

        let area = edge(s0, s1, s2.x, s2.y);
        if area.abs() < f32::EPSILON {
            return;
        }

        let w = self.framebuffer.width();
        let h = self.framebuffer.height();
        let min_x = s0.x.min(s1.x).min(s2.x).floor().max(0.0) as i32;
        let max_x = s0.x.max(s1.x).max(s2.x).ceil().min(w as f32 - 1.0) as i32;
        let min_y = s0.y.min(s1.y).min(s2.y).floor().max(0.0) as i32;
        let max_y = s0.y.max(s1.y).max(s2.y).ceil().min(h as f32 - 1.0) as i32;
        if min_x > max_x || min_y > max_y {
            return;
        }

        let format = self.framebuffer.format();
        for py in min_y..=max_y {
            for px in min_x..=max_x {
                let (cx, cy) = (px as f32 + 0.5, py as f32 + 0.5);
                let b0 = edge(s1, s2, cx, cy) / area;
                let b1 = edge(s2, s0, cx, cy) / area;
                let b2 = edge(s0, s1, cx, cy) / area;
                if b0 < 0.0 || b1 < 0.0 || b2 < 0.0 {
                    continue;
                }

                let z = b0 * s0.z + b1 * s1.z + b2 * s2.z;
                if !(-1.0..=1.0).contains(&z) {
                    continue;
                }
                let depth = (z + 1.0) * 0.5;
                let idx = py as usize * w as usize + px as usize;
                if self.depth_test {
                    if depth >= self.depth[idx] {
                        continue;
                    }
                    self.depth[idx] = depth;
                }

                // Perspective-correct color interpolation.
                let (p0, p1, p2) = (b0 * s0.inv_w, b1 * s1.inv_w, b2 * s2.inv_w);
                let color = (s0.color * p0 + s1.color * p1 + s2.color * p2) / (p0 + p1 + p2);
                let packed = format.pack_f32([color.x, color.y, color.z, 1.0]);
                self.framebuffer.put_index(idx, packed);
            }
        }
        self.triangles_drawn += 1;
    }
}

impl Rasterizer for SoftRasterizer {
    fn open(width: u32, height: u32, format: PixelFormat) -> Result<Self, RasterError> {
        let framebuffer = Framebuffer::new(width, height, format)?;

        let count = framebuffer.pixel_count();
        let mut depth = Vec::new();
        depth
            .try_reserve_exact(count)
            .map_err(|_| RasterError::Allocation {
                bytes: count * std::mem::size_of::<f32>(),
            })?;
        depth.resize(count, 1.0);

        tracing::debug!(width, height, %format, "software rasterizer opened");

        Ok(Self {
            framebuffer,
            depth,
            clear_color: [0.0; 4],
            viewport: Viewport {
                x: 0,
                y: 0,
                width,
                height,
            },
            depth_test: false,
            mode: MatrixMode::ModelView,
            projection: vec![Mat4::IDENTITY],
            modelview: vec![Mat4::IDENTITY],
            current_color: Vec3::ONE,
            primitive: None,
            vertices: Vec::new(),
            text_size: TextSize::default(),
            triangles_drawn: 0,
        })
    }

    fn set_clear_color(&mut self, rgba: [f32; 4]) {
        self.clear_color = rgba;
    }

    fn clear(&mut self, mask: ClearMask) {
        if mask.color {
            let packed = self.framebuffer.format().pack_f32(self.clear_color);
            self.framebuffer.fill(packed);
        }
        if mask.depth {
            self.depth.fill(1.0);
        }
    }

    fn viewport(&mut self, x: i32, y: i32, width: u32, height: u32) {
        self.viewport = Viewport {
            x,
            y,
            width,
            height,
        };
    }

    fn set_depth_test(&mut self, enabled: bool) {
        self.depth_test = enabled;
    }

    fn matrix_mode(&mut self, mode: MatrixMode) {
        self.mode = mode;
    }

    fn load_identity(&mut self) {
        self.set_top(Mat4::IDENTITY);
    }

    fn load_matrix(&mut self, m: &Mat4) {
        self.set_top(*m);
    }

    fn push_matrix(&mut self) -> Result<(), RasterError> {
        let stack = self.stack_mut();
        if stack.len() >= MAX_MATRIX_DEPTH {
            return Err(RasterError::MatrixStackOverflow {
                max: MAX_MATRIX_DEPTH,
            });
        }
        let t = top(stack);
        stack.push(t);
        Ok(())
    }

    fn pop_matrix(&mut self) -> Result<(), RasterError> {
        let stack = self.stack_mut();
        if stack.len() <= 1 {
            return Err(RasterError::MatrixStackUnderflow);
        }
        stack.pop();
        Ok(())
    }

    fn begin(&mut self, primitive: Primitive) {
        if self.primitive.is_some() {
            tracing::debug!("begin called inside begin/end; previous vertices discarded");
        }
        self.primitive = Some(primitive);
        self.vertices.clear();
    }

    fn color(&mut self, rgb: Vec3) {
        self.current_color = rgb;
    }

    fn vertex(&mut self, position: Vec3) {
        if self.primitive.is_none() {
            return;
        }
        let mvp = top(&self.projection) * top(&self.modelview);
        self.vertices.push(Vertex {
            clip: mvp * position.extend(1.0),
            color: self.current_color,
        });
    }

    fn end(&mut self) {
        let Some(primitive) = self.primitive.take() else {
            return;
        };
        let vertices = std::mem::take(&mut self.vertices);
        match primitive {
            Primitive::Triangles => {
                for tri in vertices.chunks_exact(3) {
                    self.draw_triangle([tri[0], tri[1], tri[2]]);
                }
            }
        }
        self.vertices = vertices;
        self.vertices.clear();
    }

    fn flush(&mut self) {
        tracing::trace!(triangles = self.triangles_drawn, "flush");
        self.triangles_drawn = 0;
    }

    fn set_text_size(&mut self, size: TextSize) {
        self.text_size = size;
    }

    fn draw_text(&mut self, text: &str, x: i32, y: i32, color: u32) {
        let cell = self.text_size.pixels() as i32;
        let scale = cell / GLYPH_SIZE as i32;
        let [_, r, g, b] = color.to_be_bytes();
        let packed = self.framebuffer.format().pack(r, g, b, 0xFF);

        let (mut cx, mut cy) = (x, y);
        for ch in text.chars() {
            if ch == '\n' {
                cx = x;
                cy += cell;
                continue;
            }
            for (row, &bits) in font::glyph(ch).iter().enumerate() {
                for col in 0..GLYPH_SIZE {
                    if (bits >> (7 - col)) & 1 == 0 {
                        continue;
                    }
                    let gx = cx + col as i32 * scale;
                    let gy = cy + row as i32 * scale;
                    for dy in 0..scale {
                        for dx in 0..scale {
                            self.framebuffer.put(gx + dx, gy + dy, packed);
                        }
                    }
                }
            }
            cx += cell;
        }
    }

    fn framebuffer(&self) -> &Framebuffer {
        &self.framebuffer
    }
}

fn top(stack: &[Mat4]) -> Mat4 {
    stack.last().copied().unwrap_or(Mat4::IDENTITY)
}

/// Twice the signed area of (a, b, p).
#[inline]
fn edge(a: ScreenVertex, b: ScreenVertex, px: f32, py: f32) -> f32 {
    (b.x - a.x) * (py - a.y) - (b.y - a.y) * (px - a.x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glcanvas_common::math;

    fn open(format: PixelFormat) -> SoftRasterizer {
        SoftRasterizer::open(32, 32, format).unwrap()
    }

    fn triangle(r: &mut SoftRasterizer, z: f32, color: Vec3) {
        r.begin(Primitive::Triangles);
        r.color(color);
        r.vertex(Vec3::new(-1.0, -1.0, z));
        r.vertex(Vec3::new(1.0, -1.0, z));
        r.vertex(Vec3::new(0.0, 1.0, z));
        r.end();
    }

    #[test]
    fn clear_fills_color() {
        let mut r = open(PixelFormat::Rgb565);
        r.set_clear_color([1.0, 0.0, 0.0, 1.0]);
        r.clear(ClearMask::COLOR_DEPTH);
        assert_eq!(r.framebuffer().get(0, 0), Some(0xF800));
        assert_eq!(r.framebuffer().get(31, 31), Some(0xF800));
    }

    #[test]
    fn triangle_covers_center() {
        let mut r = open(PixelFormat::Rgba32);
        r.clear(ClearMask::COLOR_DEPTH);
        triangle(&mut r, 0.0, Vec3::new(0.0, 1.0, 0.0));
        assert_eq!(r.framebuffer().get(16, 16), Some(0xFF00_FF00));
        // Top corners lie outside the triangle.
        assert_eq!(r.framebuffer().get(0, 0), Some(0));
        assert_eq!(r.framebuffer().get(31, 0), Some(0));
    }

    #[test]
    fn depth_test_keeps_nearest() {
        let mut r = open(PixelFormat::Rgba32);
        r.set_depth_test(true);
        r.clear(ClearMask::COLOR_DEPTH);
        triangle(&mut r, -0.5, Vec3::new(0.0, 1.0, 0.0));
        triangle(&mut r, 0.5, Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(r.framebuffer().get(16, 16), Some(0xFF00_FF00));
    }

    #[test]
    fn without_depth_test_last_wins() {
        let mut r = open(PixelFormat::Rgba32);
        r.clear(ClearMask::COLOR_DEPTH);
        triangle(&mut r, -0.5, Vec3::new(0.0, 1.0, 0.0));
        triangle(&mut r, 0.5, Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(r.framebuffer().get(16, 16), Some(0xFFFF_0000));
    }

    #[test]
    fn triangle_behind_eye_is_dropped() {
        let mut r = open(PixelFormat::Rgba32);
        r.matrix_mode(MatrixMode::Projection);
        r.load_matrix(&math::perspective(45.0, 1.0, 1.0, 1000.0));
        r.matrix_mode(MatrixMode::ModelView);
        r.clear(ClearMask::COLOR_DEPTH);
        triangle(&mut r, 5.0, Vec3::ONE);
        assert_eq!(r.triangles_drawn(), 0);
        assert!(r.framebuffer().as_bytes().iter().all(|&b| b == 0));
    }

    #[test]
    fn perspective_triangle_is_visible() {
        let mut r = open(PixelFormat::Rgb565);
        r.matrix_mode(MatrixMode::Projection);
        r.load_matrix(&math::perspective(45.0, 1.0, 1.0, 1000.0));
        r.matrix_mode(MatrixMode::ModelView);
        let view = math::look_at(Vec3::new(0.0, 0.0, 3.0), Vec3::ZERO, Vec3::Y).unwrap();
        r.load_matrix(&view);
        r.set_depth_test(true);
        r.clear(ClearMask::COLOR_DEPTH);
        triangle(&mut r, 0.0, Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(r.triangles_drawn(), 1);
        assert_eq!(r.framebuffer().get(16, 16), Some(0xF800));
    }

    #[test]
    fn matrix_stack_push_pop() {
        let mut r = open(PixelFormat::Rgba32);
        let m = Mat4::from_translation(Vec3::X);
        r.load_matrix(&m);
        r.push_matrix().unwrap();
        r.load_identity();
        assert_eq!(r.matrix_depth(MatrixMode::ModelView), 2);
        r.pop_matrix().unwrap();
        assert_eq!(r.current_matrix(MatrixMode::ModelView), m);
        assert_eq!(r.pop_matrix(), Err(RasterError::MatrixStackUnderflow));
    }

    #[test]
    fn matrix_stack_overflow() {
        let mut r = open(PixelFormat::Rgba32);
        for _ in 1..MAX_MATRIX_DEPTH {
            r.push_matrix().unwrap();
        }
        assert_eq!(
            r.push_matrix(),
            Err(RasterError::MatrixStackOverflow {
                max: MAX_MATRIX_DEPTH
            })
        );
    }

    #[test]
    fn text_is_drawn_scaled() {
        let mut r = open(PixelFormat::Rgba32);
        r.set_text_size(TextSize::Size16x16);
        r.draw_text("8", 0, 0, 0x00FF_FFFF);
        let fb = r.framebuffer();
        let lit = (0..16)
            .flat_map(|y| (0..16).map(move |x| (x, y)))
            .filter(|&(x, y)| fb.get(x, y) == Some(0xFFFF_FFFF))
            .count();
        assert!(lit > 0);
        // Nothing outside the first 16x16 cell.
        assert!((16..32).all(|x| fb.get(x, 0) == Some(0)));
    }

    #[test]
    fn text_newline_moves_down() {
        let mut r = open(PixelFormat::Rgb565);
        r.set_text_size(TextSize::Size8x8);
        r.draw_text("\n#", 0, 0, 0x00FF_FFFF);
        let fb = r.framebuffer();
        assert!((0..8).all(|y| (0..8).all(|x| fb.get(x, y) == Some(0))));
        assert!((8..16).any(|y| (0..8).any(|x| fb.get(x, y) == Some(0xFFFF))));
    }
}
