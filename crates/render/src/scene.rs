use glam::Vec3;
use glcanvas_raster::{Primitive, Rasterizer};

/// Geometry submitted to the rasterizer once per frame, after the view
/// matrix has been loaded.
pub trait Scene {
    fn submit(&self, rasterizer: &mut dyn Rasterizer);
}

/// One Gouraud-shaded triangle in the z = 0 plane: red, green and blue
/// corners.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExampleTriangle;

impl ExampleTriangle {
    pub const VERTICES: [(Vec3, Vec3); 3] = [
        (Vec3::new(1.0, 0.0, 0.0), Vec3::new(-1.0, -1.0, 0.0)),
        (Vec3::new(0.0, 1.0, 0.0), Vec3::new(1.0, -1.0, 0.0)),
        (Vec3::new(0.0, 0.0, 1.0), Vec3::new(0.0, 1.0, 0.0)),
    ];
}

impl Scene for ExampleTriangle {
    fn submit(&self, rasterizer: &mut dyn Rasterizer) {
        rasterizer.begin(Primitive::Triangles);
        for (color, position) in Self::VERTICES {
            rasterizer.color(color);
            rasterizer.vertex(position);
        }
        rasterizer.end();
    }
}
