use glcanvas_raster::{MatrixMode, RasterError, Rasterizer};

use crate::FrameTiming;

/// Text of the diagnostic overlay.
pub fn overlay_text(timing: &FrameTiming) -> String {
    format!(
        "FPS: {:.1}\nRender Time: {:.2} ms",
        timing.fps, timing.render_time_ms
    )
}

/// Run `draw` with identity projection and model-view matrices.
///
/// Both stacks are pushed once and popped once, on every path out, and the
/// rasterizer is left in model-view mode.
pub fn with_screen_space<R, T>(
    rasterizer: &mut R,
    draw: impl FnOnce(&mut R) -> T,
) -> Result<T, RasterError>
where
    R: Rasterizer + ?Sized,
{
    rasterizer.matrix_mode(MatrixMode::Projection);
    if let Err(e) = rasterizer.push_matrix() {
        rasterizer.matrix_mode(MatrixMode::ModelView);
        return Err(e);
    }
    rasterizer.load_identity();

    rasterizer.matrix_mode(MatrixMode::ModelView);
    if let Err(e) = rasterizer.push_matrix() {
        rasterizer.matrix_mode(MatrixMode::Projection);
        let _ = rasterizer.pop_matrix();
        rasterizer.matrix_mode(MatrixMode::ModelView);
        return Err(e);
    }
    rasterizer.load_identity();

    let out = draw(rasterizer);

    rasterizer.matrix_mode(MatrixMode::ModelView);
    let model_view = rasterizer.pop_matrix();
    rasterizer.matrix_mode(MatrixMode::Projection);
    let projection = rasterizer.pop_matrix();
    rasterizer.matrix_mode(MatrixMode::ModelView);

    model_view.and(projection)?;
    Ok(out)
}
