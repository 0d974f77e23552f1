use glam::Vec3;
use glcanvas_common::config::{
    DEFAULT_PIXEL_BITS, DISPLAY_HEIGHT, DISPLAY_WIDTH, FOV_Y_DEGREES, OVERLAY_COLOR, OVERLAY_X,
    OVERLAY_Y, RENDER_TIME_HISTORY, Z_FAR, Z_NEAR,
};
use glcanvas_common::math;
use glcanvas_common::{FrameStatus, SkipReason};
use glcanvas_input::{Action, ActionSink, Direction};
use glcanvas_raster::{
    ClearMask, Framebuffer, MatrixMode, PixelFormat, RasterError, Rasterizer, SoftRasterizer,
    TextSize,
};

use crate::overlay::{overlay_text, with_screen_space};
use crate::scene::{ExampleTriangle, Scene};
use crate::timing::{Clock, FrameTimer, FrameTiming, MonotonicClock};
use crate::{Camera, CameraError};

/// Errors from opening or driving a render session.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("renderer initialization failed: {0}")]
    Init(RasterError),
    #[error(transparent)]
    Raster(#[from] RasterError),
    #[error(transparent)]
    Camera(#[from] CameraError),
}

/// Runtime parameters for a render session.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderConfig {
    pub width: u32,
    pub height: u32,
    /// 32 or 16 (RGB 5:6:5).
    pub pixel_bits: u32,
    pub fov_y_degrees: f32,
    pub near: f32,
    pub far: f32,
    pub clear_color: [f32; 4],
    /// Draw the FPS / render-time text after each frame.
    pub overlay: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: DISPLAY_WIDTH,
            height: DISPLAY_HEIGHT,
            pixel_bits: DEFAULT_PIXEL_BITS,
            fov_y_degrees: FOV_Y_DEGREES,
            near: Z_NEAR,
            far: Z_FAR,
            clear_color: [0.0, 0.0, 0.0, 1.0],
            overlay: true,
        }
    }
}

/// Frame-rate and render-time figures for display or logging.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameStats {
    pub frames_rendered: u64,
    pub fps: f64,
    pub last_render_ms: f64,
    pub average_render_ms: f64,
    pub min_render_ms: f64,
    pub max_render_ms: f64,
}

/// One rasterizer context plus the camera and timing that drive it.
///
/// The framebuffer stays inside the rasterizer; consumers borrow it through
/// [`RenderSession::framebuffer`] between frames.
pub struct RenderSession<R: Rasterizer = SoftRasterizer> {
    config: RenderConfig,
    rasterizer: Option<R>,
    camera: Camera,
    timing: FrameTiming,
    history: FrameTimer,
    clock: Box<dyn Clock>,
    scene: Box<dyn Scene>,
    frames_rendered: u64,
}

impl RenderSession {
    /// Open a software-rasterized session with default projection settings.
    pub fn open(width: u32, height: u32, pixel_bits: u32) -> Result<Self, RenderError> {
        Self::open_with(RenderConfig {
            width,
            height,
            pixel_bits,
            ..RenderConfig::default()
        })
    }

    pub fn open_with(config: RenderConfig) -> Result<Self, RenderError> {
        Self::open_with_clock(config, Box::new(MonotonicClock::new()))
    }
}

impl<R: Rasterizer> RenderSession<R> {
    /// Open a session on any rasterizer backend, timed by `clock`.
    ///
    /// Nothing is kept if any step fails.
    pub fn open_with_clock(config: RenderConfig, clock: Box<dyn Clock>) -> Result<Self, RenderError> {
        let _span = tracing::info_span!(
            "render_open",
            width = config.width,
            height = config.height,
            bits = config.pixel_bits
        )
        .entered();

        let format = PixelFormat::from_bits(config.pixel_bits).map_err(RenderError::Init)?;
        let mut rasterizer =
            R::open(config.width, config.height, format).map_err(RenderError::Init)?;

        let camera = Camera::default();
        let aspect = config.width as f32 / config.height as f32;
        let projection = math::perspective(config.fov_y_degrees, aspect, config.near, config.far);

        rasterizer.viewport(0, 0, config.width, config.height);
        rasterizer.matrix_mode(MatrixMode::Projection);
        rasterizer.load_matrix(&projection);
        rasterizer.matrix_mode(MatrixMode::ModelView);
        rasterizer.load_matrix(&camera.view_matrix());
        rasterizer.set_depth_test(true);
        rasterizer.set_clear_color(config.clear_color);

        let timing = FrameTiming::new(clock.now_ms());
        tracing::info!(%format, "render session opened");

        Ok(Self {
            config,
            rasterizer: Some(rasterizer),
            camera,
            timing,
            history: FrameTimer::new(RENDER_TIME_HISTORY),
            clock,
            scene: Box::new(ExampleTriangle),
            frames_rendered: 0,
        })
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn is_open(&self) -> bool {
        self.rasterizer.is_some()
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn timing(&self) -> &FrameTiming {
        &self.timing
    }

    pub fn rasterizer(&self) -> Option<&R> {
        self.rasterizer.as_ref()
    }

    /// The last completed frame, or `None` once the session is closed.
    pub fn framebuffer(&self) -> Option<&Framebuffer> {
        self.rasterizer.as_ref().map(|r| r.framebuffer())
    }

    /// Render one frame into the native framebuffer.
    ///
    /// A closed session is not an error: the frame is skipped.
    pub fn render_frame(&mut self) -> Result<FrameStatus, RenderError> {
        let _span = tracing::info_span!("render_frame", frame = self.frames_rendered).entered();

        let Some(rasterizer) = self.rasterizer.as_mut() else {
            let reason = SkipReason::FramebufferUnavailable;
            tracing::debug!(%reason, "frame skipped");
            return Ok(FrameStatus::Skipped(reason));
        };

        let start = self.clock.now_ms();

        rasterizer.clear(ClearMask::COLOR_DEPTH);
        rasterizer.matrix_mode(MatrixMode::ModelView);
        rasterizer.load_identity();
        rasterizer.load_matrix(&self.camera.view_matrix());
        self.scene.submit(rasterizer);
        rasterizer.flush();

        let end = self.clock.now_ms();
        if self.timing.record(start, end) {
            tracing::trace!(fps = self.timing.fps, "fps window elapsed");
        }
        self.history.record_ms(end - start);

        if self.config.overlay {
            let text = overlay_text(&self.timing);
            with_screen_space(rasterizer, |r| {
                r.set_text_size(TextSize::Size16x16);
                r.draw_text(&text, OVERLAY_X, OVERLAY_Y, OVERLAY_COLOR);
            })?;
        }

        self.frames_rendered += 1;
        tracing::trace!(
            render_time_ms = self.timing.render_time_ms,
            "frame rendered"
        );
        Ok(FrameStatus::Rendered)
    }

    pub fn stats(&self) -> FrameStats {
        FrameStats {
            frames_rendered: self.frames_rendered,
            fps: self.timing.fps,
            last_render_ms: self.timing.render_time_ms,
            average_render_ms: self.history.average_ms(),
            min_render_ms: self.history.min_ms(),
            max_render_ms: self.history.max_ms(),
        }
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            open: self.is_open(),
            width: self.config.width,
            height: self.config.height,
            format: self.framebuffer().map(|fb| fb.format()),
            frames_rendered: self.frames_rendered,
            fps: self.timing.fps,
            position: self.camera.position(),
            forward: self.camera.forward(),
        }
    }

    /// Release the rasterizer and its framebuffer. Safe to call twice.
    pub fn close(&mut self) {
        if self.rasterizer.take().is_some() {
            tracing::info!(frames = self.frames_rendered, "render session closed");
        }
    }

    pub fn set_camera(&mut self, eye: Vec3, at: Vec3, up: Vec3) -> Result<(), RenderError> {
        self.update_camera(|c| c.set(eye, at, up))
    }

    pub fn move_forward(&mut self, distance: f32) -> Result<(), RenderError> {
        self.update_camera(|c| c.move_forward(distance))
    }

    pub fn move_backward(&mut self, distance: f32) -> Result<(), RenderError> {
        self.update_camera(|c| c.move_backward(distance))
    }

    pub fn move_left(&mut self, distance: f32) -> Result<(), RenderError> {
        self.update_camera(|c| c.move_left(distance))
    }

    pub fn move_right(&mut self, distance: f32) -> Result<(), RenderError> {
        self.update_camera(|c| c.move_right(distance))
    }

    pub fn rotate(&mut self, yaw: f32, pitch: f32) -> Result<(), RenderError> {
        self.update_camera(|c| c.rotate(yaw, pitch))
    }

    fn update_camera(
        &mut self,
        op: impl FnOnce(&mut Camera) -> Result<(), CameraError>,
    ) -> Result<(), RenderError> {
        op(&mut self.camera)?;
        if let Some(r) = self.rasterizer.as_mut() {
            r.matrix_mode(MatrixMode::ModelView);
            r.load_matrix(&self.camera.view_matrix());
        }
        Ok(())
    }
}

impl<R: Rasterizer> ActionSink for RenderSession<R> {
    type Error = RenderError;

    fn apply(&mut self, action: Action) -> Result<(), RenderError> {
        match action {
            Action::Move {
                direction,
                distance,
            } => match direction {
                Direction::Up => self.move_forward(distance),
                Direction::Down => self.move_backward(distance),
                Direction::Left => self.move_left(distance),
                Direction::Right => self.move_right(distance),
            },
            Action::Rotate { yaw, pitch } => self.rotate(yaw, pitch),
            Action::Noop => Ok(()),
        }
    }
}

/// Snapshot of session state for logs and the CLI.
#[derive(Debug, Clone)]
pub struct SessionSummary {
    pub open: bool,
    pub width: u32,
    pub height: u32,
    pub format: Option<PixelFormat>,
    pub frames_rendered: u64,
    pub fps: f64,
    pub position: Vec3,
    pub forward: Vec3,
}

impl std::fmt::Display for SessionSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let format = match self.format {
            Some(format) => format.to_string(),
            None => "closed".to_string(),
        };
        write!(
            f,
            "Session: {}x{} {} frames={} fps={:.1} eye=({:.2}, {:.2}, {:.2}) forward=({:.2}, {:.2}, {:.2})",
            self.width,
            self.height,
            format,
            self.frames_rendered,
            self.fps,
            self.position.x,
            self.position.y,
            self.position.z,
            self.forward.x,
            self.forward.y,
            self.forward.z
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ManualClock;
    use glcanvas_input::{ControlSignal, ControlSurface};

    fn session(width: u32, height: u32, bits: u32, overlay: bool) -> (RenderSession, ManualClock) {
        let clock = ManualClock::new(0.0);
        let config = RenderConfig {
            width,
            height,
            pixel_bits: bits,
            overlay,
            ..RenderConfig::default()
        };
        let session = RenderSession::open_with_clock(config, Box::new(clock.clone())).unwrap();
        (session, clock)
    }

    fn count_565(fb: &Framebuffer, value: u32) -> usize {
        (0..fb.height())
            .flat_map(|y| (0..fb.width()).map(move |x| (x, y)))
            .filter(|&(x, y)| fb.get(x, y) == Some(value))
            .count()
    }

    #[test]
    fn open_allocates_native_buffer() {
        let s = RenderSession::open(64, 64, 16).unwrap();
        let fb = s.framebuffer().unwrap();
        assert_eq!(fb.as_bytes().len(), 64 * 64 * 2);
        assert_eq!(fb.format(), PixelFormat::Rgb565);

        let s = RenderSession::open(8, 4, 32).unwrap();
        assert_eq!(s.framebuffer().unwrap().as_bytes().len(), 8 * 4 * 4);
    }

    #[test]
    fn unsupported_bits_fail_init() {
        let err = RenderSession::open(64, 64, 24).err().unwrap();
        assert!(matches!(err, RenderError::Init(RasterError::UnsupportedFormat(24))));
    }

    #[test]
    fn zero_size_fails_init() {
        let err = RenderSession::open(0, 64, 16).err().unwrap();
        assert!(matches!(err, RenderError::Init(RasterError::InvalidSize { .. })));
    }

    #[test]
    fn thirty_frames_over_half_second() {
        let (mut s, clock) = session(32, 32, 16, false);
        for i in 1..=30 {
            clock.set(i as f64 * 500.0 / 30.0);
            assert_eq!(s.render_frame().unwrap(), FrameStatus::Rendered);
        }
        assert_eq!(s.timing().fps, 30.0);
        assert_eq!(s.timing().frame_number, 0);
        assert_eq!(s.stats().frames_rendered, 30);
    }

    #[test]
    fn frame_draws_triangle_and_restores_stacks() {
        let (mut s, _clock) = session(64, 64, 16, true);
        s.render_frame().unwrap();

        let r = s.rasterizer().unwrap();
        assert_eq!(r.matrix_depth(MatrixMode::Projection), 1);
        assert_eq!(r.matrix_depth(MatrixMode::ModelView), 1);
        assert_eq!(r.current_mode(), MatrixMode::ModelView);
        assert_eq!(
            r.current_matrix(MatrixMode::ModelView),
            s.camera().view_matrix()
        );
        // Something other than the black clear color reached the center.
        assert_ne!(s.framebuffer().unwrap().get(32, 40), Some(0));
    }

    #[test]
    fn overlay_only_when_enabled() {
        let (mut with, _c1) = session(160, 64, 16, true);
        let (mut without, _c2) = session(160, 64, 16, false);
        with.render_frame().unwrap();
        without.render_frame().unwrap();
        assert!(count_565(with.framebuffer().unwrap(), 0xFFFF) > 0);
        assert_eq!(count_565(without.framebuffer().unwrap(), 0xFFFF), 0);
    }

    #[test]
    fn closed_session_skips() {
        let (mut s, _clock) = session(16, 16, 32, false);
        s.close();
        s.close();
        assert!(!s.is_open());
        assert!(s.framebuffer().is_none());
        assert_eq!(
            s.render_frame().unwrap(),
            FrameStatus::Skipped(SkipReason::FramebufferUnavailable)
        );
    }

    #[test]
    fn camera_ops_reload_view() {
        let (mut s, _clock) = session(16, 16, 16, false);
        s.move_forward(1.0).unwrap();
        let r = s.rasterizer().unwrap();
        assert_eq!(
            r.current_matrix(MatrixMode::ModelView),
            s.camera().view_matrix()
        );
        assert!(s.camera().position().abs_diff_eq(Vec3::new(0.0, 0.0, 2.0), 1e-6));
    }

    #[test]
    fn rejected_camera_op_keeps_pose() {
        let (mut s, _clock) = session(16, 16, 16, false);
        let before = *s.camera();
        let err = s.move_left(f32::NAN).unwrap_err();
        assert!(matches!(err, RenderError::Camera(_)));
        assert_eq!(*s.camera(), before);
    }

    #[test]
    fn dpad_drives_camera() {
        let (mut s, _clock) = session(16, 16, 16, false);
        let mut pad = ControlSurface::new(0.5);
        pad.dispatch(ControlSignal::pressed(Direction::Up), &mut s).unwrap();
        pad.dispatch(ControlSignal::released(Direction::Up), &mut s).unwrap();
        pad.dispatch(ControlSignal::pressed(Direction::Right), &mut s).unwrap();
        assert!(s.camera().position().abs_diff_eq(Vec3::new(0.5, 0.0, 2.5), 1e-6));

        s.apply(Action::Rotate {
            yaw: std::f32::consts::FRAC_PI_2,
            pitch: 0.0,
        })
        .unwrap();
        assert!(s.camera().forward().abs_diff_eq(Vec3::NEG_X, 1e-6));
    }

    /// Reports the given times in order, then repeats the last one.
    struct ScriptedClock {
        times: Vec<f64>,
        next: std::cell::Cell<usize>,
    }

    impl Clock for ScriptedClock {
        fn now_ms(&self) -> f64 {
            let i = self.next.get();
            self.next.set(i + 1);
            self.times[i.min(self.times.len() - 1)]
        }
    }

    #[test]
    fn stats_survive_enormous_render_times() {
        let clock = ScriptedClock {
            // open, then a start/end pair per frame
            times: vec![0.0, 0.0, 1.0, 1.0, 1e6, 1e6, 1e12, 1e12, f64::MAX],
            next: std::cell::Cell::new(0),
        };
        let config = RenderConfig {
            width: 8,
            height: 8,
            overlay: false,
            ..RenderConfig::default()
        };
        let mut s: RenderSession =
            RenderSession::open_with_clock(config, Box::new(clock)).unwrap();
        for _ in 0..4 {
            s.render_frame().unwrap();
        }
        let stats = s.stats();
        assert_eq!(stats.frames_rendered, 4);
        assert_eq!(stats.min_render_ms, 1.0);
        assert!(stats.max_render_ms >= 1e12);
        assert!(stats.average_render_ms > 0.0);
    }

    #[test]
    fn summary_mentions_state() {
        let (mut s, _clock) = session(16, 16, 16, false);
        s.render_frame().unwrap();
        let text = s.summary().to_string();
        assert!(text.contains("16x16"));
        assert!(text.contains("frames=1"));
        s.close();
        assert!(s.summary().to_string().contains("closed"));
    }
}
