use glam::{Mat4, Vec3};
use glcanvas_common::config::{DEFAULT_EYE, DEFAULT_FORWARD, DEFAULT_UP};
use glcanvas_common::math::{self, MathError};

/// Errors from camera operations. A rejected operation leaves the pose
/// exactly as it was.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CameraError {
    #[error("camera {op} rejected: {source}")]
    Rejected {
        op: &'static str,
        source: MathError,
    },
}

fn reject(op: &'static str) -> impl FnOnce(MathError) -> CameraError {
    move |source| CameraError::Rejected { op, source }
}

fn finite(op: &'static str, values: &[f32]) -> Result<(), CameraError> {
    if values.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(CameraError::Rejected {
            op,
            source: MathError::NonFinite,
        })
    }
}

/// Camera pose with a cached view matrix.
///
/// `forward` and `up` are unit length and orthogonal. The view matrix is
/// recomputed whenever the pose changes and is never set directly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    position: Vec3,
    forward: Vec3,
    up: Vec3,
    view: Mat4,
}

impl Default for Camera {
    fn default() -> Self {
        let position = Vec3::from(DEFAULT_EYE);
        let forward = Vec3::from(DEFAULT_FORWARD);
        let up = Vec3::from(DEFAULT_UP);
        Self {
            position,
            forward,
            up,
            view: Mat4::look_at_rh(position, position + forward, up),
        }
    }
}

impl Camera {
    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn forward(&self) -> Vec3 {
        self.forward
    }

    pub fn up(&self) -> Vec3 {
        self.up
    }

    /// Unit vector pointing to the camera's right.
    pub fn right(&self) -> Vec3 {
        // forward and up are kept orthonormal, so this cannot collapse.
        self.forward.cross(self.up).normalize_or_zero()
    }

    pub fn view_matrix(&self) -> Mat4 {
        self.view
    }

    /// Replace the whole pose at once, or nothing if the view is degenerate.
    fn commit(
        &mut self,
        op: &'static str,
        position: Vec3,
        forward: Vec3,
        up: Vec3,
    ) -> Result<(), CameraError> {
        let view = math::look_at(position, position + forward, up).map_err(reject(op))?;
        self.position = position;
        self.forward = forward;
        self.up = up;
        self.view = view;
        Ok(())
    }

    /// Place the camera at `eye` looking at `at`. `up` only needs to be
    /// roughly upward; it is made orthogonal to the view direction.
    pub fn set(&mut self, eye: Vec3, at: Vec3, up: Vec3) -> Result<(), CameraError> {
        const OP: &str = "set";
        let forward = math::normalize(at - eye).map_err(reject(OP))?;
        let up = math::normalize(up - forward * up.dot(forward)).map_err(reject(OP))?;
        self.commit(OP, eye, forward, up)
    }

    pub fn move_forward(&mut self, distance: f32) -> Result<(), CameraError> {
        finite("move_forward", &[distance])?;
        self.translate("move_forward", self.forward * distance)
    }

    pub fn move_backward(&mut self, distance: f32) -> Result<(), CameraError> {
        finite("move_backward", &[distance])?;
        self.translate("move_backward", self.forward * -distance)
    }

    pub fn move_left(&mut self, distance: f32) -> Result<(), CameraError> {
        finite("move_left", &[distance])?;
        self.translate("move_left", self.right() * -distance)
    }

    pub fn move_right(&mut self, distance: f32) -> Result<(), CameraError> {
        finite("move_right", &[distance])?;
        self.translate("move_right", self.right() * distance)
    }

    fn translate(&mut self, op: &'static str, delta: Vec3) -> Result<(), CameraError> {
        self.commit(op, self.position + delta, self.forward, self.up)
    }

    /// Turn by `yaw` about the camera's own up axis, then by `pitch` about
    /// its (new) right axis. Radians; positive yaw turns left, positive
    /// pitch looks up.
    ///
    /// Pitch rotates `up` along with `forward`, so looking straight up or
    /// down never collapses the basis.
    pub fn rotate(&mut self, yaw: f32, pitch: f32) -> Result<(), CameraError> {
        const OP: &str = "rotate";
        finite(OP, &[yaw, pitch])?;

        let yaw_rot = math::axis_rotation(self.up, yaw).map_err(reject(OP))?;
        let forward = yaw_rot.transform_vector3(self.forward);
        let right = math::normalize(forward.cross(self.up)).map_err(reject(OP))?;

        let pitch_rot = math::axis_rotation(right, pitch).map_err(reject(OP))?;
        let forward = math::normalize(pitch_rot.transform_vector3(forward)).map_err(reject(OP))?;
        let up = pitch_rot.transform_vector3(self.up);

        // Re-orthonormalize to stop drift over long rotation sequences.
        let right = math::normalize(forward.cross(up)).map_err(reject(OP))?;
        let up = math::normalize(right.cross(forward)).map_err(reject(OP))?;

        self.commit(OP, self.position, forward, up)
    }
}
