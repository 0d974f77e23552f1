// Fixed tuning constants shared by the render session, canvas bridge and hosts.

// Display
pub const DISPLAY_WIDTH: u32 = 320;
pub const DISPLAY_HEIGHT: u32 = 320;
pub const DEFAULT_PIXEL_BITS: u32 = 16;

// Projection
pub const FOV_Y_DEGREES: f32 = 45.0;
pub const Z_NEAR: f32 = 1.0;
pub const Z_FAR: f32 = 1000.0;

// Camera
pub const CAMERA_STEP: f32 = 0.1; // distance moved per d-pad press
pub const DEFAULT_EYE: [f32; 3] = [0.0, 0.0, 3.0];
pub const DEFAULT_FORWARD: [f32; 3] = [0.0, 0.0, -1.0];
pub const DEFAULT_UP: [f32; 3] = [0.0, 1.0, 0.0];

// Frame timing
pub const FPS_WINDOW_MS: f64 = 500.0; // fps recomputed once per window
pub const RENDER_TIME_HISTORY: usize = 60;

// Diagnostic overlay
pub const OVERLAY_X: i32 = 10;
pub const OVERLAY_Y: i32 = 10;
pub const OVERLAY_COLOR: u32 = 0x00FF_FFFF; // white, 0xAARRGGBB

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[allow(clippy::assertions_on_constants)]
    fn projection_planes_are_ordered() {
        assert!(Z_NEAR > 0.0);
        assert!(Z_FAR > Z_NEAR);
        assert!(FOV_Y_DEGREES > 0.0 && FOV_Y_DEGREES < 180.0);
    }

    #[test]
    fn default_pose_is_orthonormal() {
        let f = glam::Vec3::from(DEFAULT_FORWARD);
        let u = glam::Vec3::from(DEFAULT_UP);
        assert!((f.length() - 1.0).abs() < 1e-6);
        assert!((u.length() - 1.0).abs() < 1e-6);
        assert!(f.dot(u).abs() < 1e-6);
    }
}
