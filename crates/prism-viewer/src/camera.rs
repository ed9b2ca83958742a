use glam::{Mat4, Vec3};

use prism_engine::input::{InputState, Key};

use crate::config::CameraConfig;

/// Movement intent for one frame, each axis in `[-1, 1]`.
#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct Movement {
    /// +1 along the view direction.
    pub forward: f32,
    /// +1 toward the camera's right.
    pub right: f32,
    /// +1 along world up.
    pub up: f32,
}

impl Movement {
    /// W/S forward and back, A/D strafe, E/Q rise and sink.
    pub fn from_input(input: &InputState) -> Self {
        let axis = |pos: Key, neg: Key| {
            (input.key_down(pos) as i8 - input.key_down(neg) as i8) as f32
        };
        Self {
            forward: axis(Key::W, Key::S),
            right: axis(Key::D, Key::A),
            up: axis(Key::E, Key::Q),
        }
    }

    pub fn is_idle(&self) -> bool {
        *self == Self::default()
    }
}

/// Free-fly camera driven by yaw/pitch mouse look.
///
/// Yaw rotates around world up; -90° looks down -Z. Pitch is clamped so the
/// view direction never becomes parallel to up.
#[derive(Debug, Clone)]
pub struct FlyCamera {
    position: Vec3,
    front: Vec3,
    yaw_deg: f32,
    pitch_deg: f32,
    speed: f32,
    settings: CameraConfig,
}

const WORLD_UP: Vec3 = Vec3::Y;

impl FlyCamera {
    pub fn new(settings: &CameraConfig) -> Self {
        let pitch_deg = settings
            .pitch_deg
            .clamp(-settings.pitch_limit_deg, settings.pitch_limit_deg);
        let mut camera = Self {
            position: Vec3::from_array(settings.position),
            front: Vec3::NEG_Z,
            yaw_deg: settings.yaw_deg,
            pitch_deg,
            speed: settings.speed.clamp(settings.min_speed, settings.max_speed),
            settings: settings.clone(),
        };
        camera.update_front();
        camera
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Unit view direction.
    pub fn front(&self) -> Vec3 {
        self.front
    }

    #[cfg(test)]
    pub fn yaw_deg(&self) -> f32 {
        self.yaw_deg
    }

    #[cfg(test)]
    pub fn pitch_deg(&self) -> f32 {
        self.pitch_deg
    }

    #[cfg(test)]
    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Unit vector toward the camera's right, perpendicular to world up.
    pub fn right(&self) -> Vec3 {
        self.front.cross(WORLD_UP).normalize()
    }

    /// Applies raw mouse motion. `dy` is positive downward, so moving the
    /// mouse up pitches the view up.
    pub fn apply_mouse(&mut self, dx: f32, dy: f32) {
        let limit = self.settings.pitch_limit_deg;
        self.yaw_deg += dx * self.settings.yaw_sensitivity;
        self.pitch_deg = (self.pitch_deg - dy * self.settings.pitch_sensitivity).clamp(-limit, limit);
        self.update_front();
    }

    /// Wheel up (positive lines) slows the camera down.
    pub fn apply_scroll(&mut self, lines: f32) {
        if lines == 0.0 {
            return;
        }
        self.speed = (self.speed - lines).clamp(self.settings.min_speed, self.settings.max_speed);
    }

    pub fn apply_movement(&mut self, movement: Movement, dt: f32) {
        if movement.is_idle() {
            return;
        }
        let step = self.speed * dt;
        self.position += self.front * (movement.forward * step);
        self.position += self.right() * (movement.right * step);
        self.position += WORLD_UP * (movement.up * step);
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.position + self.front, WORLD_UP)
    }

    /// Right-handed perspective with a 0..1 depth range.
    pub fn projection(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(
            self.settings.fov_deg.to_radians(),
            aspect,
            self.settings.near,
            self.settings.far,
        )
    }

    fn update_front(&mut self) {
        let (yaw, pitch) = (self.yaw_deg.to_radians(), self.pitch_deg.to_radians());
        self.front = Vec3::new(yaw.cos() * pitch.cos(), pitch.sin(), yaw.sin() * pitch.cos()).normalize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ViewerConfig;

    fn camera() -> FlyCamera {
        FlyCamera::new(&ViewerConfig::default().camera)
    }

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-5
    }

    // ── orientation ──────────────────────────────────────────────────────

    #[test]
    fn starts_looking_down_negative_z() {
        let cam = camera();
        assert!(approx(cam.front(), Vec3::NEG_Z));
        assert!(approx(cam.right(), Vec3::X));
        assert_eq!(cam.position(), Vec3::new(0.0, 0.0, 3.0));
    }

    #[test]
    fn mouse_right_turns_right() {
        let mut cam = camera();
        cam.apply_mouse(90.0, 0.0);
        assert!((cam.yaw_deg() - 0.0).abs() < 1e-5);
        assert!(approx(cam.front(), Vec3::X));
    }

    #[test]
    fn mouse_up_pitches_up_with_reduced_sensitivity() {
        let mut cam = camera();
        cam.apply_mouse(0.0, -10.0);
        assert!((cam.pitch_deg() - 4.0).abs() < 1e-5);
        assert!(cam.front().y > 0.0);
    }

    #[test]
    fn pitch_is_clamped() {
        let mut cam = camera();
        cam.apply_mouse(0.0, -10_000.0);
        assert_eq!(cam.pitch_deg(), 89.0);
        cam.apply_mouse(0.0, 10_000.0);
        assert_eq!(cam.pitch_deg(), -89.0);
        assert!((cam.front().length() - 1.0).abs() < 1e-5);
    }

    // ── speed ────────────────────────────────────────────────────────────

    #[test]
    fn scroll_down_speeds_up_within_bounds() {
        let mut cam = camera();
        cam.apply_scroll(-3.0);
        assert_eq!(cam.speed(), 4.0);
        cam.apply_scroll(-100.0);
        assert_eq!(cam.speed(), 7.0);
        cam.apply_scroll(100.0);
        assert_eq!(cam.speed(), 1.0);
    }

    // ── movement ─────────────────────────────────────────────────────────

    #[test]
    fn forward_moves_along_front_scaled_by_dt() {
        let mut cam = camera();
        cam.apply_movement(Movement { forward: 1.0, ..Movement::default() }, 0.5);
        assert!(approx(cam.position(), Vec3::new(0.0, 0.0, 2.5)));
    }

    #[test]
    fn strafe_and_rise_use_right_and_world_up() {
        let mut cam = camera();
        cam.apply_scroll(-1.0);
        cam.apply_movement(Movement { forward: 0.0, right: -1.0, up: 1.0 }, 1.0);
        assert!(approx(cam.position(), Vec3::new(-2.0, 2.0, 3.0)));
    }

    #[test]
    fn opposing_keys_cancel() {
        let mut input = InputState::default();
        input.keys_down.insert(Key::W);
        input.keys_down.insert(Key::S);
        input.keys_down.insert(Key::D);
        let m = Movement::from_input(&input);
        assert_eq!(m, Movement { forward: 0.0, right: 1.0, up: 0.0 });
    }

    // ── matrices ─────────────────────────────────────────────────────────

    #[test]
    fn view_maps_target_onto_negative_z_axis() {
        let cam = camera();
        let p = cam.view().transform_point3(Vec3::ZERO);
        assert!(approx(p, Vec3::new(0.0, 0.0, -3.0)));
    }

    #[test]
    fn projection_maps_near_plane_to_depth_zero() {
        let cam = camera();
        let clip = cam.projection(800.0 / 600.0) * glam::Vec4::new(0.0, 0.0, -0.1, 1.0);
        assert!((clip.z / clip.w).abs() < 1e-5);
    }
}
