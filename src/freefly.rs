use crate::camera3d::Camera3D;
use glam::{Quat, Vec2, Vec3};

pub const BASE_MOVE_SPEED: f32 = 0.75;
pub const FAST_MOVE_MULTIPLIER: f32 = 3.0;
pub const SLOW_MOVE_MULTIPLIER: f32 = 0.1;
const VELOCITY_SMOOTHING: f32 = 0.2;
const ROLL_SPEED: f32 = std::f32::consts::PI / 24.0;
const PITCH_LIMIT: f32 = std::f32::consts::FRAC_PI_2 - 0.01;

/// Which translation axis a movement key drives, in camera space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveAxis {
    Forward,
    Backward,
    Left,
    Right,
    Up,
    Down,
    RollLeft,
    RollRight,
}

#[derive(Debug, Clone, Copy, Default)]
struct MoveState {
    forward: bool,
    backward: bool,
    left: bool,
    right: bool,
    up: bool,
    down: bool,
    roll_left: bool,
    roll_right: bool,
}

/// Free-fly camera controller. Raw key state is turned into a target velocity
/// each update; the applied velocity chases the target through a fixed lerp
/// factor so starts and stops ease in rather than snapping.
pub struct FreeFlyController {
    keys: MoveState,
    velocity: Vec3,
    roll_velocity: f32,
    pub movement_speed: f32,
}

impl FreeFlyController {
    pub fn new() -> Self {
        Self { keys: MoveState::default(), velocity: Vec3::ZERO, roll_velocity: 0.0, movement_speed: BASE_MOVE_SPEED }
    }

    pub fn set_axis(&mut self, axis: MoveAxis, active: bool) {
        match axis {
            MoveAxis::Forward => self.keys.forward = active,
            MoveAxis::Backward => self.keys.backward = active,
            MoveAxis::Left => self.keys.left = active,
            MoveAxis::Right => self.keys.right = active,
            MoveAxis::Up => self.keys.up = active,
            MoveAxis::Down => self.keys.down = active,
            MoveAxis::RollLeft => self.keys.roll_left = active,
            MoveAxis::RollRight => self.keys.roll_right = active,
        }
    }

    pub fn set_speed_multiplier(&mut self, fast: bool, slow: bool) {
        self.movement_speed = if fast {
            BASE_MOVE_SPEED * FAST_MOVE_MULTIPLIER
        } else if slow {
            BASE_MOVE_SPEED * SLOW_MOVE_MULTIPLIER
        } else {
            BASE_MOVE_SPEED
        };
    }

    /// Rotates the camera from a pointer drag, in radians per axis.
    /// Pitch is clamped short of the poles to keep the view matrix stable.
    pub fn apply_look(&self, camera: &mut Camera3D, delta: Vec2) {
        let (yaw, pitch, roll) = camera.rotation.to_euler(glam::EulerRot::YXZ);
        let yaw = yaw - delta.x;
        let pitch = (pitch - delta.y).clamp(-PITCH_LIMIT, PITCH_LIMIT);
        camera.rotation = Quat::from_euler(glam::EulerRot::YXZ, yaw, pitch, roll);
    }

    pub fn apply_pan(&self, camera: &mut Camera3D, delta: Vec2) {
        let offset = camera.right() * -delta.x + camera.up() * delta.y;
        camera.position += offset * self.movement_speed;
    }

    pub fn apply_zoom(&self, camera: &mut Camera3D, amount: f32) {
        camera.position += camera.forward() * amount * self.movement_speed;
    }

    pub fn update(&mut self, camera: &mut Camera3D, dt: f32) {
        let mut wish = Vec3::ZERO;
        if self.keys.forward {
            wish += camera.forward();
        }
        if self.keys.backward {
            wish -= camera.forward();
        }
        if self.keys.right {
            wish += camera.right();
        }
        if self.keys.left {
            wish -= camera.right();
        }
        if self.keys.up {
            wish += camera.up();
        }
        if self.keys.down {
            wish -= camera.up();
        }
        let target = wish.normalize_or_zero() * self.movement_speed;
        self.velocity = self.velocity.lerp(target, VELOCITY_SMOOTHING);
        camera.position += self.velocity * dt;

        let roll_target = match (self.keys.roll_left, self.keys.roll_right) {
            (true, false) => ROLL_SPEED,
            (false, true) => -ROLL_SPEED,
            _ => 0.0,
        };
        self.roll_velocity += (roll_target - self.roll_velocity) * VELOCITY_SMOOTHING;
        if self.roll_velocity.abs() > 1e-5 {
            camera.rotation = camera.rotation * Quat::from_rotation_z(self.roll_velocity * dt);
        }
    }

    /// Drops all key state and residual velocity, e.g. when the viewport
    /// loses focus or playback takes over the camera.
    pub fn reset(&mut self) {
        self.keys = MoveState::default();
        self.velocity = Vec3::ZERO;
        self.roll_velocity = 0.0;
        self.movement_speed = BASE_MOVE_SPEED;
    }

    pub fn is_stationary(&self) -> bool {
        self.velocity.length_squared() < 1e-8 && self.roll_velocity.abs() < 1e-5
    }
}

impl Default for FreeFlyController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera3d::DEFAULT_FOV_RADIANS;

    fn test_camera() -> Camera3D {
        Camera3D::new(Vec3::ZERO, Quat::IDENTITY, DEFAULT_FOV_RADIANS, 16.0 / 9.0)
    }

    #[test]
    fn velocity_eases_toward_target() {
        let mut controller = FreeFlyController::new();
        let mut camera = test_camera();
        controller.set_axis(MoveAxis::Forward, true);
        controller.update(&mut camera, 1.0 / 60.0);
        let first = controller.velocity.length();
        controller.update(&mut camera, 1.0 / 60.0);
        let second = controller.velocity.length();
        assert!(first > 0.0);
        assert!(second > first, "velocity should keep ramping: {first} vs {second}");
        assert!(second < BASE_MOVE_SPEED, "velocity must not overshoot the target speed");
    }

    #[test]
    fn releasing_keys_decays_motion() {
        let mut controller = FreeFlyController::new();
        let mut camera = test_camera();
        controller.set_axis(MoveAxis::Forward, true);
        for _ in 0..120 {
            controller.update(&mut camera, 1.0 / 60.0);
        }
        controller.set_axis(MoveAxis::Forward, false);
        for _ in 0..200 {
            controller.update(&mut camera, 1.0 / 60.0);
        }
        assert!(controller.is_stationary());
    }

    #[test]
    fn speed_multipliers_scale_movement() {
        let mut controller = FreeFlyController::new();
        controller.set_speed_multiplier(true, false);
        assert_eq!(controller.movement_speed, BASE_MOVE_SPEED * FAST_MOVE_MULTIPLIER);
        controller.set_speed_multiplier(false, true);
        assert_eq!(controller.movement_speed, BASE_MOVE_SPEED * SLOW_MOVE_MULTIPLIER);
        controller.set_speed_multiplier(false, false);
        assert_eq!(controller.movement_speed, BASE_MOVE_SPEED);
    }

    #[test]
    fn forward_key_moves_along_view_direction() {
        let mut controller = FreeFlyController::new();
        let mut camera = test_camera();
        controller.set_axis(MoveAxis::Forward, true);
        for _ in 0..60 {
            controller.update(&mut camera, 1.0 / 60.0);
        }
        assert!(camera.position.z < -0.05, "camera should have advanced along -Z: {:?}", camera.position);
        assert!(camera.position.x.abs() < 1e-4);
    }

    #[test]
    fn pitch_stays_clamped_under_extreme_drag() {
        let controller = FreeFlyController::new();
        let mut camera = test_camera();
        for _ in 0..100 {
            controller.apply_look(&mut camera, Vec2::new(0.0, -1.0));
        }
        let (_, pitch, _) = camera.rotation.to_euler(glam::EulerRot::YXZ);
        assert!(pitch <= PITCH_LIMIT + 1e-4);
    }
}
