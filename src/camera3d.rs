use glam::{Mat4, Quat, Vec2, Vec3, Vec4};
use winit::dpi::PhysicalSize;

pub const DEFAULT_FOV_RADIANS: f32 = 60.0_f32.to_radians();
pub const DEFAULT_NEAR: f32 = 0.1;
pub const DEFAULT_FAR: f32 = 1000.0;

/// Perspective camera with a free orientation. Aspect is stored on the camera
/// because the edit and export views render at independent resolutions.
#[derive(Debug, Clone)]
pub struct Camera3D {
    pub position: Vec3,
    pub rotation: Quat,
    pub fov_y_radians: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera3D {
    pub fn new(position: Vec3, rotation: Quat, fov_y_radians: f32, aspect: f32) -> Self {
        Self { position, rotation, fov_y_radians, aspect: aspect.max(0.0001), near: DEFAULT_NEAR, far: DEFAULT_FAR }
    }

    pub fn looking_at(position: Vec3, target: Vec3, fov_y_radians: f32, aspect: f32) -> Self {
        let view = Mat4::look_at_rh(position, target, Vec3::Y);
        let rotation = Quat::from_mat4(&view.inverse());
        Self::new(position, rotation, fov_y_radians, aspect)
    }

    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }

    pub fn right(&self) -> Vec3 {
        self.rotation * Vec3::X
    }

    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.rotation, self.position).inverse()
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh_gl(self.fov_y_radians, self.aspect.max(0.0001), self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    pub fn set_aspect(&mut self, aspect: f32) {
        self.aspect = aspect.max(0.0001);
    }

    pub fn set_aspect_from_viewport(&mut self, viewport: PhysicalSize<u32>) {
        if viewport.height > 0 {
            self.set_aspect(viewport.width as f32 / viewport.height as f32);
        }
    }

    /// Generates a world-space ray originating at the camera through a
    /// screen-space position inside the given viewport.
    pub fn screen_ray(&self, screen: Vec2, viewport: PhysicalSize<u32>) -> Option<(Vec3, Vec3)> {
        if viewport.width == 0 || viewport.height == 0 {
            return None;
        }
        let ndc_x = (2.0 * screen.x / viewport.width as f32) - 1.0;
        let ndc_y = 1.0 - (2.0 * screen.y / viewport.height as f32);
        let clip = Vec4::new(ndc_x, ndc_y, 1.0, 1.0);
        let inv_view_proj = self.view_projection().inverse();
        let world = inv_view_proj * clip;
        if world.w.abs() < f32::EPSILON {
            return None;
        }
        let to_point = (world.truncate() / world.w) - self.position;
        let dir = to_point.normalize_or_zero();
        if dir.length_squared() <= f32::EPSILON {
            return None;
        }
        Some((self.position, dir))
    }
}
