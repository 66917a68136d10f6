use crate::camera3d::{Camera3D, DEFAULT_FOV_RADIANS};
use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use winit::dpi::PhysicalSize;

/// Output aspect of the export camera. Each variant maps to a fixed
/// render resolution preset; the edit camera is never constrained by it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AspectRatio {
    #[default]
    Horizontal16x9,
    Vertical9x16,
    Square1x1,
}

impl AspectRatio {
    pub fn ratio(self) -> f32 {
        match self {
            AspectRatio::Horizontal16x9 => 16.0 / 9.0,
            AspectRatio::Vertical9x16 => 9.0 / 16.0,
            AspectRatio::Square1x1 => 1.0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AspectRatio::Horizontal16x9 => "16:9",
            AspectRatio::Vertical9x16 => "9:16",
            AspectRatio::Square1x1 => "1:1",
        }
    }
}

/// Whether the edit view is glued to the export framing or roams free.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CameraMode {
    #[default]
    PersonLocked,
    FreeFly,
}

/// Two cameras over one scene: the edit camera renders the interactive
/// viewport, the export camera renders recorded frames at the selected
/// output aspect. During playback the rig node in the scene graph is the
/// source of truth and the export camera copies it one way each tick.
pub struct DualCameraRig {
    pub edit_camera: Camera3D,
    pub export_camera: Camera3D,
    pub mode: CameraMode,
    aspect_ratio: AspectRatio,
}

impl DualCameraRig {
    pub fn new(viewport: PhysicalSize<u32>, aspect_ratio: AspectRatio) -> Self {
        let mut edit_camera =
            Camera3D::looking_at(Vec3::new(0.0, 1.6, 4.0), Vec3::new(0.0, 1.0, 0.0), DEFAULT_FOV_RADIANS, 1.0);
        edit_camera.set_aspect_from_viewport(viewport);
        let export_camera = Camera3D::new(
            edit_camera.position,
            edit_camera.rotation,
            DEFAULT_FOV_RADIANS,
            aspect_ratio.ratio(),
        );
        Self { edit_camera, export_camera, mode: CameraMode::PersonLocked, aspect_ratio }
    }

    pub fn aspect_ratio(&self) -> AspectRatio {
        self.aspect_ratio
    }

    /// Changes the output aspect. Only the export camera is affected; the
    /// edit camera keeps tracking the live viewport.
    pub fn set_aspect_ratio(&mut self, ratio: AspectRatio) {
        self.aspect_ratio = ratio;
        self.export_camera.set_aspect(ratio.ratio());
    }

    pub fn resize_viewport(&mut self, viewport: PhysicalSize<u32>) {
        self.edit_camera.set_aspect_from_viewport(viewport);
    }

    /// One-way sync from the scene rig node to the export camera. Runs every
    /// tick so scrubbing or animating the rig node always lands on the
    /// recorded framing.
    pub fn sync_export_to_rig(&mut self, translation: Vec3, rotation: Quat) {
        self.export_camera.position = translation;
        self.export_camera.rotation = rotation;
    }

    /// Snaps the edit camera onto the rig node framing, used when entering
    /// person-locked mode or after a scrub jump while not playing.
    pub fn snap_edit_to_rig(&mut self, translation: Vec3, rotation: Quat) {
        self.edit_camera.position = translation;
        self.edit_camera.rotation = rotation;
    }

    pub fn toggle_mode(&mut self) -> CameraMode {
        self.mode = match self.mode {
            CameraMode::PersonLocked => CameraMode::FreeFly,
            CameraMode::FreeFly => CameraMode::PersonLocked,
        };
        self.mode
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aspect_change_leaves_edit_camera_alone() {
        let mut rig = DualCameraRig::new(PhysicalSize::new(1600, 900), AspectRatio::Horizontal16x9);
        let edit_aspect = rig.edit_camera.aspect;
        rig.set_aspect_ratio(AspectRatio::Vertical9x16);
        assert_eq!(rig.edit_camera.aspect, edit_aspect);
        assert!((rig.export_camera.aspect - 9.0 / 16.0).abs() < 1e-6);
    }

    #[test]
    fn viewport_resize_leaves_export_camera_alone() {
        let mut rig = DualCameraRig::new(PhysicalSize::new(1280, 720), AspectRatio::Square1x1);
        rig.resize_viewport(PhysicalSize::new(640, 640));
        assert!((rig.export_camera.aspect - 1.0).abs() < 1e-6);
        assert!((rig.edit_camera.aspect - 1.0).abs() < 1e-6);
    }

    #[test]
    fn rig_sync_is_one_way() {
        let mut rig = DualCameraRig::new(PhysicalSize::new(1280, 720), AspectRatio::Horizontal16x9);
        let edit_before = rig.edit_camera.position;
        rig.sync_export_to_rig(Vec3::new(3.0, 2.0, 1.0), Quat::from_rotation_y(0.5));
        assert_eq!(rig.export_camera.position, Vec3::new(3.0, 2.0, 1.0));
        assert_eq!(rig.edit_camera.position, edit_before);
    }

    #[test]
    fn mode_toggles_round_trip() {
        let mut rig = DualCameraRig::new(PhysicalSize::new(1280, 720), AspectRatio::Horizontal16x9);
        assert_eq!(rig.mode, CameraMode::PersonLocked);
        assert_eq!(rig.toggle_mode(), CameraMode::FreeFly);
        assert_eq!(rig.toggle_mode(), CameraMode::PersonLocked);
    }
}
