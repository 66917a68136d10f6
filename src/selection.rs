use crate::camera3d::Camera3D;
use crate::picking::ray_sphere_intersection;
use crate::scene::{NodeId, NodeKind, SceneGraph};
use glam::{Vec2, Vec3};
use smallvec::SmallVec;
use thiserror::Error;
use winit::dpi::PhysicalSize;

pub const BONE_PICK_RADIUS: f32 = 0.06;

/// Bones whose lowercase name contains one of these never get pick targets.
/// End bones and face micro-bones only add noise to FK posing.
const BONE_NAME_DENYLIST: [&str; 4] = ["_end", "eye", "jaw", "twist"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InteractionMode {
    #[default]
    None,
    Transform,
    ForwardKinematics,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HandleMode {
    #[default]
    Translate,
    Rotate,
    Scale,
}

/// Manipulation handle attached to the current selection target. In FK the
/// handle is pinned to a bone and rotate-only.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformHandle {
    pub target: NodeId,
    pub mode: HandleMode,
    pub rotate_only: bool,
}

/// World-space pick sphere for one FK-posable bone.
#[derive(Debug, Clone, Copy)]
pub struct BonePickTarget {
    pub bone: NodeId,
    pub center: Vec3,
    pub radius: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FkModeError {
    #[error("Forward kinematics needs exactly one selected node")]
    EmptySelection,
    #[error("Forward kinematics requires a character selection")]
    NotACharacter,
}

/// Owns the selection set, the active interaction mode, and the FK bone
/// targets. Node references are slotmap keys, so a deleted node simply
/// stops resolving instead of pointing at recycled storage.
#[derive(Default)]
pub struct SelectionController {
    selected: Option<NodeId>,
    mode: InteractionMode,
    handle: Option<TransformHandle>,
    handle_mode: HandleMode,
    bone_targets: SmallVec<[BonePickTarget; 32]>,
}

impl SelectionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected(&self) -> Option<NodeId> {
        self.selected
    }

    pub fn mode(&self) -> InteractionMode {
        self.mode
    }

    pub fn handle(&self) -> Option<&TransformHandle> {
        self.handle.as_ref()
    }

    pub fn bone_targets(&self) -> &[BonePickTarget] {
        &self.bone_targets
    }

    pub fn set_handle_mode(&mut self, mode: HandleMode) {
        self.handle_mode = mode;
        if let Some(handle) = &mut self.handle {
            if !handle.rotate_only {
                handle.mode = mode;
            }
        }
    }

    /// Resolves a pointer click against the scene. In FK mode the click is
    /// tested against the bone pick spheres first; anywhere else it picks a
    /// node and promotes the hit to its top-level ancestor.
    pub fn pick_at(
        &mut self,
        scene: &SceneGraph,
        camera: &Camera3D,
        screen: Vec2,
        viewport: PhysicalSize<u32>,
    ) -> Option<NodeId> {
        let (origin, dir) = camera.screen_ray(screen, viewport)?;

        if self.mode == InteractionMode::ForwardKinematics {
            if let Some(bone) = self.pick_bone(origin, dir) {
                self.handle = Some(TransformHandle { target: bone, mode: HandleMode::Rotate, rotate_only: true });
                return Some(bone);
            }
            // A miss in FK keeps the mode; posing often clicks past a limb.
            return None;
        }

        match scene.pick(origin, dir) {
            Some(hit) => {
                let root = scene.top_level_ancestor(hit.node)?;
                self.select(scene, root);
                Some(root)
            }
            None => {
                self.deselect();
                None
            }
        }
    }

    fn pick_bone(&self, origin: Vec3, dir: Vec3) -> Option<NodeId> {
        let mut best: Option<(NodeId, f32)> = None;
        for target in &self.bone_targets {
            if let Some(t) = ray_sphere_intersection(origin, dir, target.center, target.radius) {
                if best.map_or(true, |(_, bt)| t < bt) {
                    best = Some((target.bone, t));
                }
            }
        }
        best.map(|(bone, _)| bone)
    }

    pub fn select(&mut self, scene: &SceneGraph, node: NodeId) {
        if !scene.contains(node) {
            return;
        }
        self.exit_fk();
        self.selected = Some(node);
        self.mode = InteractionMode::Transform;
        self.handle = Some(TransformHandle { target: node, mode: self.handle_mode, rotate_only: false });
    }

    pub fn deselect(&mut self) {
        self.exit_fk();
        self.selected = None;
        self.mode = InteractionMode::None;
        self.handle = None;
    }

    /// Toggles the FK sub-mode. Entry requires the selection to be exactly
    /// one character node; leaving disposes every bone target and restores
    /// the plain transform handle.
    pub fn toggle_fk(&mut self, scene: &SceneGraph) -> Result<InteractionMode, FkModeError> {
        if self.mode == InteractionMode::ForwardKinematics {
            let selected = self.selected;
            self.exit_fk();
            self.mode = if selected.is_some() { InteractionMode::Transform } else { InteractionMode::None };
            if let Some(node) = selected {
                self.handle = Some(TransformHandle { target: node, mode: self.handle_mode, rotate_only: false });
            }
            return Ok(self.mode);
        }

        let selected = self.selected.ok_or(FkModeError::EmptySelection)?;
        let node = scene.get(selected).ok_or(FkModeError::EmptySelection)?;
        if node.kind != NodeKind::Character {
            return Err(FkModeError::NotACharacter);
        }

        self.bone_targets = collect_bone_targets(scene, selected);
        self.mode = InteractionMode::ForwardKinematics;
        self.handle = None;
        Ok(self.mode)
    }

    fn exit_fk(&mut self) {
        self.bone_targets.clear();
        if self.mode == InteractionMode::ForwardKinematics {
            self.mode = InteractionMode::None;
            self.handle = None;
        }
    }

    /// Refreshes bone sphere centers after posing moved the skeleton.
    pub fn refresh_bone_targets(&mut self, scene: &SceneGraph) {
        if self.mode != InteractionMode::ForwardKinematics {
            return;
        }
        if let Some(selected) = self.selected {
            self.bone_targets = collect_bone_targets(scene, selected);
        }
    }

    /// Drops any reference to a node that just left the scene. Exits FK if
    /// the posed character itself went away.
    pub fn handle_node_removed(&mut self, scene: &SceneGraph) {
        if let Some(selected) = self.selected {
            if !scene.contains(selected) {
                self.deselect();
                return;
            }
        }
        if let Some(handle) = self.handle {
            if !scene.contains(handle.target) {
                self.handle = None;
            }
        }
        self.bone_targets.retain(|t| scene.contains(t.bone));
    }

    /// Recording renders must not show selection chrome. Drops everything.
    pub fn clear_for_recording(&mut self) {
        self.deselect();
    }
}

fn collect_bone_targets(scene: &SceneGraph, character: NodeId) -> SmallVec<[BonePickTarget; 32]> {
    let mut targets = SmallVec::new();
    for bone in scene.bones_of(character) {
        let Some(node) = scene.get(bone) else {
            continue;
        };
        if bone_name_denied(&node.name) {
            continue;
        }
        let Some(world) = scene.world_transform(bone) else {
            continue;
        };
        targets.push(BonePickTarget {
            bone,
            center: world.transform_point3(Vec3::ZERO),
            radius: BONE_PICK_RADIUS,
        });
    }
    targets
}

fn bone_name_denied(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    BONE_NAME_DENYLIST.iter().any(|denied| lower.contains(denied))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{NodeTransform, SceneNode};

    fn character_scene() -> (SceneGraph, NodeId) {
        let mut scene = SceneGraph::new();
        let character = scene.spawn(SceneNode::character("hero"));
        let hips = scene.spawn_child(character, SceneNode::bone("hips")).unwrap();
        scene.spawn_child(hips, SceneNode::bone("spine"));
        scene.spawn_child(hips, SceneNode::bone("leg_twist"));
        scene.spawn_child(hips, SceneNode::bone("toes_end")).unwrap();
        scene.spawn_child(character, SceneNode::bone("EyeLeft"));
        (scene, character)
    }

    #[test]
    fn fk_requires_a_selection() {
        let (scene, _) = character_scene();
        let mut controller = SelectionController::new();
        assert_eq!(controller.toggle_fk(&scene), Err(FkModeError::EmptySelection));
    }

    #[test]
    fn fk_rejects_non_character_selection() {
        let mut scene = SceneGraph::new();
        let mesh = scene.spawn(SceneNode::mesh("crate"));
        let mut controller = SelectionController::new();
        controller.select(&scene, mesh);
        assert_eq!(controller.toggle_fk(&scene), Err(FkModeError::NotACharacter));
        assert_eq!(controller.mode(), InteractionMode::Transform);
    }

    #[test]
    fn fk_builds_targets_for_allowed_bones_only() {
        let (scene, character) = character_scene();
        let mut controller = SelectionController::new();
        controller.select(&scene, character);
        controller.toggle_fk(&scene).unwrap();
        assert_eq!(controller.mode(), InteractionMode::ForwardKinematics);
        // hips + spine; leg_twist, toes_end and EyeLeft are denylisted.
        assert_eq!(controller.bone_targets().len(), 2);
        assert!(controller.handle().is_none());
    }

    #[test]
    fn leaving_fk_disposes_targets_and_restores_handle() {
        let (scene, character) = character_scene();
        let mut controller = SelectionController::new();
        controller.select(&scene, character);
        controller.toggle_fk(&scene).unwrap();
        controller.toggle_fk(&scene).unwrap();
        assert_eq!(controller.mode(), InteractionMode::Transform);
        assert!(controller.bone_targets().is_empty());
        let handle = controller.handle().unwrap();
        assert_eq!(handle.target, character);
        assert!(!handle.rotate_only);
    }

    #[test]
    fn deleting_the_posed_character_exits_fk() {
        let (mut scene, character) = character_scene();
        let mut controller = SelectionController::new();
        controller.select(&scene, character);
        controller.toggle_fk(&scene).unwrap();
        scene.remove(character);
        controller.handle_node_removed(&scene);
        assert_eq!(controller.mode(), InteractionMode::None);
        assert!(controller.selected().is_none());
        assert!(controller.bone_targets().is_empty());
    }

    #[test]
    fn pick_promotes_to_top_level_ancestor() {
        let mut scene = SceneGraph::new();
        let root = scene.spawn(
            SceneNode::character("hero")
                .with_transform(NodeTransform::from_translation(glam::Vec3::new(0.0, 0.0, -5.0))),
        );
        scene.spawn_child(root, SceneNode::mesh("torso"));
        let camera = Camera3D::looking_at(
            glam::Vec3::ZERO,
            glam::Vec3::new(0.0, 0.0, -5.0),
            crate::camera3d::DEFAULT_FOV_RADIANS,
            16.0 / 9.0,
        );
        let mut controller = SelectionController::new();
        let viewport = PhysicalSize::new(1280, 720);
        let picked = controller.pick_at(&scene, &camera, Vec2::new(640.0, 360.0), viewport);
        assert_eq!(picked, Some(root));
        assert_eq!(controller.mode(), InteractionMode::Transform);
    }

    #[test]
    fn fk_bone_click_attaches_rotate_only_handle() {
        let (scene, character) = character_scene();
        let mut controller = SelectionController::new();
        controller.select(&scene, character);
        controller.toggle_fk(&scene).unwrap();
        // All bones sit at the origin; aim straight at them.
        let camera = Camera3D::looking_at(
            glam::Vec3::new(0.0, 0.0, 2.0),
            glam::Vec3::ZERO,
            crate::camera3d::DEFAULT_FOV_RADIANS,
            1.0,
        );
        let viewport = PhysicalSize::new(512, 512);
        let picked = controller.pick_at(&scene, &camera, Vec2::new(256.0, 256.0), viewport);
        assert!(picked.is_some());
        let handle = controller.handle().unwrap();
        assert!(handle.rotate_only);
        assert_eq!(handle.mode, HandleMode::Rotate);
    }

    #[test]
    fn clear_for_recording_drops_everything() {
        let (scene, character) = character_scene();
        let mut controller = SelectionController::new();
        controller.select(&scene, character);
        controller.toggle_fk(&scene).unwrap();
        controller.clear_for_recording();
        assert_eq!(controller.mode(), InteractionMode::None);
        assert!(controller.selected().is_none());
        assert!(controller.handle().is_none());
        assert!(controller.bone_targets().is_empty());
    }
}
