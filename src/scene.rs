use crate::picking::{ray_hit_world_obb, NodeBounds};
use glam::{Mat4, Quat, Vec3};
use slotmap::{new_key_type, SlotMap};

/// Name of the singleton rig node the export camera follows.
pub const RIG_NODE_NAME: &str = "camera_rig";

new_key_type! {
    pub struct NodeId;
}

/// Closed set of node roles. Behavior that used to hang off ad-hoc string
/// tags (pickability, checksum participation, FK eligibility) dispatches on
/// this enum instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Mesh,
    Character,
    Bone,
    CameraRig,
    Light,
    Helper,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeTransform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl NodeTransform {
    pub fn identity() -> Self {
        Self { translation: Vec3::ZERO, rotation: Quat::IDENTITY, scale: Vec3::ONE }
    }

    pub fn from_translation(translation: Vec3) -> Self {
        Self { translation, ..Self::identity() }
    }

    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

impl Default for NodeTransform {
    fn default() -> Self {
        Self::identity()
    }
}

#[derive(Debug, Clone)]
pub struct SceneNode {
    pub name: String,
    pub kind: NodeKind,
    pub transform: NodeTransform,
    pub bounds: NodeBounds,
    pub visible: bool,
    /// Transient editor-only helper (gizmo geometry, guides). Hot nodes are
    /// hidden during recording and excluded from the scene checksum.
    pub hot: bool,
    pub locked: bool,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

impl SceneNode {
    fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            transform: NodeTransform::identity(),
            bounds: NodeBounds::unit(),
            visible: true,
            hot: false,
            locked: false,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn mesh(name: impl Into<String>) -> Self {
        Self::new(name, NodeKind::Mesh)
    }

    pub fn character(name: impl Into<String>) -> Self {
        Self::new(name, NodeKind::Character)
    }

    pub fn bone(name: impl Into<String>) -> Self {
        let mut node = Self::new(name, NodeKind::Bone);
        node.bounds = NodeBounds::new(Vec3::splat(-0.05), Vec3::splat(0.05));
        node
    }

    pub fn light(name: impl Into<String>) -> Self {
        Self::new(name, NodeKind::Light)
    }

    pub fn helper(name: impl Into<String>) -> Self {
        let mut node = Self::new(name, NodeKind::Helper);
        node.hot = true;
        node
    }

    pub fn camera_rig() -> Self {
        let mut node = Self::new(RIG_NODE_NAME, NodeKind::CameraRig);
        node.transform = NodeTransform::from_translation(Vec3::new(0.0, 1.6, 4.0));
        node
    }

    pub fn with_transform(mut self, transform: NodeTransform) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_bounds(mut self, bounds: NodeBounds) -> Self {
        self.bounds = bounds;
        self
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PickHit {
    pub node: NodeId,
    pub distance: f32,
}

/// Scene graph over a slotmap arena. Removed keys stay invalid forever, so
/// stale selection references simply stop resolving instead of aliasing a
/// recycled node.
#[derive(Default)]
pub struct SceneGraph {
    nodes: SlotMap<NodeId, SceneNode>,
    roots: Vec<NodeId>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn(&mut self, node: SceneNode) -> NodeId {
        let id = self.nodes.insert(node);
        self.roots.push(id);
        id
    }

    pub fn spawn_child(&mut self, parent: NodeId, mut node: SceneNode) -> Option<NodeId> {
        if !self.nodes.contains_key(parent) {
            return None;
        }
        node.parent = Some(parent);
        let id = self.nodes.insert(node);
        if let Some(parent_node) = self.nodes.get_mut(parent) {
            parent_node.children.push(id);
        }
        Some(id)
    }

    pub fn get(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut SceneNode> {
        self.nodes.get_mut(id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &SceneNode)> {
        self.nodes.iter()
    }

    /// Removes a node and its whole subtree.
    pub fn remove(&mut self, id: NodeId) {
        let Some(node) = self.nodes.get(id) else {
            return;
        };
        let children = node.children.clone();
        for child in children {
            self.remove(child);
        }
        if let Some(node) = self.nodes.remove(id) {
            match node.parent {
                Some(parent) => {
                    if let Some(parent_node) = self.nodes.get_mut(parent) {
                        parent_node.children.retain(|&c| c != id);
                    }
                }
                None => self.roots.retain(|&r| r != id),
            }
        }
    }

    /// Walks to the top-level ancestor of a node. Picks land on whichever
    /// sub-mesh the ray hit; selection always promotes to the scene child.
    pub fn top_level_ancestor(&self, id: NodeId) -> Option<NodeId> {
        let mut current = id;
        loop {
            let node = self.nodes.get(current)?;
            match node.parent {
                Some(parent) => current = parent,
                None => return Some(current),
            }
        }
    }

    pub fn world_transform(&self, id: NodeId) -> Option<Mat4> {
        let node = self.nodes.get(id)?;
        let local = node.transform.to_matrix();
        match node.parent {
            Some(parent) => Some(self.world_transform(parent)? * local),
            None => Some(local),
        }
    }

    /// Bones of a character subtree, depth-first in child order, so the FK
    /// pick target list is stable across calls.
    pub fn bones_of(&self, character: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.collect_bones(character, &mut out);
        out
    }

    fn collect_bones(&self, id: NodeId, out: &mut Vec<NodeId>) {
        let Some(node) = self.nodes.get(id) else {
            return;
        };
        for &child in &node.children {
            if let Some(child_node) = self.nodes.get(child) {
                if child_node.kind == NodeKind::Bone {
                    out.push(child);
                }
                self.collect_bones(child, out);
            }
        }
    }

    pub fn find_by_name(&self, name: &str) -> Option<NodeId> {
        self.nodes.iter().find(|(_, node)| node.name == name).map(|(id, _)| id)
    }

    pub fn rig_node(&self) -> Option<NodeId> {
        self.nodes.iter().find(|(_, node)| node.kind == NodeKind::CameraRig).map(|(id, _)| id)
    }

    /// Hides or restores all hot helper nodes in one pass.
    pub fn set_hot_hidden(&mut self, hidden: bool) {
        for (_, node) in self.nodes.iter_mut() {
            if node.hot {
                node.visible = !hidden;
            }
        }
    }

    /// Nearest pickable node along a ray. Bones, hidden nodes, hot helpers
    /// and the rig node never participate; bone picking goes through the FK
    /// controller's sphere targets instead.
    pub fn pick(&self, origin: Vec3, dir: Vec3) -> Option<PickHit> {
        let mut best: Option<PickHit> = None;
        for (id, node) in self.nodes.iter() {
            if !node.visible || node.hot || node.locked {
                continue;
            }
            if matches!(node.kind, NodeKind::Bone | NodeKind::CameraRig | NodeKind::Helper) {
                continue;
            }
            let Some(world) = self.world_transform(id) else {
                continue;
            };
            if let Some(distance) = ray_hit_world_obb(origin, dir, &world, &node.bounds) {
                if best.map_or(true, |b| distance < b.distance) {
                    best = Some(PickHit { node: id, distance });
                }
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scene_with_character() -> (SceneGraph, NodeId, NodeId, NodeId) {
        let mut scene = SceneGraph::new();
        let character = scene.spawn(SceneNode::character("hero"));
        let hips = scene.spawn_child(character, SceneNode::bone("hips")).unwrap();
        let spine = scene.spawn_child(hips, SceneNode::bone("spine")).unwrap();
        (scene, character, hips, spine)
    }

    #[test]
    fn remove_drops_whole_subtree() {
        let (mut scene, character, hips, spine) = scene_with_character();
        scene.remove(character);
        assert!(!scene.contains(character));
        assert!(!scene.contains(hips));
        assert!(!scene.contains(spine));
        assert!(scene.is_empty());
    }

    #[test]
    fn top_level_ancestor_of_nested_bone() {
        let (scene, character, _, spine) = scene_with_character();
        assert_eq!(scene.top_level_ancestor(spine), Some(character));
        assert_eq!(scene.top_level_ancestor(character), Some(character));
    }

    #[test]
    fn bones_collected_depth_first() {
        let (scene, character, hips, spine) = scene_with_character();
        assert_eq!(scene.bones_of(character), vec![hips, spine]);
    }

    #[test]
    fn world_transform_composes_parent_chain() {
        let mut scene = SceneGraph::new();
        let parent = scene.spawn(
            SceneNode::mesh("parent").with_transform(NodeTransform::from_translation(Vec3::new(1.0, 0.0, 0.0))),
        );
        let child = scene
            .spawn_child(
                parent,
                SceneNode::mesh("child").with_transform(NodeTransform::from_translation(Vec3::new(0.0, 2.0, 0.0))),
            )
            .unwrap();
        let world = scene.world_transform(child).unwrap();
        let origin = world.transform_point3(Vec3::ZERO);
        assert!((origin - Vec3::new(1.0, 2.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn pick_skips_bones_hot_and_hidden_nodes() {
        let mut scene = SceneGraph::new();
        let visible = scene.spawn(
            SceneNode::mesh("cube").with_transform(NodeTransform::from_translation(Vec3::new(0.0, 0.0, -5.0))),
        );
        scene.spawn(
            SceneNode::helper("guide").with_transform(NodeTransform::from_translation(Vec3::new(0.0, 0.0, -2.0))),
        );
        let hidden = scene.spawn(
            SceneNode::mesh("hidden").with_transform(NodeTransform::from_translation(Vec3::new(0.0, 0.0, -3.0))),
        );
        scene.get_mut(hidden).unwrap().visible = false;
        let hit = scene.pick(Vec3::ZERO, Vec3::NEG_Z).expect("cube should be hit");
        assert_eq!(hit.node, visible);
    }

    #[test]
    fn set_hot_hidden_round_trips() {
        let mut scene = SceneGraph::new();
        let helper = scene.spawn(SceneNode::helper("guide"));
        let mesh = scene.spawn(SceneNode::mesh("cube"));
        scene.set_hot_hidden(true);
        assert!(!scene.get(helper).unwrap().visible);
        assert!(scene.get(mesh).unwrap().visible);
        scene.set_hot_hidden(false);
        assert!(scene.get(helper).unwrap().visible);
    }
}
