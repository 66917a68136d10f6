use crate::generation::GenerationOptions;
use crate::scene::{NodeKind, SceneGraph, SceneNode};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Deterministic, order-independent snapshot of scene content used to key
/// the render cache. Camera transforms are deliberately left out: the export
/// camera re-syncs from the rig node every tick, so framing never makes two
/// otherwise identical recordings distinct. Hot helper nodes are left out
/// for the same reason — they are hidden during recording anyway.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SceneDigest {
    pub nodes: Vec<DigestNode>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DigestNode {
    pub path: String,
    pub kind: NodeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transform: Option<DigestTransform>,
    pub visible: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DigestTransform {
    pub translation: [f32; 3],
    pub rotation: [f32; 4],
    pub scale: [f32; 3],
}

impl SceneDigest {
    pub fn from_scene(scene: &SceneGraph) -> Self {
        let mut nodes: Vec<DigestNode> = scene
            .iter()
            .filter(|(_, node)| !node.hot)
            .map(|(_, node)| DigestNode {
                path: node_path(scene, node),
                kind: node.kind,
                transform: digest_transform(node),
                visible: node.visible,
            })
            .collect();
        nodes.sort_by(|a, b| a.path.cmp(&b.path));
        Self { nodes }
    }
}

fn node_path(scene: &SceneGraph, node: &SceneNode) -> String {
    let mut segments = vec![node.name.clone()];
    let mut current = node.parent;
    while let Some(parent_id) = current {
        match scene.get(parent_id) {
            Some(parent) => {
                segments.push(parent.name.clone());
                current = parent.parent;
            }
            None => break,
        }
    }
    segments.reverse();
    segments.join("/")
}

fn digest_transform(node: &SceneNode) -> Option<DigestTransform> {
    if node.kind == NodeKind::CameraRig {
        return None;
    }
    Some(DigestTransform {
        translation: node.transform.translation.to_array(),
        rotation: node.transform.rotation.to_array(),
        scale: node.transform.scale.to_array(),
    })
}

/// Content checksum over the digest plus the generation options. Two calls
/// over unchanged inputs always produce the same hex string.
pub fn scene_checksum(scene: &SceneGraph, options: &GenerationOptions) -> Result<String> {
    let digest = SceneDigest::from_scene(scene);
    let view = (digest, options);
    let bytes = serde_json::to_vec(&view).context("Failed to serialize scene digest for checksum")?;
    Ok(blake3::hash(&bytes).to_hex().to_string())
}
