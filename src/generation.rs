use crate::camera_rig::AspectRatio;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ArtStyle {
    #[default]
    Cinematic,
    Anime,
    Photoreal,
    Illustration,
}

impl ArtStyle {
    pub fn label(self) -> &'static str {
        match self {
            ArtStyle::Cinematic => "Cinematic",
            ArtStyle::Anime => "Anime",
            ArtStyle::Photoreal => "Photoreal",
            ArtStyle::Illustration => "Illustration",
        }
    }
}

/// Per-run settings that travel with a recording into the generation job.
/// These participate in the render cache checksum: changing any of them
/// invalidates a cached recording of the same scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationOptions {
    pub art_style: ArtStyle,
    #[serde(default)]
    pub positive_prompt: String,
    #[serde(default)]
    pub negative_prompt: String,
    #[serde(default = "GenerationOptions::default_style_strength")]
    pub style_strength: f32,
    #[serde(default)]
    pub upscale: bool,
    #[serde(default)]
    pub face_detail: bool,
    #[serde(default)]
    pub lip_sync: bool,
    #[serde(default)]
    pub cinematic: bool,
    #[serde(default)]
    pub reference_image_token: Option<String>,
    #[serde(default)]
    pub aspect_ratio: AspectRatio,
    #[serde(default)]
    pub engine_preprocessing: bool,
}

impl GenerationOptions {
    fn default_style_strength() -> f32 {
        0.5
    }
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            art_style: ArtStyle::default(),
            positive_prompt: String::new(),
            negative_prompt: String::new(),
            style_strength: Self::default_style_strength(),
            upscale: false,
            face_detail: false,
            lip_sync: false,
            cinematic: false,
            reference_image_token: None,
            aspect_ratio: AspectRatio::default(),
            engine_preprocessing: false,
        }
    }
}
