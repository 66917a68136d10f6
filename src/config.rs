use crate::camera_rig::AspectRatio;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use winit::dpi::PhysicalSize;

#[derive(Debug, Clone, Deserialize)]
pub struct ViewportConfig {
    #[serde(default = "ViewportConfig::default_width")]
    pub width: u32,
    #[serde(default = "ViewportConfig::default_height")]
    pub height: u32,
}

impl ViewportConfig {
    const fn default_width() -> u32 {
        1280
    }

    const fn default_height() -> u32 {
        720
    }

    pub fn size(&self) -> PhysicalSize<u32> {
        PhysicalSize::new(self.width.max(1), self.height.max(1))
    }
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self { width: Self::default_width(), height: Self::default_height() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CaptureConfig {
    #[serde(default = "CaptureConfig::default_fps_cap")]
    pub fps_cap: u32,
    #[serde(default = "CaptureConfig::default_timeline_frames")]
    pub timeline_frames: u32,
}

impl CaptureConfig {
    const fn default_fps_cap() -> u32 {
        60
    }

    const fn default_timeline_frames() -> u32 {
        150
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self { fps_cap: Self::default_fps_cap(), timeline_frames: Self::default_timeline_frames() }
    }
}

/// Output resolution per export aspect.
#[derive(Debug, Clone, Deserialize)]
pub struct ResolutionPresets {
    #[serde(default = "ResolutionPresets::default_horizontal")]
    pub horizontal: [u32; 2],
    #[serde(default = "ResolutionPresets::default_vertical")]
    pub vertical: [u32; 2],
    #[serde(default = "ResolutionPresets::default_square")]
    pub square: [u32; 2],
}

impl ResolutionPresets {
    const fn default_horizontal() -> [u32; 2] {
        [1280, 720]
    }

    const fn default_vertical() -> [u32; 2] {
        [720, 1280]
    }

    const fn default_square() -> [u32; 2] {
        [1080, 1080]
    }

    pub fn for_aspect(&self, aspect: AspectRatio) -> PhysicalSize<u32> {
        let [width, height] = match aspect {
            AspectRatio::Horizontal16x9 => self.horizontal,
            AspectRatio::Vertical9x16 => self.vertical,
            AspectRatio::Square1x1 => self.square,
        };
        PhysicalSize::new(width.max(1), height.max(1))
    }
}

impl Default for ResolutionPresets {
    fn default() -> Self {
        Self {
            horizontal: Self::default_horizontal(),
            vertical: Self::default_vertical(),
            square: Self::default_square(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct StudioConfig {
    #[serde(default)]
    pub viewport: ViewportConfig,
    #[serde(default)]
    pub capture: CaptureConfig,
    #[serde(default)]
    pub presets: ResolutionPresets,
    #[serde(default)]
    pub engine_preprocessing: bool,
}

impl StudioConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes =
            fs::read(path).with_context(|| format!("Failed to read config file {}", path.display()))?;
        let cfg = serde_json::from_slice(&bytes)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(cfg)
    }

    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::load(path) {
            Ok(cfg) => cfg,
            Err(err) => {
                eprintln!("Config load error: {err:?}. Falling back to defaults.");
                Self::default()
            }
        }
    }
}
