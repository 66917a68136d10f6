use crate::camera3d::Camera3D;
use crate::scene::SceneGraph;
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use winit::dpi::PhysicalSize;

/// The two render targets the editor draws into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SurfaceId {
    /// Interactive viewport, follows the window size.
    Edit,
    /// Offscreen target sized by the output resolution preset.
    Export,
}

/// Render pass selector. `Color` is the normal beauty pass; the rest are
/// auxiliary buffers captured when engine preprocessing is enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderPass {
    Color,
    Normal,
    Depth,
    Outline,
}

impl RenderPass {
    pub const AUX_PASSES: [RenderPass; 3] = [RenderPass::Normal, RenderPass::Depth, RenderPass::Outline];

    pub fn label(self) -> &'static str {
        match self {
            RenderPass::Color => "color",
            RenderPass::Normal => "normal",
            RenderPass::Depth => "depth",
            RenderPass::Outline => "outline",
        }
    }
}

/// Copied pixel data read back from a surface. RGBA8, tightly packed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FramePixels {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl FramePixels {
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let mut data = Vec::with_capacity((width * height * 4) as usize);
        for _ in 0..width * height {
            data.extend_from_slice(&rgba);
        }
        Self { width, height, rgba: data }
    }
}

/// Opaque GPU pipeline the loop drives. Implementations own their surfaces;
/// callers only ever see copied pixel data via `read_pixels`.
pub trait RenderBackend {
    fn render(&mut self, scene: &SceneGraph, camera: &Camera3D, surface: SurfaceId, pass: RenderPass)
        -> Result<()>;

    fn resize(&mut self, surface: SurfaceId, size: PhysicalSize<u32>) -> Result<()>;

    fn surface_size(&self, surface: SurfaceId) -> PhysicalSize<u32>;

    /// Returns `None` when the hosting surface has been torn down (e.g. the
    /// canvas went away mid-recording). Callers treat that as a skipped
    /// frame, never as a fatal error.
    fn read_pixels(&mut self, surface: SurfaceId) -> Option<FramePixels>;
}

/// Headless backend that fills each surface with a flat test pattern keyed
/// on the pass. Used by the demo binary and the integration tests. The
/// attachment flag is shared so a host can tear the export surface down
/// while the renderer is owned by the loop.
pub struct TestPatternRenderer {
    edit_size: PhysicalSize<u32>,
    export_size: PhysicalSize<u32>,
    export_attached: Arc<AtomicBool>,
    last_pass: RenderPass,
    pub renders: u32,
}

impl TestPatternRenderer {
    pub fn new(edit_size: PhysicalSize<u32>, export_size: PhysicalSize<u32>) -> Self {
        Self {
            edit_size,
            export_size,
            export_attached: Arc::new(AtomicBool::new(true)),
            last_pass: RenderPass::Color,
            renders: 0,
        }
    }

    /// Handle for simulating the export surface being torn down by the
    /// host: store `false` to detach, `true` to reattach.
    pub fn surface_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.export_attached)
    }

    pub fn detach_surface(&mut self) {
        self.export_attached.store(false, Ordering::SeqCst);
    }

    pub fn reattach_surface(&mut self) {
        self.export_attached.store(true, Ordering::SeqCst);
    }

    fn export_is_attached(&self) -> bool {
        self.export_attached.load(Ordering::SeqCst)
    }

    fn pattern(pass: RenderPass) -> [u8; 4] {
        match pass {
            RenderPass::Color => [200, 120, 40, 255],
            RenderPass::Normal => [128, 128, 255, 255],
            RenderPass::Depth => [16, 16, 16, 255],
            RenderPass::Outline => [255, 255, 255, 255],
        }
    }
}

impl RenderBackend for TestPatternRenderer {
    fn render(
        &mut self,
        _scene: &SceneGraph,
        camera: &Camera3D,
        surface: SurfaceId,
        pass: RenderPass,
    ) -> Result<()> {
        if !crate::picking::matrix_is_finite(&camera.view_projection()) {
            bail!("Camera produced a non-finite view projection");
        }
        if surface == SurfaceId::Export && !self.export_is_attached() {
            // Draw is a no-op on a detached surface; readback will report it.
            return Ok(());
        }
        self.last_pass = pass;
        self.renders += 1;
        Ok(())
    }

    fn resize(&mut self, surface: SurfaceId, size: PhysicalSize<u32>) -> Result<()> {
        match surface {
            SurfaceId::Edit => self.edit_size = size,
            SurfaceId::Export => self.export_size = size,
        }
        Ok(())
    }

    fn surface_size(&self, surface: SurfaceId) -> PhysicalSize<u32> {
        match surface {
            SurfaceId::Edit => self.edit_size,
            SurfaceId::Export => self.export_size,
        }
    }

    fn read_pixels(&mut self, surface: SurfaceId) -> Option<FramePixels> {
        let size = match surface {
            SurfaceId::Edit => self.edit_size,
            SurfaceId::Export => {
                if !self.export_is_attached() {
                    return None;
                }
                self.export_size
            }
        };
        Some(FramePixels::solid(size.width.max(1), size.height.max(1), Self::pattern(self.last_pass)))
    }
}
