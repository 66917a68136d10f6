mod recording;

pub use recording::FinalizeOutcome;

use crate::camera_rig::{CameraMode, DualCameraRig};
use crate::capture::FrameCapturePipeline;
use crate::config::StudioConfig;
use crate::events::{EventBus, StatusSink, StudioEvent, ToastKind};
use crate::freefly::FreeFlyController;
use crate::generation::GenerationOptions;
use crate::input::{CommandQueue, EditorCommand};
use crate::media::{JobQueue, MediaUploader};
use crate::playback::{PlaybackState, PlaybackStateMachine};
use crate::render_cache::RenderCache;
use crate::renderer::{RenderBackend, RenderPass, SurfaceId};
use crate::scene::SceneGraph;
use crate::selection::SelectionController;
use crate::time::{FrameThrottle, Time};
use anyhow::Result;
use glam::Vec2;
use std::sync::Arc;
use std::time::Instant;
use winit::dpi::PhysicalSize;

/// The editor session: one scene, two cameras, and the render loop driving
/// them. `tick` is the only entry point the host calls per frame; input
/// arrives through the command queue and results leave through the event
/// bus and the status sink.
pub struct Editor {
    pub config: StudioConfig,
    pub scene: SceneGraph,
    pub rig: DualCameraRig,
    pub freefly: FreeFlyController,
    pub selection: SelectionController,
    pub playback: PlaybackStateMachine,
    pub capture: FrameCapturePipeline,
    pub cache: RenderCache,
    pub options: GenerationOptions,
    pub commands: CommandQueue,
    pub events: EventBus,
    renderer: Box<dyn RenderBackend>,
    uploader: Arc<dyn MediaUploader>,
    jobs: Arc<dyn JobQueue>,
    status: Arc<dyn StatusSink>,
    throttle: FrameThrottle,
    time: Time,
    viewport: PhysicalSize<u32>,
    finalize: Option<recording::FinalizeJob>,
    recording_cancelled: bool,
    export_surface_before_recording: Option<PhysicalSize<u32>>,
    camera_mode_before_recording: Option<CameraMode>,
}

impl Editor {
    pub fn new(
        config: StudioConfig,
        scene: SceneGraph,
        renderer: Box<dyn RenderBackend>,
        uploader: Arc<dyn MediaUploader>,
        jobs: Arc<dyn JobQueue>,
        status: Arc<dyn StatusSink>,
    ) -> Self {
        let viewport = config.viewport.size();
        let options = GenerationOptions {
            engine_preprocessing: config.engine_preprocessing,
            ..GenerationOptions::default()
        };
        let rig = DualCameraRig::new(viewport, options.aspect_ratio);
        let playback = PlaybackStateMachine::new(config.capture.timeline_frames);
        let throttle = FrameThrottle::from_fps(config.capture.fps_cap);
        eprintln!(
            "[editor] session up: viewport {}x{}, fps cap {}, timeline {} frames",
            viewport.width, viewport.height, config.capture.fps_cap, config.capture.timeline_frames
        );
        Self {
            config,
            scene,
            rig,
            freefly: FreeFlyController::new(),
            selection: SelectionController::new(),
            playback,
            capture: FrameCapturePipeline::new(),
            cache: RenderCache::new(),
            options,
            commands: CommandQueue::new(),
            events: EventBus::default(),
            renderer,
            uploader,
            jobs,
            status,
            throttle,
            time: Time::new(),
            viewport,
            finalize: None,
            recording_cancelled: false,
            export_surface_before_recording: None,
            camera_mode_before_recording: None,
        }
    }

    pub fn viewport(&self) -> PhysicalSize<u32> {
        self.viewport
    }

    pub fn renderer(&self) -> &dyn RenderBackend {
        self.renderer.as_ref()
    }

    pub fn renderer_mut(&mut self) -> &mut dyn RenderBackend {
        self.renderer.as_mut()
    }

    pub fn finalize_pending(&self) -> bool {
        self.finalize.is_some()
    }

    /// One cooperative tick of the render loop. Early calls inside the FPS
    /// cap window are dropped whole; nothing is deferred.
    pub fn tick(&mut self, now: Instant) -> Result<()> {
        if !self.throttle.should_run(now) {
            return Ok(());
        }
        self.time.tick(now);
        self.poll_finalize()?;
        self.apply_commands()?;
        self.update_cameras();
        self.render_tick()
    }

    pub fn resize_viewport(&mut self, size: PhysicalSize<u32>) -> Result<()> {
        if size.width == 0 || size.height == 0 {
            return Ok(());
        }
        self.viewport = size;
        self.rig.resize_viewport(size);
        self.renderer.resize(SurfaceId::Edit, size)
    }

    fn apply_commands(&mut self) -> Result<()> {
        for command in self.commands.drain() {
            self.apply_command(command)?;
        }
        Ok(())
    }

    fn apply_command(&mut self, command: EditorCommand) -> Result<()> {
        match command {
            EditorCommand::Move { axis, active } => self.freefly.set_axis(axis, active),
            EditorCommand::SetSpeedModifiers { fast, slow } => self.freefly.set_speed_multiplier(fast, slow),
            EditorCommand::Look { delta } => {
                if self.rig.mode == CameraMode::FreeFly {
                    self.freefly.apply_look(&mut self.rig.edit_camera, delta);
                }
            }
            EditorCommand::Pan { delta } => {
                if self.rig.mode == CameraMode::FreeFly {
                    self.freefly.apply_pan(&mut self.rig.edit_camera, delta);
                }
            }
            EditorCommand::Zoom { amount } => {
                if self.rig.mode == CameraMode::FreeFly {
                    self.freefly.apply_zoom(&mut self.rig.edit_camera, amount);
                }
            }
            EditorCommand::PointerClick { x, y } => {
                if self.playback.state() == PlaybackState::Editing {
                    self.selection.pick_at(&self.scene, &self.rig.edit_camera, Vec2::new(x, y), self.viewport);
                    self.events.push(StudioEvent::SelectionChanged);
                }
            }
            EditorCommand::SetHandleMode(mode) => self.selection.set_handle_mode(mode),
            EditorCommand::ToggleFkMode => match self.selection.toggle_fk(&self.scene) {
                Ok(mode) => self.events.push(StudioEvent::FkModeChanged {
                    active: mode == crate::selection::InteractionMode::ForwardKinematics,
                }),
                Err(err) => self.status.toast(ToastKind::Error, &err.to_string()),
            },
            EditorCommand::DeleteSelected => self.delete_selected(),
            EditorCommand::Deselect => {
                self.selection.deselect();
                self.events.push(StudioEvent::SelectionChanged);
            }
            EditorCommand::ToggleCameraMode => self.toggle_camera_mode(),
            EditorCommand::SetAspectRatio(ratio) => {
                self.rig.set_aspect_ratio(ratio);
                self.options.aspect_ratio = ratio;
                self.renderer.resize(SurfaceId::Export, self.config.presets.for_aspect(ratio))?;
            }
            EditorCommand::ScrubTo(frame) => {
                if self.playback.scrub_to(frame) {
                    // While not playing, a scrub jump re-seats the locked
                    // view on the rig node before the reverse sync resumes.
                    if self.rig.mode == CameraMode::PersonLocked {
                        self.snap_edit_camera_to_rig();
                    }
                }
            }
            EditorCommand::EnterPreview => self.enter_preview()?,
            EditorCommand::StartRecording => self.start_recording()?,
            EditorCommand::CancelRecording => self.cancel_recording()?,
        }
        Ok(())
    }

    fn delete_selected(&mut self) {
        let Some(selected) = self.selection.selected() else {
            return;
        };
        self.selection.deselect();
        self.scene.remove(selected);
        self.selection.handle_node_removed(&self.scene);
        self.events.push(StudioEvent::SelectionChanged);
    }

    fn toggle_camera_mode(&mut self) {
        let mode = self.rig.toggle_mode();
        self.freefly.reset();
        if mode == CameraMode::PersonLocked {
            self.snap_edit_camera_to_rig();
        }
        eprintln!("[editor] camera mode: {mode:?}");
    }

    fn rig_node_pose(&self) -> Option<(glam::Vec3, glam::Quat)> {
        let rig = self.scene.rig_node()?;
        let world = self.scene.world_transform(rig)?;
        let (_, rotation, translation) = world.to_scale_rotation_translation();
        Some((translation, rotation))
    }

    fn snap_edit_camera_to_rig(&mut self) {
        if let Some((translation, rotation)) = self.rig_node_pose() {
            self.rig.snap_edit_to_rig(translation, rotation);
        }
    }

    fn update_cameras(&mut self) {
        let dt = self.time.delta_seconds();
        match self.rig.mode {
            CameraMode::FreeFly => self.freefly.update(&mut self.rig.edit_camera, dt),
            CameraMode::PersonLocked => self.snap_edit_camera_to_rig(),
        }
        // The rig node in the scene is the source of truth for the export
        // framing; the sync is strictly one way.
        if let Some((translation, rotation)) = self.rig_node_pose() {
            self.rig.sync_export_to_rig(translation, rotation);
        }
    }

    fn render_tick(&mut self) -> Result<()> {
        match self.playback.state() {
            PlaybackState::Editing | PlaybackState::Previewing => {
                self.renderer.render(&self.scene, &self.rig.edit_camera, SurfaceId::Edit, RenderPass::Color)
            }
            PlaybackState::Recording => self.recording_tick(),
        }
    }

    fn recording_tick(&mut self) -> Result<()> {
        self.renderer.render(&self.scene, &self.rig.export_camera, SurfaceId::Export, RenderPass::Color)?;
        match self.renderer.read_pixels(SurfaceId::Export) {
            Some(pixels) => {
                let mut outcome = self.capture.push_frame(&pixels).map(|_| ()).map_err(anyhow::Error::from);
                if outcome.is_ok() && self.options.engine_preprocessing {
                    outcome = self.capture_aux_passes();
                }
                if let Err(err) = outcome {
                    // A capture failure mid-recording aborts through the
                    // single failure path instead of surfacing to the host.
                    self.abort_recording(&err.to_string());
                    return Ok(());
                }
            }
            None => {
                // The surface went away under us. Count it and keep going;
                // the missing frame never aborts the recording.
                let cursor = self.playback.cursor();
                eprintln!("[capture] export surface unavailable at frame {cursor}, skipping");
                self.capture.note_missing_surface();
                self.events.push(StudioEvent::FrameSkipped { cursor });
            }
        }
        if !self.playback.advance_cursor() {
            self.finish_recording()?;
        }
        Ok(())
    }

    fn capture_aux_passes(&mut self) -> Result<()> {
        for pass in RenderPass::AUX_PASSES {
            self.renderer.render(&self.scene, &self.rig.export_camera, SurfaceId::Export, pass)?;
            if let Some(pixels) = self.renderer.read_pixels(SurfaceId::Export) {
                self.capture.push_aux_frame(pass, &pixels).map_err(anyhow::Error::from)?;
            }
        }
        Ok(())
    }
}
