use super::Editor;
use crate::camera_rig::CameraMode;
use crate::capture::{encode_png, CaptureError, FramePackage};
use crate::events::{ProgressUpdate, StudioEvent, ToastKind};
use crate::generation::GenerationOptions;
use crate::media::{GenerationJobRequest, JobQueue, MediaToken, MediaTokens, MediaUploader, SnapshotImage};
use crate::playback::Transition;
use crate::renderer::{RenderPass, SurfaceId};
use anyhow::Result;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::Arc;
use std::thread::JoinHandle;

/// Result of the background package/upload/enqueue worker.
#[derive(Debug)]
pub enum FinalizeOutcome {
    Complete { tokens: MediaTokens, job: String, captured: u32 },
    Failed { reason: String },
}

pub(super) struct FinalizeJob {
    rx: Receiver<FinalizeOutcome>,
    handle: Option<JoinHandle<()>>,
}

impl Editor {
    /// Renders one still with the export camera, uploads it, and hands the
    /// snapshot token back through `PreviewReady`, leaving the session
    /// exactly where it was. A request while a preview or recording is
    /// already running is a silent no-op.
    pub fn enter_preview(&mut self) -> Result<()> {
        if self.playback.try_transition(Transition::BeginPreview).is_err() {
            eprintln!("[preview] ignored, state is {}", self.playback.state().label());
            return Ok(());
        }
        let was_locked = self.rig.mode == CameraMode::PersonLocked;
        if was_locked {
            self.rig.mode = CameraMode::FreeFly;
        }
        self.scene.set_hot_hidden(true);

        let outcome = self.render_preview_still();

        self.scene.set_hot_hidden(false);
        if was_locked {
            self.rig.mode = CameraMode::PersonLocked;
        }
        self.playback.try_transition(Transition::EndPreview).ok();

        match outcome {
            Ok(token) => self.events.push(StudioEvent::PreviewReady { token }),
            Err(reason) => {
                self.status.toast(ToastKind::Error, &reason);
                self.events.push(StudioEvent::PreviewFailed { reason });
            }
        }
        Ok(())
    }

    fn render_preview_still(&mut self) -> Result<MediaToken, String> {
        self.renderer
            .render(&self.scene, &self.rig.export_camera, SurfaceId::Export, RenderPass::Color)
            .map_err(|err| format!("Preview render failed: {err}"))?;
        let pixels = self
            .renderer
            .read_pixels(SurfaceId::Export)
            .ok_or_else(|| "Preview surface unavailable".to_string())?;
        let png = encode_png(&pixels).map_err(|err| format!("Preview encode failed: {err}"))?;
        let snapshot = SnapshotImage { png, width: pixels.width, height: pixels.height };
        self.uploader
            .upload_snapshot(&snapshot)
            .map_err(|err| format!("Preview upload failed: {err}"))
    }

    /// Kicks off a recording. The cache is consulted before anything else;
    /// a hit enqueues the previous result and never enters Recording, so no
    /// frame buffer is ever allocated for it.
    pub fn start_recording(&mut self) -> Result<()> {
        if self.playback.state() != crate::playback::PlaybackState::Editing
            || self.playback.finalize_in_flight()
        {
            eprintln!("[record] ignored, state is {}", self.playback.state().label());
            return Ok(());
        }

        if self.cache.should_reuse(&self.scene, &self.options)? {
            if let Some(tokens) = self.cache.reusable_tokens().cloned() {
                self.enqueue_cached(tokens);
                return Ok(());
            }
        }

        self.status.progress(ProgressUpdate {
            progress: 25,
            label: "Recording".to_string(),
            message: "Capturing frames".to_string(),
        });

        if self.playback.try_transition(Transition::BeginRecording).is_err() {
            eprintln!("[record] ignored, state is {}", self.playback.state().label());
            return Ok(());
        }

        self.recording_cancelled = false;
        self.selection.clear_for_recording();
        self.events.push(StudioEvent::SelectionChanged);
        self.scene.set_hot_hidden(true);
        self.freefly.reset();
        self.camera_mode_before_recording = Some(self.rig.mode);
        self.rig.mode = CameraMode::PersonLocked;

        self.export_surface_before_recording = Some(self.renderer.surface_size(SurfaceId::Export));
        let export_size = self.config.presets.for_aspect(self.rig.aspect_ratio());
        self.renderer.resize(SurfaceId::Export, export_size)?;

        self.playback.set_total_frames(self.config.capture.timeline_frames);
        self.capture.begin();
        self.events.push(StudioEvent::RecordingStarted { total_frames: self.playback.total_frames() });
        eprintln!(
            "[record] started: {} frames at {}x{}",
            self.playback.total_frames(),
            export_size.width,
            export_size.height
        );
        Ok(())
    }

    fn enqueue_cached(&mut self, tokens: MediaTokens) {
        let request = GenerationJobRequest::new(tokens.color, self.options.clone());
        match self.jobs.enqueue_generation_job(request) {
            Ok(handle) => {
                eprintln!("[record] reused cached render, job {}", handle.0);
                self.events.push(StudioEvent::CacheHit { job: handle.0 });
                self.status.progress(ProgressUpdate {
                    progress: 100,
                    label: "Recording".to_string(),
                    message: "Reused previous render".to_string(),
                });
                self.status.toast(ToastKind::Success, "Reused previous render");
            }
            Err(err) => {
                // The cached artifact could not be used after all; the next
                // attempt has to render fresh.
                self.cache.record_failure();
                self.status.toast(ToastKind::Error, &format!("Generation enqueue failed: {err}"));
                self.events.push(StudioEvent::RecordingFailed { reason: err.to_string() });
            }
        }
        self.render_loop_reset();
    }

    /// Stops the recording early. The finalize path is the same as a natural
    /// end, but the cache entry is marked failed so the partial result is
    /// never reused.
    pub fn cancel_recording(&mut self) -> Result<()> {
        if self.playback.state() != crate::playback::PlaybackState::Recording {
            return Ok(());
        }
        self.recording_cancelled = true;
        self.events.push(StudioEvent::RecordingCancelled);
        eprintln!("[record] cancelled at frame {}", self.playback.cursor());
        self.finish_recording()
    }

    /// Ends a recording that cannot continue, e.g. a frame failed to
    /// encode. No finalize is started; the buffer is dropped and the
    /// session returns to Editing with one user-visible error.
    pub(super) fn abort_recording(&mut self, reason: &str) {
        if self.playback.try_transition(Transition::EndRecording).is_err() {
            return;
        }
        self.fail_recording(reason);
    }

    /// Exactly one finalize runs per recording; the transition table rejects
    /// a second `EndRecording` so re-entry is impossible.
    pub(super) fn finish_recording(&mut self) -> Result<()> {
        if self.playback.try_transition(Transition::EndRecording).is_err() {
            return Ok(());
        }
        self.begin_finalize()
    }

    fn begin_finalize(&mut self) -> Result<()> {
        let fps = self.config.capture.fps_cap;
        let skipped = self.capture.skipped();
        let package = match self.capture.drain_and_package(fps) {
            Ok(package) => package,
            Err(CaptureError::EmptyBuffer) => {
                self.fail_recording("Recording produced no frames");
                return Ok(());
            }
            Err(err) => {
                self.fail_recording(&err.to_string());
                return Ok(());
            }
        };
        if skipped > 0 {
            eprintln!("[capture] packaged {} frames, {} skipped", package.captured, skipped);
        }

        self.status.progress(ProgressUpdate {
            progress: 60,
            label: "Recording".to_string(),
            message: "Uploading frames".to_string(),
        });

        let (tx, rx) = mpsc::channel();
        let uploader = Arc::clone(&self.uploader);
        let jobs = Arc::clone(&self.jobs);
        let options = self.options.clone();
        let handle = std::thread::spawn(move || {
            let outcome = finalize_worker(uploader, jobs, package, options);
            // The editor may have shut down; a dead receiver is fine.
            let _ = tx.send(outcome);
        });
        self.finalize = Some(FinalizeJob { rx, handle: Some(handle) });
        Ok(())
    }

    /// Checks on the background finalize worker. Called every tick so the
    /// loop stays interactive while the upload is in flight.
    pub(super) fn poll_finalize(&mut self) -> Result<()> {
        let Some(job) = &self.finalize else {
            return Ok(());
        };
        let outcome = match job.rx.try_recv() {
            Ok(outcome) => outcome,
            Err(TryRecvError::Empty) => return Ok(()),
            Err(TryRecvError::Disconnected) => {
                FinalizeOutcome::Failed { reason: "Finalize worker disappeared".to_string() }
            }
        };
        if let Some(mut job) = self.finalize.take() {
            if let Some(handle) = job.handle.take() {
                let _ = handle.join();
            }
        }
        match outcome {
            FinalizeOutcome::Complete { tokens, job, captured } => {
                if self.recording_cancelled {
                    self.cache.record_failure();
                } else {
                    self.cache.record_success(tokens);
                }
                self.status.progress(ProgressUpdate {
                    progress: 100,
                    label: "Recording".to_string(),
                    message: "Generation job enqueued".to_string(),
                });
                self.status.toast(ToastKind::Success, "Recording uploaded");
                self.events.push(StudioEvent::RecordingFinished { captured, job });
                eprintln!("[record] finalized, {captured} frames uploaded");
                self.playback.finalize_complete();
                self.render_loop_reset();
            }
            FinalizeOutcome::Failed { reason } => {
                self.fail_recording(&reason);
            }
        }
        Ok(())
    }

    /// Single failure path: cache entry marked failed, buffer dropped, one
    /// user-visible error, back to Editing.
    pub(super) fn fail_recording(&mut self, reason: &str) {
        eprintln!("[record] failed: {reason}");
        self.cache.record_failure();
        self.capture.clear();
        self.status.toast(ToastKind::Error, reason);
        self.events.push(StudioEvent::RecordingFailed { reason: reason.to_string() });
        self.playback.finalize_complete();
        self.render_loop_reset();
    }

    /// Runs after every recording outcome, cache hits included: restores the
    /// export surface and the camera mode, unhides hot helpers, reopens the
    /// throttle.
    fn render_loop_reset(&mut self) {
        self.scene.set_hot_hidden(false);
        if let Some(size) = self.export_surface_before_recording.take() {
            if let Err(err) = self.renderer.resize(SurfaceId::Export, size) {
                eprintln!("[record] export surface restore failed: {err}");
            }
        }
        if let Some(mode) = self.camera_mode_before_recording.take() {
            self.rig.mode = mode;
        }
        self.throttle.reset();
    }
}

fn finalize_worker(
    uploader: Arc<dyn MediaUploader>,
    jobs: Arc<dyn JobQueue>,
    package: FramePackage,
    options: GenerationOptions,
) -> FinalizeOutcome {
    let captured = package.captured;
    let video_token = match uploader.upload_packaged_frames(&package) {
        Ok(token) => token,
        Err(err) => return FinalizeOutcome::Failed { reason: format!("Upload failed: {err}") },
    };
    let tokens = MediaTokens { color: video_token.clone() };
    let request = GenerationJobRequest::new(video_token, options);
    match jobs.enqueue_generation_job(request) {
        Ok(handle) => FinalizeOutcome::Complete { tokens, job: handle.0, captured },
        Err(err) => FinalizeOutcome::Failed { reason: format!("Generation enqueue failed: {err}") },
    }
}
