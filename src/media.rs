use crate::capture::FramePackage;
use crate::generation::GenerationOptions;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use thiserror::Error;
use uuid::Uuid;

/// Opaque handle to an uploaded artifact, minted by the media service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MediaToken(pub String);

impl MediaToken {
    pub fn mint() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

/// Tokens produced by one completed recording upload, per pass family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaTokens {
    pub color: MediaToken,
}

/// Opaque handle to an enqueued generation job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobHandle(pub String);

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Upload transport failed: {0}")]
    Transport(String),
    #[error("Upload rejected by the media service: {0}")]
    Rejected(String),
}

#[derive(Debug, Error)]
pub enum EnqueueError {
    #[error("Generation job rejected: {0}")]
    Rejected(String),
    #[error("Job queue unavailable")]
    Unavailable,
}

/// Single still image captured outside a recording, e.g. the preview flow.
#[derive(Debug, Clone)]
pub struct SnapshotImage {
    pub png: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Request for one generation job. `idempotency_token` is minted fresh per
/// recording so a retried enqueue of a cached result stays deduplicated
/// server-side.
#[derive(Debug, Clone)]
pub struct GenerationJobRequest {
    pub video_token: MediaToken,
    pub image_token: Option<MediaToken>,
    pub options: GenerationOptions,
    pub idempotency_token: Uuid,
}

impl GenerationJobRequest {
    pub fn new(video_token: MediaToken, options: GenerationOptions) -> Self {
        let image_token = options.reference_image_token.clone().map(MediaToken);
        Self { video_token, image_token, options, idempotency_token: Uuid::new_v4() }
    }
}

/// Upload collaborator. No retry policy lives here; errors surface to the
/// recording state machine which fails the run.
pub trait MediaUploader: Send + Sync {
    fn upload_packaged_frames(&self, package: &FramePackage) -> Result<MediaToken, UploadError>;

    fn upload_snapshot(&self, snapshot: &SnapshotImage) -> Result<MediaToken, UploadError>;
}

pub trait JobQueue: Send + Sync {
    fn enqueue_generation_job(&self, request: GenerationJobRequest) -> Result<JobHandle, EnqueueError>;
}

/// In-memory uploader used by the demo binary and tests.
#[derive(Default)]
pub struct MemoryUploader {
    uploads: Mutex<Vec<FramePackage>>,
    snapshots: Mutex<Vec<SnapshotImage>>,
    pub fail_uploads: std::sync::atomic::AtomicBool,
}

impl MemoryUploader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upload_count(&self) -> usize {
        self.uploads.lock().map(|u| u.len()).unwrap_or(0)
    }

    pub fn snapshot_count(&self) -> usize {
        self.snapshots.lock().map(|s| s.len()).unwrap_or(0)
    }

    pub fn last_upload(&self) -> Option<FramePackage> {
        self.uploads.lock().ok()?.last().cloned()
    }

    pub fn set_failing(&self, failing: bool) {
        self.fail_uploads.store(failing, std::sync::atomic::Ordering::SeqCst);
    }
}

impl MediaUploader for MemoryUploader {
    fn upload_packaged_frames(&self, package: &FramePackage) -> Result<MediaToken, UploadError> {
        if self.fail_uploads.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(UploadError::Transport("simulated transport failure".into()));
        }
        match self.uploads.lock() {
            Ok(mut uploads) => {
                uploads.push(package.clone());
                Ok(MediaToken::mint())
            }
            Err(_) => Err(UploadError::Transport("upload store poisoned".into())),
        }
    }

    fn upload_snapshot(&self, snapshot: &SnapshotImage) -> Result<MediaToken, UploadError> {
        if self.fail_uploads.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(UploadError::Transport("simulated transport failure".into()));
        }
        match self.snapshots.lock() {
            Ok(mut snapshots) => {
                snapshots.push(snapshot.clone());
                Ok(MediaToken::mint())
            }
            Err(_) => Err(UploadError::Transport("snapshot store poisoned".into())),
        }
    }
}

/// In-memory job queue used by the demo binary and tests.
#[derive(Default)]
pub struct MemoryJobQueue {
    jobs: Mutex<Vec<GenerationJobRequest>>,
    pub fail_enqueue: std::sync::atomic::AtomicBool,
}

impl MemoryJobQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn job_count(&self) -> usize {
        self.jobs.lock().map(|j| j.len()).unwrap_or(0)
    }

    pub fn last_job(&self) -> Option<GenerationJobRequest> {
        self.jobs.lock().ok()?.last().cloned()
    }

    pub fn set_failing(&self, failing: bool) {
        self.fail_enqueue.store(failing, std::sync::atomic::Ordering::SeqCst);
    }
}

impl JobQueue for MemoryJobQueue {
    fn enqueue_generation_job(&self, request: GenerationJobRequest) -> Result<JobHandle, EnqueueError> {
        if self.fail_enqueue.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(EnqueueError::Unavailable);
        }
        match self.jobs.lock() {
            Ok(mut jobs) => {
                let handle = JobHandle(request.idempotency_token.to_string());
                jobs.push(request);
                Ok(handle)
            }
            Err(_) => Err(EnqueueError::Unavailable),
        }
    }
}
