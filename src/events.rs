use crate::media::MediaToken;
use std::fmt;
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq)]
pub enum StudioEvent {
    RecordingStarted { total_frames: u32 },
    RecordingFinished { captured: u32, job: String },
    RecordingFailed { reason: String },
    RecordingCancelled,
    CacheHit { job: String },
    PreviewReady { token: MediaToken },
    PreviewFailed { reason: String },
    FrameSkipped { cursor: u32 },
    SelectionChanged,
    FkModeChanged { active: bool },
}

impl fmt::Display for StudioEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StudioEvent::RecordingStarted { total_frames } => {
                write!(f, "RecordingStarted total_frames={total_frames}")
            }
            StudioEvent::RecordingFinished { captured, job } => {
                write!(f, "RecordingFinished captured={captured} job={job}")
            }
            StudioEvent::RecordingFailed { reason } => write!(f, "RecordingFailed reason={reason}"),
            StudioEvent::RecordingCancelled => write!(f, "RecordingCancelled"),
            StudioEvent::CacheHit { job } => write!(f, "CacheHit job={job}"),
            StudioEvent::PreviewReady { token } => write!(f, "PreviewReady token={}", token.0),
            StudioEvent::PreviewFailed { reason } => write!(f, "PreviewFailed reason={reason}"),
            StudioEvent::FrameSkipped { cursor } => write!(f, "FrameSkipped cursor={cursor}"),
            StudioEvent::SelectionChanged => write!(f, "SelectionChanged"),
            StudioEvent::FkModeChanged { active } => write!(f, "FkModeChanged active={active}"),
        }
    }
}

#[derive(Default)]
pub struct EventBus {
    events: Vec<StudioEvent>,
}

impl EventBus {
    pub fn push(&mut self, event: StudioEvent) {
        self.events.push(event);
    }

    pub fn drain(&mut self) -> Vec<StudioEvent> {
        self.events.drain(..).collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProgressUpdate {
    pub progress: u8,
    pub label: String,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
}

/// UI notification surface. The editor only ever produces updates; it never
/// reads anything back.
pub trait StatusSink: Send + Sync {
    fn progress(&self, update: ProgressUpdate);

    fn toast(&self, kind: ToastKind, message: &str);
}

pub struct NullStatusSink;

impl StatusSink for NullStatusSink {
    fn progress(&self, _update: ProgressUpdate) {}

    fn toast(&self, _kind: ToastKind, _message: &str) {}
}

/// Logs every update to stderr with the tag scheme the rest of the crate
/// uses.
pub struct ConsoleStatusSink;

impl StatusSink for ConsoleStatusSink {
    fn progress(&self, update: ProgressUpdate) {
        eprintln!("[status] {}% {} - {}", update.progress, update.label, update.message);
    }

    fn toast(&self, kind: ToastKind, message: &str) {
        match kind {
            ToastKind::Success => eprintln!("[status] ok: {message}"),
            ToastKind::Error => eprintln!("[status] error: {message}"),
        }
    }
}

/// Test double that records everything it is told.
#[derive(Default)]
pub struct MemoryStatusSink {
    pub updates: Mutex<Vec<ProgressUpdate>>,
    pub toasts: Mutex<Vec<(ToastKind, String)>>,
}

impl MemoryStatusSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn toast_count(&self, kind: ToastKind) -> usize {
        self.toasts.lock().map(|t| t.iter().filter(|(k, _)| *k == kind).count()).unwrap_or(0)
    }

    pub fn last_progress(&self) -> Option<ProgressUpdate> {
        self.updates.lock().ok()?.last().cloned()
    }
}

impl StatusSink for MemoryStatusSink {
    fn progress(&self, update: ProgressUpdate) {
        if let Ok(mut updates) = self.updates.lock() {
            updates.push(update);
        }
    }

    fn toast(&self, kind: ToastKind, message: &str) {
        if let Ok(mut toasts) = self.toasts.lock() {
            toasts.push((kind, message.to_string()));
        }
    }
}
