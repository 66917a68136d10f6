use crate::camera_rig::AspectRatio;
use crate::freefly::MoveAxis;
use crate::selection::HandleMode;
use glam::Vec2;

/// Everything the UI layer can ask the editor to do. Commands are queued by
/// input handlers and drained exactly once per tick, so a burst of events
/// between two ticks cannot interleave with render state mid-frame.
#[derive(Debug, Clone, PartialEq)]
pub enum EditorCommand {
    Move { axis: MoveAxis, active: bool },
    SetSpeedModifiers { fast: bool, slow: bool },
    Look { delta: Vec2 },
    Pan { delta: Vec2 },
    Zoom { amount: f32 },
    PointerClick { x: f32, y: f32 },
    SetHandleMode(HandleMode),
    ToggleFkMode,
    DeleteSelected,
    Deselect,
    ToggleCameraMode,
    SetAspectRatio(AspectRatio),
    ScrubTo(u32),
    EnterPreview,
    StartRecording,
    CancelRecording,
}

#[derive(Default)]
pub struct CommandQueue {
    pending: Vec<EditorCommand>,
}

impl CommandQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, command: EditorCommand) {
        self.pending.push(command);
    }

    pub fn drain(&mut self) -> Vec<EditorCommand> {
        self.pending.drain(..).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
