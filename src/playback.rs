use thiserror::Error;

/// What the editor session is currently doing with the timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Editing,
    Previewing,
    Recording,
}

impl PlaybackState {
    pub fn label(self) -> &'static str {
        match self {
            PlaybackState::Editing => "editing",
            PlaybackState::Previewing => "previewing",
            PlaybackState::Recording => "recording",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    BeginPreview,
    EndPreview,
    BeginRecording,
    EndRecording,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Transition {transition:?} is not valid from {from:?}")]
pub struct TransitionRejected {
    pub from: PlaybackState,
    pub transition: Transition,
}

/// Owns the playback state, the timeline cursor, and the single-finalize
/// guard. All state changes go through `try_transition`; invalid requests
/// are rejected by construction instead of being filtered by ad-hoc
/// boolean flags at every call site.
pub struct PlaybackStateMachine {
    state: PlaybackState,
    cursor: u32,
    advancing: bool,
    total_frames: u32,
    finalize_in_flight: bool,
}

impl PlaybackStateMachine {
    pub fn new(total_frames: u32) -> Self {
        Self {
            state: PlaybackState::Editing,
            cursor: 0,
            advancing: false,
            total_frames: total_frames.max(1),
            finalize_in_flight: false,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn cursor(&self) -> u32 {
        self.cursor
    }

    pub fn is_advancing(&self) -> bool {
        self.advancing
    }

    pub fn total_frames(&self) -> u32 {
        self.total_frames
    }

    pub fn set_total_frames(&mut self, total: u32) {
        self.total_frames = total.max(1);
        self.cursor = self.cursor.min(self.total_frames);
    }

    pub fn finalize_in_flight(&self) -> bool {
        self.finalize_in_flight
    }

    pub fn try_transition(&mut self, transition: Transition) -> Result<PlaybackState, TransitionRejected> {
        let next = match (self.state, transition) {
            (PlaybackState::Editing, Transition::BeginPreview) => PlaybackState::Previewing,
            (PlaybackState::Previewing, Transition::EndPreview) => PlaybackState::Editing,
            (PlaybackState::Editing, Transition::BeginRecording) if !self.finalize_in_flight => {
                self.cursor = 0;
                self.advancing = true;
                PlaybackState::Recording
            }
            (PlaybackState::Recording, Transition::EndRecording) => {
                self.cursor = 0;
                self.advancing = false;
                self.finalize_in_flight = true;
                PlaybackState::Editing
            }
            (from, transition) => return Err(TransitionRejected { from, transition }),
        };
        self.state = next;
        Ok(next)
    }

    /// Steps the cursor one frame. Returns `false` once the timeline end is
    /// reached, which is the signal to end the recording.
    pub fn advance_cursor(&mut self) -> bool {
        if !self.advancing {
            return false;
        }
        if self.cursor + 1 >= self.total_frames {
            self.cursor = self.total_frames;
            false
        } else {
            self.cursor += 1;
            true
        }
    }

    /// Manual scrub while not advancing.
    pub fn scrub_to(&mut self, frame: u32) -> bool {
        if self.advancing || self.state != PlaybackState::Editing {
            return false;
        }
        self.cursor = frame.min(self.total_frames);
        true
    }

    /// Called when the background finalize worker reports in, success or
    /// failure. Unblocks the next recording.
    pub fn finalize_complete(&mut self) {
        self.finalize_in_flight = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_round_trip_resets_cursor() {
        let mut machine = PlaybackStateMachine::new(10);
        machine.try_transition(Transition::BeginRecording).unwrap();
        assert_eq!(machine.state(), PlaybackState::Recording);
        while machine.advance_cursor() {}
        assert_eq!(machine.cursor(), 10);
        machine.try_transition(Transition::EndRecording).unwrap();
        assert_eq!(machine.state(), PlaybackState::Editing);
        assert_eq!(machine.cursor(), 0);
    }

    #[test]
    fn preview_cannot_start_while_recording() {
        let mut machine = PlaybackStateMachine::new(10);
        machine.try_transition(Transition::BeginRecording).unwrap();
        let err = machine.try_transition(Transition::BeginPreview).unwrap_err();
        assert_eq!(err.from, PlaybackState::Recording);
    }

    #[test]
    fn second_recording_blocked_until_finalize_completes() {
        let mut machine = PlaybackStateMachine::new(10);
        machine.try_transition(Transition::BeginRecording).unwrap();
        machine.try_transition(Transition::EndRecording).unwrap();
        assert!(machine.finalize_in_flight());
        assert!(machine.try_transition(Transition::BeginRecording).is_err());
        machine.finalize_complete();
        assert!(machine.try_transition(Transition::BeginRecording).is_ok());
    }

    #[test]
    fn cursor_stops_at_timeline_end() {
        let mut machine = PlaybackStateMachine::new(3);
        machine.try_transition(Transition::BeginRecording).unwrap();
        assert!(machine.advance_cursor());
        assert!(machine.advance_cursor());
        assert!(!machine.advance_cursor());
        assert_eq!(machine.cursor(), 3);
        assert!(!machine.advance_cursor());
        assert_eq!(machine.cursor(), 3);
    }

    #[test]
    fn scrub_only_while_editing_and_idle() {
        let mut machine = PlaybackStateMachine::new(30);
        assert!(machine.scrub_to(12));
        assert_eq!(machine.cursor(), 12);
        assert!(machine.scrub_to(99));
        assert_eq!(machine.cursor(), 30);
        machine.try_transition(Transition::BeginRecording).unwrap();
        assert!(!machine.scrub_to(5));
    }

    #[test]
    fn end_recording_from_editing_is_rejected() {
        let mut machine = PlaybackStateMachine::new(10);
        assert!(machine.try_transition(Transition::EndRecording).is_err());
    }
}
