//! Replaying a recording through the normal change pipeline.
//!
//! The player is a [`DeviceStateModifier`].  While playing it marks every
//! device in the recording as synced, so local backend input cannot fight the
//! replay, and each frame pushes the entries whose timestamp has been reached.
//! Replayed changes go through the queue like any other, so listeners and
//! the recorder see them exactly as they saw the live input.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::domain::change::Change;
use crate::domain::ids::{DeviceId, ModifierId};
use crate::manager::clock::Clock;
use crate::manager::modifiers::{DeviceStateModifier, ModifierContext};
use crate::manager::InputManager;
use crate::recording::recording::InputRecording;

#[derive(Debug, Default)]
struct PlayerState {
    recording: InputRecording,
    playing: bool,
    start_ms: u64,
    cursor: usize,
    /// Devices this player has marked synced and must release.
    synced: Vec<DeviceId>,
}

struct PlayerModifier {
    shared: Arc<Mutex<PlayerState>>,
}

impl DeviceStateModifier for PlayerModifier {
    fn update(&mut self, ctx: &mut ModifierContext<'_>) {
        let mut state = self.shared.lock().unwrap_or_else(PoisonError::into_inner);
        let state = &mut *state;

        if !state.playing {
            for device in state.synced.drain(..) {
                ctx.set_synced(device, false);
            }
            return;
        }

        if state.cursor == 0 && state.synced.is_empty() {
            state.synced = state.recording.devices();
            for &device in &state.synced {
                ctx.set_synced(device, true);
            }
        }

        let elapsed = ctx.time_ms().saturating_sub(state.start_ms);
        while let Some(entry) = state.recording.get(state.cursor) {
            if entry.time_ms > elapsed {
                break;
            }
            ctx.push(Change::new(entry.device, entry.button, entry.value));
            state.cursor += 1;
        }

        if state.cursor >= state.recording.len() {
            debug!(changes = state.cursor, elapsed, "playback finished");
            state.playing = false;
            for device in state.synced.drain(..) {
                ctx.set_synced(device, false);
            }
        }
    }

    fn priority(&self) -> i32 {
        i32::MAX
    }
}

/// Plays an [`InputRecording`] back into a manager.
#[derive(Debug)]
pub struct InputPlayer {
    shared: Arc<Mutex<PlayerState>>,
    clock: Clock,
    modifier: ModifierId,
}

impl InputPlayer {
    pub fn new(manager: &mut InputManager) -> Self {
        let shared = Arc::new(Mutex::new(PlayerState::default()));
        let modifier = manager.add_device_state_modifier(PlayerModifier {
            shared: Arc::clone(&shared),
        });
        Self {
            shared,
            clock: manager.clock(),
            modifier,
        }
    }

    fn state(&self) -> MutexGuard<'_, PlayerState> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replaces the recording.  Stops any playback in progress.
    pub fn set_recording(&self, recording: InputRecording) {
        let mut state = self.state();
        state.recording = recording;
        state.playing = false;
        state.cursor = 0;
    }

    /// Starts from the first entry.  Entries are released relative to the
    /// manager time at this call.
    pub fn start(&self) {
        let mut state = self.state();
        state.start_ms = self.clock.now_ms();
        state.cursor = 0;
        state.playing = !state.recording.is_empty();
    }

    /// Stops playback.  Devices are released from sync on the next update.
    pub fn stop(&self) {
        self.state().playing = false;
    }

    /// True until the last entry has been pushed or [`stop`](Self::stop) is
    /// called.
    pub fn is_playing(&self) -> bool {
        self.state().playing
    }

    pub fn detach(self, manager: &mut InputManager) -> InputRecording {
        manager.remove_device_state_modifier(self.modifier);
        let mut state = self.state();
        for device in state.synced.drain(..) {
            manager.set_synced(device, false);
        }
        std::mem::take(&mut state.recording)
    }
}
