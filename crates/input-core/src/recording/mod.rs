//! Capture and replay of change streams.
//!
//! An [`InputRecorder`] taps the listener chain and logs every committed
//! transition with its time relative to `start`.  An [`InputPlayer`] feeds a
//! recording back through the manager's change queue from a modifier, so
//! replayed input takes exactly the same apply-and-dispatch path as live
//! input and listeners cannot tell the two apart.

pub mod player;
pub mod recorder;
pub mod recording;

pub use player::InputPlayer;
pub use recorder::{InputRecorder, RecordingRef};
pub use recording::{InputRecording, RecordedChange, RecordingError, RECORDING_FORMAT_VERSION};
