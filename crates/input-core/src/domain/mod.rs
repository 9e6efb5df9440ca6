//! Pure value types shared by every other module.
//!
//! Nothing in here knows about devices, listeners or threads.  These are the
//! building blocks the manager moves around each frame.

pub mod change;
pub mod delta;
pub mod ids;
pub mod state;
pub mod value;
