//! Redraw timing: one `FrameClock` per window, ticked on every redraw.

mod frame_clock;

pub use frame_clock::{FrameClock, FrameTime};
