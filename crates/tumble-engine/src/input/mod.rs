//! Window input.
//!
//! winit events are translated into `InputEvent`s and folded into one
//! `InputState` per window. Apps never see winit types from here.

mod event;
mod state;
mod translate;

pub use event::{InputEvent, MouseButton, TouchPhase, TouchPoint};
pub use state::InputState;

pub(crate) use translate::translate;
