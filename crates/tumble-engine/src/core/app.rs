use crate::input::{InputEvent, InputState};

use super::ctx::{FrameCtx, StartCtx, StopCtx};

/// What the runtime should do after a callback.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// Callbacks the runtime drives for its window.
///
/// `on_start` runs once the surface exists and `on_stop` once before it
/// goes away. In between, `on_input` and `on_frame` arrive on the event-loop
/// thread in whatever order the platform delivers them.
pub trait App {
    /// Returning an error ends the runtime with that error.
    fn on_start(&mut self, ctx: &mut StartCtx<'_, '_>) -> anyhow::Result<()>;

    /// `input` already includes `event`.
    fn on_input(&mut self, event: &InputEvent, input: &InputState) -> AppControl {
        let _ = (event, input);
        AppControl::Continue
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl;

    fn on_stop(&mut self, ctx: &mut StopCtx<'_, '_>) {
        let _ = ctx;
    }
}
