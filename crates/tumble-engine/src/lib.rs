//! Window, GPU surface, input and frame pacing for the tumble viewer.
//!
//! An app implements [`core::App`] and hands it to [`window::Runtime::run`];
//! the runtime owns the window and calls back into the app for start, input,
//! every redraw and stop.

pub mod core;
pub mod device;
pub mod input;
pub mod logging;
pub mod render;
pub mod time;
pub mod window;
