//! Handle given to app renderers for the frame in flight.

mod target;

pub use target::RenderTarget;
