//! GPU device and window surface.
//!
//! `Gpu` owns the wgpu device/queue and the configured surface, hands out one
//! `GpuFrame` per redraw and recovers from lost or outdated swapchains.

mod frame;
mod gpu;
mod init;
mod surface;

pub use frame::GpuFrame;
pub use gpu::Gpu;
pub use init::GpuInit;
pub use surface::SurfaceErrorAction;
