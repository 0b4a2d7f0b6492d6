//! A textured cube you can spin with the mouse or a finger.
//!
//! `render_loop` owns the cube's GPU objects and draws it once per frame
//! through the `gfx::GraphicsContext` API; `pointer` turns drags into
//! rotations; `app` wires both into the engine runtime.

pub mod app;
pub mod camera;
pub mod config;
pub mod geometry;
pub mod gfx;
pub mod pointer;
pub mod render_loop;
pub mod schedule;
pub mod shading;
pub mod texture;

pub use app::CubeApp;
pub use config::CubeConfig;
