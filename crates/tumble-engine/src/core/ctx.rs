use winit::dpi::PhysicalSize;
use winit::window::Window;

use crate::device::{Gpu, GpuFrame, SurfaceErrorAction};
use crate::input::InputState;
use crate::render::RenderTarget;
use crate::time::FrameTime;

use super::app::AppControl;

/// Handed to `App::on_start` once the surface is configured.
pub struct StartCtx<'a, 'w> {
    pub window: &'a Window,
    pub gpu: &'a Gpu<'w>,
}

/// Handed to `App::on_frame` on every redraw.
///
/// `'a` is the callback, `'w` the window borrow held by the surface.
pub struct FrameCtx<'a, 'w> {
    pub window: &'a Window,
    pub gpu: &'a mut Gpu<'w>,
    pub input: &'a InputState,
    pub time: FrameTime,
}

impl FrameCtx<'_, '_> {
    /// Acquires the next image, clears it to `clear`, lets `draw` record on
    /// top and presents. A frame that cannot be acquired is skipped; `Exit`
    /// comes back only when the device is gone.
    pub fn render<F>(&mut self, clear: wgpu::Color, draw: F) -> AppControl
    where
        F: FnOnce(&mut RenderTarget<'_>),
    {
        present(self.gpu, self.window, clear, draw)
    }
}

/// Handed to `App::on_stop` right before the surface is dropped.
pub struct StopCtx<'a, 'w> {
    pub window: &'a Window,
    pub gpu: &'a mut Gpu<'w>,
}

impl StopCtx<'_, '_> {
    /// Shows one frame holding only `clear`.
    pub fn present_clear(&mut self, clear: wgpu::Color) {
        if present(self.gpu, self.window, clear, |_| {}) == AppControl::Exit {
            log::warn!("could not present the final frame");
        }
    }
}

fn present<F>(gpu: &mut Gpu<'_>, window: &Window, clear: wgpu::Color, draw: F) -> AppControl
where
    F: FnOnce(&mut RenderTarget<'_>),
{
    let mut frame = match gpu.begin_frame() {
        Ok(frame) => frame,
        Err(err) => {
            return match gpu.handle_surface_error(err) {
                SurfaceErrorAction::Fatal => AppControl::Exit,
                SurfaceErrorAction::Reconfigured | SurfaceErrorAction::SkipFrame => {
                    window.request_redraw();
                    AppControl::Continue
                }
            };
        }
    };

    clear_view(&mut frame, clear);

    let texture = &frame.surface_texture.texture;
    let size = PhysicalSize::new(texture.width(), texture.height());
    let mut target = RenderTarget {
        encoder: &mut frame.encoder,
        view: &frame.view,
        size,
    };
    draw(&mut target);

    window.pre_present_notify();
    gpu.submit(frame);
    AppControl::Continue
}

fn clear_view(frame: &mut GpuFrame, color: wgpu::Color) {
    let _pass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some("tumble clear"),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view: &frame.view,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(color),
                store: wgpu::StoreOp::Store,
            },
            depth_slice: None,
        })],
        depth_stencil_attachment: None,
        timestamp_writes: None,
        occlusion_query_set: None,
        multiview_mask: None,
    });
}
