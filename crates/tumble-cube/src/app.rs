use anyhow::Context;
use tumble_engine::core::{App, AppControl, FrameCtx, StartCtx, StopCtx};
use tumble_engine::input::{InputEvent, InputState};

use crate::config::CubeConfig;
use crate::gfx::wgpu_backend::WgpuGraphics;
use crate::pointer::PointerTracker;
use crate::render_loop::RenderLoop;
use crate::texture::TextureRequest;

/// The cube viewer as an engine app.
pub struct CubeApp {
    config: CubeConfig,
    gfx: Option<WgpuGraphics>,
    render_loop: RenderLoop,
    pointer: PointerTracker,
}

impl CubeApp {
    pub fn new(config: CubeConfig) -> Self {
        Self {
            render_loop: RenderLoop::new(config.scene),
            config,
            gfx: None,
            pointer: PointerTracker::new(),
        }
    }
}

impl App for CubeApp {
    fn on_start(&mut self, ctx: &mut StartCtx<'_, '_>) -> anyhow::Result<()> {
        let mut gfx = WgpuGraphics::new(
            ctx.gpu.device().clone(),
            ctx.gpu.queue().clone(),
            ctx.gpu.surface_format(),
        );
        self.render_loop
            .start(
                &mut gfx,
                ctx.gpu.aspect_ratio(),
                TextureRequest::file(&self.config.texture_path),
            )
            .context("failed to start the cube")?;
        self.gfx = Some(gfx);
        Ok(())
    }

    fn on_input(&mut self, event: &InputEvent, input: &InputState) -> AppControl {
        let Some(request) = self.pointer.handle(event, input) else {
            return AppControl::Continue;
        };
        let Some(gfx) = self.gfx.as_mut() else {
            return AppControl::Continue;
        };
        match self.render_loop.rotate(gfx, request.dx, request.dy) {
            Ok(()) => AppControl::Continue,
            Err(e) => {
                log::error!("rotate failed: {e}");
                AppControl::Exit
            }
        }
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        let Some(gfx) = self.gfx.as_mut() else {
            return AppControl::Continue;
        };

        match self.render_loop.animation(gfx) {
            Ok(true) => {}
            Ok(false) => log::trace!("frame {}: nothing scheduled", ctx.time.index),
            Err(e) => {
                log::error!("frame {} failed: {e}", ctx.time.index);
                return AppControl::Exit;
            }
        }

        ctx.render(self.config.clear_color, |target| gfx.flush(target))
    }

    fn on_stop(&mut self, ctx: &mut StopCtx<'_, '_>) {
        if let Some(mut gfx) = self.gfx.take() {
            self.render_loop.stop(&mut gfx);
        }
        ctx.present_clear(self.config.clear_color);
    }
}
