use anyhow::{Context, Result};
use ouroboros::self_referencing;
use winit::application::ApplicationHandler;
use winit::dpi::{LogicalSize, PhysicalSize};
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::core::{App, AppControl, FrameCtx, StartCtx, StopCtx};
use crate::device::{Gpu, GpuInit};
use crate::input::{self, InputState};
use crate::time::FrameClock;

/// Title and initial size of the runtime's window.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    pub size: LogicalSize<f64>,
}

impl RuntimeConfig {
    /// `width` and `height` are logical pixels.
    pub fn new(title: impl Into<String>, width: f64, height: f64) -> Self {
        Self {
            title: title.into(),
            size: LogicalSize::new(width, height),
        }
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self::new("tumble", 800.0, 600.0)
    }
}

/// Runs one app in one window until it exits or the window closes.
///
/// A redraw is requested after every event batch, so `on_frame` runs once
/// per present (the display refresh under FIFO).
pub struct Runtime;

impl Runtime {
    pub fn run<A: App + 'static>(config: RuntimeConfig, gpu_init: GpuInit, app: A) -> Result<()> {
        let event_loop = EventLoop::new().context("failed to create the event loop")?;
        let mut driver = Driver {
            config,
            gpu_init,
            app,
            session: None,
            phase: Phase::Waiting,
            error: None,
        };
        event_loop
            .run_app(&mut driver)
            .context("event loop exited with an error")?;
        driver.error.map_or(Ok(()), Err)
    }
}

/// A window and the GPU surface that borrows it.
#[self_referencing]
struct Session {
    input: InputState,
    clock: FrameClock,
    window: Window,
    #[borrows(window)]
    #[covariant]
    gpu: Gpu<'this>,
}

impl Session {
    fn open(event_loop: &ActiveEventLoop, config: &RuntimeConfig, gpu_init: GpuInit) -> Result<Self> {
        let attrs = Window::default_attributes()
            .with_title(config.title.as_str())
            .with_inner_size(config.size);
        let window = event_loop.create_window(attrs).context("failed to create the window")?;

        SessionTryBuilder {
            input: InputState::default(),
            clock: FrameClock::new(),
            window,
            gpu_builder: |window| pollster::block_on(Gpu::new(window, gpu_init)),
        }
        .try_build()
        .context("failed to set up the GPU")
    }

    fn request_redraw(&self) {
        self.with_window(|w| w.request_redraw());
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum Phase {
    /// No window yet.
    Waiting,
    /// `on_start` succeeded; `on_stop` is still owed.
    Running,
    Stopped,
}

struct Driver<A> {
    config: RuntimeConfig,
    gpu_init: GpuInit,
    app: A,
    session: Option<Session>,
    phase: Phase,
    error: Option<anyhow::Error>,
}

impl<A: App> Driver<A> {
    fn launch(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let mut session = Session::open(event_loop, &self.config, self.gpu_init.clone())?;
        let app = &mut self.app;
        session.with_mut(|s| {
            app.on_start(&mut StartCtx {
                window: s.window,
                gpu: &*s.gpu,
            })
        })?;
        self.session = Some(session);
        self.phase = Phase::Running;
        Ok(())
    }

    /// Gives the app its `on_stop` (if it started) and drops the window.
    fn stop(&mut self, event_loop: &ActiveEventLoop) {
        event_loop.exit();
        if self.phase == Phase::Stopped {
            return;
        }
        let was_running = self.phase == Phase::Running;
        self.phase = Phase::Stopped;

        let Some(mut session) = self.session.take() else {
            return;
        };
        if was_running {
            let app = &mut self.app;
            session.with_mut(|s| {
                app.on_stop(&mut StopCtx {
                    window: s.window,
                    gpu: s.gpu,
                })
            });
        }
        drop(session);
        log::debug!("window closed");
    }

    fn deliver_input(&mut self, event: &WindowEvent) -> AppControl {
        let (app, Some(session)) = (&mut self.app, self.session.as_mut()) else {
            return AppControl::Continue;
        };
        session.with_mut(|s| match input::translate(s.window, event) {
            Some(ev) => {
                s.input.apply(&ev);
                app.on_input(&ev, s.input)
            }
            None => AppControl::Continue,
        })
    }

    fn resize(&mut self, size: Option<PhysicalSize<u32>>) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let size = size.unwrap_or_else(|| session.with_window(|w| w.inner_size()));
        session.with_gpu_mut(|gpu| gpu.resize(size));
        session.request_redraw();
    }

    fn redraw(&mut self) -> AppControl {
        let (app, Some(session)) = (&mut self.app, self.session.as_mut()) else {
            return AppControl::Continue;
        };
        session.with_mut(|s| {
            let time = s.clock.tick();
            app.on_frame(&mut FrameCtx {
                window: s.window,
                gpu: s.gpu,
                input: s.input,
                time,
            })
        })
    }
}

impl<A: App> ApplicationHandler for Driver<A> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.phase != Phase::Waiting {
            return;
        }
        match self.launch(event_loop) {
            Ok(()) => {
                if let Some(session) = self.session.as_ref() {
                    session.request_redraw();
                }
            }
            Err(e) => {
                log::error!("startup failed: {e:#}");
                self.error = Some(e);
                self.stop(event_loop);
            }
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.phase == Phase::Stopped {
            event_loop.exit();
            return;
        }
        event_loop.set_control_flow(ControlFlow::Wait);
        if let Some(session) = self.session.as_ref() {
            session.request_redraw();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        if self.phase != Phase::Running {
            return;
        }
        if self.deliver_input(&event) == AppControl::Exit {
            self.stop(event_loop);
            return;
        }

        let control = match event {
            WindowEvent::CloseRequested => {
                log::info!("close requested");
                AppControl::Exit
            }
            WindowEvent::Resized(size) => {
                self.resize(Some(size));
                AppControl::Continue
            }
            WindowEvent::ScaleFactorChanged { .. } => {
                self.resize(None);
                AppControl::Continue
            }
            WindowEvent::RedrawRequested => self.redraw(),
            _ => AppControl::Continue,
        };
        if control == AppControl::Exit {
            self.stop(event_loop);
        }
    }

    fn exiting(&mut self, event_loop: &ActiveEventLoop) {
        self.stop(event_loop);
    }
}
