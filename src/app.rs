use std::sync::Arc;

use wgpu::{Backends, InstanceDescriptor, Surface, SurfaceError, SurfaceTarget};
use winit::{
    application::ApplicationHandler,
    event::{ElementState, WindowEvent},
    event_loop::ActiveEventLoop,
    window::{Fullscreen, Window, WindowId, WindowLevel},
};

use crate::{
    cmd::Cmd,
    config::Config,
    gpu::{Batch, Gpu, GpuCanvas, Pass},
    guard::InjectionGuard,
    input::{self, Pointer},
    math::{vec2, Vec2f},
    overlay::{Overlay, Response},
    render::{Clock, FrameScheduler, FrameTask},
};

impl FrameScheduler for Arc<Window> {
    fn request_frame(&self) {
        self.request_redraw();
    }
}

pub struct App {
    config: Config,
    guard: InjectionGuard,
    instance: wgpu::Instance,
    win: Option<Win>,
    /// Error that shut the event loop down, reported once it returns.
    fatal: Option<anyhow::Error>,
}

struct Win {
    window: Arc<Window>,
    surface: Surface<'static>,
    gpu: Gpu,

    canvas: GpuCanvas,
    batch: Batch,

    overlay: Overlay,
    frames: Option<FrameTask<Arc<Window>>>,
    clock: Clock,
    pointer: Pointer,
}

impl Win {
    fn viewport(&self) -> Vec2f {
        let size = self.window.inner_size();
        vec2(size.width as f32, size.height as f32)
    }

    fn recreate_swapchain(&self) -> anyhow::Result<()> {
        let res = self.window.inner_size();
        let config = self.gpu.surface_config(&self.surface, res.width, res.height)?;

        log::debug!(
            "configuring window surface for {}x{} (format: {:?}, present mode: {:?}, alpha mode: {:?})",
            res.width,
            res.height,
            config.format,
            config.present_mode,
            config.alpha_mode,
        );

        self.surface.configure(self.gpu.device(), &config);
        Ok(())
    }

    fn redraw(&mut self) -> anyhow::Result<()> {
        let st = match self.surface.get_current_texture() {
            Ok(st) => st,
            Err(err @ (SurfaceError::Outdated | SurfaceError::Lost)) => {
                log::debug!("surface error: {}", err);
                self.recreate_swapchain()?;
                self.surface.get_current_texture()?
            }
            Err(SurfaceError::Timeout) => {
                log::debug!("timed out acquiring frame, skipping it");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        self.overlay.render(&mut self.canvas, self.clock.now());
        self.batch.upload(
            &self.gpu,
            &self.canvas,
            [st.texture.width(), st.texture.height()],
        );

        let mut enc = self.gpu.device().create_command_encoder(&Default::default());
        let mut pass = Pass::new(&self.gpu, &mut enc, &st.texture);
        self.batch.draw(&mut pass);
        drop(pass);

        self.gpu.queue().submit([enc.finish()]);
        self.window.pre_present_notify();
        st.present();
        Ok(())
    }
}

impl App {
    pub fn new(config: Config, guard: InjectionGuard) -> Self {
        Self {
            config,
            guard,
            instance: wgpu::Instance::new(&InstanceDescriptor {
                backends: Backends::PRIMARY,
                ..Default::default()
            }),
            win: None,
            fatal: None,
        }
    }

    /// Returns the error that stopped the event loop, if any.
    pub fn into_result(self) -> anyhow::Result<()> {
        match self.fatal {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn create_win(&self, event_loop: &ActiveEventLoop) -> anyhow::Result<Option<Win>> {
        let monitor = match &self.config.monitor {
            Some(name) => {
                let found = event_loop
                    .available_monitors()
                    .find(|m| m.name().as_deref() == Some(name.as_str()));
                if found.is_none() {
                    log::warn!("no monitor named '{name}', using the primary monitor");
                }
                found.or_else(|| event_loop.primary_monitor())
            }
            None => event_loop.primary_monitor(),
        };

        let window = Arc::new(
            event_loop.create_window(
                Window::default_attributes()
                    .with_window_level(WindowLevel::AlwaysOnTop)
                    .with_transparent(true)
                    .with_decorations(false)
                    .with_fullscreen(Some(Fullscreen::Borderless(monitor)))
                    .with_title("glowpen"),
            )?,
        );

        let size = window.inner_size();
        let viewport = vec2(size.width as f32, size.height as f32);
        let Some(overlay) = Overlay::inject(&self.guard, &self.config, viewport) else {
            return Ok(None);
        };

        let surface = self
            .instance
            .create_surface(SurfaceTarget::from(window.clone()))?;
        let gpu = Gpu::new(&self.instance, &surface)?;
        let batch = Batch::new(&gpu);

        let mut win = Win {
            window: window.clone(),
            surface,
            gpu,
            canvas: GpuCanvas::default(),
            batch,
            overlay,
            frames: None,
            clock: Clock::start(),
            pointer: Pointer::default(),
        };
        win.recreate_swapchain()?;
        win.frames = Some(FrameTask::start(window));
        Ok(Some(win))
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, e: anyhow::Error) {
        log::error!("{e:#}");
        self.fatal = Some(e);
        self.teardown(event_loop);
    }

    /// Stops the render loop, destroys the window along with its surface, and leaves the event
    /// loop.
    fn teardown(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(mut win) = self.win.take() {
            if let Some(frames) = win.frames.take() {
                frames.stop();
            }
            win.overlay.exit();
        }
        event_loop.exit();
    }

    fn dispatch(&mut self, event_loop: &ActiveEventLoop, cmd: Cmd) {
        let Some(win) = &mut self.win else { return };
        match win.overlay.handle(cmd, win.clock.now()) {
            Response::Continue | Response::Ignored => {}
            Response::Blank => {
                if let Err(e) = win.redraw() {
                    self.fail(event_loop, e);
                }
            }
            Response::Exited => self.teardown(event_loop),
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.win.is_some() {
            return;
        }
        match self.create_win(event_loop) {
            Ok(Some(win)) => self.win = Some(win),
            Ok(None) => event_loop.exit(),
            Err(e) => self.fail(event_loop, e.context("could not create overlay window")),
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(win) = &mut self.win else { return };

        let cmd = match event {
            WindowEvent::CloseRequested => Some(Cmd::Exit),
            WindowEvent::RedrawRequested => {
                if let Err(e) = win.redraw() {
                    return self.fail(event_loop, e);
                }
                if let Some(frames) = &win.frames {
                    frames.tick();
                }
                None
            }
            WindowEvent::Resized(_) => {
                if let Err(e) = win.recreate_swapchain() {
                    return self.fail(event_loop, e);
                }
                let viewport = win.viewport();
                win.overlay.resize(viewport);
                win.window.request_redraw();
                None
            }
            WindowEvent::CursorMoved { position, .. } => {
                Some(win.pointer.moved(position.x, position.y))
            }
            WindowEvent::MouseInput { state, button, .. } => win.pointer.button(state, button),
            WindowEvent::KeyboardInput { event, .. }
                if event.state == ElementState::Pressed && !event.repeat =>
            {
                input::key_cmd(&self.config, &event.logical_key)
            }
            _ => None,
        };

        if let Some(cmd) = cmd {
            self.dispatch(event_loop, cmd);
        }
    }
}
