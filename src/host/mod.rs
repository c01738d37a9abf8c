//! Desktop host: a winit window presenting engine frames through wgpu.
//!
//! The host owns no scene state. It translates window events into engine
//! input, ticks the engine once per redraw and uploads the finished frame.
//! If the GPU cannot be initialized the window closes and [`run`] returns
//! `Ok(())` without the engine ever starting.

mod present;

use std::sync::Arc;

use winit::{
    application::ApplicationHandler,
    dpi::LogicalSize,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowId},
};

use crate::engine::{Engine, FrameOutcome, LoopHandle};
use crate::error::HostError;
use crate::input;
use crate::time::FrameClock;

use present::Presenter;

const DEFAULT_WIDTH: f64 = 1280.0;
const DEFAULT_HEIGHT: f64 = 720.0;

/// Drive `engine` in a window until the window is closed.
pub fn run(engine: Engine) -> Result<(), HostError> {
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(engine);
    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

struct App {
    engine: Engine,
    window: Option<Arc<Window>>,
    presenter: Option<Presenter>,
    handle: Option<LoopHandle>,
    clock: FrameClock,
    occluded: bool,
    error: Option<HostError>,
}

impl App {
    fn new(engine: Engine) -> Self {
        Self {
            engine,
            window: None,
            presenter: None,
            handle: None,
            clock: FrameClock::new(),
            occluded: false,
            error: None,
        }
    }

    fn shutdown(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(handle) = self.handle.take() {
            handle.cancel();
        }
        self.engine.stop();
        event_loop.exit();
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let dt = self.clock.tick();
        match self.engine.tick(dt) {
            FrameOutcome::Rendered(_) => {}
            FrameOutcome::Deferred => return,
            FrameOutcome::Stopped => {
                event_loop.exit();
                return;
            }
        }

        let Some(presenter) = self.presenter.as_mut() else {
            return;
        };
        match presenter.present(self.engine.surface()) {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                presenter.reconfigure();
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("GPU out of memory, closing");
                self.shutdown(event_loop);
            }
            Err(e) => log::warn!("present failed: {:?}", e),
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attrs = Window::default_attributes()
            .with_title(self.engine.name())
            .with_inner_size(LogicalSize::new(DEFAULT_WIDTH, DEFAULT_HEIGHT));
        let window = match event_loop.create_window(attrs) {
            Ok(window) => Arc::new(window),
            Err(err) => {
                self.error = Some(err.into());
                event_loop.exit();
                return;
            }
        };
        self.window = Some(window.clone());

        match pollster::block_on(Presenter::new(window.clone())) {
            Ok(presenter) => self.presenter = Some(presenter),
            Err(err) => {
                log::warn!("graphics unavailable, not starting: {}", err);
                event_loop.exit();
                return;
            }
        }

        self.handle = Some(self.engine.start());
        let size = window.inner_size();
        let scale = window.scale_factor();
        self.engine
            .push_input(input::InputEvent::Resize(input::logical_size(size, scale)));
        window.request_redraw();
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let Some(window) = self.window.clone() else {
            return;
        };

        match &event {
            WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                self.shutdown(event_loop);
                return;
            }
            WindowEvent::Resized(size) => {
                if let Some(presenter) = self.presenter.as_mut() {
                    presenter.resize(*size);
                }
            }
            WindowEvent::Occluded(occluded) => {
                self.occluded = *occluded;
                if *occluded {
                    self.clock.pause();
                } else {
                    self.clock.resume();
                    window.request_redraw();
                }
                return;
            }
            WindowEvent::RedrawRequested => {
                self.redraw(event_loop);
                return;
            }
            _ => {}
        }

        let message = input::translate(&event, window.inner_size(), window.scale_factor());
        if let Some(message) = message {
            self.engine.push_input(message);
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if self.occluded {
            return;
        }
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}
