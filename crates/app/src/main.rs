//! Lumen example application.
//!
//! Opens a window and renders the classic RGB triangle, exercising the
//! full engine lifecycle: init, per-frame rendering, resize and minimize
//! handling, and teardown on close.

use anyhow::Result;
use tracing::{debug, error, info};
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::WindowId;

use lumen_core::Timer;
use lumen_platform::Window;
use lumen_renderer::{Engine, EngineConfig};

/// Log the frame rate once per this many seconds.
const FPS_LOG_INTERVAL_SECS: f32 = 5.0;

struct App {
    config: EngineConfig,
    window: Option<Window>,
    engine: Option<Engine>,
    timer: Timer,
    frames_since_log: u32,
    secs_since_log: f32,
}

impl App {
    fn new(config: EngineConfig) -> Self {
        Self {
            config,
            window: None,
            engine: None,
            timer: Timer::new(),
            frames_since_log: 0,
            secs_since_log: 0.0,
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            match Window::new(
                event_loop,
                self.config.width,
                self.config.height,
                &self.config.app_name,
            ) {
                Ok(window) => match Engine::new(&window, &self.config) {
                    Ok(engine) => {
                        info!("Initialization complete, entering main loop");
                        self.engine = Some(engine);
                        self.window = Some(window);
                    }
                    Err(e) => {
                        error!("Failed to create engine: {:?}", e);
                        event_loop.exit();
                    }
                },
                Err(e) => {
                    error!("Failed to create window: {}", e);
                    event_loop.exit();
                }
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                info!(
                    "Close requested after {:.1}s, shutting down",
                    self.timer.elapsed_secs()
                );
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                debug!("Window resized to {}x{}", size.width, size.height);
                if let Some(ref mut window) = self.window {
                    window.resize(size.width, size.height);
                }
                if let Some(ref mut engine) = self.engine {
                    engine.resize(size.width, size.height);
                }
            }
            WindowEvent::RedrawRequested => {
                // Skip frames while minimized; recreation inside
                // render_frame stalls on the framebuffer size as well
                if let Some(ref window) = self.window
                    && window.is_minimized()
                {
                    return;
                }

                if let (Some(window), Some(engine)) = (&self.window, &mut self.engine) {
                    if let Err(e) = engine.render_frame(window) {
                        error!("Render error: {:?}", e);
                        event_loop.exit();
                        return;
                    }

                    self.frames_since_log += 1;
                    self.secs_since_log += self.timer.delta_secs();
                    if self.secs_since_log >= FPS_LOG_INTERVAL_SECS {
                        info!(
                            "{:.1} fps",
                            self.frames_since_log as f32 / self.secs_since_log
                        );
                        self.frames_since_log = 0;
                        self.secs_since_log = 0.0;
                    }
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(ref window) = self.window {
            window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    lumen_core::init_logging();
    info!("Starting Lumen");

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(EngineConfig::default());
    event_loop.run_app(&mut app)?;

    Ok(())
}
