//! Sonoscore - an interactive audiovisual installation
//!
//! A captured frame becomes a graphical score; coloured players sweep it and
//! the audio engine sonifies what they cross.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;
use winit::{
    application::ApplicationHandler,
    event::*,
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use sonoscore::audio::AudioSystem;
use sonoscore::camera::{self, FrameSource};
use sonoscore::cli::Args;
use sonoscore::error::{InitError, RenderError};
use sonoscore::messages::Inbox;
use sonoscore::params::{PlayerRosterConfig, RenderConfig, SessionConfig};
use sonoscore::rendering::{self, Canvas, RenderSystem};
use sonoscore::session::SessionController;

/// Main application state
struct App {
    // Window and rendering
    window: Option<Arc<Window>>,
    render_system: Option<RenderSystem>,
    canvas: Canvas,

    // Installation
    session: SessionController<AudioSystem>,
    camera: Box<dyn FrameSource>,

    // Configuration
    render_config: RenderConfig,

    /// Set when the renderer could not start
    failed: bool,
}

impl App {
    fn new(args: &Args) -> Result<Self, InitError> {
        let score_config = args.score_config();
        let audio_config = args.audio_config();
        let session_config = SessionConfig::default();
        let roster = PlayerRosterConfig::default();
        score_config.validate()?;

        let camera = camera::open(
            &args.camera_preset(),
            score_config.width,
            score_config.height,
        )?;

        let (inbox_tx, inbox) = Inbox::channel(session_config.inbox_capacity);
        let audio = AudioSystem::new(&audio_config, &score_config, &roster, inbox_tx)?;

        let session = SessionController::new(
            &score_config,
            &session_config,
            &roster,
            audio_config.wait_seconds,
            audio,
            inbox,
        )?;

        Ok(Self {
            window: None,
            render_system: None,
            canvas: Canvas::new(score_config.width, score_config.height),
            session,
            camera,
            render_config: args.render_config(),
            failed: false,
        })
    }

    fn init_graphics(&mut self, event_loop: &ActiveEventLoop) -> Result<(), InitError> {
        let window_attributes = Window::default_attributes()
            .with_title(self.render_config.title.clone())
            .with_inner_size(winit::dpi::PhysicalSize::new(
                self.render_config.window_width,
                self.render_config.window_height,
            ));

        let window = Arc::new(
            event_loop
                .create_window(window_attributes)
                .map_err(|e| RenderError::Window(e.to_string()))?,
        );

        let render_system = pollster::block_on(RenderSystem::new(
            Arc::clone(&window),
            self.canvas.width(),
            self.canvas.height(),
        ))?;

        self.window = Some(window);
        self.render_system = Some(render_system);
        Ok(())
    }

    /// One session tick, composed and presented
    fn render_frame(&mut self, event_loop: &ActiveEventLoop) {
        let Some(ref mut render_system) = self.render_system else {
            return;
        };

        self.session.tick(self.camera.as_mut());
        rendering::compose(&mut self.canvas, &self.session, &self.render_config);
        render_system.upload(&self.canvas);

        match render_system.render() {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                if let Some(window) = &self.window {
                    let size = window.inner_size();
                    render_system.resize(size.width, size.height);
                }
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                tracing::error!("GPU out of memory");
                event_loop.exit();
            }
            Err(e) => tracing::warn!(err = ?e, "frame dropped"),
        }
    }
}

impl ApplicationHandler for App {
    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return; // Already initialized
        }

        if let Err(err) = self.init_graphics(event_loop) {
            tracing::error!(%err, "startup failed");
            self.failed = true;
            event_loop.exit();
            return;
        }

        tracing::info!(camera = %self.camera.describe(), "Sonoscore is running, press ESC to quit");
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state: ElementState::Pressed,
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        ..
                    },
                ..
            } => event_loop.exit(),
            WindowEvent::Resized(size) => {
                if let Some(render_system) = &mut self.render_system {
                    render_system.resize(size.width, size.height);
                }
            }
            WindowEvent::RedrawRequested => self.render_frame(event_loop),
            _ => {}
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let mut app = match App::new(&args) {
        Ok(app) => app,
        Err(err) => {
            tracing::error!(%err, "startup failed");
            return ExitCode::FAILURE;
        }
    };

    let event_loop = match EventLoop::new() {
        Ok(event_loop) => event_loop,
        Err(err) => {
            tracing::error!(%err, "failed to create event loop");
            return ExitCode::FAILURE;
        }
    };

    if let Err(err) = event_loop.run_app(&mut app) {
        tracing::error!(%err, "event loop terminated");
        return ExitCode::FAILURE;
    }

    if app.failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
