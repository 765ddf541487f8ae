//! Window host: builder and runner.

use std::sync::Arc;
use std::time::Instant;

use winit::{
    application::ApplicationHandler,
    event::{ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use crate::config::ViewConfig;
use crate::error::ViewerError;
use crate::gpu::GpuRenderer;
use crate::render::RenderTarget;
use crate::scheduler::{FrameStatus, RotationMode, TickOutcome};
use crate::session::RenderSession;
use crate::source::StateSource;

/// A viewer builder.
///
/// Use method chaining to configure, then call `.run()` to open the window.
///
/// ```ignore
/// Viewer::new(ViewConfig::default())
///     .with_source(SweepSource::new(GridDims::new(8, 32, 32)))
///     .run()?;
/// ```
pub struct Viewer {
    config: ViewConfig,
    source: Option<Box<dyn StateSource>>,
    title: String,
    window_size: (u32, u32),
}

impl Viewer {
    pub fn new(config: ViewConfig) -> Self {
        Self {
            config,
            source: None,
            title: "lifeview".to_string(),
            window_size: (1280, 720),
        }
    }

    /// Set where frames come from. Closures returning `Option<Frame>` work too.
    pub fn with_source<S: StateSource + 'static>(mut self, source: S) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Initial window size in logical pixels.
    pub fn with_window_size(mut self, width: u32, height: u32) -> Self {
        self.window_size = (width, height);
        self
    }

    /// Run the viewer. This blocks until the window is closed.
    pub fn run(self) -> Result<(), ViewerError> {
        let source = self.source.ok_or(ViewerError::NoSource)?;
        let (width, height) = self.window_size;
        let session = RenderSession::new(self.config, width as usize, height as usize)?;

        let event_loop = EventLoop::new()?;
        event_loop.set_control_flow(ControlFlow::Poll);

        let mut app = App {
            window: None,
            gpu: None,
            session,
            source,
            title: self.title,
            window_size: self.window_size,
            error: None,
        };
        event_loop.run_app(&mut app)?;

        match app.error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

struct App {
    window: Option<Arc<Window>>,
    gpu: Option<GpuRenderer>,
    session: RenderSession,
    source: Box<dyn StateSource>,
    title: String,
    window_size: (u32, u32),
    error: Option<ViewerError>,
}

impl App {
    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<(), ViewerError> {
        let (width, height) = self.window_size;
        let window_attrs = Window::default_attributes()
            .with_title(self.title.as_str())
            .with_inner_size(winit::dpi::LogicalSize::new(width, height));

        let window = Arc::new(event_loop.create_window(window_attrs)?);
        let size = window.inner_size();
        self.session
            .resize_pixels(size.width.max(1) as usize, size.height.max(1) as usize);
        self.gpu = Some(pollster::block_on(GpuRenderer::new(
            window.clone(),
            self.session.config(),
        ))?);
        window.request_redraw();
        self.window = Some(window);
        Ok(())
    }

    fn handle_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Space => {
                if self.session.is_running() {
                    log::info!("paused");
                    self.session.stop();
                } else {
                    log::info!("resumed");
                    self.session.restart();
                    if let Some(window) = &self.window {
                        window.request_redraw();
                    }
                }
            }
            KeyCode::KeyN if !self.session.is_running() => self.step(),
            KeyCode::KeyR => {
                log::info!("lattice reset");
                self.session.reset_lattice();
            }
            _ => {}
        }
    }

    /// Pull and draw a single frame while the loop is stopped.
    fn step(&mut self) {
        let Some(gpu) = &mut self.gpu else {
            return;
        };
        if let Some(frame) = self.source.next_frame() {
            // Errors are already logged by the session.
            let _ = self.session.present(&frame, gpu);
        }
        gpu.set_camera_transform(&self.session.rig().transform());
        if let Err(e) = gpu.render_frame() {
            log::warn!("step render failed: {:?}", e);
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let Some(gpu) = &mut self.gpu else {
            return;
        };

        match self.session.advance(Instant::now(), self.source.as_mut(), gpu) {
            TickOutcome::Rendered(status) => {
                if let Some(window) = &self.window {
                    window.set_title(&status_title(&self.title, &status));
                }
            }
            TickOutcome::Throttled => {}
            // A stray redraw while paused draws nothing and pulls nothing.
            TickOutcome::Cancelled => return,
        }

        if let Some(e) = gpu.take_surface_error() {
            match e {
                wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => gpu.reconfigure(),
                wgpu::SurfaceError::OutOfMemory => {
                    log::error!("GPU out of memory");
                    event_loop.exit();
                    return;
                }
                other => log::warn!("render error: {:?}", other),
            }
        }

        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            if let Err(e) = self.init(event_loop) {
                log::error!("viewer startup failed: {}", e);
                self.error = Some(e);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(physical_size) => {
                if let Some(gpu) = &mut self.gpu {
                    gpu.resize(physical_size);
                }
                if physical_size.width > 0 && physical_size.height > 0 {
                    self.session
                        .resize_pixels(physical_size.width as usize, physical_size.height as usize);
                }
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state: ElementState::Pressed,
                        repeat: false,
                        ..
                    },
                ..
            } => self.handle_key(code),
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            other => self.session.handle_window_event(&other, Instant::now()),
        }
    }
}

fn status_title(base: &str, status: &FrameStatus) -> String {
    match status.mode {
        RotationMode::Autonomous => format!("{} | auto | {:.0} fps", base, status.fps),
        RotationMode::Manual => format!(
            "{} | manual, resuming in {:.0}s | {:.0} fps",
            base,
            status.idle_countdown_secs.ceil(),
            status.fps
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(mode: RotationMode, idle_countdown_secs: f32) -> FrameStatus {
        FrameStatus {
            mode,
            idle_countdown_secs,
            fps: 59.6,
            frame: 10,
        }
    }

    #[test]
    fn title_shows_mode_and_fps() {
        assert_eq!(
            status_title("lifeview", &status(RotationMode::Autonomous, 0.0)),
            "lifeview | auto | 60 fps"
        );
        assert_eq!(
            status_title("lifeview", &status(RotationMode::Manual, 6.2)),
            "lifeview | manual, resuming in 7s | 60 fps"
        );
    }

    #[test]
    fn run_without_source_fails_early() {
        let result = Viewer::new(ViewConfig::default()).run();
        assert!(matches!(result, Err(ViewerError::NoSource)));
    }
}
