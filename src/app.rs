//! Window, event loop and the per-frame host contract.

use std::sync::Arc;

use winit::{
    application::ApplicationHandler,
    event::{ElementState, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use crate::config::ClothConfig;
use crate::display::DisplayMode;
use crate::error::AppError;
use crate::gpu::Renderer;
use crate::time::FrameClock;

/// Host side of the demo: owns the window, the renderer and the display
/// mode, and drives one [`Renderer::display`] per redraw.
pub struct ClothApp {
    config: ClothConfig,
    window: Option<Arc<Window>>,
    renderer: Option<Renderer>,
    clock: FrameClock,
    mode: DisplayMode,
    finished: bool,
    error: Option<AppError>,
    reported_fps: u64,
}

impl ClothApp {
    pub fn new(config: ClothConfig) -> Self {
        let clock = FrameClock::new(config.max_delta_time);
        Self {
            config,
            window: None,
            renderer: None,
            clock,
            mode: DisplayMode::default(),
            finished: false,
            error: None,
            reported_fps: 0,
        }
    }

    /// Create the window and the renderer. Does nothing once they exist.
    pub fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<(), AppError> {
        if self.window.is_some() {
            return Ok(());
        }

        let (width, height) = self.config.window_size;
        let window_attrs = Window::default_attributes()
            .with_title(self.config.window_title.as_str())
            .with_inner_size(winit::dpi::LogicalSize::new(width, height));

        let window = Arc::new(event_loop.create_window(window_attrs)?);
        let renderer = pollster::block_on(Renderer::new(window.clone(), &self.config))?;

        self.window = Some(window);
        self.renderer = Some(renderer);
        // Startup time is not simulated
        self.clock = FrameClock::new(self.config.max_delta_time);
        log::info!("Cloth initialized, press C to switch display mode");
        Ok(())
    }

    /// Whether the loop has been asked to stop.
    pub fn has_finished(&self) -> bool {
        self.finished
    }

    /// Release GPU resources, then the window.
    pub fn destroy(&mut self) {
        self.renderer = None;
        self.window = None;
        self.finished = true;
    }

    pub fn mode(&self) -> DisplayMode {
        self.mode
    }

    /// React to a key. Only a fresh press of `C` does anything.
    pub fn on_key(&mut self, key: PhysicalKey, state: ElementState, repeat: bool) {
        if state != ElementState::Pressed || repeat {
            return;
        }
        if key == PhysicalKey::Code(KeyCode::KeyC) {
            self.mode = self.mode.cycle();
            log::info!("Display mode: {:?}", self.mode);
        }
    }

    /// Error that stopped the loop, if any.
    pub fn take_error(&mut self) -> Option<AppError> {
        self.error.take()
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: AppError) {
        log::error!("{}", error);
        self.error = Some(error);
        self.destroy();
        event_loop.exit();
    }

    fn frame(&mut self, event_loop: &ActiveEventLoop) {
        let delta_time = self.clock.tick();
        let mode = self.mode;

        if let Some(renderer) = &mut self.renderer {
            match renderer.display(delta_time, mode) {
                Ok(_) => {}
                Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => renderer.reconfigure(),
                Err(wgpu::SurfaceError::OutOfMemory) => {
                    log::error!("Surface out of memory, exiting");
                    self.destroy();
                    event_loop.exit();
                    return;
                }
                Err(e) => log::warn!("Render error: {:?}", e),
            }
        }

        if self.clock.fps_generation() != self.reported_fps {
            self.reported_fps = self.clock.fps_generation();
            let fps = self.clock.fps();
            log::debug!("{:.1} FPS", fps);
            if let Some(window) = &self.window {
                window.set_title(&format!("{} - {:.0} FPS", self.config.window_title, fps));
            }
        }
    }
}

impl ApplicationHandler for ClothApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if let Err(e) = self.init(event_loop) {
            self.fail(event_loop, e);
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        if self.has_finished() {
            return;
        }
        match event {
            WindowEvent::CloseRequested => {
                self.destroy();
                event_loop.exit();
            }
            WindowEvent::Resized(physical_size) => {
                if let Some(renderer) = &mut self.renderer {
                    renderer.resize(physical_size);
                }
            }
            WindowEvent::KeyboardInput { event, .. } => {
                self.on_key(event.physical_key, event.state, event.repeat);
            }
            WindowEvent::RedrawRequested => {
                self.frame(event_loop);
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }
}

/// Open the window and run until it is closed.
pub fn run(config: ClothConfig) -> Result<(), AppError> {
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = ClothApp::new(config);
    event_loop.run_app(&mut app)?;

    match app.take_error() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_c_press_cycles_mode() {
        let mut app = ClothApp::new(ClothConfig::default());
        assert_eq!(app.mode(), DisplayMode::Color);

        app.on_key(PhysicalKey::Code(KeyCode::KeyC), ElementState::Pressed, false);
        assert_eq!(app.mode(), DisplayMode::Shadow);

        // Release and auto-repeat are ignored
        app.on_key(PhysicalKey::Code(KeyCode::KeyC), ElementState::Released, false);
        app.on_key(PhysicalKey::Code(KeyCode::KeyC), ElementState::Pressed, true);
        assert_eq!(app.mode(), DisplayMode::Shadow);

        app.on_key(PhysicalKey::Code(KeyCode::KeyC), ElementState::Pressed, false);
        assert_eq!(app.mode(), DisplayMode::Color);
    }

    #[test]
    fn test_other_keys_ignored() {
        let mut app = ClothApp::new(ClothConfig::default());
        app.on_key(PhysicalKey::Code(KeyCode::KeyX), ElementState::Pressed, false);
        assert_eq!(app.mode(), DisplayMode::Color);
    }

    #[test]
    fn test_destroy_finishes() {
        let mut app = ClothApp::new(ClothConfig::default());
        assert!(!app.has_finished());
        app.destroy();
        assert!(app.has_finished());
        assert!(app.take_error().is_none());
    }
}
