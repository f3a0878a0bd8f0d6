use anyhow::{anyhow, Result};
use exo_cuing::experiment::{self, ExperimentState, SessionPhase};
use exo_cuing::renderer::SkiaRenderer;
use exo_cuing::stimulus::GREY;
use exo_cuing::timer::HighPrecisionTimer;
use exo_cuing::{ExperimentConfig, JsonFileSink, ScreenGeometry};
use pixels::{Pixels, SurfaceTexture};
use std::sync::Arc;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{Key, NamedKey},
    window::{Fullscreen, Window, WindowId},
};

pub struct App {
    config: ExperimentConfig,
    window: Option<Arc<Window>>,
    pixels: Option<Pixels<'static>>,
    experiment: Option<ExperimentState>,
    renderer: Option<SkiaRenderer>,
    timer: HighPrecisionTimer,
    refresh_rate: Option<f64>,
    exited: bool,
}

impl App {
    pub fn new(config: ExperimentConfig) -> Self {
        Self {
            config,
            window: None,
            pixels: None,
            experiment: None,
            renderer: None,
            timer: HighPrecisionTimer::new(),
            refresh_rate: None,
            exited: false,
        }
    }

    pub fn run(mut self) -> Result<()> {
        let event_loop = EventLoop::new()?;
        log::info!("=== EXOGENOUS CUING TASK ===");
        log::info!("Platform: {} ({})", std::env::consts::OS, std::env::consts::ARCH);
        log::info!("Press SPACE to start a block, z = left, / = right, ESC to exit.");

        event_loop.run_app(&mut self)?;
        Ok(())
    }

    fn geometry(&self, size: PhysicalSize<u32>) -> ScreenGeometry {
        ScreenGeometry::new(
            size.width,
            size.height,
            self.config.display.width_mm,
            self.config.display.viewing_distance_mm,
        )
    }

    fn create_window_and_surface(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let primary_monitor = event_loop
            .primary_monitor()
            .or_else(|| event_loop.available_monitors().next())
            .ok_or_else(|| anyhow!("No monitor available"))?;

        self.refresh_rate = primary_monitor
            .refresh_rate_millihertz()
            .map(|rate| rate as f64 / 1000.0);

        let window_attributes = Window::default_attributes()
            .with_title("Exogenous Cuing")
            .with_fullscreen(Some(Fullscreen::Borderless(Some(primary_monitor))))
            .with_resizable(false);

        let window = Arc::new(event_loop.create_window(window_attributes)?);
        let size = window.inner_size();

        log::info!("Display configuration:");
        log::info!("  Physical size: {}×{}", size.width, size.height);
        log::info!("  Scale factor: {:.2}", window.scale_factor());
        if let Some(refresh_rate) = self.refresh_rate {
            log::info!("  Refresh rate: {:.1} Hz", refresh_rate);
        }

        let surface_texture = SurfaceTexture::new(size.width, size.height, window.clone());
        self.pixels = Some(Pixels::new(size.width, size.height, surface_texture)?);

        let geometry = self.geometry(size);
        let sink = Box::new(JsonFileSink::new(self.config.results_path.clone()));
        let experiment = experiment::setup(self.config.clone(), &geometry, sink)?;
        self.renderer = Some(SkiaRenderer::new(
            size.width,
            size.height,
            GREY,
            &experiment.catalog,
        )?);
        self.experiment = Some(experiment);

        window.set_cursor_visible(false);
        window.request_redraw();
        self.window = Some(window);

        log::info!("Press SPACE to begin block 1");
        Ok(())
    }

    fn update(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let now = self.timer.now();
        let Some(exp) = self.experiment.as_mut() else {
            return Ok(());
        };
        let ticked = experiment::tick(exp, now);
        // a sink error still leaves the session advanced; finish if it is over
        if exp.phase == SessionPhase::Finished {
            self.cleanup_and_exit(event_loop);
        }
        ticked.map(|_| ())
    }

    fn render(&mut self) -> Result<()> {
        let (Some(pixels), Some(renderer), Some(exp)) =
            (&mut self.pixels, &mut self.renderer, &self.experiment)
        else {
            return Ok(());
        };
        let draws = exp.composition(self.timer.now());
        let stats = renderer.render_frame(draws, &exp.catalog, pixels.frame_mut(), &mut self.timer)?;
        pixels.render()?;

        log::trace!(
            "frame: clear {:.3}ms, draw {:.3}ms ({} blits), copy {:.3}ms, total {:.3}ms",
            stats.clear.as_secs_f64() * 1e3,
            stats.draw.as_secs_f64() * 1e3,
            stats.draw_count,
            stats.copy.as_secs_f64() * 1e3,
            stats.total.as_secs_f64() * 1e3,
        );
        Ok(())
    }

    fn handle_input(&mut self, event: KeyEvent, event_loop: &ActiveEventLoop) {
        // timestamp before anything else so RT excludes our own handling
        let at = self.timer.now();
        if event.state != ElementState::Pressed || event.repeat {
            return;
        }
        match event.logical_key {
            Key::Named(NamedKey::Escape) => self.cleanup_and_exit(event_loop),
            Key::Named(NamedKey::Space) => {
                if let Some(exp) = self.experiment.as_mut() {
                    if exp.phase == SessionPhase::AwaitingBlock {
                        experiment::begin_block(exp, at);
                    }
                }
            }
            Key::Character(ref text) => {
                if let Some(exp) = self.experiment.as_mut() {
                    experiment::handle_key(exp, text.as_str(), at);
                }
            }
            _ => {}
        }
    }

    fn handle_resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        if let Some(pixels) = &mut self.pixels {
            if let Err(e) = pixels.resize_surface(new_size.width, new_size.height) {
                log::error!("Failed to resize surface: {}", e);
            }
            if let Err(e) = pixels.resize_buffer(new_size.width, new_size.height) {
                log::error!("Failed to resize buffer: {}", e);
            }
        }
        let geometry = self.geometry(new_size);
        if let (Some(exp), Some(renderer)) = (&mut self.experiment, &mut self.renderer) {
            exp.resize(&geometry);
            if let Err(e) = renderer.resize(new_size.width, new_size.height, &exp.catalog) {
                log::error!("Failed to resize renderer: {}", e);
            }
        }
        log::info!("Display resized to: {}×{}", new_size.width, new_size.height);
    }

    fn cleanup_and_exit(&mut self, event_loop: &ActiveEventLoop) {
        if self.exited {
            return;
        }
        self.exited = true;

        if let Some(window) = &self.window {
            window.set_cursor_visible(true);
        }
        if let Some(exp) = self.experiment.as_mut() {
            if let Err(e) = experiment::clean_up(exp) {
                log::error!("Failed to save results: {:#}", e);
            }
        }

        let stats = self.timer.frame_stats();
        log::info!(
            "Frame timing over {} frames: {:.3} ms/frame, {:.1} Hz, jitter {:.3} ms",
            stats.samples,
            stats.average_frame_time_ns / 1e6,
            stats.effective_fps,
            stats.jitter_ns / 1e6,
        );
        log::info!("Experiment completed. Thank you!");

        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            if let Err(e) = self.create_window_and_surface(event_loop) {
                log::error!("Failed to create window and surface: {:#}", e);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => self.cleanup_and_exit(event_loop),
            WindowEvent::RedrawRequested => {
                if let Err(e) = self.update(event_loop) {
                    log::error!("Update error: {:#}", e);
                }
                if self.exited {
                    return;
                }
                if let Err(e) = self.render() {
                    log::error!("Render error: {:#}", e);
                }
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            WindowEvent::KeyboardInput { event, .. } => self.handle_input(event, event_loop),
            WindowEvent::Resized(size) => self.handle_resize(size),
            WindowEvent::ScaleFactorChanged { .. } => {
                if let Some(size) = self.window.as_ref().map(|w| w.inner_size()) {
                    self.handle_resize(size);
                }
            }
            _ => {}
        }
    }
}
