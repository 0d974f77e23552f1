use std::collections::HashSet;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use egui::Context as EguiContext;
use glcanvas_canvas::{Area, CanvasBridge, CanvasColor, CanvasConfig, ConversionMode, DisplayFlush};
use glcanvas_common::config::{DEFAULT_PIXEL_BITS, DISPLAY_HEIGHT, DISPLAY_WIDTH};
use glcanvas_input::{Action, ActionSink, ControlSignal, ControlSurface, Direction};
use glcanvas_render::{RenderConfig, RenderSession};
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

/// Radians turned per rotation key press.
const ROTATE_STEP: f32 = 0.05;

#[derive(Parser)]
#[command(name = "glcanvas-desktop", about = "glcanvas desktop viewer")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Framebuffer width in pixels
    #[arg(long, default_value_t = DISPLAY_WIDTH)]
    width: u32,
    /// Framebuffer height in pixels
    #[arg(long, default_value_t = DISPLAY_HEIGHT)]
    height: u32,
    /// Native pixel depth: 32 or 16
    #[arg(long, default_value_t = DEFAULT_PIXEL_BITS)]
    bits: u32,
    /// 16-bit widening: shift or replicate
    #[arg(long, default_value = "shift")]
    mode: ConversionMode,
    /// On-screen magnification of the canvas
    #[arg(long, default_value = "2.0")]
    scale: f32,
}

/// Display hook that turns presented canvas frames into egui images.
#[derive(Default)]
struct TextureDisplay {
    pending: Option<egui::ColorImage>,
}

impl DisplayFlush for TextureDisplay {
    fn flush(&mut self, _area: Area, pixels: &[CanvasColor], stride: usize) {
        let height = pixels.len() / stride.max(1);
        let rgba: Vec<u8> = pixels
            .iter()
            .flat_map(|c| {
                let [r, g, b] = c.rgb();
                [r, g, b, 0xFF]
            })
            .collect();
        self.pending = Some(egui::ColorImage::from_rgba_unmultiplied(
            [stride, height],
            &rgba,
        ));
    }
}

/// Application state.
struct AppState {
    session: RenderSession,
    canvas: CanvasBridge<TextureDisplay>,
    pad: ControlSurface,
    // D-pad buttons currently held by the pointer
    pointer_down: HashSet<Direction>,
    texture: Option<egui::TextureHandle>,
    scale: f32,
    show_panel: bool,
}

impl AppState {
    fn new(cli: &Cli) -> Result<Self> {
        let session = RenderSession::open_with(RenderConfig {
            width: cli.width,
            height: cli.height,
            pixel_bits: cli.bits,
            ..RenderConfig::default()
        })
        .context("failed to open render session")?;
        let canvas = CanvasBridge::init_with(
            CanvasConfig {
                width: cli.width,
                height: cli.height,
                mode: cli.mode,
            },
            TextureDisplay::default(),
        )
        .context("failed to initialize canvas")?;

        Ok(Self {
            session,
            canvas,
            pad: ControlSurface::default(),
            pointer_down: HashSet::new(),
            texture: None,
            scale: cli.scale,
            show_panel: true,
        })
    }

    fn step_frame(&mut self) {
        if let Err(e) = self.session.render_frame() {
            tracing::error!("frame failed: {e}");
        }
        self.canvas.update(self.session.framebuffer());
        self.canvas.present();
    }

    fn signal(&mut self, signal: ControlSignal) {
        if let Err(e) = self.pad.dispatch(signal, &mut self.session) {
            tracing::warn!("d-pad {} ignored: {e}", signal.direction);
        }
    }

    fn rotate(&mut self, yaw: f32, pitch: f32) {
        if let Err(e) = self.session.apply(Action::Rotate { yaw, pitch }) {
            tracing::warn!("rotation ignored: {e}");
        }
    }

    fn handle_key(&mut self, key: KeyCode, pressed: bool, repeat: bool) {
        let direction = match key {
            KeyCode::ArrowUp => Some(Direction::Up),
            KeyCode::ArrowDown => Some(Direction::Down),
            KeyCode::ArrowLeft => Some(Direction::Left),
            KeyCode::ArrowRight => Some(Direction::Right),
            _ => None,
        };
        if let Some(direction) = direction {
            // Arrows behave like the on-screen buttons: one move per press.
            if !repeat {
                let signal = if pressed {
                    ControlSignal::pressed(direction)
                } else {
                    ControlSignal::released(direction)
                };
                self.signal(signal);
            }
            return;
        }

        if !pressed {
            return;
        }

        match key {
            KeyCode::KeyQ => self.rotate(ROTATE_STEP, 0.0),
            KeyCode::KeyE => self.rotate(-ROTATE_STEP, 0.0),
            KeyCode::KeyR => self.rotate(0.0, ROTATE_STEP),
            KeyCode::KeyF => self.rotate(0.0, -ROTATE_STEP),
            KeyCode::F1 => self.show_panel = !self.show_panel,
            _ => {}
        }
    }

    fn draw_ui(&mut self, ctx: &EguiContext) {
        if let Some(image) = self.canvas.display_mut().pending.take() {
            match &mut self.texture {
                Some(texture) => texture.set(image, egui::TextureOptions::NEAREST),
                None => {
                    self.texture =
                        Some(ctx.load_texture("canvas", image, egui::TextureOptions::NEAREST));
                }
            }
        }

        let mut signals = Vec::new();
        if self.show_panel {
            let stats = self.session.stats();
            let camera = self.session.camera();
            egui::SidePanel::right("controls")
                .default_width(220.0)
                .show(ctx, |ui| {
                    ui.heading("glcanvas");
                    ui.separator();
                    ui.label(format!("FPS: {:.1}", stats.fps));
                    ui.label(format!(
                        "Render: {:.2} ms (avg {:.2}, max {:.2})",
                        stats.last_render_ms, stats.average_render_ms, stats.max_render_ms
                    ));
                    let p = camera.position();
                    let f = camera.forward();
                    ui.label(format!("Eye: ({:.2}, {:.2}, {:.2})", p.x, p.y, p.z));
                    ui.label(format!("Forward: ({:.2}, {:.2}, {:.2})", f.x, f.y, f.z));
                    ui.separator();

                    ui.heading("D-pad");
                    egui::Grid::new("dpad").show(ui, |ui| {
                        ui.label("");
                        dpad_button(ui, &self.pad, &mut self.pointer_down, Direction::Up, &mut signals);
                        ui.label("");
                        ui.end_row();
                        dpad_button(ui, &self.pad, &mut self.pointer_down, Direction::Left, &mut signals);
                        ui.label("");
                        dpad_button(ui, &self.pad, &mut self.pointer_down, Direction::Right, &mut signals);
                        ui.end_row();
                        ui.label("");
                        dpad_button(ui, &self.pad, &mut self.pointer_down, Direction::Down, &mut signals);
                        ui.label("");
                        ui.end_row();
                    });

                    ui.separator();
                    ui.small("Arrows: move | Q/E: yaw | R/F: pitch | F1: panel");
                });
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            if let Some(texture) = &self.texture {
                let size = texture.size_vec2() * self.scale;
                ui.centered_and_justified(|ui| {
                    ui.image((texture.id(), size));
                });
            }
        });

        for signal in signals {
            self.signal(signal);
        }
    }
}

/// Emit press/release edges as the pointer goes down on or leaves a button.
fn dpad_button(
    ui: &mut egui::Ui,
    pad: &ControlSurface,
    pointer_down: &mut HashSet<Direction>,
    direction: Direction,
    signals: &mut Vec<ControlSignal>,
) {
    let button = egui::Button::new(direction.symbol()).selected(pad.is_held(direction));
    let down = ui.add_sized([48.0, 48.0], button).is_pointer_button_down_on();
    let was_down = pointer_down.contains(&direction);
    if down && !was_down {
        pointer_down.insert(direction);
        signals.push(ControlSignal::pressed(direction));
    } else if !down && was_down {
        pointer_down.remove(&direction);
        signals.push(ControlSignal::released(direction));
    }
}

/// Window, surface and egui plumbing. Created once the event loop resumes.
struct Gpu {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    egui_winit: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
}

impl Gpu {
    fn new(event_loop: &ActiveEventLoop, egui_ctx: &EguiContext, size: PhysicalSize<u32>) -> Result<Self> {
        let attrs = Window::default_attributes()
            .with_title("glcanvas")
            .with_inner_size(size);
        let window = Arc::new(
            event_loop
                .create_window(attrs)
                .context("failed to create window")?,
        );

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance
            .create_surface(window.clone())
            .context("failed to create surface")?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::LowPower,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .context("no compatible GPU adapter")?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("glcanvas_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))
        .context("failed to create device")?;

        let size = window.inner_size();
        let caps = surface.get_capabilities(&adapter);
        let format = caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| caps.formats.first())
            .copied()
            .context("surface reports no formats")?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let egui_winit = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(&device, format, None, 1, false);

        tracing::info!(
            "GPU initialized with {} backend",
            adapter.get_info().backend.to_str()
        );

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            egui_winit,
            egui_renderer,
        })
    }

    fn resize(&mut self, size: PhysicalSize<u32>) {
        self.config.width = size.width.max(1);
        self.config.height = size.height.max(1);
        self.surface.configure(&self.device, &self.config);
    }
}

struct App {
    state: AppState,
    gpu: Option<Gpu>,
    egui_ctx: EguiContext,
}

impl App {
    fn redraw(&mut self) {
        self.state.step_frame();

        let Some(gpu) = self.gpu.as_mut() else {
            return;
        };

        let output = match gpu.surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                gpu.surface.configure(&gpu.device, &gpu.config);
                return;
            }
            Err(e) => {
                tracing::error!("surface error: {e}");
                return;
            }
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let raw_input = gpu.egui_winit.take_egui_input(&gpu.window);
        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            self.state.draw_ui(ctx);
        });
        gpu.egui_winit
            .handle_platform_output(&gpu.window, full_output.platform_output);

        let paint_jobs = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [gpu.config.width, gpu.config.height],
            pixels_per_point: full_output.pixels_per_point,
        };

        for (id, image_delta) in &full_output.textures_delta.set {
            gpu.egui_renderer
                .update_texture(&gpu.device, &gpu.queue, *id, image_delta);
        }
        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("egui_encoder"),
            });
        gpu.egui_renderer.update_buffers(
            &gpu.device,
            &gpu.queue,
            &mut encoder,
            &paint_jobs,
            &screen_descriptor,
        );
        {
            let mut pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("egui_pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    ..Default::default()
                })
                .forget_lifetime();
            gpu.egui_renderer
                .render(&mut pass, &paint_jobs, &screen_descriptor);
        }
        gpu.queue.submit(std::iter::once(encoder.finish()));
        for id in &full_output.textures_delta.free {
            gpu.egui_renderer.free_texture(id);
        }

        output.present();
        gpu.window.request_redraw();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.gpu.is_some() {
            return;
        }
        let scale = self.state.scale.max(1.0);
        let size = PhysicalSize::new(
            (self.state.canvas.width() as f32 * scale) as u32 + 260,
            (self.state.canvas.height() as f32 * scale) as u32 + 40,
        );
        match Gpu::new(event_loop, &self.egui_ctx, size) {
            Ok(gpu) => self.gpu = Some(gpu),
            Err(e) => {
                tracing::error!("{e:#}");
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if let Some(gpu) = &mut self.gpu {
            let response = gpu.egui_winit.on_window_event(&gpu.window, &event);
            if response.consumed {
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested => {
                self.state.canvas.cleanup();
                self.state.session.close();
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                if let Some(gpu) = &mut self.gpu {
                    gpu.resize(new_size);
                }
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state: key_state,
                        repeat,
                        ..
                    },
                ..
            } => {
                self.state
                    .handle_key(key, key_state == ElementState::Pressed, repeat);
            }
            WindowEvent::RedrawRequested => self.redraw(),
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(gpu) = &self.gpu {
            gpu.window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    tracing::info!("glcanvas-desktop starting");

    let state = AppState::new(&cli)?;
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App {
        state,
        gpu: None,
        egui_ctx: EguiContext::default(),
    };
    event_loop.run_app(&mut app)?;

    Ok(())
}
