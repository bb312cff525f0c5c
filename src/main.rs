//! Glowroom - a shared room where everyone glows
//!
//! Remote participants drift across the wall as colored spheres, two
//! clickable objects drive the synth volume, and a pair of cubes pulse
//! with the music.

use std::sync::{Arc, Mutex};

use clap::Parser;
use tracing::{info, trace, warn};
use winit::{
    application::ApplicationHandler,
    event::*,
    event_loop::EventLoop,
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use glowroom::audio::{AudioControl, AudioSystem};
use glowroom::camera::Camera;
use glowroom::cli::Args;
use glowroom::interaction::handle_click;
use glowroom::net::{InboundEvent, ThroughputMeter, TransportClient};
use glowroom::params::*;
use glowroom::presence::PresenceSynchronizer;
use glowroom::rendering::{CameraUniforms, ObjectId, ObjectUniforms, RenderSystem};
use glowroom::scene::SceneState;
use glowroom::stats::FrameStats;

const WINDOW_TITLE: &str = "Glowroom";

/// Main application state. Everything that touches the scene lives here,
/// on the event-loop thread; the transport and audio workers only talk to
/// it through channels and shared handles.
struct App {
    // Window and rendering
    window: Option<Arc<Window>>,
    render_system: Option<RenderSystem>,

    // Simulation systems
    scene: SceneState,
    camera: Camera,
    presence: PresenceSynchronizer,
    transport: Option<TransportClient>,
    audio: Option<AudioSystem>,

    /// Playback control: owned by the audio system when one exists, local
    /// otherwise so clicks keep their visual side effects without sound
    audio_control: Arc<Mutex<AudioControl>>,

    // Configuration
    render_config: RenderConfig,
    net_config: NetConfig,
    volume_policy: VolumePolicy,

    // Diagnostics
    throughput: ThroughputMeter,
    stats: FrameStats,

    // Last cursor position in physical pixels
    cursor: Option<(f64, f64)>,
}

impl App {
    fn new(args: &Args) -> Self {
        let layout = SceneLayout::default();
        let mapping = ReactiveMapping::default();
        let render_config = RenderConfig::default();

        let scene = SceneState::new(layout, mapping);
        let camera = Camera::new(&render_config);
        let volume_policy = args.volume_policy();
        let audio_control = Arc::new(Mutex::new(AudioControl::new(volume_policy.clone())));

        Self {
            window: None,
            render_system: None,
            scene,
            camera,
            presence: PresenceSynchronizer::new(),
            transport: None,
            audio: None,
            audio_control,
            render_config,
            net_config: args.net_config(),
            volume_policy,
            throughput: ThroughputMeter::new(),
            stats: FrameStats::new(),
            cursor: None,
        }
    }
}

impl ApplicationHandler for App {
    fn about_to_wait(&mut self, _event_loop: &winit::event_loop::ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn resumed(&mut self, event_loop: &winit::event_loop::ActiveEventLoop) {
        if self.window.is_some() {
            return; // Already initialized
        }

        // Create window
        let window_attributes = Window::default_attributes()
            .with_title(WINDOW_TITLE)
            .with_inner_size(winit::dpi::LogicalSize::new(
                self.render_config.window_width,
                self.render_config.window_height,
            ));

        let window = Arc::new(
            event_loop
                .create_window(window_attributes)
                .expect("failed to create window"),
        );

        // Initialize rendering system
        let render_system =
            pollster::block_on(RenderSystem::new(Arc::clone(&window), &self.scene.layout))
                .expect("failed to initialize rendering");

        let size = window.inner_size();
        self.camera.set_aspect(size.width, size.height);
        render_system.update_camera(&CameraUniforms {
            view_proj: self.camera.view_proj().to_cols_array_2d(),
        });

        // Initialize audio. A machine with no output device still gets the
        // room; the reactive objects just stay collapsed.
        match AudioSystem::new(AnalyzerConfig::default(), self.volume_policy.clone()) {
            Ok(audio) => {
                self.audio_control = audio.control();
                self.audio = Some(audio);
            }
            Err(e) => warn!(%e, "audio unavailable, continuing without sound"),
        }

        // Start connecting to the presence server
        self.transport = Some(TransportClient::connect(self.net_config.clone()));

        info!("glowroom is running, click the sphere to start the music");

        self.window = Some(window);
        self.render_system = Some(render_system);
    }

    fn window_event(
        &mut self,
        event_loop: &winit::event_loop::ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
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
                self.camera.set_aspect(size.width, size.height);
                if let Some(render_system) = &self.render_system {
                    render_system.update_camera(&CameraUniforms {
                        view_proj: self.camera.view_proj().to_cols_array_2d(),
                    });
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = Some((position.x, position.y));
                self.send_pointer(position.x, position.y);
            }
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button: MouseButton::Left,
                ..
            } => {
                self.handle_mouse_click();
            }
            WindowEvent::RedrawRequested => {
                self.render_frame();
            }
            _ => {}
        }
    }
}

impl App {
    /// Forward the cursor position as normalized 0..1 telemetry. The
    /// transport drops it unless the connection is open.
    fn send_pointer(&self, px: f64, py: f64) {
        let (Some(window), Some(transport)) = (&self.window, &self.transport) else {
            return;
        };
        let size = window.inner_size();
        if size.width == 0 || size.height == 0 {
            return;
        }
        transport.send_pointer(
            (px / f64::from(size.width)) as f32,
            (py / f64::from(size.height)) as f32,
        );
    }

    /// Left click: fire the audio gesture latch, then ray-pick the targets
    fn handle_mouse_click(&mut self) {
        if self.audio_control.lock().unwrap().start() {
            info!("audio started by user gesture");
        }

        let (Some(window), Some((px, py))) = (&self.window, self.cursor) else {
            return;
        };
        let size = window.inner_size();
        if size.width == 0 || size.height == 0 {
            return;
        }

        // Pixel coordinates → NDC (y flips)
        let ndc_x = (px / f64::from(size.width)) as f32 * 2.0 - 1.0;
        let ndc_y = 1.0 - (py / f64::from(size.height)) as f32 * 2.0;
        let (origin, dir) = self.camera.screen_ray(ndc_x, ndc_y);

        let mut control = self.audio_control.lock().unwrap();
        let hit = handle_click(
            origin,
            dir,
            &mut self.scene.targets,
            &mut control,
            &mut rand::thread_rng(),
        );
        if let Some(kind) = hit {
            info!(?kind, volume = control.volume(), "target clicked");
        }
    }

    /// Apply everything the transport gathered since the last frame
    fn pump_network(&mut self) {
        let Some(transport) = &self.transport else {
            return;
        };

        for event in transport.poll() {
            match event {
                InboundEvent::Opened => info!("presence connection open"),
                InboundEvent::Closed => info!("presence connection closed"),
                InboundEvent::Roster(roster) => {
                    if self.net_config.apply_roster {
                        self.presence.apply_roster(&roster);
                    } else {
                        trace!(participants = roster.len(), "roster discarded");
                    }
                }
                InboundEvent::Binary { bytes, arrived } => {
                    let sample = self.throughput.record_at(bytes, arrived);
                    info!("{sample}");
                    if let Some(window) = &self.window {
                        window.set_title(&format!("{WINDOW_TITLE} - {sample}"));
                    }
                }
                InboundEvent::Text(text) => info!(%text, "server says"),
            }
        }
    }

    /// Render a single frame
    fn render_frame(&mut self) {
        self.stats.begin();

        self.pump_network();

        // Live audio inputs; both zero while audio is unavailable or the
        // latch has not fired
        let avg_frequency = self.audio.as_ref().map_or(0.0, |a| a.average_frequency());
        let volume = self.audio_control.lock().unwrap().volume();

        self.scene.update(avg_frequency, volume);

        let Some(render_system) = &self.render_system else {
            return;
        };

        // Reactive objects
        render_system.update_object(
            ObjectId::Cube,
            &ObjectUniforms::new(self.scene.cube_model(), [1.0, 0.0, 0.0], [0.0; 3]),
        );
        render_system.update_object(
            ObjectId::CubeLine,
            &ObjectUniforms::new(self.scene.line_model(), [1.0, 0.0, 0.0], [0.0; 3]),
        );

        // Clickable targets
        for (index, id) in [ObjectId::SphereTarget, ObjectId::TorusTarget]
            .into_iter()
            .enumerate()
        {
            let target = &self.scene.targets[index];
            render_system.update_object(
                id,
                &ObjectUniforms::new(self.scene.target_model(index), target.color, target.emissive()),
            );
        }

        // Participant pool, only when a roster update touched it
        if self.presence.pool().is_dirty() {
            render_system.update_instances(self.presence.pool().instances());
            self.presence.pool_mut().clear_dirty();
        }

        match render_system.render(self.presence.pool().active()) {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                let size = self.window.as_ref().map(|w| w.inner_size());
                if let (Some(size), Some(render_system)) = (size, &mut self.render_system) {
                    render_system.resize(size.width, size.height);
                }
            }
            Err(e) => warn!(%e, "render error"),
        }

        self.stats.end();
    }
}

fn main() {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    info!(server = %args.server, apply_roster = args.apply_roster, "starting");

    let mut app = App::new(&args);
    let event_loop = EventLoop::new().expect("failed to create event loop");
    let _ = event_loop.run_app(&mut app);
}
