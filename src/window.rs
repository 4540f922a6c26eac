//! Native host: a transparent winit window carrying the backdrop.

use std::sync::Arc;

use glam::{UVec2, Vec2};
use tracing::{error, info, trace};
use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowId},
};

use crate::backdrop::ParticleBackdrop;
use crate::config::{BackdropConfig, RenderConfig};
use crate::error::BackdropError;
use crate::field::Particle;
use crate::gpu::GpuSurface;
use crate::host::Host;
use crate::input::{EventKind, HostEvent, Listener, ListenerId, ListenerRegistry};
use crate::scheduler::{FrameId, FrameQueue};

/// A window acting as the backdrop's container.
///
/// Frame requests map to `request_redraw`, which winit delivers once per
/// display refresh with `AutoVsync`.
pub struct WindowHost {
    window: Arc<Window>,
    listeners: ListenerRegistry,
    frames: FrameQueue,
}

impl WindowHost {
    pub fn new(window: Arc<Window>) -> Self {
        Self {
            window,
            listeners: ListenerRegistry::new(),
            frames: FrameQueue::new(),
        }
    }

    pub fn window(&self) -> &Arc<Window> {
        &self.window
    }

    pub fn dispatch(&mut self, event: HostEvent) {
        self.listeners.dispatch(&event);
    }

    /// Hand out every frame due on this redraw.
    pub fn take_due_frames(&mut self) -> Vec<FrameId> {
        self.frames.take_all_due()
    }
}

impl Host for WindowHost {
    type Surface = GpuSurface;

    fn viewport(&self) -> UVec2 {
        let size = self.window.inner_size();
        UVec2::new(size.width, size.height)
    }

    fn attach_surface(
        &mut self,
        viewport: UVec2,
        particles: &[Particle],
        config: &RenderConfig,
    ) -> Result<GpuSurface, BackdropError> {
        let surface = pollster::block_on(GpuSurface::new(
            self.window.clone(),
            viewport,
            particles,
            config,
        ))?;
        Ok(surface)
    }

    fn detach_surface(&mut self, surface: GpuSurface) {
        drop(surface);
    }

    fn add_listener(&mut self, kind: EventKind, listener: Listener) -> ListenerId {
        self.listeners.add(kind, listener)
    }

    fn remove_listener(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    fn request_frame(&mut self) -> FrameId {
        let id = self.frames.request();
        self.window.request_redraw();
        id
    }

    fn cancel_frame(&mut self, id: FrameId) {
        self.frames.cancel(id);
    }
}

/// winit application driving one backdrop in one window.
pub struct BackdropApp {
    host: Option<WindowHost>,
    backdrop: ParticleBackdrop<WindowHost>,
    last_fps_log: u64,
    /// Failure that ended the event loop early.
    exit_error: Option<BackdropError>,
}

impl BackdropApp {
    pub fn new(config: BackdropConfig) -> Self {
        Self {
            host: None,
            backdrop: ParticleBackdrop::new(config),
            last_fps_log: 0,
            exit_error: None,
        }
    }

    /// Outcome of the finished event loop.
    pub fn finish(&mut self) -> Result<(), BackdropError> {
        match self.exit_error.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl ApplicationHandler for BackdropApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.host.is_some() {
            return;
        }
        let window_attrs = Window::default_attributes()
            .with_title("Particle Backdrop")
            .with_transparent(true)
            .with_inner_size(winit::dpi::LogicalSize::new(1280, 720));

        match event_loop.create_window(window_attrs) {
            Ok(window) => {
                self.host = Some(WindowHost::new(Arc::new(window)));
                self.backdrop.mount(self.host.as_mut());
            }
            Err(e) => {
                error!(error = %e, "failed to create window");
                self.exit_error = Some(BackdropError::Window(e));
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let Some(host) = self.host.as_mut() else {
            return;
        };
        match event {
            WindowEvent::CloseRequested => {
                self.backdrop.unmount(host);
                event_loop.exit();
            }
            WindowEvent::Resized(physical_size) => {
                host.dispatch(HostEvent::Resized {
                    size: UVec2::new(physical_size.width, physical_size.height),
                });
            }
            WindowEvent::CursorMoved { position, .. } => {
                let viewport = host.viewport();
                host.dispatch(HostEvent::PointerMoved {
                    position: Vec2::new(position.x as f32, position.y as f32),
                    viewport,
                });
            }
            WindowEvent::RedrawRequested => {
                for id in host.take_due_frames() {
                    self.backdrop.on_frame(host, id);
                }
                let frames = self.backdrop.frames_rendered();
                if frames >= self.last_fps_log + 600 {
                    self.last_fps_log = frames;
                    if let Some(fps) = self.backdrop.fps() {
                        trace!(fps, frames, "backdrop frame rate");
                    }
                }
            }
            _ => {}
        }
    }
}

/// Open a window and run the backdrop until it is closed.
pub fn run(config: BackdropConfig) -> Result<(), BackdropError> {
    config.validate()?;

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Wait);

    info!(particles = config.particle_count, "starting backdrop window");
    let mut app = BackdropApp::new(config);
    event_loop.run_app(&mut app)?;
    app.finish()
}
