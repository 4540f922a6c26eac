//! An offscreen host that records what the backdrop does to it.
//!
//! No window and no GPU: surfaces keep the staged positions and count
//! uploads, renders and releases. Useful for tests and benchmarks.

use glam::{UVec2, Vec2, Vec3};

use crate::config::RenderConfig;
use crate::error::{BackdropError, RenderError};
use crate::field::Particle;
use crate::host::{Host, RenderSurface};
use crate::input::{EventKind, HostEvent, Listener, ListenerId, ListenerRegistry};
use crate::scheduler::{FrameId, FrameQueue};

/// Surface that draws nothing and remembers every call.
#[derive(Debug, Default)]
pub struct HeadlessSurface {
    pub size: UVec2,
    pub aspect: f32,
    pub positions: Vec<Vec3>,
    pub positions_dirty: bool,
    pub uploads: u64,
    pub renders: u64,
    pub resizes: u64,
    pub last_rotation: Vec2,
    pub teardowns: u32,
    /// Error to return from the next render instead of drawing.
    pub fail_next_render: Option<RenderError>,
    released: bool,
}

impl HeadlessSurface {
    pub fn new(size: UVec2, particles: &[Particle]) -> Self {
        let mut surface = Self {
            positions: particles.iter().map(|p| p.position).collect(),
            ..Default::default()
        };
        surface.resize(size);
        surface.resizes = 0;
        surface
    }
}

impl RenderSurface for HeadlessSurface {
    fn resize(&mut self, size: UVec2) {
        if self.released {
            return;
        }
        self.size = size;
        self.aspect = size.x.max(1) as f32 / size.y.max(1) as f32;
        self.resizes += 1;
    }

    fn upload_positions(&mut self, particles: &[Particle]) {
        if self.released {
            return;
        }
        self.positions.clear();
        self.positions.extend(particles.iter().map(|p| p.position));
        self.positions_dirty = true;
        self.uploads += 1;
    }

    fn render(&mut self, rotation: Vec2) -> Result<(), RenderError> {
        if self.released {
            return Err(RenderError::Released);
        }
        if let Some(err) = self.fail_next_render.take() {
            return Err(err);
        }
        self.positions_dirty = false;
        self.last_rotation = rotation;
        self.renders += 1;
        Ok(())
    }

    fn teardown(&mut self) {
        self.teardowns += 1;
        if self.released {
            return;
        }
        self.positions = Vec::new();
        self.released = true;
    }

    fn is_released(&self) -> bool {
        self.released
    }
}

/// Host with a fixed-size virtual viewport.
#[derive(Debug)]
pub struct HeadlessHost {
    viewport: UVec2,
    listeners: ListenerRegistry,
    frames: FrameQueue,
    /// When `false`, attaching a surface fails as if the container vanished.
    pub available: bool,
    /// Render error injected into the next attached surface.
    pub fail_first_render: Option<RenderError>,
    attached: usize,
    detached: Vec<HeadlessSurface>,
}

impl HeadlessHost {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            viewport: UVec2::new(width, height),
            listeners: ListenerRegistry::new(),
            frames: FrameQueue::new(),
            available: true,
            fail_first_render: None,
            attached: 0,
            detached: Vec::new(),
        }
    }

    /// Deliver an event to registered listeners. Resizes also update the
    /// host viewport.
    pub fn dispatch(&mut self, event: HostEvent) {
        if let HostEvent::Resized { size } = event {
            self.viewport = size;
        }
        self.listeners.dispatch(&event);
    }

    /// Move the pointer to screen pixel `(x, y)`.
    pub fn move_pointer(&mut self, x: f32, y: f32) {
        self.dispatch(HostEvent::PointerMoved {
            position: Vec2::new(x, y),
            viewport: self.viewport,
        });
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.dispatch(HostEvent::Resized {
            size: UVec2::new(width, height),
        });
    }

    /// Hand out the oldest pending frame.
    pub fn take_due_frame(&mut self) -> Option<FrameId> {
        self.frames.take_due()
    }

    /// Simulate a display refresh: hand out every pending frame.
    pub fn take_due_frames(&mut self) -> Vec<FrameId> {
        self.frames.take_all_due()
    }

    /// The oldest pending frame.
    pub fn pending_frame(&self) -> Option<FrameId> {
        self.frames.pending().first().copied()
    }

    pub fn pending_frames(&self) -> &[FrameId] {
        self.frames.pending()
    }

    /// Surfaces currently attached.
    pub fn attached_surfaces(&self) -> usize {
        self.attached
    }

    /// Surfaces that were detached, in order.
    pub fn detached_surfaces(&self) -> &[HeadlessSurface] {
        &self.detached
    }

    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.listeners.count(kind)
    }
}

impl Host for HeadlessHost {
    type Surface = HeadlessSurface;

    fn viewport(&self) -> UVec2 {
        self.viewport
    }

    fn attach_surface(
        &mut self,
        viewport: UVec2,
        particles: &[Particle],
        _config: &RenderConfig,
    ) -> Result<HeadlessSurface, BackdropError> {
        if !self.available {
            return Err(BackdropError::HostUnavailable);
        }
        let mut surface = HeadlessSurface::new(viewport, particles);
        surface.fail_next_render = self.fail_first_render.take();
        self.attached += 1;
        Ok(surface)
    }

    fn detach_surface(&mut self, surface: HeadlessSurface) {
        self.attached = self.attached.saturating_sub(1);
        self.detached.push(surface);
    }

    fn add_listener(&mut self, kind: EventKind, listener: Listener) -> ListenerId {
        self.listeners.add(kind, listener)
    }

    fn remove_listener(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    fn request_frame(&mut self) -> FrameId {
        self.frames.request()
    }

    fn cancel_frame(&mut self, id: FrameId) {
        self.frames.cancel(id);
    }
}
