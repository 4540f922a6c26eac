//! The mounted particle backdrop and its per-frame loop.
//!
//! ```ignore
//! let mut backdrop = ParticleBackdrop::new(BackdropConfig::default());
//! backdrop.mount(Some(&mut host));
//!
//! // Each display refresh:
//! if let Some(id) = host.take_due_frame() {
//!     backdrop.on_frame(&mut host, id);
//! }
//!
//! backdrop.unmount(&mut host);
//! ```

use std::rc::Rc;

use glam::UVec2;
use tracing::{debug, error, info, warn};

use crate::config::BackdropConfig;
use crate::error::RenderError;
use crate::field::{field_rotation, ParticleField};
use crate::host::{Host, RenderSurface};
use crate::input::{EventKind, InputState, ListenerId};
use crate::scheduler::FrameId;
use crate::spawn::SpawnContext;
use crate::time::Time;

/// Lifecycle of a backdrop instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Constructed, nothing allocated yet.
    Idle,
    /// Mounted and scheduling frames.
    Running,
    /// Torn down. Terminal.
    Unmounted,
}

/// Everything owned while mounted. Dropped as one unit on unmount.
struct Mounted<S> {
    surface: Option<S>,
    field: ParticleField,
    input: Rc<InputState>,
    listeners: Vec<ListenerId>,
    pending_frame: Option<FrameId>,
    time: Time,
    viewport: UVec2,
    frames_rendered: u64,
}

/// A mouse-reactive particle cloud drawn behind page content.
pub struct ParticleBackdrop<H: Host> {
    config: BackdropConfig,
    phase: Phase,
    mounted: Option<Mounted<H::Surface>>,
}

impl<H: Host> ParticleBackdrop<H> {
    pub fn new(config: BackdropConfig) -> Self {
        Self {
            config,
            phase: Phase::Idle,
            mounted: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn config(&self) -> &BackdropConfig {
        &self.config
    }

    /// The live field, while mounted.
    pub fn field(&self) -> Option<&ParticleField> {
        self.mounted.as_ref().map(|m| &m.field)
    }

    /// The attached surface, while mounted.
    pub fn surface(&self) -> Option<&H::Surface> {
        self.mounted.as_ref().and_then(|m| m.surface.as_ref())
    }

    /// Frames successfully rendered since mount.
    pub fn frames_rendered(&self) -> u64 {
        self.mounted.as_ref().map_or(0, |m| m.frames_rendered)
    }

    /// Measured frame rate, while mounted.
    pub fn fps(&self) -> Option<f32> {
        self.mounted.as_ref().map(|m| m.time.fps())
    }

    /// Mount into `host` and start the frame loop.
    ///
    /// Returns `false`, with nothing allocated, when there is no host, the
    /// component was already mounted, the configuration is invalid or the
    /// surface cannot be attached. The backdrop is decorative, so none of
    /// these are errors for the caller.
    pub fn mount(&mut self, host: Option<&mut H>) -> bool {
        if self.phase != Phase::Idle {
            warn!(phase = ?self.phase, "backdrop can only be mounted once");
            return false;
        }
        let Some(host) = host else {
            debug!("no host container, skipping backdrop");
            return false;
        };

        let palette = match self.config.validate().and_then(|_| self.config.palette()) {
            Ok(palette) => palette,
            Err(e) => {
                warn!(error = %e, "invalid backdrop configuration, skipping");
                return false;
            }
        };

        let mut ctx = SpawnContext::new(self.config.seed);
        let field = ParticleField::initialize(self.config.particle_count, &palette, &mut ctx);

        let viewport = host.viewport();
        let surface = match host.attach_surface(viewport, field.particles(), &self.config.render) {
            Ok(surface) => surface,
            Err(e) => {
                warn!(error = %e, "could not attach backdrop surface, skipping");
                return false;
            }
        };

        let input = Rc::new(InputState::new());
        let pointer_input = Rc::clone(&input);
        let resize_input = Rc::clone(&input);
        let listeners = vec![
            host.add_listener(
                EventKind::PointerMove,
                Box::new(move |event| pointer_input.record(event)),
            ),
            host.add_listener(
                EventKind::Resize,
                Box::new(move |event| resize_input.record(event)),
            ),
        ];

        let pending_frame = Some(host.request_frame());

        info!(
            particles = field.len(),
            width = viewport.x,
            height = viewport.y,
            "backdrop mounted"
        );

        self.mounted = Some(Mounted {
            surface: Some(surface),
            field,
            input,
            listeners,
            pending_frame,
            time: Time::new(),
            viewport,
            frames_rendered: 0,
        });
        self.phase = Phase::Running;
        true
    }

    /// Run the frame `id`, reading elapsed time from the internal clock.
    pub fn on_frame(&mut self, host: &mut H, id: FrameId) {
        let Some(mounted) = self.mounted.as_mut() else {
            return;
        };
        if mounted.pending_frame != Some(id) {
            return;
        }
        let (elapsed, _) = mounted.time.update();
        self.on_frame_at(host, id, elapsed);
    }

    /// Run the frame `id` at an explicit elapsed time in seconds.
    ///
    /// Frames that are stale, cancelled or arrive after unmount are ignored.
    pub fn on_frame_at(&mut self, host: &mut H, id: FrameId, elapsed: f32) {
        if self.phase != Phase::Running {
            return;
        }
        let Some(mounted) = self.mounted.as_mut() else {
            return;
        };
        if mounted.pending_frame != Some(id) {
            debug!(?id, "ignoring stale frame");
            return;
        }
        mounted.pending_frame = None;

        let Some(surface) = mounted.surface.as_mut() else {
            return;
        };

        // A zero-sized viewport (minimised window) keeps the last real size
        if let Some(size) = mounted.input.take_resize() {
            if size.x > 0 && size.y > 0 && size != mounted.viewport {
                debug!(width = size.x, height = size.y, "resizing backdrop");
                mounted.viewport = size;
                surface.resize(size);
            }
        }

        let pointer = mounted.input.pointer();
        mounted.field.advance(pointer, elapsed);
        surface.upload_positions(mounted.field.particles());

        match surface.render(field_rotation(elapsed)) {
            Ok(()) => mounted.frames_rendered += 1,
            Err(e) if e.is_recoverable() => {
                debug!(error = %e, "skipping frame");
                if e == RenderError::Lost {
                    surface.resize(mounted.viewport);
                }
            }
            Err(e) => {
                error!(error = %e, "backdrop render failed, tearing down");
                self.unmount(host);
                return;
            }
        }

        mounted.pending_frame = Some(host.request_frame());
    }

    /// Stop the loop and release everything that was allocated.
    ///
    /// Safe in any phase and on repeated calls; only the first call after a
    /// successful mount releases anything.
    pub fn unmount(&mut self, host: &mut H) {
        if let Some(mut mounted) = self.mounted.take() {
            if let Some(id) = mounted.pending_frame.take() {
                host.cancel_frame(id);
            }
            for id in mounted.listeners.drain(..) {
                host.remove_listener(id);
            }
            if let Some(mut surface) = mounted.surface.take() {
                surface.teardown();
                host.detach_surface(surface);
            }
            info!(frames = mounted.frames_rendered, "backdrop unmounted");
        }
        self.phase = Phase::Unmounted;
    }
}
