//! The seams between the backdrop and the environment it is mounted into.

use glam::{UVec2, Vec2};

use crate::config::RenderConfig;
use crate::error::{BackdropError, RenderError};
use crate::field::Particle;
use crate::input::{EventKind, Listener, ListenerId};
use crate::scheduler::FrameId;

/// A drawing surface holding the scene, camera and GPU buffers.
pub trait RenderSurface {
    /// Resize the output and recompute the camera aspect ratio.
    ///
    /// Safe at any frequency; a no-op after [`teardown`](Self::teardown).
    fn resize(&mut self, size: UVec2);

    /// Stage the current particle positions and mark them for re-upload.
    fn upload_positions(&mut self, particles: &[Particle]);

    /// Draw one frame with the whole field rotated by `rotation`
    /// (radians about X, then Y).
    fn render(&mut self, rotation: Vec2) -> Result<(), RenderError>;

    /// Release every GPU-side resource. Idempotent.
    fn teardown(&mut self);

    fn is_released(&self) -> bool;
}

/// The container a backdrop mounts into.
///
/// A host owns the viewport, the event sources and the display-synchronised
/// scheduler. The backdrop borrows it per call instead of holding on to it,
/// so the frame callback and the resources it touches never form a cycle.
pub trait Host {
    type Surface: RenderSurface;

    /// Current viewport size in pixels.
    fn viewport(&self) -> UVec2;

    /// Create a surface sized to `viewport` for `particles` and attach it as
    /// the host's single drawing child.
    ///
    /// Returns [`BackdropError::HostUnavailable`] if the container went away.
    fn attach_surface(
        &mut self,
        viewport: UVec2,
        particles: &[Particle],
        config: &RenderConfig,
    ) -> Result<Self::Surface, BackdropError>;

    /// Remove a previously attached surface from the container.
    fn detach_surface(&mut self, surface: Self::Surface);

    fn add_listener(&mut self, kind: EventKind, listener: Listener) -> ListenerId;

    /// Returns `false` if `id` was not registered.
    fn remove_listener(&mut self, id: ListenerId) -> bool;

    /// Schedule a callback for the next display refresh.
    fn request_frame(&mut self) -> FrameId;

    fn cancel_frame(&mut self, id: FrameId);
}
