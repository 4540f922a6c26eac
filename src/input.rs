//! Host events, listener registration and the latest-value input state.
//!
//! Listeners never drive computation. They record the newest pointer
//! position or viewport size into an [`InputState`], and the frame callback
//! reads it once per frame. Input arrival rate is thereby decoupled from
//! simulation rate.

use std::cell::Cell;

use glam::{UVec2, Vec2};

/// Events a host forwards to registered listeners.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HostEvent {
    /// Pointer moved to `position` (screen pixels, origin top-left) within
    /// a viewport of `viewport` pixels.
    PointerMoved { position: Vec2, viewport: UVec2 },
    /// The viewport changed size.
    Resized { size: UVec2 },
}

impl HostEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            HostEvent::PointerMoved { .. } => EventKind::PointerMove,
            HostEvent::Resized { .. } => EventKind::Resize,
        }
    }
}

/// Event categories a listener can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    PointerMove,
    Resize,
}

/// Handle returned by listener registration, used to deregister.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Boxed listener callback.
pub type Listener = Box<dyn FnMut(&HostEvent)>;

/// Registration/deregistration pairs for host events.
///
/// Hosts embed one of these. Each registration is independent, so several
/// components can listen to the same host without colliding.
#[derive(Default)]
pub struct ListenerRegistry {
    next_id: u64,
    listeners: Vec<(ListenerId, EventKind, Listener)>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, kind: EventKind, listener: Listener) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, kind, listener));
        id
    }

    /// Remove a listener. Returns `false` if `id` was not registered.
    pub fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _, _)| *existing != id);
        self.listeners.len() != before
    }

    /// Deliver `event` to every listener of its kind.
    pub fn dispatch(&mut self, event: &HostEvent) {
        let kind = event.kind();
        for (_, listener_kind, listener) in &mut self.listeners {
            if *listener_kind == kind {
                listener(event);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Number of listeners subscribed to `kind`.
    pub fn count(&self, kind: EventKind) -> usize {
        self.listeners.iter().filter(|(_, k, _)| *k == kind).count()
    }
}

impl std::fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("next_id", &self.next_id)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

/// Latest observed input, written by listeners and read by the frame loop.
#[derive(Debug, Default)]
pub struct InputState {
    /// Pointer in normalized coordinates; starts at the origin.
    pointer: Cell<Vec2>,
    /// Most recent viewport size not yet applied to the surface.
    pending_resize: Cell<Option<UVec2>>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current pointer position, -1 to 1 on each axis. Y increases upward.
    pub fn pointer(&self) -> Vec2 {
        self.pointer.get()
    }

    /// Take the latest unapplied viewport size, if any.
    pub fn take_resize(&self) -> Option<UVec2> {
        self.pending_resize.take()
    }

    /// Record an event. Later events overwrite earlier ones.
    pub fn record(&self, event: &HostEvent) {
        match *event {
            HostEvent::PointerMoved { position, viewport } => {
                if let Some(ndc) = normalize_pointer(position, viewport) {
                    self.pointer.set(ndc);
                }
            }
            HostEvent::Resized { size } => self.pending_resize.set(Some(size)),
        }
    }
}

/// Map screen pixels to normalized coordinates: center is the origin,
/// X increases to the right, Y increases upward.
///
/// Returns `None` for a zero-sized viewport.
pub fn normalize_pointer(position: Vec2, viewport: UVec2) -> Option<Vec2> {
    if viewport.x == 0 || viewport.y == 0 {
        return None;
    }
    Some(Vec2::new(
        (position.x / viewport.x as f32) * 2.0 - 1.0,
        1.0 - (position.y / viewport.y as f32) * 2.0, // Y flipped
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_pointer_ndc() {
        let viewport = UVec2::new(800, 600);

        // Center of window should be (0, 0)
        let center = normalize_pointer(Vec2::new(400.0, 300.0), viewport).unwrap();
        assert!(center.x.abs() < 0.001);
        assert!(center.y.abs() < 0.001);

        let top_left = normalize_pointer(Vec2::ZERO, viewport).unwrap();
        assert_eq!(top_left, Vec2::new(-1.0, 1.0));

        let bottom_right = normalize_pointer(Vec2::new(800.0, 600.0), viewport).unwrap();
        assert_eq!(bottom_right, Vec2::new(1.0, -1.0));
    }

    #[test]
    fn test_zero_viewport_is_ignored() {
        assert!(normalize_pointer(Vec2::new(1.0, 1.0), UVec2::new(0, 600)).is_none());

        let state = InputState::new();
        state.record(&HostEvent::PointerMoved {
            position: Vec2::new(10.0, 10.0),
            viewport: UVec2::ZERO,
        });
        assert_eq!(state.pointer(), Vec2::ZERO);
    }

    #[test]
    fn test_resize_keeps_latest_only() {
        let state = InputState::new();
        assert!(state.take_resize().is_none());

        state.record(&HostEvent::Resized { size: UVec2::new(640, 480) });
        state.record(&HostEvent::Resized { size: UVec2::new(1024, 768) });

        assert_eq!(state.take_resize(), Some(UVec2::new(1024, 768)));
        assert!(state.take_resize().is_none());
    }

    #[test]
    fn test_registry_dispatches_by_kind() {
        let mut registry = ListenerRegistry::new();
        let pointer_hits = Rc::new(RefCell::new(0));
        let resize_hits = Rc::new(RefCell::new(0));

        let hits = pointer_hits.clone();
        registry.add(EventKind::PointerMove, Box::new(move |_| *hits.borrow_mut() += 1));
        let hits = resize_hits.clone();
        registry.add(EventKind::Resize, Box::new(move |_| *hits.borrow_mut() += 1));

        registry.dispatch(&HostEvent::Resized { size: UVec2::new(1, 1) });
        registry.dispatch(&HostEvent::Resized { size: UVec2::new(2, 2) });
        registry.dispatch(&HostEvent::PointerMoved {
            position: Vec2::ZERO,
            viewport: UVec2::new(1, 1),
        });

        assert_eq!(*pointer_hits.borrow(), 1);
        assert_eq!(*resize_hits.borrow(), 2);
    }

    #[test]
    fn test_registry_remove() {
        let mut registry = ListenerRegistry::new();
        let a = registry.add(EventKind::Resize, Box::new(|_| {}));
        let b = registry.add(EventKind::Resize, Box::new(|_| {}));
        assert_ne!(a, b);
        assert_eq!(registry.count(EventKind::Resize), 2);

        assert!(registry.remove(a));
        assert!(!registry.remove(a));
        assert_eq!(registry.len(), 1);
        assert!(registry.remove(b));
        assert!(registry.is_empty());
    }
}
