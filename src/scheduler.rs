//! Display-synchronised frame requests.

/// Identifies one requested frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameId(u64);

/// Outstanding frame requests for one host, oldest first.
///
/// Several backdrops can share a host, so every request keeps its own id
/// until it is handed out or cancelled.
#[derive(Debug, Default)]
pub struct FrameQueue {
    next_id: u64,
    pending: Vec<FrameId>,
}

impl FrameQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a frame for the next display refresh.
    pub fn request(&mut self) -> FrameId {
        let id = FrameId(self.next_id);
        self.next_id += 1;
        self.pending.push(id);
        id
    }

    /// Cancel `id` if it is still pending. Other ids are left alone.
    pub fn cancel(&mut self, id: FrameId) {
        self.pending.retain(|&pending| pending != id);
    }

    /// Hand out the oldest pending frame, if any.
    pub fn take_due(&mut self) -> Option<FrameId> {
        if self.pending.is_empty() {
            None
        } else {
            Some(self.pending.remove(0))
        }
    }

    /// The display refreshed: hand out every frame requested before it.
    ///
    /// Frames requested while the returned ids are being run wait for the
    /// next refresh.
    pub fn take_all_due(&mut self) -> Vec<FrameId> {
        std::mem::take(&mut self.pending)
    }

    pub fn pending(&self) -> &[FrameId] {
        &self.pending
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
