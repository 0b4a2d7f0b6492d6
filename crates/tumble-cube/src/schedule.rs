//! Single-slot frame callback scheduling.
//!
//! The host redraws continuously; a frame only does work when a callback was
//! requested for it and not cancelled since. `fire` consumes the pending
//! request, so each request yields at most one frame.

/// Opaque id of a requested frame.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct AnimationHandle(u64);

#[derive(Debug, Default)]
pub struct FrameScheduler {
    next: u64,
    pending: Option<AnimationHandle>,
}

impl FrameScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests the next frame, replacing any pending request.
    pub fn request(&mut self) -> AnimationHandle {
        self.next += 1;
        let handle = AnimationHandle(self.next);
        self.pending = Some(handle);
        handle
    }

    /// Cancels `handle` if it is still pending. Returns whether it was.
    pub fn cancel(&mut self, handle: AnimationHandle) -> bool {
        if self.pending == Some(handle) {
            self.pending = None;
            true
        } else {
            false
        }
    }

    /// Takes the pending request, if any, for the frame about to run.
    pub fn fire(&mut self) -> Option<AnimationHandle> {
        self.pending.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_fires_once() {
        let mut s = FrameScheduler::new();
        let h = s.request();
        assert_eq!(s.fire(), Some(h));
        assert_eq!(s.fire(), None);
    }

    #[test]
    fn cancelled_request_never_fires() {
        let mut s = FrameScheduler::new();
        let h = s.request();
        assert!(s.cancel(h));
        assert!(!s.cancel(h));
        assert_eq!(s.fire(), None);
    }

    #[test]
    fn stale_handle_does_not_cancel_newer_request() {
        let mut s = FrameScheduler::new();
        let old = s.request();
        let new = s.request();
        assert_ne!(old, new);
        assert!(!s.cancel(old));
        assert_eq!(s.fire(), Some(new));
    }
}
