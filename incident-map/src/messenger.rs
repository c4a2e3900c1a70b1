use maybe_sync::{MaybeSend, MaybeSync};

/// Wakes the UI when background work has produced something to show.
pub trait Messenger: MaybeSend + MaybeSync {
    /// Asks the UI to process pending outcomes and redraw.
    fn request_redraw(&self);
}

/// Messenger that does nothing. Useful when the UI redraws continuously anyway.
#[derive(Debug, Clone, Copy, Default)]
pub struct DummyMessenger;

impl Messenger for DummyMessenger {
    fn request_redraw(&self) {}
}
