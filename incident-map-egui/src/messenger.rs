use incident_map::Messenger;

/// Wakes the egui event loop when background work finishes.
#[derive(Clone)]
pub(crate) struct RepaintMessenger {
    context: egui::Context,
}

impl RepaintMessenger {
    pub(crate) fn new(context: egui::Context) -> Self {
        Self { context }
    }
}

impl Messenger for RepaintMessenger {
    fn request_redraw(&self) {
        self.context.request_repaint();
    }
}
