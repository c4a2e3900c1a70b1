//! Traffic flow images and their limited display time.

use std::time::Duration;

use web_time::Instant;

use crate::decoded_image::DecodedImage;
use crate::geo::ClickLocation;

/// Traffic image shown for the latest traffic click.
#[derive(Debug, Clone)]
pub struct TrafficSnapshot {
    id: u64,
    location: ClickLocation,
    image: DecodedImage,
    shown_at: Instant,
    ttl: Duration,
}

impl TrafficSnapshot {
    pub(crate) fn new(
        id: u64,
        location: ClickLocation,
        image: DecodedImage,
        shown_at: Instant,
        ttl: Duration,
    ) -> Self {
        Self {
            id,
            location,
            image,
            shown_at,
            ttl,
        }
    }

    /// Identifier of the snapshot. A new traffic response always gets a new id, so the UI can
    /// tell when its texture must be replaced.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Click location the image was requested for.
    pub fn location(&self) -> ClickLocation {
        self.location
    }

    /// Decoded image.
    pub fn image(&self) -> &DecodedImage {
        &self.image
    }

    /// Returns true once the snapshot has been shown for its full display time.
    pub fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.shown_at) >= self.ttl
    }

    /// Time left before the snapshot is hidden.
    pub fn remaining(&self, now: Instant) -> Duration {
        self.ttl
            .saturating_sub(now.saturating_duration_since(self.shown_at))
    }
}
