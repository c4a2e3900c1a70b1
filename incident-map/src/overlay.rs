//! Markers anchored to geographic coordinates and drawn over the base map.

use galileo_types::geo::impls::GeoPoint2d;

use crate::incident::{Incident, ThirdPartyIncident};

/// What an overlay represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OverlayKind {
    /// Current position of the user (or the last click).
    UserPosition,
    /// Incident stored in the backend.
    Incident,
    /// Incident returned by the third-party traffic API.
    ThirdPartyIncident,
}

/// A marker anchored at a map coordinate. The icon's bottom center sits on the anchor.
#[derive(Debug, Clone, PartialEq)]
pub struct Overlay {
    /// What the overlay represents.
    pub kind: OverlayKind,
    /// Anchor point.
    pub position: GeoPoint2d,
    /// Url of the icon image.
    pub icon_url: String,
    /// Description shown when the marker is hovered.
    pub description: Option<String>,
}

impl Overlay {
    /// User position marker.
    pub fn user_position(position: GeoPoint2d, icon_url: impl Into<String>) -> Self {
        Self {
            kind: OverlayKind::UserPosition,
            position,
            icon_url: icon_url.into(),
            description: None,
        }
    }

    /// Marker of a backend incident. Returns `None` if the record coordinates do not parse.
    pub fn from_incident(incident: &Incident, icon_url: &str) -> Option<Self> {
        match incident.position() {
            Ok(position) => Some(Self {
                kind: OverlayKind::Incident,
                position,
                icon_url: icon_url.to_owned(),
                description: Some(incident.short_desc.clone()),
            }),
            Err(err) => {
                log::warn!("Skipping incident {incident:?}: {err}");
                None
            }
        }
    }

    /// Marker of a third-party incident, using the icon the provider suggests.
    pub fn from_third_party(incident: &ThirdPartyIncident) -> Self {
        Self {
            kind: OverlayKind::ThirdPartyIncident,
            position: incident.position(),
            icon_url: incident.icon_url.clone(),
            description: Some(incident.short_desc.clone()),
        }
    }
}

/// Incident overlays currently shown on the map.
///
/// The collection is only changed as a whole, so it always mirrors the last incident list it
/// was given.
#[derive(Debug, Default, Clone)]
pub struct OverlayCollection {
    overlays: Vec<Overlay>,
}

impl OverlayCollection {
    /// Appends the overlays to the collection.
    pub fn add_all(&mut self, overlays: impl IntoIterator<Item = Overlay>) {
        self.overlays.extend(overlays);
    }

    /// Removes all overlays.
    pub fn clear_all(&mut self) {
        self.overlays.clear();
    }

    /// Removes all overlays and adds the given ones.
    pub fn replace_all(&mut self, overlays: impl IntoIterator<Item = Overlay>) {
        self.clear_all();
        self.add_all(overlays);
    }

    /// Number of overlays.
    pub fn len(&self) -> usize {
        self.overlays.len()
    }

    /// Returns true if there are no overlays.
    pub fn is_empty(&self) -> bool {
        self.overlays.is_empty()
    }

    /// Iterates over the overlays in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Overlay> + '_ {
        self.overlays.iter()
    }
}
