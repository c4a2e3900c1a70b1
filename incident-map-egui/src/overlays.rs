//! Painting of markers over the map image.

use egui::{Color32, FontId, Painter, Pos2, Rect, Stroke, Vec2};
use incident_map::geo::ScreenProjector;
use incident_map::overlay::{Overlay, OverlayKind};

use crate::icons::IconCache;

const MAX_ICON_SIZE: f32 = 32.0;
const FALLBACK_RADIUS: f32 = 6.0;

/// Paints the overlays inside `rect`, which must be the rect the map image occupies.
///
/// The description of the marker under the pointer is drawn above it, after all markers so
/// it is never covered.
pub(crate) fn paint_overlays<'a>(
    ui: &egui::Ui,
    rect: Rect,
    projector: &ScreenProjector,
    overlays: impl IntoIterator<Item = &'a Overlay>,
    icons: &mut IconCache,
) {
    let painter = ui.painter_at(rect);
    let pointer = ui.ctx().pointer_hover_pos().filter(|pos| rect.contains(*pos));
    let mut hovered = None;

    for overlay in overlays {
        let Some([x, y]) = projector.to_screen(&overlay.position) else {
            continue;
        };
        let anchor = rect.min + Vec2::new(x as f32, y as f32);

        let marker = match icons.get(ui.ctx(), &overlay.icon_url) {
            Some(texture) => {
                let size = icon_size(texture.size_vec2());
                let marker = Rect::from_min_size(anchor - Vec2::new(size.x / 2.0, size.y), size);
                painter.image(
                    texture.id(),
                    marker,
                    Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0)),
                    Color32::WHITE,
                );
                marker
            }
            None => {
                painter.circle(
                    anchor,
                    FALLBACK_RADIUS,
                    fallback_color(overlay.kind),
                    Stroke::new(1.5, Color32::WHITE),
                );
                Rect::from_center_size(anchor, Vec2::splat(FALLBACK_RADIUS * 2.0))
            }
        };

        if let (Some(pointer), Some(description)) = (pointer, overlay.description.as_deref()) {
            if marker.contains(pointer) {
                hovered = Some((marker, description));
            }
        }
    }

    if let Some((marker, description)) = hovered {
        paint_description(&painter, marker, description);
    }
}

fn icon_size(texture_size: Vec2) -> Vec2 {
    let largest = texture_size.max_elem();
    if largest <= MAX_ICON_SIZE || largest <= 0.0 {
        texture_size
    } else {
        texture_size * (MAX_ICON_SIZE / largest)
    }
}

fn fallback_color(kind: OverlayKind) -> Color32 {
    match kind {
        OverlayKind::UserPosition => Color32::from_rgb(0x7b, 0x00, 0x99),
        OverlayKind::Incident => Color32::from_rgb(0xe6, 0x7e, 0x22),
        OverlayKind::ThirdPartyIncident => Color32::from_rgb(0xc0, 0x39, 0x2b),
    }
}

fn paint_description(painter: &Painter, marker: Rect, text: &str) {
    let galley = painter.layout_no_wrap(
        text.to_owned(),
        FontId::proportional(13.0),
        Color32::WHITE,
    );
    let size = galley.size();
    let top_left = marker.center_top() - Vec2::new(size.x / 2.0, size.y + 6.0);

    painter.rect_filled(
        Rect::from_min_size(top_left, size).expand(4.0),
        4.0,
        Color32::from_black_alpha(200),
    );
    painter.galley(top_left, galley, Color32::WHITE);
}
