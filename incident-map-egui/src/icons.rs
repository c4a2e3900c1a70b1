use std::collections::HashMap;

use egui::{ColorImage, TextureHandle, TextureOptions};
use futures::channel::mpsc::{unbounded, UnboundedReceiver, UnboundedSender};
use incident_map::decoded_image::DecodedImage;
use incident_map::platform::{spawn, HttpClient};
use incident_map::{HttpClientImpl, IncidentMapError};

type LoadedIcon = (String, Result<DecodedImage, IncidentMapError>);

enum IconState {
    Loading,
    Ready(TextureHandle),
    Failed,
}

/// Marker icons keyed by url. Every url is requested once; failed icons are not retried and
/// their markers keep the fallback look.
pub(crate) struct IconCache {
    http: HttpClientImpl,
    icons: HashMap<String, IconState>,
    sender: UnboundedSender<LoadedIcon>,
    receiver: UnboundedReceiver<LoadedIcon>,
}

impl IconCache {
    pub(crate) fn new(http: HttpClientImpl) -> Self {
        let (sender, receiver) = unbounded();
        Self {
            http,
            icons: HashMap::new(),
            sender,
            receiver,
        }
    }

    /// Texture of the icon, or `None` while it is loading or if it cannot be loaded.
    pub(crate) fn get(&mut self, ctx: &egui::Context, url: &str) -> Option<&TextureHandle> {
        if !self.icons.contains_key(url) {
            self.load(ctx, url);
        }

        match self.icons.get(url) {
            Some(IconState::Ready(texture)) => Some(texture),
            _ => None,
        }
    }

    /// Turns finished downloads into textures.
    pub(crate) fn poll(&mut self, ctx: &egui::Context) {
        while let Ok(Some((url, result))) = self.receiver.try_next() {
            let state = match result {
                Ok(image) => IconState::Ready(ctx.load_texture(
                    url.as_str(),
                    to_color_image(&image),
                    TextureOptions::LINEAR,
                )),
                Err(err) => {
                    log::warn!("Failed to load icon {url}: {err}");
                    IconState::Failed
                }
            };
            self.icons.insert(url, state);
        }
    }

    fn load(&mut self, ctx: &egui::Context, url: &str) {
        log::debug!("Loading icon {url}");
        self.icons.insert(url.to_owned(), IconState::Loading);

        let http = self.http.clone();
        let sender = self.sender.clone();
        let ctx = ctx.clone();
        let url = url.to_owned();
        spawn(async move {
            let result = match http.get(&url).await {
                Ok(bytes) => DecodedImage::decode(&bytes),
                Err(err) => Err(err),
            };
            if sender.unbounded_send((url, result)).is_ok() {
                ctx.request_repaint();
            }
        });
    }
}

pub(crate) fn to_color_image(image: &DecodedImage) -> ColorImage {
    let (width, height) = image.dimensions;
    ColorImage::from_rgba_unmultiplied([width as usize, height as usize], &image.bytes)
}
