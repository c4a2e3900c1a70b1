//! Continuous tracking of the user's position.

use galileo_types::geo::impls::GeoPoint2d;

use crate::error::IncidentMapError;

/// Receives position updates.
pub type PositionCallback = Box<dyn Fn(GeoPoint2d) + 'static>;

/// Active high-accuracy position watch. Tracking stops when the value is dropped.
pub struct GeolocationWatch {
    #[cfg(target_arch = "wasm32")]
    _inner: web::WebWatch,
}

impl GeolocationWatch {
    /// Starts tracking the position and calls `on_position` for every update.
    ///
    /// Errors reported by the platform after tracking has started are logged; the callback is
    /// simply not called in that case.
    #[cfg(target_arch = "wasm32")]
    pub fn start(on_position: PositionCallback) -> Result<Self, IncidentMapError> {
        Ok(Self {
            _inner: web::WebWatch::start(on_position)?,
        })
    }

    /// Starts tracking the position and calls `on_position` for every update.
    ///
    /// No position source is available on native platforms.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn start(_on_position: PositionCallback) -> Result<Self, IncidentMapError> {
        Err(IncidentMapError::GeolocationUnavailable(
            "no position provider on this platform".into(),
        ))
    }
}

impl std::fmt::Debug for GeolocationWatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeolocationWatch").finish_non_exhaustive()
    }
}

#[cfg(target_arch = "wasm32")]
mod web {
    use galileo_types::geo::impls::GeoPoint2d;
    use galileo_types::geo::NewGeoPoint;
    use wasm_bindgen::prelude::*;
    use wasm_bindgen::JsCast;
    use web_sys::{Geolocation, GeolocationPosition, GeolocationPositionError, PositionOptions};

    use super::PositionCallback;
    use crate::error::IncidentMapError;

    pub(super) struct WebWatch {
        geolocation: Geolocation,
        watch_id: i32,
        _on_success: Closure<dyn FnMut(GeolocationPosition)>,
        _on_error: Closure<dyn FnMut(GeolocationPositionError)>,
    }

    impl WebWatch {
        pub(super) fn start(on_position: PositionCallback) -> Result<Self, IncidentMapError> {
            let window = web_sys::window()
                .ok_or_else(|| IncidentMapError::Wasm(Some("no window".into())))?;
            let geolocation = window.navigator().geolocation()?;

            let on_success = Closure::wrap(Box::new(move |position: GeolocationPosition| {
                let coords = position.coords();
                on_position(GeoPoint2d::latlon(coords.latitude(), coords.longitude()));
            }) as Box<dyn FnMut(GeolocationPosition)>);

            let on_error = Closure::wrap(Box::new(move |error: GeolocationPositionError| {
                log::warn!("Geolocation error {}: {}", error.code(), error.message());
            }) as Box<dyn FnMut(GeolocationPositionError)>);

            let options = PositionOptions::new();
            options.set_enable_high_accuracy(true);

            let watch_id = geolocation.watch_position_with_error_callback_and_options(
                on_success.as_ref().unchecked_ref(),
                Some(on_error.as_ref().unchecked_ref()),
                &options,
            )?;
            log::info!("Started position tracking (watch {watch_id})");

            Ok(Self {
                geolocation,
                watch_id,
                _on_success: on_success,
                _on_error: on_error,
            })
        }
    }

    impl Drop for WebWatch {
        fn drop(&mut self) {
            log::info!("Stopping position tracking (watch {})", self.watch_id);
            self.geolocation.clear_watch(self.watch_id);
        }
    }
}
