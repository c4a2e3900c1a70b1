//! Geographic helpers: rounded click locations, search boxes and conversion between
//! geographic, projected and screen coordinates.

use std::fmt::{Display, Formatter};

use galileo_types::cartesian::{CartesianPoint2d, Point2};
use galileo_types::geo::impls::GeoPoint2d;
use galileo_types::geo::{Crs, GeoPoint, NewGeoPoint, Projection};

/// Location of a map click, rounded to two decimal places.
///
/// All requests triggered by a click (traffic image, incident search, incident creation) use
/// the rounded values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClickLocation {
    lon: f64,
    lat: f64,
}

impl ClickLocation {
    /// Rounds the given coordinates (in degrees) to two decimals. Longitude is wrapped into
    /// `[-180, 180)` first.
    pub fn new(lon: f64, lat: f64) -> Self {
        Self {
            lon: round2(wrap_longitude(lon)),
            lat: round2(lat),
        }
    }

    /// Rounded longitude.
    pub fn lon(&self) -> f64 {
        self.lon
    }

    /// Rounded latitude.
    pub fn lat(&self) -> f64 {
        self.lat
    }

    /// Longitude as sent to remote services.
    pub fn lon_string(&self) -> String {
        format!("{:.2}", self.lon)
    }

    /// Latitude as sent to remote services.
    pub fn lat_string(&self) -> String {
        format!("{:.2}", self.lat)
    }

    /// The location as a geographic point.
    pub fn to_geo(&self) -> GeoPoint2d {
        GeoPoint2d::latlon(self.lat, self.lon)
    }
}

impl From<&GeoPoint2d> for ClickLocation {
    fn from(point: &GeoPoint2d) -> Self {
        Self::new(point.lon(), point.lat())
    }
}

impl Display for ClickLocation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Longitude:{:.2}, Latitude:{:.2}", self.lon, self.lat)
    }
}

/// Brings a longitude that went around the antimeridian back into `[-180, 180)`.
pub fn wrap_longitude(lon: f64) -> f64 {
    if (-180.0..180.0).contains(&lon) {
        lon
    } else {
        (lon + 180.0).rem_euclid(360.0) - 180.0
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Axis aligned box in geographic coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// Minimum latitude.
    pub south: f64,
    /// Minimum longitude.
    pub west: f64,
    /// Maximum latitude.
    pub north: f64,
    /// Maximum longitude.
    pub east: f64,
}

impl BoundingBox {
    /// Box extending `pad` degrees from the location in each direction.
    pub fn around(location: &ClickLocation, pad: f64) -> Self {
        Self {
            south: location.lat() - pad,
            west: location.lon() - pad,
            north: location.lat() + pad,
            east: location.lon() + pad,
        }
    }

    /// Returns true if the point lies inside the box (borders included).
    pub fn contains(&self, point: &impl GeoPoint<Num = f64>) -> bool {
        (self.south..=self.north).contains(&point.lat())
            && (self.west..=self.east).contains(&point.lon())
    }

    /// `south,west,north,east` string used by the incidents query.
    pub fn to_query_value(&self) -> String {
        format!(
            "{:.4},{:.4},{:.4},{:.4}",
            self.south, self.west, self.north, self.east
        )
    }
}

/// Converts between geographic coordinates, Web Mercator map coordinates and screen pixels
/// of a north-up view.
pub struct ScreenProjector {
    projection: Box<dyn Projection<InPoint = GeoPoint2d, OutPoint = Point2>>,
    center: Point2,
    resolution: f64,
    width: f64,
    height: f64,
}

impl ScreenProjector {
    /// Creates a projector for a view centered at `center` with the given resolution
    /// (map units per pixel) and screen size in pixels.
    ///
    /// Returns `None` if the center cannot be projected.
    pub fn new(center: &GeoPoint2d, resolution: f64, width: f64, height: f64) -> Option<Self> {
        let projection = Crs::EPSG3857.get_projection::<GeoPoint2d, Point2>()?;
        let center = projection.project(center)?;

        Some(Self {
            projection,
            center,
            resolution,
            width,
            height,
        })
    }

    /// Projects a geographic point into map coordinates.
    pub fn to_map(&self, point: &GeoPoint2d) -> Option<Point2> {
        self.projection.project(point)
    }

    /// Screen position (pixels from the top-left corner) of a geographic point.
    pub fn to_screen(&self, point: &GeoPoint2d) -> Option<[f64; 2]> {
        let projected = self.projection.project(point)?;
        Some([
            self.width / 2.0 + (projected.x() - self.center.x()) / self.resolution,
            self.height / 2.0 - (projected.y() - self.center.y()) / self.resolution,
        ])
    }

    /// Geographic point under the given screen position. Longitude is wrapped into
    /// `[-180, 180)` when the view shows the world more than once.
    pub fn to_geo(&self, screen: [f64; 2]) -> Option<GeoPoint2d> {
        let x = self.center.x() + (screen[0] - self.width / 2.0) * self.resolution;
        let y = self.center.y() - (screen[1] - self.height / 2.0) * self.resolution;
        let point = self.projection.unproject(&Point2::new(x, y))?;
        Some(GeoPoint2d::latlon(point.lat(), wrap_longitude(point.lon())))
    }
}
