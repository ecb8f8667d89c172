use iced::{Point, Size};
use std::f64::consts::PI;

const TILE_SIZE: f64 = 256.0;
const MAX_MERCATOR_LAT: f64 = 85.051_128_78;

/// Web Mercator view centered on a coordinate at a fixed zoom.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapView {
    pub latitude: f64,
    pub longitude: f64,
    pub zoom: f64,
}

impl MapView {
    pub fn new(latitude: f64, longitude: f64, zoom: f64) -> Self {
        Self {
            latitude,
            longitude,
            zoom,
        }
    }

    /// Screen position of a coordinate inside a canvas of `size`.
    pub fn project(&self, latitude: f64, longitude: f64, size: Size) -> Point {
        let (cx, cy) = world_pixels(self.latitude, self.longitude, self.zoom);
        let (x, y) = world_pixels(latitude, longitude, self.zoom);
        Point::new(
            (x - cx) as f32 + size.width / 2.0,
            (y - cy) as f32 + size.height / 2.0,
        )
    }

    /// Degrees of longitude covered by one screen pixel.
    pub fn degrees_per_pixel(&self) -> f64 {
        360.0 / (TILE_SIZE * 2f64.powf(self.zoom))
    }
}

fn world_pixels(latitude: f64, longitude: f64, zoom: f64) -> (f64, f64) {
    let scale = TILE_SIZE * 2f64.powf(zoom);
    let lat = latitude.clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT).to_radians();
    let x = (longitude + 180.0) / 360.0 * scale;
    let y = (1.0 - (lat.tan() + 1.0 / lat.cos()).ln() / PI) / 2.0 * scale;
    (x, y)
}
