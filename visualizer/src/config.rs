use heatcore::display::ProviderRequest;
use heatcore::interface::GeoPoint;
use log::warn;

pub const DEFAULT_BRIDGE_URL: &str = "http://127.0.0.1:9000";
pub const DEFAULT_CENTER: (f64, f64) = (28.5956, 77.1673);
pub const DEFAULT_ZOOM: f64 = 12.0;

/// Where the viewer fetches from and what the map opens on. Values can be
/// overridden through `HEATMAP_*` environment variables.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewConfig {
    pub bridge_url: String,
    pub latitude: f64,
    pub longitude: f64,
    pub zoom: f64,
    pub map_key: String,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }
}

impl ViewConfig {
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let bridge_url = lookup("HEATMAP_BRIDGE_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_BRIDGE_URL.into());
        let latitude = lookup("HEATMAP_MAP_LAT")
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_CENTER.0);
        let longitude = lookup("HEATMAP_MAP_LON")
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_CENTER.1);
        let zoom = lookup("HEATMAP_MAP_ZOOM")
            .and_then(|v| v.parse::<f64>().ok())
            .filter(|zoom| (0.0..=22.0).contains(zoom))
            .unwrap_or(DEFAULT_ZOOM);
        let map_key = lookup("HEATMAP_MAP_KEY").unwrap_or_default();

        let (latitude, longitude) = match GeoPoint::new(latitude, longitude) {
            Ok(center) => (center.lat(), center.lng()),
            Err(err) => {
                warn!("ignoring map center override: {err}");
                DEFAULT_CENTER
            }
        };

        Self {
            bridge_url,
            latitude,
            longitude,
            zoom,
            map_key,
        }
    }

    pub fn provider_request(&self) -> ProviderRequest {
        ProviderRequest::new(self.bridge_url.clone(), self.map_key.clone())
    }

    pub fn points_url(&self) -> String {
        format!("{}/points", self.bridge_url)
    }
}
