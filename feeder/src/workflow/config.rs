use crate::generator::scatter::SyntheticConfig;
use anyhow::Context;
use heatcore::display::VISUALIZATION_LIBRARY;
use heatcore::store::StoreConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FeederConfig {
    pub store: StoreConfig,
    pub bridge: BridgeConfig,
    /// Local JSON fixture used instead of the store.
    pub records: Option<PathBuf>,
    /// Synthetic records used instead of the store.
    pub synthetic: Option<SyntheticConfig>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    pub port: u16,
    /// Feature libraries the provider endpoint reports as available.
    pub libraries: Vec<String>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            port: 9000,
            libraries: vec![VISUALIZATION_LIBRARY.to_string()],
        }
    }
}

impl BridgeConfig {
    pub fn bind_address(&self) -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], self.port))
    }
}

impl FeederConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading feeder config {}", path_ref.display()))?;
        let config: FeederConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing feeder config {}", path_ref.display()))?;
        Ok(config)
    }

    pub fn from_args(project_id: Option<String>, collection: Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(project_id) = project_id {
            config.store.project_id = project_id;
        }
        if let Some(collection) = collection {
            config.store.collection = collection;
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn config_from_args_keeps_store_defaults() {
        let cfg = FeederConfig::from_args(Some("heatmap-demo".into()), None);
        assert_eq!(cfg.store.project_id, "heatmap-demo");
        assert_eq!(cfg.store.collection, "crime");
        assert_eq!(cfg.store.timestamp_field, None);
        assert_eq!(cfg.bridge.port, 9000);
        assert_eq!(cfg.bridge.libraries, vec!["visualization".to_string()]);
    }

    #[test]
    fn config_load_reads_yaml() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(
            b"store:\n  project_id: heatmap-demo\n  api_key: abc\n  timestamp_field: timestamp\nbridge:\n  port: 9100\nsynthetic:\n  count: 50\n",
        )
        .unwrap();
        let path = temp.into_temp_path();
        let cfg = FeederConfig::load(&path).unwrap();
        assert_eq!(cfg.store.project_id, "heatmap-demo");
        assert_eq!(cfg.store.api_key.as_deref(), Some("abc"));
        assert_eq!(cfg.store.timestamp_field.as_deref(), Some("timestamp"));
        assert_eq!(cfg.store.collection, "crime");
        assert_eq!(cfg.bridge.port, 9100);
        assert_eq!(cfg.synthetic.map(|s| s.count), Some(50));
    }

    #[test]
    fn config_load_reports_missing_file() {
        let err = FeederConfig::load("/no/such/feeder.yaml").unwrap_err();
        assert!(err.to_string().contains("reading feeder config"));
    }
}
