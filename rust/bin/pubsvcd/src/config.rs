//! Server configuration, loaded from `/etc/pubsvc/<name>.toml`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Directory bare context names resolve into.
pub const CONFIG_DIR: &str = "/etc/pubsvc";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub storage: StorageConfig,
    /// Absent when no trend ranker is deployed; `/trending` then answers 503.
    #[serde(default)]
    pub trends: Option<TrendsConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendsConfig {
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    5
}

impl ServerConfig {
    /// Resolve `-c` to a file path.
    ///
    /// Anything containing `/` or `.` is taken as a path; a bare name maps to
    /// `/etc/pubsvc/<name>.toml`.
    pub fn resolve_path(name_or_path: &str) -> PathBuf {
        if name_or_path.contains('/') || name_or_path.contains('.') {
            PathBuf::from(name_or_path)
        } else {
            Path::new(CONFIG_DIR).join(format!("{name_or_path}.toml"))
        }
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("cannot read {}: {}", path.display(), e))?;
        let config: ServerConfig = toml::from_str(&content)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_path() {
        assert_eq!(
            ServerConfig::resolve_path("prod"),
            PathBuf::from("/etc/pubsvc/prod.toml")
        );
        assert_eq!(
            ServerConfig::resolve_path("./local.toml"),
            PathBuf::from("./local.toml")
        );
        assert_eq!(
            ServerConfig::resolve_path("/tmp/x"),
            PathBuf::from("/tmp/x")
        );
    }

    #[test]
    fn test_load_full() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dev.toml");
        std::fs::write(
            &path,
            r#"
[storage]
data_dir = "/var/lib/pubsvc"

[trends]
base_url = "http://trends:8000"
timeout_secs = 2
"#,
        )
        .unwrap();

        let config = ServerConfig::load(&path).unwrap();
        assert_eq!(config.storage.data_dir, "/var/lib/pubsvc");
        let trends = config.trends.unwrap();
        assert_eq!(trends.base_url, "http://trends:8000");
        assert_eq!(trends.timeout_secs, 2);
    }

    #[test]
    fn test_load_without_trends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dev.toml");
        std::fs::write(&path, "[storage]\ndata_dir = \"/data\"\n").unwrap();

        let config = ServerConfig::load(&path).unwrap();
        assert!(config.trends.is_none());
    }

    #[test]
    fn test_load_missing_file() {
        assert!(ServerConfig::load(Path::new("/nonexistent/pubsvc.toml")).is_err());
    }
}
