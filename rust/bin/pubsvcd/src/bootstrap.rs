//! Bootstrap - first-start checks before any store is opened.

use crate::config::ServerConfig;

/// Verify server configuration is usable.
pub fn verify_config(config: &ServerConfig) -> anyhow::Result<()> {
    if config.storage.data_dir.trim().is_empty() {
        anyhow::bail!("Storage data_dir is empty in configuration.");
    }
    if let Some(trends) = &config.trends {
        if !(trends.base_url.starts_with("http://") || trends.base_url.starts_with("https://")) {
            anyhow::bail!(
                "Trends base_url must be an http(s) URL, got '{}'.",
                trends.base_url
            );
        }
        if trends.timeout_secs == 0 {
            anyhow::bail!("Trends timeout_secs must be positive.");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{StorageConfig, TrendsConfig};

    fn config(data_dir: &str, trends: Option<&str>) -> ServerConfig {
        ServerConfig {
            storage: StorageConfig {
                data_dir: data_dir.to_string(),
            },
            trends: trends.map(|url| TrendsConfig {
                base_url: url.to_string(),
                timeout_secs: 5,
            }),
        }
    }

    #[test]
    fn test_verify_config_ok() {
        assert!(verify_config(&config("/tmp", None)).is_ok());
        assert!(verify_config(&config("/tmp", Some("https://trends.local"))).is_ok());
    }

    #[test]
    fn test_verify_config_empty_data_dir() {
        assert!(verify_config(&config("  ", None)).is_err());
    }

    #[test]
    fn test_verify_config_bad_trends_url() {
        assert!(verify_config(&config("/tmp", Some("trends:8000"))).is_err());
    }
}
