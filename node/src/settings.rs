use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use config::{Config, File as ConfigFile};
use snipshare_files::DEFAULT_CHUNK_SIZE;
use snipshare_p2p::PeerAddress;
use tracing::warn;
use url::Url;

/// Config file picked up when `--config` is not given.
pub const DEFAULT_CONFIG_PATH: &str = "config/snipshare.toml";
/// Prefix of environment overrides, e.g. `SNIPSHARE_LOG_LEVEL`.
pub const ENV_PREFIX: &str = "SNIPSHARE";

const DEFAULT_SHARE_BASE_URL: &str = "http://localhost:5173/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    // Logging
    pub log_level: String,
    pub log_format: String,

    // Links
    pub share_base_url: String,

    // Peers
    pub node_addresses: Vec<String>,

    // Store
    pub read_chunk_size: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            share_base_url: DEFAULT_SHARE_BASE_URL.to_string(),
            node_addresses: Vec::new(),
            read_chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl AppConfig {
    /// Load from the config file (if any) and `SNIPSHARE_*` variables.
    pub fn load(config_path_override: Option<&str>) -> Result<Self> {
        let resolved_path = match config_path_override {
            Some(path) => {
                let path = PathBuf::from(path);
                if !path.exists() {
                    anyhow::bail!(
                        "Configuration file {} not found (specified via --config)",
                        path.display()
                    );
                }
                Some(path)
            }
            None => Some(PathBuf::from(DEFAULT_CONFIG_PATH)).filter(|path| path.exists()),
        };

        let mut builder = Config::builder();
        if let Some(path) = &resolved_path {
            builder = builder.add_source(ConfigFile::from(path.as_path()));
        }
        builder = builder.add_source(config::Environment::with_prefix(ENV_PREFIX));

        let config = builder
            .build()
            .with_context(|| describe_source(resolved_path.as_deref()))?;
        Self::from_config(&config)
    }

    fn from_config(config: &Config) -> Result<Self> {
        let defaults = Self::default();

        let read_chunk_size = match get_string_value(config, &["read_chunk_size", "store.read_chunk_size"]) {
            Some(raw) => raw
                .parse::<usize>()
                .with_context(|| format!("invalid read_chunk_size '{raw}'"))?,
            None => defaults.read_chunk_size,
        };

        Ok(Self {
            log_level: get_string_value(config, &["log_level", "logging.level"])
                .unwrap_or(defaults.log_level),
            log_format: get_string_value(config, &["log_format", "logging.format"])
                .unwrap_or(defaults.log_format),
            share_base_url: get_string_value(config, &["share_base_url", "share.base_url"])
                .unwrap_or(defaults.share_base_url),
            node_addresses: get_list_value(config, &["node_addresses", "p2p.node_addresses"]),
            read_chunk_size,
        })
    }

    pub fn validate(&self) -> Result<()> {
        self.base_url()?;
        if self.read_chunk_size == 0 {
            anyhow::bail!("read_chunk_size must be greater than zero");
        }
        if !matches!(self.log_format.as_str(), "pretty" | "json") {
            anyhow::bail!(
                "unsupported log_format '{}' (expected pretty or json)",
                self.log_format
            );
        }
        for address in &self.node_addresses {
            if let Err(err) = PeerAddress::from(address.as_str()).to_multiaddr() {
                warn!("Configured node address will never be shared: {}", err);
            }
        }
        Ok(())
    }

    pub fn base_url(&self) -> Result<Url> {
        Url::parse(&self.share_base_url)
            .with_context(|| format!("invalid share_base_url '{}'", self.share_base_url))
    }

    pub fn peer_addresses(&self) -> Vec<PeerAddress> {
        self.node_addresses
            .iter()
            .map(|address| PeerAddress::from(address.as_str()))
            .collect()
    }
}

fn describe_source(path: Option<&Path>) -> String {
    match path {
        Some(path) => format!("failed to read configuration from {}", path.display()),
        None => "failed to read configuration from the environment".to_string(),
    }
}

fn get_string_value(config: &Config, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| {
        config
            .get_string(key)
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    })
}

/// A list given either as an array or as a comma-separated string.
fn get_list_value(config: &Config, keys: &[&str]) -> Vec<String> {
    for key in keys {
        if let Ok(values) = config.get_array(key) {
            return values
                .into_iter()
                .filter_map(|value| value.into_string().ok())
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .collect();
        }
        if let Some(raw) = get_string_value(config, &[key]) {
            return raw
                .split(',')
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .collect();
        }
    }
    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .expect("temp config");
        file.write_all(contents.as_bytes()).expect("write config");
        file
    }

    fn load_file(contents: &str) -> Result<AppConfig> {
        let file = write_config(contents);
        let config = Config::builder()
            .add_source(ConfigFile::from(file.path()))
            .build()?;
        AppConfig::from_config(&config)
    }

    #[test]
    fn defaults_are_valid() {
        let config = AppConfig::default();
        config.validate().expect("valid defaults");
        assert_eq!(config.read_chunk_size, DEFAULT_CHUNK_SIZE);
    }

    #[test]
    fn reads_flat_keys_and_address_arrays() {
        let config = load_file(
            r#"
log_level = "debug"
share_base_url = "https://snip.example/"
node_addresses = ["/ip4/192.0.2.10/udp/4001/webrtc-direct", " "]
read_chunk_size = 1024
"#,
        )
        .expect("load");

        assert_eq!(config.log_level, "debug");
        assert_eq!(config.log_format, "pretty");
        assert_eq!(config.share_base_url, "https://snip.example/");
        assert_eq!(
            config.node_addresses,
            vec!["/ip4/192.0.2.10/udp/4001/webrtc-direct".to_string()]
        );
        assert_eq!(config.read_chunk_size, 1024);
    }

    #[test]
    fn reads_sectioned_keys_and_comma_lists() {
        let config = load_file(
            r#"
[logging]
format = "json"

[p2p]
node_addresses = "/ip4/192.0.2.10/udp/4001/webrtc-direct, /dns4/relay.example.com/tcp/443/wss/p2p-circuit"
"#,
        )
        .expect("load");

        assert_eq!(config.log_format, "json");
        assert_eq!(config.node_addresses.len(), 2);
        assert_eq!(
            config.node_addresses[1],
            "/dns4/relay.example.com/tcp/443/wss/p2p-circuit"
        );
    }

    #[test]
    fn load_with_explicit_path() {
        let file = write_config("share_base_url = \"https://snip.example/app/\"\n");
        let path = file.path().to_str().expect("utf-8 path");
        let config = AppConfig::load(Some(path)).expect("load");
        assert_eq!(config.share_base_url, "https://snip.example/app/");
    }

    #[test]
    fn missing_explicit_path_is_an_error() {
        let err = AppConfig::load(Some("/definitely/not/here.toml")).expect_err("missing file");
        assert!(err.to_string().contains("--config"));
    }

    #[test]
    fn validation_rejects_bad_values() {
        let config = AppConfig {
            share_base_url: "not a url".into(),
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());

        let config = AppConfig {
            read_chunk_size: 0,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());

        let config = AppConfig {
            log_format: "xml".into(),
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());

        assert!(load_file("read_chunk_size = \"lots\"\n").is_err());
    }
}
