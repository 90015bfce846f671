use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use std::time::Duration;

use crate::indexer::{ClientSettings, HttpSettings};

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub search: SearchConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    8080
}

/// Database holding the persisted indexer definitions
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("indexhub.db")
}

/// Backend request settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearchConfig {
    /// Per-backend HTTP timeout in seconds (default: 15)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Ordered YTS mirror list; the built-in list when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub yts_mirrors: Option<Vec<String>>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            user_agent: default_user_agent(),
            yts_mirrors: None,
        }
    }
}

fn default_timeout() -> u64 {
    15
}

fn default_user_agent() -> String {
    concat!("indexhub/", env!("CARGO_PKG_VERSION")).to_string()
}

impl SearchConfig {
    /// Settings handed to the client factory.
    pub fn client_settings(&self) -> ClientSettings {
        let defaults = ClientSettings::default();
        ClientSettings {
            http: HttpSettings {
                timeout: Duration::from_secs(self.timeout_secs),
                user_agent: self.user_agent.clone(),
            },
            yts_mirrors: self.yts_mirrors.clone().unwrap_or(defaults.yts_mirrors),
        }
    }
}

/// Config for API responses
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub search: SanitizedSearchConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedSearchConfig {
    pub timeout_secs: u64,
    pub user_agent: String,
    pub yts_mirrors: Vec<String>,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            database: config.database.clone(),
            search: SanitizedSearchConfig {
                timeout_secs: config.search.timeout_secs,
                user_agent: config.search.user_agent.clone(),
                yts_mirrors: config.search.client_settings().yts_mirrors,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_empty_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host.to_string(), "0.0.0.0");
        assert_eq!(config.database.path.to_str().unwrap(), "indexhub.db");
        assert_eq!(config.search.timeout_secs, 15);
        assert!(config.search.user_agent.starts_with("indexhub/"));
        assert!(config.search.yts_mirrors.is_none());
    }

    #[test]
    fn test_deserialize_full_config() {
        let toml = r#"
[server]
host = "127.0.0.1"
port = 9000

[database]
path = "/data/indexers.sqlite"

[search]
timeout_secs = 10
user_agent = "custom/1.0"
yts_mirrors = ["https://yts.example"]
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.host.to_string(), "127.0.0.1");
        assert_eq!(config.server.port, 9000);
        assert_eq!(
            config.database.path.to_str().unwrap(),
            "/data/indexers.sqlite"
        );
        assert_eq!(config.search.timeout_secs, 10);
        assert_eq!(config.search.user_agent, "custom/1.0");
    }

    #[test]
    fn test_client_settings() {
        let search = SearchConfig {
            timeout_secs: 12,
            user_agent: "ua".into(),
            yts_mirrors: Some(vec!["https://one".into()]),
        };
        let settings = search.client_settings();
        assert_eq!(settings.http.timeout, Duration::from_secs(12));
        assert_eq!(settings.http.user_agent, "ua");
        assert_eq!(settings.yts_mirrors, vec!["https://one".to_string()]);

        let defaults = SearchConfig::default().client_settings();
        assert_eq!(defaults.yts_mirrors.len(), 3);
    }

    #[test]
    fn test_sanitized_config() {
        let sanitized = SanitizedConfig::from(&Config::default());
        assert_eq!(sanitized.server.port, 8080);
        assert_eq!(sanitized.search.timeout_secs, 15);
        assert_eq!(sanitized.search.yts_mirrors[0], "https://yts.mx");
    }
}
