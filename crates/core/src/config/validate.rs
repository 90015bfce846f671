use super::{types::Config, ConfigError};

const MAX_TIMEOUT_SECS: u64 = 60;

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Backend timeout is within 1..=60 seconds
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.search.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "search.timeout_secs cannot be 0".to_string(),
        ));
    }

    if config.search.timeout_secs > MAX_TIMEOUT_SECS {
        return Err(ConfigError::ValidationError(format!(
            "search.timeout_secs cannot exceed {}",
            MAX_TIMEOUT_SECS
        )));
    }

    if let Some(mirrors) = &config.search.yts_mirrors {
        if mirrors.iter().all(|m| m.trim().is_empty()) {
            return Err(ConfigError::ValidationError(
                "search.yts_mirrors must list at least one mirror".to_string(),
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SearchConfig, ServerConfig};
    use std::net::IpAddr;

    #[test]
    fn test_validate_valid_config() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_port_zero_fails() {
        let config = Config {
            server: ServerConfig {
                host: "0.0.0.0".parse::<IpAddr>().unwrap(),
                port: 0,
            },
            ..Config::default()
        };
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_validate_timeout_bounds() {
        for timeout_secs in [0, 61] {
            let config = Config {
                search: SearchConfig {
                    timeout_secs,
                    ..SearchConfig::default()
                },
                ..Config::default()
            };
            assert!(validate_config(&config).is_err());
        }
    }

    #[test]
    fn test_validate_empty_mirror_list_fails() {
        let config = Config {
            search: SearchConfig {
                yts_mirrors: Some(vec![]),
                ..SearchConfig::default()
            },
            ..Config::default()
        };
        assert!(validate_config(&config).is_err());
    }
}
