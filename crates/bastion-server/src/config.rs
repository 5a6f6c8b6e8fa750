//! Server configuration read from the environment.

use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

pub const DEFAULT_SEED_SIZE: u32 = 64;
pub const DEFAULT_ACTION_LOG_LIMIT: usize = 10_000;
/// Well-known id of the seeded demo map.
pub const DEFAULT_SEED_MAP_ID: uuid::Uuid = uuid::Uuid::from_u128(0x0000_0000_0000_4000_8000_0000_0000_0001);

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} has an invalid value {value:?}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    /// Directory with the built front end (`trunk build` output).
    pub static_dir: PathBuf,
    pub action_log_limit: usize,
    pub seed: SeedConfig,
}

/// Demo campaign and map created at startup.
#[derive(Debug, Clone)]
pub struct SeedConfig {
    pub map_id: uuid::Uuid,
    pub width: u32,
    pub height: u32,
    pub owner: String,
    pub editors: Vec<String>,
    pub viewers: Vec<String>,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let addr = parse_or(&lookup, "BASTION_ADDR", || SocketAddr::from(([0, 0, 0, 0], 3000)))?;
        let static_dir = lookup("BASTION_STATIC_DIR").map_or_else(|| PathBuf::from("dist"), PathBuf::from);
        let action_log_limit =
            parse_or(&lookup, "BASTION_ACTION_LOG_LIMIT", || DEFAULT_ACTION_LOG_LIMIT)?;

        let width = parse_or(&lookup, "BASTION_SEED_WIDTH", || DEFAULT_SEED_SIZE)?;
        let height = parse_or(&lookup, "BASTION_SEED_HEIGHT", || DEFAULT_SEED_SIZE)?;
        if width == 0 {
            return Err(invalid("BASTION_SEED_WIDTH", "0"));
        }
        if height == 0 {
            return Err(invalid("BASTION_SEED_HEIGHT", "0"));
        }

        let seed = SeedConfig {
            map_id: parse_or(&lookup, "BASTION_SEED_MAP_ID", || DEFAULT_SEED_MAP_ID)?,
            width,
            height,
            owner: lookup("BASTION_SEED_OWNER").unwrap_or_else(|| "owner".to_string()),
            editors: list_or(&lookup, "BASTION_SEED_EDITORS", "editor"),
            viewers: list_or(&lookup, "BASTION_SEED_VIEWERS", "viewer"),
        };

        Ok(Self {
            addr,
            static_dir,
            action_log_limit,
            seed,
        })
    }
}

fn invalid(name: &'static str, value: &str) -> ConfigError {
    ConfigError::Invalid {
        name,
        value: value.to_string(),
    }
}

fn parse_or<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: impl FnOnce() -> T,
) -> Result<T, ConfigError> {
    match lookup(name) {
        Some(raw) => raw.trim().parse().map_err(|_| invalid(name, &raw)),
        None => Ok(default()),
    }
}

fn list_or(lookup: &impl Fn(&str) -> Option<String>, name: &str, default: &str) -> Vec<String> {
    lookup(name)
        .unwrap_or_else(|| default.to_string())
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<ServerConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        ServerConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]).unwrap();
        assert_eq!(config.addr.to_string(), "0.0.0.0:3000");
        assert_eq!(config.seed.width, DEFAULT_SEED_SIZE);
        assert_eq!(config.seed.map_id, DEFAULT_SEED_MAP_ID);
        assert_eq!(config.seed.editors, vec!["editor".to_string()]);
    }

    #[test]
    fn test_overrides_and_lists() {
        let config = config(&[
            ("BASTION_ADDR", "127.0.0.1:8080"),
            ("BASTION_SEED_WIDTH", "12"),
            ("BASTION_SEED_EDITORS", "alice, bob,,"),
        ])
        .unwrap();
        assert_eq!(config.addr.port(), 8080);
        assert_eq!(config.seed.width, 12);
        assert_eq!(config.seed.editors, vec!["alice".to_string(), "bob".to_string()]);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(matches!(
            config(&[("BASTION_SEED_HEIGHT", "tall")]),
            Err(ConfigError::Invalid { name: "BASTION_SEED_HEIGHT", .. })
        ));
        assert!(config(&[("BASTION_SEED_WIDTH", "0")]).is_err());
    }
}
