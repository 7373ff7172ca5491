//! Dev server configuration from environment variables
//!
//! - `FOLIO_DEV_SERVER_PORT`: Server port (default: 3001)
//! - `FOLIO_DB_PATH`: Database file (default: `~/.folio/database/folio-dev.db`)
//! - `FOLIO_IN_MEMORY`: `1`/`true` keeps everything in memory, no database file
//! - `FOLIO_TREE_DEPTH`, `FOLIO_MAX_TREE_DEPTH`, `FOLIO_MAX_ANCESTOR_STEPS`:
//!   hierarchy overrides
//! - `CORS_ALLOW_ORIGIN`: single allowed origin instead of the local defaults

use anyhow::{anyhow, Context, Result};
use folio_core::HierarchyConfig;
use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_PORT: u16 = 3001;

const DEFAULT_ORIGINS: &[&str] = &[
    "http://localhost:1420",
    "http://localhost:5173",
    "http://localhost:1421",
];

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub db_path: PathBuf,
    pub in_memory: bool,
    pub cors_origins: Vec<String>,
    pub hierarchy: HierarchyConfig,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source (tests pass a map)
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = parse_var(&lookup, "FOLIO_DEV_SERVER_PORT")?.unwrap_or(DEFAULT_PORT);

        let db_path = match lookup("FOLIO_DB_PATH") {
            Some(path) => PathBuf::from(path),
            None => default_db_path()?,
        };

        let in_memory = lookup("FOLIO_IN_MEMORY")
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        let cors_origins = match lookup("CORS_ALLOW_ORIGIN") {
            Some(origin) => vec![origin],
            None => DEFAULT_ORIGINS.iter().map(|o| o.to_string()).collect(),
        };

        let mut hierarchy = HierarchyConfig::default();
        if let Some(depth) = parse_var(&lookup, "FOLIO_TREE_DEPTH")? {
            hierarchy.default_tree_depth = depth;
        }
        if let Some(depth) = parse_var(&lookup, "FOLIO_MAX_TREE_DEPTH")? {
            hierarchy.max_tree_depth = depth;
        }
        if let Some(steps) = parse_var(&lookup, "FOLIO_MAX_ANCESTOR_STEPS")? {
            hierarchy.max_ancestor_steps = steps;
        }
        hierarchy
            .validate()
            .map_err(|e| anyhow!("Invalid hierarchy settings: {}", e))?;

        Ok(Self {
            port,
            db_path,
            in_memory,
            cors_origins,
            hierarchy,
        })
    }
}

fn parse_var<F, T>(lookup: &F, key: &str) -> Result<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .with_context(|| format!("{} has invalid value '{}'", key, raw))
        })
        .transpose()
}

fn default_db_path() -> Result<PathBuf> {
    let home_dir = dirs::home_dir().ok_or_else(|| anyhow!("Failed to get home directory"))?;
    Ok(home_dir.join(".folio").join("database").join("folio-dev.db"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<ServerConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[("FOLIO_DB_PATH", "/tmp/folio.db")]).unwrap();
        assert_eq!(config.port, 3001);
        assert!(!config.in_memory);
        assert_eq!(config.db_path, PathBuf::from("/tmp/folio.db"));
        assert_eq!(config.cors_origins.len(), 3);
        assert_eq!(config.hierarchy, HierarchyConfig::default());
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("FOLIO_DB_PATH", "/tmp/folio.db"),
            ("FOLIO_DEV_SERVER_PORT", "4000"),
            ("FOLIO_IN_MEMORY", "true"),
            ("FOLIO_TREE_DEPTH", "2"),
            ("FOLIO_MAX_ANCESTOR_STEPS", "50"),
            ("CORS_ALLOW_ORIGIN", "http://localhost:8080"),
        ])
        .unwrap();

        assert_eq!(config.port, 4000);
        assert!(config.in_memory);
        assert_eq!(config.hierarchy.default_tree_depth, 2);
        assert_eq!(config.hierarchy.max_ancestor_steps, 50);
        assert_eq!(config.cors_origins, vec!["http://localhost:8080"]);
    }

    #[test]
    fn test_invalid_values_are_errors() {
        let err = config_from(&[("FOLIO_DB_PATH", "/tmp/f.db"), ("FOLIO_DEV_SERVER_PORT", "abc")])
            .unwrap_err();
        assert!(err.to_string().contains("FOLIO_DEV_SERVER_PORT"));

        assert!(config_from(&[
            ("FOLIO_DB_PATH", "/tmp/f.db"),
            ("FOLIO_TREE_DEPTH", "40"),
        ])
        .is_err());
    }
}
