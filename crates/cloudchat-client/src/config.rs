//! Client configuration loaded from environment variables.
//!
//! Every setting has a default, so the client starts with no configuration.

use std::path::PathBuf;

use cloudchat_store::{LocalBackend, StoreError};

/// Client configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientConfig {
    /// SQLite file backing the local database.
    /// Env: `CLOUDCHAT_DB_PATH`
    /// Default: `cloudchat.db` in the platform data directory.
    pub db_path: Option<PathBuf>,

    /// Keep everything in memory; nothing survives the process.
    /// Env: `CLOUDCHAT_IN_MEMORY` (true/false)
    /// Default: `false`
    pub in_memory: bool,

    /// Join the lobby right after logging in.
    /// Env: `CLOUDCHAT_AUTO_LOBBY` (true/false)
    /// Default: `false`
    pub auto_lobby: bool,
}

impl ClientConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(path) = lookup("CLOUDCHAT_DB_PATH") {
            if !path.trim().is_empty() {
                config.db_path = Some(PathBuf::from(path));
            }
        }

        if let Some(val) = lookup("CLOUDCHAT_IN_MEMORY") {
            config.in_memory = parse_flag("CLOUDCHAT_IN_MEMORY", &val, config.in_memory);
        }

        if let Some(val) = lookup("CLOUDCHAT_AUTO_LOBBY") {
            config.auto_lobby = parse_flag("CLOUDCHAT_AUTO_LOBBY", &val, config.auto_lobby);
        }

        // RUST_LOG is read by tracing-subscriber's EnvFilter directly.

        config
    }

    /// Open the local backend this configuration points at.
    pub fn open_backend(&self) -> Result<LocalBackend, StoreError> {
        if self.in_memory {
            return LocalBackend::open_in_memory();
        }
        match &self.db_path {
            Some(path) => LocalBackend::open_at(path),
            None => LocalBackend::open_default(),
        }
    }
}

fn parse_flag(name: &str, value: &str, default: bool) -> bool {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => {
            tracing::warn!(variable = name, value = %value, "Invalid boolean, using default");
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use cloudchat_store::RealtimeDb;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> ClientConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ClientConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_default_config() {
        let config = config(&[]);
        assert_eq!(config, ClientConfig::default());
        assert!(!config.in_memory);
        assert!(!config.auto_lobby);
    }

    #[test]
    fn test_env_overrides() {
        let config = config(&[
            ("CLOUDCHAT_DB_PATH", "/tmp/chat.db"),
            ("CLOUDCHAT_IN_MEMORY", "1"),
            ("CLOUDCHAT_AUTO_LOBBY", "TRUE"),
        ]);
        assert_eq!(config.db_path, Some(PathBuf::from("/tmp/chat.db")));
        assert!(config.in_memory);
        assert!(config.auto_lobby);
    }

    #[test]
    fn test_invalid_flag_keeps_default() {
        let config = config(&[("CLOUDCHAT_IN_MEMORY", "maybe"), ("CLOUDCHAT_DB_PATH", " ")]);
        assert!(!config.in_memory);
        assert_eq!(config.db_path, None);
    }

    #[test]
    fn test_open_backend_at_path() {
        let dir = tempfile::tempdir().unwrap();
        let config = ClientConfig {
            db_path: Some(dir.path().join("chat.db")),
            ..ClientConfig::default()
        };
        let backend = config.open_backend().unwrap();
        let users = backend.get(&crate::paths::users().unwrap()).unwrap();
        assert_eq!(users.value, None);
        assert!(dir.path().join("chat.db").exists());
    }
}
