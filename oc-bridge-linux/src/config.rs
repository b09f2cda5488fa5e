//! Load config from file and environment.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Host configuration. File: ~/.config/oc-bridge/config.toml or /etc/oc-bridge/config.toml.
/// Env overrides: OC_BRIDGE_DISCOVERY_INTERVAL, OC_BRIDGE_RESOURCE_TYPE, OC_BRIDGE_LOG_LEVEL.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Manufacturer name announced for the platform.
    #[serde(default = "default_platform_name")]
    pub platform_name: String,
    /// Device name announced on /oic/d.
    #[serde(default = "default_device_name")]
    pub device_name: String,
    /// Device type announced on /oic/d (default oic.d.phone).
    #[serde(default = "default_device_type")]
    pub device_type: String,
    /// Seconds between discovery rounds (default 30).
    #[serde(default = "default_discovery_interval_secs")]
    pub discovery_interval_secs: u64,
    /// Only discover this resource type; discover everything if unset.
    #[serde(default)]
    pub resource_type: Option<String>,
    /// tracing level: error, warn, info, debug or trace.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_platform_name() -> String {
    "oc-bridge".to_string()
}
fn default_device_name() -> String {
    "oc-bridge client".to_string()
}
fn default_device_type() -> String {
    "oic.d.phone".to_string()
}
fn default_discovery_interval_secs() -> u64 {
    30
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            platform_name: default_platform_name(),
            device_name: default_device_name(),
            device_type: default_device_type(),
            discovery_interval_secs: default_discovery_interval_secs(),
            resource_type: None,
            log_level: default_log_level(),
        }
    }
}

impl Config {
    /// Discovery interval, never shorter than one second.
    pub fn discovery_interval(&self) -> Duration {
        Duration::from_secs(self.discovery_interval_secs.max(1))
    }
}

/// Load config: merge default, then config file (if present), then env vars.
/// A config file that exists but cannot be read or parsed is an error.
pub fn load() -> anyhow::Result<Config> {
    let c = match config_paths().into_iter().find(|p| p.exists()) {
        Some(p) => read_file(&p)?,
        None => Config::default(),
    };
    Ok(apply_env(c, |k| std::env::var(k).ok()))
}

/// Apply overrides from `lookup`; unparsable values are ignored.
pub fn apply_env(mut c: Config, lookup: impl Fn(&str) -> Option<String>) -> Config {
    if let Some(s) = lookup("OC_BRIDGE_DISCOVERY_INTERVAL") {
        if let Ok(secs) = s.parse::<u64>() {
            c.discovery_interval_secs = secs;
        }
    }
    if let Some(s) = lookup("OC_BRIDGE_RESOURCE_TYPE") {
        let s = s.trim();
        c.resource_type = if s.is_empty() { None } else { Some(s.to_string()) };
    }
    if let Some(s) = lookup("OC_BRIDGE_LOG_LEVEL") {
        c.log_level = s;
    }
    c
}

fn config_paths() -> Vec<PathBuf> {
    let home = std::env::var_os("HOME").map(PathBuf::from);
    let mut out = Vec::new();
    if let Some(h) = home {
        out.push(h.join(".config/oc-bridge/config.toml"));
    }
    out.push(PathBuf::from("/etc/oc-bridge/config.toml"));
    out
}

pub fn read_file(path: &Path) -> anyhow::Result<Config> {
    let s = std::fs::read_to_string(path).map_err(|e| anyhow::anyhow!("reading {}: {}", path.display(), e))?;
    toml::from_str(&s).map_err(|e| anyhow::anyhow!("parsing {}: {}", path.display(), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn partial_file_keeps_defaults() {
        let c: Config = toml::from_str("device_name = \"lab client\"\nresource_type = \"oic.r.light\"\n").unwrap();
        assert_eq!(c.device_name, "lab client");
        assert_eq!(c.resource_type.as_deref(), Some("oic.r.light"));
        assert_eq!(c.discovery_interval_secs, 30);
        assert_eq!(c.platform_name, "oc-bridge");
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(toml::from_str::<Config>("proxy_port = 3128\n").is_err());
    }

    #[test]
    fn env_overrides_file() {
        let env: HashMap<&str, &str> = [
            ("OC_BRIDGE_DISCOVERY_INTERVAL", "5"),
            ("OC_BRIDGE_RESOURCE_TYPE", "oic.r.switch.binary"),
            ("OC_BRIDGE_LOG_LEVEL", "debug"),
        ]
        .into_iter()
        .collect();
        let c = apply_env(Config::default(), |k| env.get(k).map(|v| v.to_string()));
        assert_eq!(c.discovery_interval(), Duration::from_secs(5));
        assert_eq!(c.resource_type.as_deref(), Some("oic.r.switch.binary"));
        assert_eq!(c.log_level, "debug");
    }

    #[test]
    fn bad_env_values_are_ignored() {
        let base = Config {
            resource_type: Some("oic.r.light".to_string()),
            ..Config::default()
        };
        let c = apply_env(base, |k| match k {
            "OC_BRIDGE_DISCOVERY_INTERVAL" => Some("soon".to_string()),
            "OC_BRIDGE_RESOURCE_TYPE" => Some("  ".to_string()),
            _ => None,
        });
        assert_eq!(c.discovery_interval_secs, 30);
        assert_eq!(c.resource_type, None);
    }

    #[test]
    fn zero_interval_is_clamped() {
        let c = Config {
            discovery_interval_secs: 0,
            ..Config::default()
        };
        assert_eq!(c.discovery_interval(), Duration::from_secs(1));
    }

    fn scratch_file(name: &str, body: &str) -> PathBuf {
        let p = std::env::temp_dir().join(format!("oc-bridge-{}-{}.toml", std::process::id(), name));
        std::fs::write(&p, body).unwrap();
        p
    }

    #[test]
    fn file_values_are_read() {
        let p = scratch_file("good", "discovery_interval_secs = 12\n");
        let c = read_file(&p).unwrap();
        std::fs::remove_file(&p).unwrap();
        assert_eq!(c.discovery_interval_secs, 12);
        assert_eq!(c.device_name, "oc-bridge client");
    }

    #[test]
    fn malformed_file_is_an_error_naming_the_path() {
        let p = scratch_file("bad", "discovery_interval_secs = \"often\"\n");
        let err = read_file(&p).unwrap_err();
        std::fs::remove_file(&p).unwrap();
        assert!(err.to_string().contains(&p.display().to_string()));
    }

    #[test]
    fn missing_file_is_an_error() {
        let p = std::env::temp_dir().join("oc-bridge-does-not-exist.toml");
        assert!(read_file(&p).is_err());
    }
}
