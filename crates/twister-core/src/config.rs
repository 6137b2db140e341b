//! Configuration file support for twister
//!
//! Configuration is stored in TOML format at:
//! - Linux: `~/.config/twister/config.toml`
//! - macOS: `~/Library/Application Support/twister/config.toml`
//! - Windows: `%APPDATA%\twister\config.toml`

use crate::error::{Error, Result};
use crate::inbound::DEFAULT_QUEUE_CAPACITY;
use crate::param::{Parameter, ParameterGroup};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Device name prefix the controller reports for its ports
pub const DEFAULT_PORT_PREFIX: &str = "Midi Fighter Twister";

/// Default poll interval in milliseconds (about 60 frames per second)
pub const DEFAULT_FRAME_MS: u64 = 16;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Device connection
    pub device: DeviceSettings,
    /// Poll loop and queue sizing
    pub engine: EngineSettings,
    /// Parameter bank, bound to the encoders in order
    pub params: Vec<ParamSpec>,
}

impl Config {
    /// Load configuration from the default config file location
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            Self::load_from(&path)
        } else {
            Err(Error::Config(format!("Config file not found at {:?}", path)))
        }
    }

    /// Load configuration from a specific file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration or return default if not found
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }

    /// Save configuration to the default config file location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    /// Save configuration to a specific file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path
    pub fn config_path() -> Result<PathBuf> {
        if let Some(proj_dirs) = ProjectDirs::from("", "", "twister") {
            Ok(proj_dirs.config_dir().join("config.toml"))
        } else {
            Err(Error::Config("Could not determine config directory".to_string()))
        }
    }

    /// Create a default config file with comments
    pub fn create_default_config_file() -> Result<PathBuf> {
        let path = Self::config_path()?;
        Self::write_default_config(&path)?;
        Ok(path)
    }

    /// Write the commented default config to `path`
    pub fn write_default_config(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = r#"# twister configuration file

[device]
# Ports whose name starts with this are used for input and output
port_prefix = "Midi Fighter Twister"

# MIDI client name shown to other applications
client_name = "twister"

[engine]
# Inbound frames buffered between two polls
queue_capacity = 256

# Poll interval in milliseconds
frame_ms = 16

# Parameters, bound to encoders 1-16 in order.
# kind = "float" binds as a knob, kind = "bool" as a button.
[[params]]
name = "cutoff"
kind = "float"
value = 0.5
min = 0.0
max = 1.0

[[params]]
name = "resonance"
kind = "float"
value = 0.2
min = 0.0
max = 1.0

[[params]]
name = "bypass"
kind = "bool"
value = 0.0
"#;

        fs::write(path, content)?;
        Ok(())
    }

    /// Check values that would make the bridge misbehave
    pub fn validate(&self) -> Result<()> {
        if self.device.client_name.is_empty() {
            return Err(Error::Config("Client name must not be empty".to_string()));
        }

        if self.engine.queue_capacity == 0 {
            return Err(Error::Config("queue_capacity must be at least 1".to_string()));
        }

        if self.engine.frame_ms == 0 {
            return Err(Error::Config("frame_ms must be at least 1".to_string()));
        }

        for entry in &self.params {
            if entry.name.is_empty() {
                return Err(Error::Config("Parameter names must not be empty".to_string()));
            }
            if !entry.value.is_finite() || !entry.min.is_finite() || !entry.max.is_finite() {
                return Err(Error::Config(format!(
                    "Parameter '{}': value, min and max must be finite numbers",
                    entry.name
                )));
            }
            if entry.kind == ParamKind::Float && entry.min > entry.max {
                return Err(Error::Config(format!(
                    "Parameter '{}': min ({}) is greater than max ({})",
                    entry.name, entry.min, entry.max
                )));
            }
        }

        Ok(())
    }

    /// Build the parameter bank described by `params`
    pub fn parameter_group(&self) -> ParameterGroup {
        self.params.iter().map(ParamSpec::to_parameter).collect()
    }
}

/// Device connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceSettings {
    /// Prefix of the controller's port names
    pub port_prefix: String,
    /// MIDI client name
    pub client_name: String,
}

impl Default for DeviceSettings {
    fn default() -> Self {
        Self {
            port_prefix: DEFAULT_PORT_PREFIX.to_string(),
            client_name: "twister".to_string(),
        }
    }
}

/// Poll loop settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Inbound queue capacity
    pub queue_capacity: usize,
    /// Poll interval in milliseconds
    pub frame_ms: u64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            frame_ms: DEFAULT_FRAME_MS,
        }
    }
}

impl EngineSettings {
    /// Poll interval as a duration
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_ms)
    }
}

/// Parameter kind in the config file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamKind {
    Float,
    Bool,
    Text,
}

/// One parameter of the bank
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamSpec {
    pub name: String,
    pub kind: ParamKind,
    /// Initial value; for bools anything above 0.5 is on
    #[serde(default)]
    pub value: f32,
    #[serde(default)]
    pub min: f32,
    #[serde(default = "default_max")]
    pub max: f32,
    /// Initial value for text parameters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

fn default_max() -> f32 {
    1.0
}

impl ParamSpec {
    /// Build the host parameter
    pub fn to_parameter(&self) -> Parameter {
        match self.kind {
            ParamKind::Float => Parameter::float(&self.name, self.value, self.min, self.max),
            ParamKind::Bool => Parameter::toggle(&self.name, self.value > 0.5),
            ParamKind::Text => {
                Parameter::text(&self.name, self.text.clone().unwrap_or_default())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.device.port_prefix, "Midi Fighter Twister");
        assert_eq!(config.engine.queue_capacity, 256);
        assert_eq!(config.engine.frame_interval(), Duration::from_millis(16));
        assert!(config.params.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_toml_roundtrip() {
        let mut config = Config::default();
        config.params.push(ParamSpec {
            name: "gain".to_string(),
            kind: ParamKind::Float,
            value: 0.3,
            min: 0.0,
            max: 2.0,
            text: None,
        });
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.params.len(), 1);
        assert_eq!(parsed.params[0].max, 2.0);
    }

    #[test]
    fn test_default_file_parses() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        Config::write_default_config(&path).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.device.client_name, "twister");
        let group = config.parameter_group();
        assert_eq!(group.len(), 3);
        assert!(matches!(group[0], Parameter::Numeric(_)));
        assert!(matches!(group[2], Parameter::Boolean(ref p) if !p.get()));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut config = Config::default();
        config.engine.frame_ms = 5;
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.engine.frame_ms, 5);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
[[params]]
name = "on"
kind = "bool"
value = 1.0
"#,
        )
        .unwrap();
        assert_eq!(config.device.client_name, "twister");
        assert!(matches!(config.parameter_group()[0], Parameter::Boolean(ref p) if p.get()));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.engine.queue_capacity = 0;
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let mut config = Config::default();
        config.params.push(ParamSpec {
            name: "inverted".to_string(),
            kind: ParamKind::Float,
            value: 0.0,
            min: 1.0,
            max: 0.0,
            text: None,
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_nan_range() {
        let config: Config = toml::from_str(
            r#"
[[params]]
name = "cutoff"
kind = "float"
value = 0.5
min = nan
max = 1.0
"#,
        )
        .unwrap();
        assert!(config.params[0].min.is_nan());
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[[params]]\nname = \"x\"\nkind = \"bool\"\nmax = inf\n").unwrap();
        assert!(matches!(Config::load_from(&path), Err(Error::Config(_))));
    }

    #[test]
    fn test_text_param() {
        let entry = ParamSpec {
            name: "label".to_string(),
            kind: ParamKind::Text,
            value: 0.0,
            min: 0.0,
            max: 1.0,
            text: Some("lead".to_string()),
        };
        assert_eq!(entry.to_parameter().value_string(), "lead");
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            Config::load_from(&dir.path().join("nope.toml")),
            Err(Error::Io(_))
        ));
    }
}
