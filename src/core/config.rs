//! Configuration snapshot loaded from `config.yml`

use crate::core::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Name of the configuration file inside the project root
pub const CONFIG_FILENAME: &str = "config.yml";

/// A single typed configuration value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Bool(bool),
    Int(i64),
    String(String),
    /// Lists, mappings and anything else this crate never interprets
    Other(serde_yaml::Value),
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        ConfigValue::String(value.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(value: String) -> Self {
        ConfigValue::String(value)
    }
}

impl From<bool> for ConfigValue {
    fn from(value: bool) -> Self {
        ConfigValue::Bool(value)
    }
}

impl From<i64> for ConfigValue {
    fn from(value: i64) -> Self {
        ConfigValue::Int(value)
    }
}

/// Immutable key/value snapshot of the user's configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Config {
    values: BTreeMap<String, ConfigValue>,
}

/// Defaults for every key read by this crate
fn defaults() -> Vec<(&'static str, ConfigValue)> {
    vec![
        ("LOCAL_PROJECT_NAME", "tutor_local".into()),
        ("DEV_PROJECT_NAME", "tutor_dev".into()),
        ("DEV_MODE", false.into()),
        ("RUN_LMS", true.into()),
        ("RUN_CMS", true.into()),
        ("LMS_HOST", "www.myopenedx.com".into()),
        ("CMS_HOST", "studio.www.myopenedx.com".into()),
    ]
}

impl Config {
    /// Load `<root>/config.yml` layered over the built-in defaults.
    ///
    /// A missing file yields the defaults alone.
    pub fn load<P: AsRef<Path>>(root: P) -> Result<Self, ConfigError> {
        let path = config_path(root.as_ref());
        let mut config = Self::with_defaults();

        if !path.exists() {
            tracing::debug!("No configuration file at {}, using defaults", path.display());
            return Ok(config);
        }

        let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        let user = Self::from_yaml(&content).map_err(|source| ConfigError::Parse {
            path: path.clone(),
            source,
        })?;
        config.values.extend(user.values);
        Ok(config)
    }

    /// Parse a configuration mapping from YAML, without defaults
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        // An empty file deserializes to null rather than an empty mapping
        let values: Option<BTreeMap<String, ConfigValue>> = serde_yaml::from_str(yaml)?;
        Ok(Self {
            values: values.unwrap_or_default(),
        })
    }

    pub fn with_defaults() -> Self {
        Self::from_pairs(defaults())
    }

    /// Build a snapshot from literal pairs
    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<ConfigValue>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self {
            values: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Return a copy of this snapshot with extra values applied on top
    pub fn merged<K, V, I>(&self, pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<ConfigValue>,
        I: IntoIterator<Item = (K, V)>,
    {
        let mut values = self.values.clone();
        values.extend(pairs.into_iter().map(|(k, v)| (k.into(), v.into())));
        Self { values }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.values.get(key)
    }

    pub fn get_str(&self, key: &str) -> Result<&str, ConfigError> {
        match self.values.get(key) {
            Some(ConfigValue::String(s)) => Ok(s),
            Some(_) => Err(ConfigError::TypeMismatch {
                key: key.to_string(),
                expected: "string",
            }),
            None => Err(ConfigError::MissingKey(key.to_string())),
        }
    }

    pub fn get_bool(&self, key: &str) -> Result<bool, ConfigError> {
        match self.values.get(key) {
            Some(ConfigValue::Bool(b)) => Ok(*b),
            Some(_) => Err(ConfigError::TypeMismatch {
                key: key.to_string(),
                expected: "bool",
            }),
            None => Err(ConfigError::MissingKey(key.to_string())),
        }
    }

    pub fn get_int(&self, key: &str) -> Result<i64, ConfigError> {
        match self.values.get(key) {
            Some(ConfigValue::Int(i)) => Ok(*i),
            Some(_) => Err(ConfigError::TypeMismatch {
                key: key.to_string(),
                expected: "int",
            }),
            None => Err(ConfigError::MissingKey(key.to_string())),
        }
    }

    /// Optional string: absent keys and empty strings both yield `None`
    pub fn get_optional_str(&self, key: &str) -> Result<Option<&str>, ConfigError> {
        match self.values.get(key) {
            None => Ok(None),
            Some(_) => self
                .get_str(key)
                .map(|s| if s.is_empty() { None } else { Some(s) }),
        }
    }
}

/// Absolute path of the configuration file for a project root
pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILENAME)
}
