//! Configuration loader with layered resolution.
//!
//! Reads the base agent file, merges the deployment file into the
//! `intersection` section, then applies environment overrides.

use super::env::{
    EnvSource, INTERSECTION_OVERRIDES, ProcessEnv, SERVICE_OVERRIDES, apply_overrides, section_mut,
};
use super::merge::{get_path, set_path, shallow_merge};
use crate::error::{ConfigError, Result};
use crate::identity::intersection_id;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// Resolved configuration tree: string keys to nested mappings or scalars.
pub type ConfigTree = Map<String, Value>;

/// File name of the base agent configuration.
pub const AGENT_CONFIG_FILE: &str = "traffic_agent.json";
/// File name of the per-deployment intersection overrides.
pub const DEPLOYMENT_CONFIG_FILE: &str = "deployment_instance.json";
/// Directory used when `TRAFFIC_AGENT_CONFIG_DIR` is not set.
pub const DEFAULT_CONFIG_DIR: &str = "config";

/// Intersection name used when `intersection.name` is absent.
pub const DEFAULT_INTERSECTION_NAME: &str = "Intersection-1";
/// Latitude used when `intersection.latitude` is absent.
pub const DEFAULT_LATITUDE: f64 = 33.3091336;
/// Longitude used when `intersection.longitude` is absent.
pub const DEFAULT_LONGITUDE: f64 = -111.9353095;
/// Vehicle count above which traffic is considered dense.
pub const DEFAULT_HIGH_DENSITY_THRESHOLD: f64 = 5.0;

/// Scene data topics subscribed to when `mqtt.camera_topics` is absent.
pub const DEFAULT_CAMERA_TOPICS: [&str; 4] = [
    "scenescape/data/camera/camera1",
    "scenescape/data/camera/camera2",
    "scenescape/data/camera/camera3",
    "scenescape/data/camera/camera4",
];

/// Camera image topics subscribed to when `mqtt.image_topics` is absent.
pub const DEFAULT_IMAGE_TOPICS: [&str; 4] = [
    "scenescape/image/camera/camera1",
    "scenescape/image/camera/camera2",
    "scenescape/image/camera/camera3",
    "scenescape/image/camera/camera4",
];

/// Keys whose accessors return typed values. They are checked whenever the
/// tree is built or updated so the accessors never see a malformed value.
const TOPIC_LIST_KEYS: [&str; 2] = ["mqtt.camera_topics", "mqtt.image_topics"];
const NUMERIC_KEYS: [&str; 1] = ["traffic.high_density_threshold"];

/// Location of the configuration files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigPaths {
    /// Directory holding `traffic_agent.json` and `deployment_instance.json`
    pub config_dir: PathBuf,
}

impl Default for ConfigPaths {
    fn default() -> Self {
        Self::discover()
    }
}

impl ConfigPaths {
    /// `TRAFFIC_AGENT_CONFIG_DIR` when set, otherwise `./config`.
    pub fn discover() -> Self {
        Self::discover_from(&ProcessEnv)
    }

    /// Same as [`ConfigPaths::discover`], reading from `env`.
    ///
    /// The directory is read as an OS string, so non-UTF-8 paths are kept.
    pub fn discover_from(env: &impl EnvSource) -> Self {
        let config_dir = env
            .var_os("TRAFFIC_AGENT_CONFIG_DIR")
            .filter(|dir| !dir.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_DIR));
        Self { config_dir }
    }

    /// Create paths for an explicit directory.
    pub fn with_dir(config_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
        }
    }

    /// Path of the base agent configuration file.
    pub fn agent_config_file(&self) -> PathBuf {
        self.config_dir.join(AGENT_CONFIG_FILE)
    }

    /// Path of the deployment override file.
    pub fn deployment_config_file(&self) -> PathBuf {
        self.config_dir.join(DEPLOYMENT_CONFIG_FILE)
    }
}

/// Authoritative configuration for one agent process.
///
/// Built once at startup and passed to consumers. Reads are pure;
/// [`ConfigResolver::update_config`] takes `&mut self`, so concurrent
/// writers must be serialized by the owner.
#[derive(Debug, Clone)]
pub struct ConfigResolver {
    /// Where the files were read from; `None` for trees built in memory.
    paths: Option<ConfigPaths>,
    tree: ConfigTree,
}

impl ConfigResolver {
    /// Resolve from discovered paths and the process environment.
    pub fn load() -> Result<Self> {
        Self::load_with(ConfigPaths::discover(), &ProcessEnv)
    }

    /// Resolve from explicit paths and an explicit environment.
    pub fn load_with(paths: ConfigPaths, env: &impl EnvSource) -> Result<Self> {
        let tree = match resolve_tree(&paths, env) {
            Ok(tree) => tree,
            Err(e) => {
                match &e {
                    ConfigError::InvalidValue { key, value, .. } => error!(
                        key = %key,
                        value = %value,
                        error = %e,
                        "Invalid value in config file(s) or environment variables"
                    ),
                    _ => error!(
                        config_dir = %paths.config_dir.display(),
                        error = %e,
                        "Error occurred while handling config file(s) or environment variables"
                    ),
                }
                return Err(e);
            }
        };

        let resolver = Self {
            paths: Some(paths),
            tree,
        };
        info!(
            intersection_id = %resolver.intersection_id(),
            intersection_name = %resolver.intersection_name(),
            "Configuration service initialized"
        );
        Ok(resolver)
    }

    /// Wrap an already-resolved tree, skipping all file and environment layers.
    ///
    /// The typed keys are checked the same way a file load checks them.
    pub fn from_tree(tree: ConfigTree) -> Result<Self> {
        validate_typed_keys(&tree)?;
        Ok(Self { paths: None, tree })
    }

    /// Paths the configuration was loaded from, if it came from files.
    pub fn paths(&self) -> Option<&ConfigPaths> {
        self.paths.as_ref()
    }

    /// The full resolved tree.
    pub fn tree(&self) -> &ConfigTree {
        &self.tree
    }

    /// Consume the resolver and return the tree.
    pub fn into_tree(self) -> ConfigTree {
        self.tree
    }

    /// Value at a dotted key path, if present.
    pub fn get(&self, key: &str) -> Option<&Value> {
        get_path(&self.tree, key)
    }

    /// `intersection.name`, or `Intersection-1`.
    pub fn intersection_name(&self) -> &str {
        self.get("intersection.name")
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_INTERSECTION_NAME)
    }

    /// Identifier derived from [`ConfigResolver::intersection_name`].
    pub fn intersection_id(&self) -> String {
        intersection_id(self.intersection_name())
    }

    /// `(latitude, longitude)`, with defaults for absent keys.
    pub fn intersection_coordinates(&self) -> Result<(f64, f64)> {
        let lat = self.coordinate("latitude", DEFAULT_LATITUDE)?;
        let lon = self.coordinate("longitude", DEFAULT_LONGITUDE)?;
        Ok((lat, lon))
    }

    fn coordinate(&self, field: &str, default: f64) -> Result<f64> {
        let key = format!("intersection.{field}");
        let parsed = match self.get(&key) {
            None => Ok(default),
            Some(Value::Number(n)) => n
                .as_f64()
                .ok_or_else(|| ConfigError::invalid_value(&key, n.to_string(), "not representable as f64")),
            Some(Value::String(s)) => s
                .trim()
                .parse::<f64>()
                .map_err(|e| ConfigError::invalid_value(&key, s.as_str(), e)),
            Some(other) => Err(ConfigError::invalid_value(&key, other.to_string(), "expected a number")),
        };
        if let Err(e) = &parsed {
            error!(
                key = %key,
                error = %e,
                "Invalid value in deployment configuration or environment variables for intersection coordinates"
            );
        }
        parsed
    }

    pub fn camera_topics(&self) -> Vec<String> {
        self.topics("mqtt.camera_topics", &DEFAULT_CAMERA_TOPICS)
    }

    pub fn image_topics(&self) -> Vec<String> {
        self.topics("mqtt.image_topics", &DEFAULT_IMAGE_TOPICS)
    }

    // Stored lists are validated on every build and update; only an absent
    // key reaches the defaults.
    fn topics(&self, key: &str, defaults: &[&str]) -> Vec<String> {
        match self.get(key).and_then(Value::as_array) {
            Some(items) => items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            None => defaults.iter().map(|t| t.to_string()).collect(),
        }
    }

    pub fn mqtt_config(&self) -> Map<String, Value> {
        self.section("mqtt")
    }

    pub fn weather_config(&self) -> Map<String, Value> {
        self.section("weather")
    }

    pub fn vlm_config(&self) -> Map<String, Value> {
        self.section("vlm")
    }

    pub fn traffic_config(&self) -> Map<String, Value> {
        self.section("traffic")
    }

    /// Clone of a top-level section; empty when absent or not a mapping.
    pub fn section(&self, name: &str) -> Map<String, Value> {
        self.tree
            .get(name)
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default()
    }

    /// `traffic.high_density_threshold`, or `5.0` when absent.
    pub fn high_density_threshold(&self) -> f64 {
        self.get("traffic.high_density_threshold")
            .and_then(Value::as_f64)
            .unwrap_or(DEFAULT_HIGH_DENSITY_THRESHOLD)
    }

    /// Set `key` (dot-delimited) to `value`, creating intermediate mappings.
    ///
    /// Any value is accepted except a malformed one for a typed key
    /// (topic lists, the density threshold); that is rejected with
    /// [`ConfigError::InvalidValue`] and the tree is left unchanged.
    pub fn update_config(&mut self, key: &str, value: Value) -> Result<()> {
        let mut candidate = self.tree.clone();
        set_path(&mut candidate, key, value)?;
        validate_typed_keys(&candidate)?;
        self.tree = candidate;
        if let Some(stored) = get_path(&self.tree, key) {
            info!(key, value = %stored, "Configuration updated");
        }
        Ok(())
    }
}

/// Run the full load procedure. Nothing is returned on failure.
fn resolve_tree(paths: &ConfigPaths, env: &impl EnvSource) -> Result<ConfigTree> {
    let agent_file = paths.agent_config_file();
    let deployment_file = paths.deployment_config_file();
    info!(
        agent_config_path = %agent_file.display(),
        deployment_config_path = %deployment_file.display(),
        "Loading configuration files"
    );

    let mut tree = read_json_object(&agent_file)?;
    info!(path = %agent_file.display(), "Loaded configuration from file");

    let deployment = read_json_object(&deployment_file)?;
    shallow_merge(section_mut(&mut tree, "intersection")?, deployment);
    info!(path = %deployment_file.display(), "Loaded deployment configuration from file");

    apply_overrides(&mut tree, INTERSECTION_OVERRIDES, env)?;
    apply_overrides(&mut tree, SERVICE_OVERRIDES, env)?;
    validate_typed_keys(&tree)?;
    Ok(tree)
}

/// Reject typed keys whose stored value has the wrong shape.
fn validate_typed_keys(tree: &ConfigTree) -> Result<()> {
    for key in TOPIC_LIST_KEYS {
        if let Some(v) = get_path(tree, key) {
            let is_string_list = v
                .as_array()
                .is_some_and(|items| items.iter().all(Value::is_string));
            if !is_string_list {
                return Err(ConfigError::invalid_value(
                    key,
                    v.to_string(),
                    "expected a list of topic strings",
                ));
            }
        }
    }
    for key in NUMERIC_KEYS {
        if let Some(v) = get_path(tree, key) {
            if !v.is_number() {
                return Err(ConfigError::invalid_value(key, v.to_string(), "expected a number"));
            }
        }
    }
    Ok(())
}

/// Read a JSON file whose top level must be an object.
fn read_json_object(path: &Path) -> Result<ConfigTree> {
    if !path.exists() {
        error!(path = %path.display(), "Config file does not exist");
        return Err(ConfigError::MissingFile {
            path: path.to_path_buf(),
        });
    }
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
