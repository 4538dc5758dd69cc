//! Environment variable overrides.
//!
//! Each override maps one variable onto a `section.key` leaf with a coercion
//! rule. Unset and empty variables leave the earlier layer untouched.

use crate::error::{ConfigError, Result};
use serde_json::{Map, Number, Value};
use std::collections::HashMap;
use std::env::VarError;
use std::ffi::OsString;

/// Source of environment variables.
///
/// Implemented for the process environment and for plain maps so callers
/// can resolve configuration against an injected environment.
pub trait EnvSource {
    /// Value of `key`, `None` when unset. A value that is not valid UTF-8
    /// is an [`ConfigError::InvalidValue`], never treated as unset.
    fn var(&self, key: &str) -> Result<Option<String>>;

    /// Value of `key`, treating an empty string as unset.
    fn non_empty(&self, key: &str) -> Result<Option<String>> {
        Ok(self.var(key)?.filter(|v| !v.is_empty()))
    }

    /// Raw OS value of `key`, for settings such as paths that need not be UTF-8.
    fn var_os(&self, key: &str) -> Option<OsString> {
        self.var(key).ok().flatten().map(OsString::from)
    }
}

/// The real process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, key: &str) -> Result<Option<String>> {
        match std::env::var(key) {
            Ok(value) => Ok(Some(value)),
            Err(VarError::NotPresent) => Ok(None),
            Err(VarError::NotUnicode(raw)) => Err(ConfigError::invalid_value(
                key,
                raw.to_string_lossy(),
                "not valid UTF-8",
            )),
        }
    }

    fn var_os(&self, key: &str) -> Option<OsString> {
        std::env::var_os(key)
    }
}

impl EnvSource for HashMap<String, String> {
    fn var(&self, key: &str) -> Result<Option<String>> {
        Ok(self.get(key).cloned())
    }
}

impl<E: EnvSource + ?Sized> EnvSource for &E {
    fn var(&self, key: &str) -> Result<Option<String>> {
        (**self).var(key)
    }

    fn var_os(&self, key: &str) -> Option<OsString> {
        (**self).var_os(key)
    }
}

/// How a raw environment string becomes a tree value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coercion {
    /// Stored verbatim.
    String,
    /// Finite float; surrounding whitespace is ignored.
    Float,
    /// Signed integer; surrounding whitespace is ignored.
    Integer,
    /// True iff the lower-cased value is `true`, `1` or `yes`.
    Bool,
}

impl Coercion {
    /// Convert `raw` (read from `var`) into a JSON value.
    pub fn apply(self, var: &str, raw: &str) -> Result<Value> {
        match self {
            Coercion::String => Ok(Value::String(raw.to_string())),
            Coercion::Float => {
                let f = parse_float(var, raw)?;
                Number::from_f64(f)
                    .map(Value::Number)
                    .ok_or_else(|| ConfigError::invalid_value(var, raw, "not a finite number"))
            }
            Coercion::Integer => parse_int(var, raw).map(Value::from),
            Coercion::Bool => Ok(Value::Bool(parse_flag(raw))),
        }
    }
}

/// One environment override: `var` writes `section.key`.
#[derive(Debug, Clone, Copy)]
pub struct EnvOverride {
    /// Environment variable name
    pub var: &'static str,
    /// Top-level section, created if absent
    pub section: &'static str,
    /// Leaf key inside `section`
    pub key: &'static str,
    pub coercion: Coercion,
}

const fn ov(var: &'static str, section: &'static str, key: &'static str, coercion: Coercion) -> EnvOverride {
    EnvOverride {
        var,
        section,
        key,
        coercion,
    }
}

/// Overrides for the intersection identity, applied right after the
/// deployment file is merged.
pub const INTERSECTION_OVERRIDES: &[EnvOverride] = &[
    ov("INTERSECTION_NAME", "intersection", "name", Coercion::String),
    ov("INTERSECTION_LATITUDE", "intersection", "latitude", Coercion::Float),
    ov("INTERSECTION_LONGITUDE", "intersection", "longitude", Coercion::Float),
];

/// Overrides for the service domains, applied last.
pub const SERVICE_OVERRIDES: &[EnvOverride] = &[
    ov("MQTT_HOST", "mqtt", "host", Coercion::String),
    ov("MQTT_PORT", "mqtt", "port", Coercion::Integer),
    ov("WEATHER_MOCK", "weather", "use_mock", Coercion::Bool),
    ov("ENABLE_FIRE_MARKERS", "weather", "enable_fire_markers", Coercion::Bool),
    ov("ENABLE_STORM_MARKERS", "weather", "enable_storm_markers", Coercion::Bool),
    ov("ENABLE_FLOOD_MARKERS", "weather", "enable_flood_markers", Coercion::Bool),
    ov("VLM_BASE_URL", "vlm", "base_url", Coercion::String),
    ov("VLM_MODEL_NAME", "vlm", "model", Coercion::String),
    ov("VLM_TIMEOUT_SECONDS", "vlm", "timeout_seconds", Coercion::Integer),
    ov("VLM_MAX_COMPLETION_TOKENS", "vlm", "max_completion_tokens", Coercion::Integer),
    ov("VLM_TEMPERATURE", "vlm", "temperature", Coercion::Float),
    ov("VLM_TOP_P", "vlm", "top_p", Coercion::Float),
    ov("HIGH_DENSITY_THRESHOLD", "traffic", "high_density_threshold", Coercion::Float),
    ov("TRAFFIC_BUFFER_DURATION", "traffic", "analysis_window_seconds", Coercion::Integer),
];

/// Apply every override in `overrides` whose variable is set.
///
/// Sections are created on first use. The first coercion failure aborts;
/// values already written by earlier overrides in the same call remain, so
/// callers must discard the tree on error.
pub fn apply_overrides(
    tree: &mut Map<String, Value>,
    overrides: &[EnvOverride],
    env: &impl EnvSource,
) -> Result<()> {
    for o in overrides {
        let Some(raw) = env.non_empty(o.var)? else {
            continue;
        };
        let value = o.coercion.apply(o.var, &raw)?;
        let section = section_mut(tree, o.section)?;
        tracing::debug!(var = o.var, key = %format!("{}.{}", o.section, o.key), "Applied environment override");
        section.insert(o.key.to_string(), value);
    }
    Ok(())
}

/// Mutable access to a top-level section, creating it when absent.
pub(crate) fn section_mut<'a>(
    tree: &'a mut Map<String, Value>,
    section: &str,
) -> Result<&'a mut Map<String, Value>> {
    match tree
        .entry(section.to_string())
        .or_insert_with(|| Value::Object(Map::new()))
    {
        Value::Object(map) => Ok(map),
        _ => Err(ConfigError::NotAMapping {
            path: section.to_string(),
        }),
    }
}

pub(crate) fn parse_float(key: &str, raw: &str) -> Result<f64> {
    raw.trim()
        .parse::<f64>()
        .map_err(|e| ConfigError::invalid_value(key, raw, e))
}

pub(crate) fn parse_int(key: &str, raw: &str) -> Result<i64> {
    raw.trim()
        .parse::<i64>()
        .map_err(|e| ConfigError::invalid_value(key, raw, e))
}

pub(crate) fn parse_flag(raw: &str) -> bool {
    matches!(raw.to_lowercase().as_str(), "true" | "1" | "yes")
}
