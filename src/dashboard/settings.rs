//! Dashboard settings read from environment variables with fixed defaults.
//!
//! A variable that is unset or empty falls back to its default. A variable
//! that is set but cannot be parsed is an error.

use crate::config::env::{EnvSource, parse_float, parse_int};
use crate::error::{ConfigError, Result};
use serde::Serialize;
use serde_json::{Map, Value};
use std::io::Write;

/// Seconds between dashboard refreshes when `REFRESH_INTERVAL` is unset.
pub const DEFAULT_REFRESH_INTERVAL: f64 = 10.0;
/// Agent endpoint polled for current traffic.
pub const DEFAULT_API_URL: &str = "http://localhost:8081/api/v1/traffic/current";
/// Heading shown on the dashboard.
pub const DEFAULT_APP_TITLE: &str = "TRAFFIC MONITORING SYSTEM";
/// Port the dashboard UI listens on.
pub const DEFAULT_APP_PORT: u16 = 7860;
/// Bind address of the dashboard UI.
pub const DEFAULT_APP_HOST: &str = "0.0.0.0";
/// Colour theme name.
pub const DEFAULT_UI_THEME: &str = "light";
/// Vehicle count at or above which the dashboard shows high density.
pub const DEFAULT_HIGH_DENSITY_THRESHOLD: i64 = 10;
/// Vehicle count at or above which the dashboard shows moderate density.
pub const DEFAULT_MODERATE_DENSITY_THRESHOLD: i64 = 5;

const BANNER_TITLE: &str = "=== RSU Monitoring System Configuration ===";
const BANNER_RULE_WIDTH: usize = 45;

/// All dashboard settings. Field order is the order used by
/// [`DashboardSettings::to_map`] and the banner.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSettings {
    /// `REFRESH_INTERVAL`, seconds
    pub refresh_interval: f64,
    /// `AGENT_API_URL`
    pub api_url: String,
    /// `APP_TITLE`
    pub app_title: String,
    /// `AGENT_UI_HOSTPORT`
    pub app_port: u16,
    /// `AGENT_UI_HOST`
    pub app_host: String,
    /// `UI_THEME`
    pub ui_theme: String,
    /// `HIGH_DENSITY_THRESHOLD`
    pub high_density_threshold: i64,
    /// `MODERATE_DENSITY_THRESHOLD`
    pub moderate_density_threshold: i64,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            api_url: DEFAULT_API_URL.to_string(),
            app_title: DEFAULT_APP_TITLE.to_string(),
            app_port: DEFAULT_APP_PORT,
            app_host: DEFAULT_APP_HOST.to_string(),
            ui_theme: DEFAULT_UI_THEME.to_string(),
            high_density_threshold: DEFAULT_HIGH_DENSITY_THRESHOLD,
            moderate_density_threshold: DEFAULT_MODERATE_DENSITY_THRESHOLD,
        }
    }
}

impl DashboardSettings {
    /// Read every setting from `env`.
    pub fn from_env(env: &impl EnvSource) -> Result<Self> {
        Ok(Self {
            refresh_interval: refresh_interval(env)?,
            api_url: api_url(env)?,
            app_title: app_title(env)?,
            app_port: app_port(env)?,
            app_host: app_host(env)?,
            ui_theme: ui_theme(env)?,
            high_density_threshold: high_density_threshold(env)?,
            moderate_density_threshold: moderate_density_threshold(env)?,
        })
    }

    /// All eight settings as one mapping, in fixed order.
    pub fn to_map(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("refresh_interval".into(), Value::from(self.refresh_interval));
        map.insert("api_url".into(), Value::from(self.api_url.as_str()));
        map.insert("app_title".into(), Value::from(self.app_title.as_str()));
        map.insert("app_port".into(), Value::from(self.app_port));
        map.insert("app_host".into(), Value::from(self.app_host.as_str()));
        map.insert("ui_theme".into(), Value::from(self.ui_theme.as_str()));
        map.insert(
            "high_density_threshold".into(),
            Value::from(self.high_density_threshold),
        );
        map.insert(
            "moderate_density_threshold".into(),
            Value::from(self.moderate_density_threshold),
        );
        map
    }

    /// The diagnostic banner printed by [`DashboardSettings::print_settings`].
    pub fn render_banner(&self) -> String {
        let mut out = String::new();
        out.push_str(BANNER_TITLE);
        out.push('\n');
        for (key, value) in self.to_map() {
            let shown = match value {
                Value::String(s) => s,
                other => other.to_string(),
            };
            out.push_str(&format!("{}: {}\n", key.to_uppercase(), shown));
        }
        out.push_str(&"=".repeat(BANNER_RULE_WIDTH));
        out.push('\n');
        out
    }

    /// Write the banner to stdout.
    pub fn print_settings(&self) -> std::io::Result<()> {
        self.write_settings(&mut std::io::stdout().lock())
    }

    /// Write the banner to `out`.
    pub fn write_settings(&self, out: &mut impl Write) -> std::io::Result<()> {
        out.write_all(self.render_banner().as_bytes())?;
        out.flush()
    }
}

fn string_or(env: &impl EnvSource, var: &str, default: &str) -> Result<String> {
    Ok(env.non_empty(var)?.unwrap_or_else(|| default.to_string()))
}

/// `REFRESH_INTERVAL` as a finite float.
pub fn refresh_interval(env: &impl EnvSource) -> Result<f64> {
    let Some(raw) = env.non_empty("REFRESH_INTERVAL")? else {
        return Ok(DEFAULT_REFRESH_INTERVAL);
    };
    let value = parse_float("REFRESH_INTERVAL", &raw)?;
    if !value.is_finite() {
        return Err(ConfigError::invalid_value(
            "REFRESH_INTERVAL",
            raw,
            "not a finite number",
        ));
    }
    Ok(value)
}

pub fn api_url(env: &impl EnvSource) -> Result<String> {
    string_or(env, "AGENT_API_URL", DEFAULT_API_URL)
}

pub fn app_title(env: &impl EnvSource) -> Result<String> {
    string_or(env, "APP_TITLE", DEFAULT_APP_TITLE)
}

/// `AGENT_UI_HOSTPORT` as a port number.
pub fn app_port(env: &impl EnvSource) -> Result<u16> {
    match env.non_empty("AGENT_UI_HOSTPORT")? {
        None => Ok(DEFAULT_APP_PORT),
        Some(raw) => raw
            .trim()
            .parse::<u16>()
            .map_err(|e| ConfigError::invalid_value("AGENT_UI_HOSTPORT", raw, e)),
    }
}

pub fn app_host(env: &impl EnvSource) -> Result<String> {
    string_or(env, "AGENT_UI_HOST", DEFAULT_APP_HOST)
}

pub fn ui_theme(env: &impl EnvSource) -> Result<String> {
    string_or(env, "UI_THEME", DEFAULT_UI_THEME)
}

// Same variable as the agent's traffic threshold, but read as an integer
// with its own default.
pub fn high_density_threshold(env: &impl EnvSource) -> Result<i64> {
    env.non_empty("HIGH_DENSITY_THRESHOLD")?
        .map_or(Ok(DEFAULT_HIGH_DENSITY_THRESHOLD), |raw| {
            parse_int("HIGH_DENSITY_THRESHOLD", &raw)
        })
}

pub fn moderate_density_threshold(env: &impl EnvSource) -> Result<i64> {
    env.non_empty("MODERATE_DENSITY_THRESHOLD")?
        .map_or(Ok(DEFAULT_MODERATE_DENSITY_THRESHOLD), |raw| {
            parse_int("MODERATE_DENSITY_THRESHOLD", &raw)
        })
}
