//! Layered agent configuration.
//!
//! Resolves one configuration tree from three sources, later ones winning:
//! 1. **Base** - `traffic_agent.json` in the config directory
//! 2. **Deployment** - `deployment_instance.json`, shallow-merged into `intersection`
//! 3. **Environment** - per-key overrides with type coercion
//!
//! Both files are required. Any read, parse or coercion failure aborts the
//! load; no partially resolved configuration is ever returned.
//!
//! ## Environment Variables
//! - `TRAFFIC_AGENT_CONFIG_DIR` - Config directory (default: `./config`)
//! - `INTERSECTION_NAME`, `INTERSECTION_LATITUDE`, `INTERSECTION_LONGITUDE`
//! - `MQTT_HOST`, `MQTT_PORT`
//! - `WEATHER_MOCK`, `ENABLE_FIRE_MARKERS`, `ENABLE_STORM_MARKERS`, `ENABLE_FLOOD_MARKERS`
//! - `VLM_BASE_URL`, `VLM_MODEL_NAME`, `VLM_TIMEOUT_SECONDS`,
//!   `VLM_MAX_COMPLETION_TOKENS`, `VLM_TEMPERATURE`, `VLM_TOP_P`
//! - `HIGH_DENSITY_THRESHOLD`, `TRAFFIC_BUFFER_DURATION`

pub mod env;
mod loader;
mod merge;

pub use env::{Coercion, EnvOverride, EnvSource, ProcessEnv};
pub use loader::*;
pub use merge::{get_path, set_path, shallow_merge};
