//! Integration tests for layered configuration resolution.
//!
//! Each test writes both config files into a temp directory and resolves
//! against an injected environment map.

use serde_json::{Value, json};
use std::collections::HashMap;
use std::fs;
use tempfile::TempDir;
use traffic_agent_config::config::{
    AGENT_CONFIG_FILE, ConfigPaths, ConfigResolver, DEFAULT_CAMERA_TOPICS, DEPLOYMENT_CONFIG_FILE,
};
use traffic_agent_config::identity::intersection_id;
use traffic_agent_config::{ConfigError, cli};

/// Helper to create a config dir with both files.
fn config_dir(agent: Value, deployment: Value) -> TempDir {
    let temp = TempDir::new().expect("temp dir");
    fs::write(temp.path().join(AGENT_CONFIG_FILE), agent.to_string()).expect("write agent");
    fs::write(temp.path().join(DEPLOYMENT_CONFIG_FILE), deployment.to_string())
        .expect("write deployment");
    temp
}

fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn resolve(temp: &TempDir, vars: &[(&str, &str)]) -> Result<ConfigResolver, ConfigError> {
    ConfigResolver::load_with(ConfigPaths::with_dir(temp.path()), &env(vars))
}

#[test]
fn test_deployment_keys_merge_into_intersection() {
    let temp = config_dir(json!({"intersection": {"name": "A"}}), json!({"latitude": 1.5}));
    let resolver = resolve(&temp, &[]).unwrap();
    assert_eq!(
        resolver.tree()["intersection"],
        json!({"name": "A", "latitude": 1.5})
    );
}

#[test]
fn test_deployment_value_wins_on_collision() {
    let temp = config_dir(
        json!({"intersection": {"name": "Base", "longitude": -1.0}}),
        json!({"name": "Deployed"}),
    );
    let resolver = resolve(&temp, &[]).unwrap();
    assert_eq!(resolver.intersection_name(), "Deployed");
    assert_eq!(resolver.tree()["intersection"]["longitude"], json!(-1.0));
    assert_eq!(resolver.intersection_id(), intersection_id("Deployed"));
}

#[test]
fn test_environment_wins_over_deployment() {
    let temp = config_dir(
        json!({"intersection": {"name": "Base"}}),
        json!({"name": "Deployed", "latitude": 10.0, "longitude": 20.0}),
    );
    let resolver = resolve(
        &temp,
        &[
            ("INTERSECTION_NAME", "From Env"),
            ("INTERSECTION_LATITUDE", "33.5"),
        ],
    )
    .unwrap();
    assert_eq!(resolver.intersection_name(), "From Env");
    assert_eq!(resolver.intersection_coordinates().unwrap(), (33.5, 20.0));
}

#[test]
fn test_empty_environment_value_is_ignored() {
    let temp = config_dir(json!({"intersection": {"name": "Base"}}), json!({}));
    let resolver = resolve(&temp, &[("INTERSECTION_NAME", ""), ("MQTT_PORT", "")]).unwrap();
    assert_eq!(resolver.intersection_name(), "Base");
    assert!(resolver.mqtt_config().is_empty());
}

#[test]
fn test_bad_latitude_fails_load() {
    let temp = config_dir(json!({}), json!({"latitude": 1.0}));
    let err = resolve(&temp, &[("INTERSECTION_LATITUDE", "not-a-number")]).unwrap_err();
    assert!(err.is_invalid_value(), "got {err}");
    assert!(err.to_string().contains("INTERSECTION_LATITUDE"));
}

#[test]
fn test_bad_service_override_fails_load() {
    let temp = config_dir(json!({}), json!({}));
    let err = resolve(&temp, &[("MQTT_HOST", "broker"), ("MQTT_PORT", "eighteen")]).unwrap_err();
    assert!(err.is_invalid_value());
}

#[test]
fn test_bad_longitude_fails_load() {
    let temp = config_dir(json!({}), json!({"longitude": 2.0}));
    let err = resolve(&temp, &[("INTERSECTION_LONGITUDE", "east")]).unwrap_err();
    assert!(err.is_invalid_value(), "got {err}");
    assert!(err.to_string().contains("INTERSECTION_LONGITUDE"));
}

#[test]
fn test_bad_float_service_override_fails_load() {
    let temp = config_dir(json!({"vlm": {"temperature": 0.2}}), json!({}));
    let err = resolve(&temp, &[("VLM_TEMPERATURE", "warm")]).unwrap_err();
    assert!(err.is_invalid_value(), "got {err}");
    assert!(err.to_string().contains("VLM_TEMPERATURE"));
}

#[test]
fn test_malformed_typed_file_values_fail_load() {
    let temp = config_dir(
        json!({"mqtt": {"camera_topics": "scenescape/data/camera/camera9"}}),
        json!({}),
    );
    let err = resolve(&temp, &[]).unwrap_err();
    assert!(err.is_invalid_value(), "got {err}");
    assert!(err.to_string().contains("mqtt.camera_topics"));

    let temp = config_dir(json!({"traffic": {"high_density_threshold": "lots"}}), json!({}));
    let err = resolve(&temp, &[]).unwrap_err();
    assert!(err.is_invalid_value(), "got {err}");
    assert!(err.to_string().contains("traffic.high_density_threshold"));
}

#[test]
fn test_missing_base_file_fails_before_env() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join(DEPLOYMENT_CONFIG_FILE), "{}").unwrap();
    // A bad override would be InvalidValue if it were ever considered.
    let err = resolve(&temp, &[("INTERSECTION_LATITUDE", "x")]).unwrap_err();
    match err {
        ConfigError::MissingFile { path } => assert!(path.ends_with(AGENT_CONFIG_FILE)),
        other => panic!("expected MissingFile, got {other}"),
    }
}

#[test]
fn test_missing_deployment_file_fails() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join(AGENT_CONFIG_FILE), "{}").unwrap();
    let err = resolve(&temp, &[]).unwrap_err();
    match err {
        ConfigError::MissingFile { path } => assert!(path.ends_with(DEPLOYMENT_CONFIG_FILE)),
        other => panic!("expected MissingFile, got {other}"),
    }
}

#[test]
fn test_malformed_json_fails() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join(AGENT_CONFIG_FILE), "{\"mqtt\": ").unwrap();
    fs::write(temp.path().join(DEPLOYMENT_CONFIG_FILE), "{}").unwrap();
    let err = resolve(&temp, &[]).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
}

#[test]
fn test_scalar_intersection_in_base_fails() {
    let temp = config_dir(json!({"intersection": "Main St"}), json!({"name": "X"}));
    let err = resolve(&temp, &[]).unwrap_err();
    assert!(matches!(err, ConfigError::NotAMapping { .. }));
}

#[test]
fn test_service_overrides_layer_over_file_sections() {
    let temp = config_dir(
        json!({
            "mqtt": {"host": "localhost", "port": 1883, "camera_topics": ["cam/a"]},
            "weather": {"use_mock": false, "api_key": "k"},
            "vlm": {"model": "base-model", "timeout_seconds": 30},
            "traffic": {"high_density_threshold": 3}
        }),
        json!({"name": "Main & 5th"}),
    );
    let resolver = resolve(
        &temp,
        &[
            ("MQTT_HOST", "broker.internal"),
            ("MQTT_PORT", "8883"),
            ("WEATHER_MOCK", "YES"),
            ("ENABLE_FIRE_MARKERS", "false"),
            ("ENABLE_FLOOD_MARKERS", "1"),
            ("VLM_BASE_URL", "http://vlm:8000/v1"),
            ("VLM_MODEL_NAME", "Qwen2.5-VL"),
            ("VLM_MAX_COMPLETION_TOKENS", "512"),
            ("VLM_TOP_P", "0.9"),
            ("HIGH_DENSITY_THRESHOLD", "7.5"),
            ("TRAFFIC_BUFFER_DURATION", "60"),
        ],
    )
    .unwrap();

    assert_eq!(
        Value::Object(resolver.mqtt_config()),
        json!({"host": "broker.internal", "port": 8883, "camera_topics": ["cam/a"]})
    );
    assert_eq!(
        Value::Object(resolver.weather_config()),
        json!({
            "use_mock": true,
            "api_key": "k",
            "enable_fire_markers": false,
            "enable_flood_markers": true
        })
    );
    assert_eq!(
        Value::Object(resolver.vlm_config()),
        json!({
            "model": "Qwen2.5-VL",
            "timeout_seconds": 30,
            "base_url": "http://vlm:8000/v1",
            "max_completion_tokens": 512,
            "top_p": 0.9
        })
    );
    assert_eq!(resolver.high_density_threshold(), 7.5);
    assert_eq!(
        resolver.traffic_config()["analysis_window_seconds"],
        json!(60)
    );
    assert_eq!(resolver.camera_topics(), vec!["cam/a".to_string()]);
}

#[test]
fn test_absent_topics_yield_canonical_defaults() {
    let temp = config_dir(json!({"mqtt": {"host": "h"}}), json!({}));
    let resolver = resolve(&temp, &[]).unwrap();
    assert_eq!(
        resolver.camera_topics(),
        vec![
            "scenescape/data/camera/camera1",
            "scenescape/data/camera/camera2",
            "scenescape/data/camera/camera3",
            "scenescape/data/camera/camera4",
        ]
    );
    assert_eq!(resolver.camera_topics(), DEFAULT_CAMERA_TOPICS.to_vec());
    assert_eq!(resolver.image_topics()[3], "scenescape/image/camera/camera4");
}

#[test]
fn test_update_config_creates_missing_section() {
    let temp = config_dir(json!({}), json!({}));
    let mut resolver = resolve(&temp, &[]).unwrap();
    assert!(resolver.tree().get("vlm").is_none());
    resolver.update_config("vlm.temperature", json!(0.7)).unwrap();
    assert_eq!(resolver.tree()["vlm"], json!({"temperature": 0.7}));
    assert_eq!(resolver.get("vlm.temperature"), Some(&json!(0.7)));
}

#[test]
fn test_update_config_rejects_path_through_scalar() {
    let temp = config_dir(json!({"mqtt": {"port": 1883}}), json!({}));
    let mut resolver = resolve(&temp, &[]).unwrap();
    let err = resolver.update_config("mqtt.port.tls", json!(true)).unwrap_err();
    assert!(matches!(err, ConfigError::NotAMapping { .. }));
    assert_eq!(resolver.tree()["mqtt"], json!({"port": 1883}));
}

#[test]
fn test_cli_show_and_set() {
    use clap::Parser;

    let temp = config_dir(json!({"mqtt": {"host": "h"}}), json!({"name": "Cli"}));
    let paths = ConfigPaths::with_dir(temp.path());
    let vars = env(&[]);

    let show = cli::Cli::try_parse_from(["traffic-agent-config", "show", "--section", "mqtt"])
        .unwrap();
    let out = cli::execute_with(&show, paths.clone(), &vars).unwrap();
    assert_eq!(serde_json::from_str::<Value>(&out).unwrap(), json!({"host": "h"}));

    let set = cli::Cli::try_parse_from(["traffic-agent-config", "set", "vlm.top_p", "0.5"])
        .unwrap();
    let out = cli::execute_with(&set, paths.clone(), &vars).unwrap();
    let tree: Value = serde_json::from_str(&out).unwrap();
    assert_eq!(tree["vlm"], json!({"top_p": 0.5}));
    assert_eq!(tree["intersection"]["name"], json!("Cli"));

    let identity = cli::Cli::try_parse_from(["traffic-agent-config", "identity"]).unwrap();
    let out = cli::execute_with(&identity, paths, &vars).unwrap();
    assert_eq!(out, intersection_id("Cli"));
}
