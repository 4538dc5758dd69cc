//! CLI command definitions for traffic-agent-config
//!
//! This module defines the CLI structure using clap's derive macros and the
//! handlers behind each subcommand. Handlers return the text to print so
//! `main` owns all output.

use crate::config::{ConfigPaths, ConfigResolver, EnvSource, ProcessEnv};
use crate::dashboard::DashboardSettings;
use crate::identity::{DEFAULT_ID_LENGTH, hash_intersection_name};
use anyhow::{Context, Result, anyhow};
use clap::{Args, Parser, Subcommand};
use serde_json::Value;
use std::path::PathBuf;

/// Traffic intersection agent configuration tools
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory holding traffic_agent.json and deployment_instance.json
    /// (overrides TRAFFIC_AGENT_CONFIG_DIR)
    #[arg(short, long, global = true)]
    pub config_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: String,

    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the resolved agent configuration as JSON
    Show(ShowArgs),

    /// Print the intersection identifier
    Identity(IdentityArgs),

    /// Apply a dotted-path update to the resolved configuration and print it
    Set(SetArgs),

    /// Print the dashboard settings
    Dashboard(DashboardArgs),
}

/// Arguments for the show subcommand
#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Only print one top-level section (e.g. mqtt, vlm)
    #[arg(short, long)]
    pub section: Option<String>,
}

/// Arguments for the identity subcommand
#[derive(Args, Debug)]
pub struct IdentityArgs {
    /// Hash this name instead of the resolved intersection name
    #[arg(short, long)]
    pub name: Option<String>,

    /// Number of hex characters to keep
    #[arg(long, default_value_t = DEFAULT_ID_LENGTH)]
    pub length: usize,
}

/// Arguments for the set subcommand
#[derive(Args, Debug)]
pub struct SetArgs {
    /// Dot-delimited key path, e.g. vlm.temperature
    pub key: String,

    /// New value; parsed as JSON, otherwise taken as a string
    pub value: String,
}

/// Arguments for the dashboard subcommand
#[derive(Args, Debug)]
pub struct DashboardArgs {
    /// Print the settings as a JSON object instead of the banner
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    pub fn config_paths(&self) -> ConfigPaths {
        match &self.config_dir {
            Some(dir) => ConfigPaths::with_dir(dir),
            None => ConfigPaths::discover(),
        }
    }
}

/// Execute a parsed command against the process environment.
pub fn execute(cli: &Cli) -> Result<String> {
    execute_with(cli, cli.config_paths(), &ProcessEnv)
}

pub fn execute_with(cli: &Cli, paths: ConfigPaths, env: &impl EnvSource) -> Result<String> {
    match &cli.command {
        Command::Show(args) => {
            let resolver = ConfigResolver::load_with(paths, env)?;
            show(&resolver, args)
        }
        Command::Identity(args) => match &args.name {
            Some(name) => Ok(hash_intersection_name(name, args.length)),
            None => {
                let resolver = ConfigResolver::load_with(paths, env)?;
                Ok(hash_intersection_name(resolver.intersection_name(), args.length))
            }
        },
        Command::Set(args) => {
            let mut resolver = ConfigResolver::load_with(paths, env)?;
            resolver.update_config(&args.key, parse_value_arg(&args.value))?;
            Ok(serde_json::to_string_pretty(resolver.tree())?)
        }
        Command::Dashboard(args) => {
            let settings = DashboardSettings::from_env(env)?;
            if args.json {
                Ok(serde_json::to_string_pretty(&settings)?)
            } else {
                Ok(settings.render_banner().trim_end().to_string())
            }
        }
    }
}

fn show(resolver: &ConfigResolver, args: &ShowArgs) -> Result<String> {
    match &args.section {
        None => Ok(serde_json::to_string_pretty(resolver.tree())?),
        Some(name) => {
            let section = resolver
                .tree()
                .get(name)
                .ok_or_else(|| anyhow!("No section '{}' in resolved configuration", name))?;
            serde_json::to_string_pretty(section)
                .with_context(|| format!("Failed to render section '{}'", name))
        }
    }
}

/// Interpret a command-line value: valid JSON keeps its type, anything
/// else becomes a string.
pub fn parse_value_arg(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}
