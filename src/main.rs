//! Traffic Agent Config CLI
//!
//! Resolves and inspects the layered configuration of a traffic
//! intersection agent and its monitoring dashboard.

use anyhow::Result;
use clap::Parser;
use traffic_agent_config::cli::{self, Cli};
use traffic_agent_config::logging::{LogTarget, init_logging};

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(&LogTarget::parse(&cli.log), cli.verbose)?;

    let output = cli::execute(&cli)?;
    println!("{output}");
    Ok(())
}
