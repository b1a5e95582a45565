mod payload;
mod run;
mod targets;

use anyhow::Result;
use tracing::debug;

use crate::cli::{Cli, Commands};
use crate::config::Config;

pub async fn dispatch(cli: Cli) -> Result<()> {
	let mut config = Config::load(cli.config.as_deref())?;
	config.apply(&cli.overrides);
	let manager_config = config.to_manager_config()?;
	debug!(
		target = "autoclick.cli",
		port = manager_config.port,
		fallback_port = manager_config.fallback_port,
		phrases = config.custom_phrases.len(),
		markers = config.panel_markers.len(),
		"resolved config"
	);

	match cli.command {
		Commands::Run => run::execute(manager_config).await,
		Commands::Targets { all } => targets::execute(&manager_config, all).await,
		Commands::Payload => payload::execute(&manager_config),
	}
}
