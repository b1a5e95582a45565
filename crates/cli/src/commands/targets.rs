use anyhow::{Context, Result};
use autoclick::ManagerConfig;
use autoclick::discovery::{candidate_ports, probe_client, resolve_endpoint};
use autoclick_protocol::GetTargetsResult;
use autoclick_protocol::methods::GET_TARGETS;
use autoclick_runtime::{Connection, WebSocketTransport};
use colored::Colorize;
use serde_json::json;

/// Connects once and prints every target with its eligibility.
pub async fn execute(config: &ManagerConfig, all: bool) -> Result<()> {
	let client = probe_client(config.probe_timeout)?;
	let ports = candidate_ports(None, config.port, config.fallback_port);
	let (port, info) = resolve_endpoint(&client, &ports).await?;

	let parts = WebSocketTransport::connect(&info.web_socket_debugger_url)
		.await
		.with_context(|| format!("failed to open {}", info.web_socket_debugger_url))?;
	let (connection, _events) = Connection::open(parts, config.request_timeout);
	let listed = connection
		.request_typed::<GetTargetsResult>(GET_TARGETS, json!({}), None)
		.await;
	connection.close();
	let targets = listed.context("Target.getTargets failed")?.target_infos;

	println!(
		"{} {} on port {}",
		"browser".bold(),
		info.browser.as_deref().unwrap_or("unknown"),
		port.to_string().cyan()
	);

	let mut hidden = 0usize;
	for target in &targets {
		let eligible = config.targets.is_eligible(target);
		if !eligible && !all {
			hidden += 1;
			continue;
		}
		let marker = if eligible {
			format!("{:<6}", "attach").green().bold()
		} else {
			format!("{:<6}", "skip").dimmed()
		};
		let title = if target.title.is_empty() {
			"(untitled)"
		} else {
			target.title.as_str()
		};
		println!(
			"  {marker} {:<14} {} {}  {}",
			target.target_id.chars().take(12).collect::<String>(),
			format!("{:<10}", target.kind).yellow(),
			title,
			target.url.dimmed()
		);
	}

	if hidden > 0 {
		println!("  {} {hidden} ineligible target(s) hidden; pass --all to list them", "…".dimmed());
	}
	Ok(())
}
