
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::styles::cli_styles;

/// Root CLI for autoclick.
#[derive(Parser, Debug)]
#[command(name = "autoclick")]
#[command(about = "Keep an approval auto-clicker injected into every DevTools target")]
#[command(version)]
#[command(styles = cli_styles())]
pub struct Cli {
	/// Increase verbosity (-v info, -vv debug)
	#[arg(short, long, global = true, action = clap::ArgAction::Count)]
	pub verbose: u8,

	/// Config file (defaults to <config dir>/autoclick/config.json)
	#[arg(long, global = true, value_name = "FILE")]
	pub config: Option<PathBuf>,

	#[command(flatten)]
	pub overrides: Overrides,

	#[command(subcommand)]
	pub command: Commands,
}

/// Flags that take precedence over the config file.
#[derive(Args, Debug, Clone, Default)]
pub struct Overrides {
	/// Remote debugging port tried first
	#[arg(long, global = true, value_name = "PORT")]
	pub port: Option<u16>,

	/// Port tried after the configured one
	#[arg(long, global = true, value_name = "PORT")]
	pub fallback_port: Option<u16>,

	/// Extra action phrase (repeatable)
	#[arg(long = "phrase", global = true, value_name = "TEXT")]
	pub phrases: Vec<String>,

	/// Panel marker selector: #id, .class or [attr] (repeatable, replaces configured markers)
	#[arg(long = "marker", global = true, value_name = "SELECTOR")]
	pub markers: Vec<String>,

	/// Scan every context regardless of panel markers
	#[arg(long, global = true, conflicts_with = "markers")]
	pub no_markers: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
	/// Start the session manager and run until interrupted.
	Run,
	/// Connect once and list targets with their eligibility.
	Targets {
		/// Also list targets that would never be attached
		#[arg(long)]
		all: bool,
	},
	/// Print the injection expression for the current config.
	Payload,
}
