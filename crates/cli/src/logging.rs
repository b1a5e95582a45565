use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::MakeWriterExt;

pub fn init_logging(verbosity: u8) {
	// 0 = warnings only
	// 1 (-v) = session lifecycle at info
	// 2+ (-vv) = protocol traffic and probe failures
	// Directive targets match by prefix, so `autoclick` also covers
	// `autoclick.manager` and `autoclick.cli`.
	let filter = match verbosity {
		0 => "warn",
		1 => "warn,autoclick=info",
		_ => "info,autoclick=debug",
	};

	let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

	let stderr = std::io::stderr.with_max_level(tracing::Level::TRACE);

	tracing_subscriber::fmt()
		.with_env_filter(env_filter)
		.with_writer(stderr)
		.with_target(true)
		.with_level(true)
		.compact()
		.init();
}
