use anyhow::{Context, Result};
use autoclick::{ManagerConfig, SessionManager};
use tracing::info;

/// Runs the session manager until Ctrl-C.
pub async fn execute(config: ManagerConfig) -> Result<()> {
	let manager = SessionManager::new(config).context("failed to build session manager")?;
	let mut snapshots = manager.subscribe();
	manager.start();
	info!(
		target = "autoclick.cli",
		port = manager.config().port,
		fallback_port = manager.config().fallback_port,
		"session manager started"
	);

	let mut last = *snapshots.borrow_and_update();
	let interrupted = loop {
		tokio::select! {
			signal = tokio::signal::ctrl_c() => break signal,
			changed = snapshots.changed() => {
				if changed.is_err() {
					break Ok(());
				}
				let snapshot = *snapshots.borrow_and_update();
				if snapshot.connected != last.connected {
					match snapshot.active_port {
						Some(port) if snapshot.connected => info!(target = "autoclick.cli", port, "connected"),
						_ => info!(target = "autoclick.cli", "disconnected"),
					}
				}
				if snapshot.sessions != last.sessions {
					info!(target = "autoclick.cli", sessions = snapshot.sessions, "active sessions changed");
				}
				last = snapshot;
			}
		}
	};
	interrupted.context("failed to listen for Ctrl-C")?;

	info!(target = "autoclick.cli", "stopping");
	manager.stop().await;
	Ok(())
}
