use anyhow::Result;
use autoclick::ManagerConfig;
use autoclick::render_payload;

pub fn execute(config: &ManagerConfig) -> Result<()> {
	println!("{}", render_payload(&config.matcher));
	Ok(())
}
