use webscout_agent::web_recon_agent;
use webscout_core::{Config, Paths};

/// Print the recon agent definition as JSON.
pub fn show() -> anyhow::Result<()> {
    let paths = Paths::new();
    let config = Config::load_or_default(&paths)?;
    let agent = web_recon_agent(&config.agent.model);
    println!("{}", agent.to_json()?);
    Ok(())
}
