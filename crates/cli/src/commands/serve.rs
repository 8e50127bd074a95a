//! `threadsage serve`: Start the HTTP gateway.

use tracing::info;

pub async fn run(port_override: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = super::load_config()?;

    if let Some(port) = port_override {
        config.gateway.port = port;
    }

    println!("ThreadSage Gateway");
    println!("   Listening: {}:{}", config.gateway.host, config.gateway.port);
    println!("   Slack:     {}", if config.slack.is_configured() { "enabled" } else { "disabled" });
    println!("   Knowledge: {}", config.knowledge_path().display());

    info!(
        host = %config.gateway.host,
        port = config.gateway.port,
        slack = config.slack.is_configured(),
        "Starting gateway"
    );
    threadsage_gateway::start(config).await?;
    info!("Gateway stopped");

    Ok(())
}
