//! `threadsage status`: Show resolved configuration.

use threadsage_config::AppConfig;
use threadsage_core::knowledge::KnowledgeStore;
use threadsage_knowledge::FileKnowledgeStore;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config()?;

    let knowledge = config.knowledge_path();
    let corpus = FileKnowledgeStore::new(knowledge.clone()).load().await?;
    let facts = count_facts(&corpus);

    println!("ThreadSage Status");
    println!("=================");
    println!("  Config dir:   {}", AppConfig::config_dir().display());
    println!("  Provider:     {}", config.default_provider);
    println!("  Model:        {}", config.chat_model());
    println!("  Temperature:  {}", config.default_temperature);
    println!("  API key:      {}", if config.has_api_key() { "set" } else { "missing" });
    println!(
        "  Embeddings:   {}",
        if config.embedding.is_disabled() {
            "disabled (keyword index)".to_string()
        } else {
            format!("{} via {}", config.embedding.model, config.embedding.provider)
        }
    );
    println!("  Knowledge:    {} ({facts} lines)", knowledge.display());
    println!("  Gateway:      {}:{}", config.gateway.host, config.gateway.port);
    println!(
        "  Retry:        {} attempts, {}s timeout",
        config.retry.max_attempts, config.retry.timeout_secs
    );
    println!(
        "  Slack:        {}",
        if config.slack.is_configured() { "configured" } else { "not configured" }
    );
    println!(
        "  Signatures:   {}",
        if config.slack.signing_secret.is_some() { "verified" } else { "not verified" }
    );

    let config_path = AppConfig::config_dir().join("config.toml");
    if config_path.exists() {
        println!("\n  Config file found");
    } else {
        println!("\n  No config file; running on defaults and environment");
    }

    Ok(())
}

/// Number of non-blank lines in a knowledge corpus.
fn count_facts(corpus: &str) -> usize {
    corpus.lines().filter(|l| !l.trim().is_empty()).count()
}
