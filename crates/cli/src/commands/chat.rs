//! `threadsage chat`: Interactive or single-message chat mode.

use std::io::Write;
use threadsage_channels::CliChannel;
use threadsage_config::AppConfig;
use threadsage_core::channel::Channel;
use threadsage_core::message::HistoryEntry;
use tracing::info;

/// Speaker recorded for the local user's turns.
const LOCAL_SPEAKER: &str = "You";

pub async fn run(message: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config()?;

    if !config.has_api_key() && config.default_provider != "ollama" {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        eprintln!("    AZURE_OPENAI_API_KEY=...   (with AZURE_OPENAI_ENDPOINT)");
        eprintln!("    OPENAI_API_KEY=sk-...");
        eprintln!("    THREADSAGE_API_KEY=...     (generic)");
        eprintln!();
        eprintln!("  Or add it to your config file:");
        eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    }

    let pipeline = super::build_pipeline(&config)?;
    info!(
        provider = %config.default_provider,
        model = %config.chat_model(),
        interactive = message.is_none(),
        "Chat session started"
    );

    if let Some(msg) = message {
        // Single message mode
        eprint!("  Thinking...");
        let response = pipeline.respond(&msg, &[]).await;
        eprint!("\r              \r");
        println!("{response}");
        return Ok(());
    }

    println!();
    println!("  ThreadSage: Interactive Mode");
    println!();
    println!("  Provider:   {}", config.default_provider);
    println!("  Model:      {}", config.chat_model());
    println!("  Knowledge:  {}", config.knowledge_path().display());
    println!();
    println!("  Type your message and press Enter.");
    println!("  Type 'exit' or Ctrl+C to quit.");
    println!();

    let channel = CliChannel::new();
    let mut rx = channel
        .start()
        .await
        .map_err(|e| format!("Channel error: {e}"))?;
    let mut history: Vec<HistoryEntry> = Vec::new();

    print!("  You > ");
    std::io::stdout().flush()?;

    while let Some(result) = rx.recv().await {
        match result {
            Ok(chan_msg) => {
                eprint!("  ...");
                let response = pipeline.respond(&chan_msg.content, &history).await;
                eprint!("\r     \r");

                println!();
                for line in response.lines() {
                    println!("  AI > {line}");
                }
                println!();

                history.push(HistoryEntry::new(LOCAL_SPEAKER, chan_msg.content));
                history.push(HistoryEntry::assistant(response));

                print!("  You > ");
                std::io::stdout().flush()?;
            }
            Err(e) => {
                eprintln!("  [Channel Error] {e}");
                break;
            }
        }
    }

    info!(turns = history.len() / 2, "Chat session ended");
    println!();
    println!("  Goodbye!");
    println!();

    Ok(())
}
