//! `threadsage knowledge`: Print the knowledge corpus.

use threadsage_core::knowledge::KnowledgeStore;
use threadsage_knowledge::FileKnowledgeStore;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config()?;
    let store = FileKnowledgeStore::new(config.knowledge_path());

    let corpus = store.load().await?;
    if corpus.trim().is_empty() {
        eprintln!("  Knowledge file is empty: {}", store.path().display());
        return Ok(());
    }

    print!("{corpus}");
    if !corpus.ends_with('\n') {
        println!();
    }

    Ok(())
}
