use anyhow::Result;
use hippograph::config::HippoConfig;
use hippograph::engine::MemoryEngine;
use hippograph::memory::recall::RecallRequest;

use super::preview;

/// Rank memories from the terminal. With no query, ranks by significance.
pub async fn recall(
    config: &HippoConfig,
    query: Option<String>,
    min_significance: Option<f64>,
    limit: Option<usize>,
) -> Result<()> {
    let engine = MemoryEngine::open(config.clone())?;

    let response = engine
        .recall_memory(RecallRequest {
            query,
            significance_threshold: min_significance,
            limit,
            ..Default::default()
        })
        .await?;

    if response.memories.is_empty() {
        println!("No memories found.");
        return Ok(());
    }

    println!("Recalled {} memor(ies)\n", response.count);

    for (i, m) in response.memories.iter().enumerate() {
        println!(
            "  {}. [{}] {} {} (significance: {:.2}, score: {:.4})",
            i + 1,
            m.event_type.as_deref().unwrap_or("event"),
            m.timestamp,
            m.event_id,
            m.significance,
            m.score,
        );
        println!("     {}", preview(&m.context_summary, 120));
        println!();
    }

    Ok(())
}
