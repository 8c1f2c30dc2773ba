use anyhow::{Context, Result};
use hippograph::config::HippoConfig;
use hippograph::db;
use hippograph::memory::stats::graph_stats;

/// Display graph statistics and a health summary in the terminal.
pub fn stats(config: &HippoConfig) -> Result<()> {
    let db_path = config.resolved_db_path();

    if !db_path.exists() {
        println!("Database: not found at {}", db_path.display());
        println!("Run `hippograph serve` to initialize.");
        return Ok(());
    }

    let conn = db::open_database(&db_path).context("failed to open database (may be corrupt)")?;
    let stats = graph_stats(&conn, Some(&db_path))?;
    let health = db::check_database_health(&conn).context("failed to run health check")?;

    println!("Graph Statistics");
    println!("{}", "=".repeat(40));
    println!("  Events:              {}", stats.events);
    for (t, count) in &stats.by_event_type {
        println!("    {:<17} {}", t, count);
    }
    println!();

    println!("Nodes:");
    for (kind, count) in &stats.nodes {
        println!("  {:<19} {}", kind, count);
    }
    println!();

    println!("Edges:");
    for (kind, count) in &stats.edges {
        println!("  {:<19} {}", kind, count);
    }
    println!();

    println!("Bonds:                 {}", stats.bonds);
    println!("Trajectory snapshots:  {}", stats.trajectory_snapshots);
    println!("Database size:         {} bytes", stats.db_size_bytes);
    if let Some(ref oldest) = stats.oldest_event {
        println!("Oldest event:          {oldest}");
    }
    if let Some(ref newest) = stats.newest_event {
        println!("Newest event:          {newest}");
    }
    println!();

    println!("Health");
    println!("{}", "=".repeat(40));
    println!("  Schema version:      {}", health.schema_version);
    println!("  sqlite-vec:          {}", health.sqlite_vec_version);
    println!(
        "  Embedding model:     {}",
        health.embedding_model.as_deref().unwrap_or("(not set)")
    );
    if health.vector_count != health.event_count {
        println!(
            "  WARNING: {} events but {} indexed vectors",
            health.event_count, health.vector_count
        );
    }
    println!(
        "  Integrity check:     {}",
        if health.integrity_ok { "PASSED" } else { "FAILED" }
    );

    Ok(())
}
