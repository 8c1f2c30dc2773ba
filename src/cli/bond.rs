use anyhow::Result;
use hippograph::config::HippoConfig;
use hippograph::engine::MemoryEngine;

/// Print a bond and its full history.
pub async fn bond(config: &HippoConfig, from: &str, to: &str) -> Result<()> {
    let engine = MemoryEngine::open(config.clone())?;

    let Some(bond) = engine.get_bond(from.to_string(), to.to_string()).await? else {
        println!("No bond from {from} to {to}.");
        return Ok(());
    };

    println!("Bond {} -> {}", bond.source_id, bond.target_id);
    println!("{}", "=".repeat(40));
    println!("  Strength:            {:.3}", bond.strength);
    println!("  Resonance:           {:.3}", bond.emotional_resonance);
    println!("  Interactions:        {}", bond.interaction_count);
    println!("  First interaction:   {}", bond.first_interaction);
    println!("  Last interaction:    {}", bond.last_interaction);
    println!();

    if !bond.milestones.is_empty() {
        println!("Milestones:");
        for m in &bond.milestones {
            println!("  {}  {}", m.recorded_at, m.milestone);
        }
        println!();
    }

    println!("Trajectory:");
    for point in &bond.trajectory {
        println!(
            "  {}  strength {:.3}  resonance {:+.3}  {}",
            point.recorded_at,
            point.strength,
            point.emotional_resonance,
            point.context.as_deref().unwrap_or("")
        );
    }

    Ok(())
}
