use anyhow::Result;
use hippograph::config::HippoConfig;
use hippograph::engine::MemoryEngine;
use hippograph::memory::episodes::{Episode, ParticipantView, SearchEventsRequest};

use super::preview;

/// Reconstruct episodes from the terminal by cue.
pub async fn search(config: &HippoConfig, req: SearchEventsRequest) -> Result<()> {
    let engine = MemoryEngine::open(config.clone())?;
    let response = engine.search_events(req).await?;

    if response.events.is_empty() {
        println!("No events found.");
        return Ok(());
    }

    println!("Found {} event(s)\n", response.count);
    for (i, episode) in response.events.iter().enumerate() {
        print_episode(i + 1, episode);
    }

    Ok(())
}

fn print_episode(n: usize, ep: &Episode) {
    let heading = ep.title.as_deref().unwrap_or(&ep.context_summary);
    println!("  {n}. {} [{}] {}", ep.happened_at, ep.event_id, preview(heading, 80));

    if !ep.who.persons.is_empty() || !ep.who.agents.is_empty() {
        println!("     who:     {} {}", names(&ep.who.persons), names(&ep.who.agents));
    }
    if let Some(place) = &ep.place {
        println!("     where:   {place}");
    }
    if !ep.why.is_empty() {
        println!("     why:     {}", ep.why.join("; "));
    }
    let what: Vec<&str> = ep
        .what
        .involved
        .iter()
        .chain(&ep.what.produced)
        .map(|e| e.name.as_str())
        .collect();
    if !what.is_empty() {
        println!("     what:    {}", what.join(", "));
    }
    for effect in &ep.effects {
        println!(
            "     effect:  {} ({}, {:.2})",
            preview(&effect.summary, 60),
            effect.valence,
            effect.intensity
        );
    }
    println!();
}

fn names(list: &[ParticipantView]) -> String {
    list.iter().map(|p| p.id.as_str()).collect::<Vec<_>>().join(", ")
}
