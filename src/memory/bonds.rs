//! Directed, evolving relationship bonds between entities.
//!
//! One live aggregate per ordered `(source, target)` pair in `bonds`, plus
//! two append-only logs: `bond_milestones` and `bond_trajectory`. Each
//! [`evolve_bond`] call overwrites the strength, keeps the prior resonance
//! unless a new one is given, bumps the interaction count, and appends exactly
//! one trajectory snapshot. Nothing here updates or deletes a log row.

use rusqlite::{params, Connection, OptionalExtension, Transaction};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::error::{MemoryError, MemoryResult};
use super::nodes;
use super::validate::{check_not_blank, check_signed_unit, check_unit};

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct EvolveBondInput {
    #[schemars(description = "Source entity id")]
    pub from_entity_id: String,

    #[schemars(description = "Target entity id")]
    pub to_entity_id: String,

    #[schemars(description = "New bond strength 0.0-1.0; replaces the previous value")]
    pub new_strength: f64,

    #[schemars(description = "Emotional resonance -1.0-1.0; unchanged when omitted")]
    pub emotional_resonance: Option<f64>,

    #[schemars(description = "Milestone to append to the bond's history")]
    pub milestone: Option<String>,

    #[schemars(description = "What prompted this interaction")]
    pub interaction_context: Option<String>,
}

impl EvolveBondInput {
    pub fn validate(&self) -> MemoryResult<()> {
        check_not_blank("from_entity_id", &self.from_entity_id)?;
        check_not_blank("to_entity_id", &self.to_entity_id)?;
        check_unit("new_strength", self.new_strength)?;
        if let Some(r) = self.emotional_resonance {
            check_signed_unit("emotional_resonance", r)?;
        }
        if let Some(m) = &self.milestone {
            check_not_blank("milestone", m)?;
        }
        Ok(())
    }
}

/// Bond state as reported by `evolve_bond`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BondSummary {
    pub strength: f64,
    pub resonance: f64,
    pub interaction_count: u32,
    pub milestones: Vec<String>,
    pub trajectory_length: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BondResult {
    pub from: String,
    pub to: String,
    pub bond: BondSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Milestone {
    pub milestone: String,
    pub recorded_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrajectoryPoint {
    pub recorded_at: String,
    pub strength: f64,
    pub emotional_resonance: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

/// A bond with its full history, oldest entries first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bond {
    pub source_id: String,
    pub target_id: String,
    pub strength: f64,
    pub emotional_resonance: f64,
    pub interaction_count: u32,
    pub first_interaction: String,
    pub last_interaction: String,
    pub milestones: Vec<Milestone>,
    pub trajectory: Vec<TrajectoryPoint>,
}

/// Create or update the bond from `from_entity_id` to `to_entity_id`.
///
/// Endpoints are upserted as placeholder entities when unknown.
pub fn evolve_bond(conn: &mut Connection, input: &EvolveBondInput) -> MemoryResult<BondResult> {
    input.validate()?;

    let now = super::now_timestamp();
    let (from, to) = (input.from_entity_id.as_str(), input.to_entity_id.as_str());

    let tx = conn.transaction()?;

    nodes::ensure_entity(&tx, from, &now)?;
    nodes::ensure_entity(&tx, to, &now)?;

    tx.execute(
        "INSERT INTO bonds (source_id, target_id, strength, emotional_resonance, \
         interaction_count, first_interaction, last_interaction) \
         VALUES (?1, ?2, ?3, COALESCE(?4, 0.0), 1, ?5, ?5) \
         ON CONFLICT(source_id, target_id) DO UPDATE SET \
             strength = excluded.strength, \
             emotional_resonance = COALESCE(?4, emotional_resonance), \
             interaction_count = interaction_count + 1, \
             last_interaction = excluded.last_interaction",
        params![from, to, input.new_strength, input.emotional_resonance, now],
    )?;

    if let Some(milestone) = &input.milestone {
        tx.execute(
            "INSERT INTO bond_milestones (source_id, target_id, milestone, recorded_at) \
             VALUES (?1, ?2, ?3, ?4)",
            params![from, to, milestone, now],
        )?;
    }

    // The snapshot carries the post-update resonance, which may be the kept value.
    tx.execute(
        "INSERT INTO bond_trajectory (source_id, target_id, recorded_at, strength, \
         emotional_resonance, context) \
         SELECT source_id, target_id, ?3, strength, emotional_resonance, ?4 \
         FROM bonds WHERE source_id = ?1 AND target_id = ?2",
        params![from, to, now, input.interaction_context],
    )?;

    let summary = summarize(&tx, from, to)?;
    tx.commit()?;

    tracing::info!(
        from = %from,
        to = %to,
        strength = summary.strength,
        interactions = summary.interaction_count,
        "bond evolved"
    );

    Ok(BondResult {
        from: from.to_string(),
        to: to.to_string(),
        bond: summary,
    })
}

fn summarize(tx: &Transaction, from: &str, to: &str) -> MemoryResult<BondSummary> {
    let bond = get_bond(tx, from, to)?
        .ok_or_else(|| MemoryError::Internal(format!("bond {from} -> {to} missing after upsert")))?;
    Ok(BondSummary {
        strength: bond.strength,
        resonance: bond.emotional_resonance,
        interaction_count: bond.interaction_count,
        milestones: bond.milestones.into_iter().map(|m| m.milestone).collect(),
        trajectory_length: bond.trajectory.len(),
    })
}

/// Read one bond with its milestone and trajectory logs.
pub fn get_bond(conn: &Connection, from: &str, to: &str) -> MemoryResult<Option<Bond>> {
    let head = conn
        .query_row(
            "SELECT strength, emotional_resonance, interaction_count, first_interaction, \
             last_interaction FROM bonds WHERE source_id = ?1 AND target_id = ?2",
            params![from, to],
            |row| {
                Ok((
                    row.get::<_, f64>(0)?,
                    row.get::<_, f64>(1)?,
                    row.get::<_, u32>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                ))
            },
        )
        .optional()?;

    let Some((strength, emotional_resonance, interaction_count, first, last)) = head else {
        return Ok(None);
    };

    let milestones = conn
        .prepare_cached(
            "SELECT milestone, recorded_at FROM bond_milestones \
             WHERE source_id = ?1 AND target_id = ?2 ORDER BY seq",
        )?
        .query_map(params![from, to], |row| {
            Ok(Milestone {
                milestone: row.get(0)?,
                recorded_at: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let trajectory = conn
        .prepare_cached(
            "SELECT recorded_at, strength, emotional_resonance, context FROM bond_trajectory \
             WHERE source_id = ?1 AND target_id = ?2 ORDER BY seq",
        )?
        .query_map(params![from, to], |row| {
            Ok(TrajectoryPoint {
                recorded_at: row.get(0)?,
                strength: row.get(1)?,
                emotional_resonance: row.get(2)?,
                context: row.get(3)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Some(Bond {
        source_id: from.to_string(),
        target_id: to.to_string(),
        strength,
        emotional_resonance,
        interaction_count,
        first_interaction: first,
        last_interaction: last,
        milestones,
        trajectory,
    }))
}
