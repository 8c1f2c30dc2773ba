//! Event encoding pipeline. One episode, one transaction.
//!
//! [`encode_memory`] and [`write_event`] share the same shape: validate every
//! numeric range, then inside a single transaction create the Event row and its
//! vector, bind each structural block (who / where / why / what / effects /
//! precedes / consolidations), and commit. Any failing statement drops the
//! transaction, which rolls back, so no Event is ever left half-bound. The
//! embedding is computed by the caller before the transaction opens.
//!
//! Reference policy: identifier-keyed nodes are upserted (see
//! [`super::nodes`]); references to Events must already exist or the whole
//! write fails with [`MemoryError::Reference`].

use rusqlite::{params, Connection, OptionalExtension, Transaction};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::error::{MemoryError, MemoryResult};
use super::nodes;
use super::types::{
    BoundEntity, Consolidation, ConsolidationRef, EffectValence, EntityRef, EventType,
    Involvement, ParticipantKind, ParticipantRef, PrecedesRef, PrecedingEvent, TargetRef,
    DEFAULT_CONSOLIDATION_STRENGTH, DEFAULT_CONSOLIDATION_TYPE,
};
use super::validate::{
    check_not_blank, check_optional_unit, check_signed_unit, check_unit, parse_timestamp,
};

/// Default significance for biomimetic events that do not state one.
pub const DEFAULT_EVENT_SIGNIFICANCE: f64 = 0.5;

// ── Inputs ────────────────────────────────────────────────────────────────────

/// The Event payload of `encode_memory`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct EventPayload {
    #[serde(rename = "type")]
    #[schemars(
        description = "Event type: conversation, realization, correction, collaboration, genesis"
    )]
    pub event_type: EventType,

    #[schemars(description = "Short summary of what happened")]
    pub context_summary: String,

    #[schemars(description = "Optional full content (transcript, notes)")]
    pub full_content: Option<String>,

    #[schemars(description = "Emotional valence, -1.0 to 1.0")]
    pub emotional_valence: f64,

    #[schemars(description = "Significance, 0.0 to 1.0")]
    pub significance: f64,

    #[schemars(description = "RFC 3339 time the event happened. Defaults to now.")]
    pub timestamp: Option<String>,

    #[schemars(description = "Place the event was held at")]
    pub place: Option<String>,

    #[serde(default)]
    #[schemars(description = "People and agents who took part")]
    pub participants: Vec<ParticipantRef>,

    #[serde(default)]
    #[schemars(description = "Reasons or motivations behind the event")]
    pub catalysts: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct EncodeMemoryInput {
    pub event: EventPayload,

    #[serde(default)]
    #[schemars(description = "Entities involved in, produced by, or modified by the event")]
    pub involves: Vec<EntityRef>,

    #[serde(default)]
    #[schemars(description = "Existing events that preceded this one")]
    pub precedes: Vec<PrecedesRef>,

    #[serde(default)]
    #[schemars(description = "Concepts, people, or projects this event consolidates into")]
    pub consolidates_to: Vec<ConsolidationRef>,
}

/// An Effect occurrence attached to a biomimetic event.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct EffectInput {
    pub summary: String,

    #[schemars(description = "'positive', 'negative', 'neutral', or 'mixed'")]
    pub valence: EffectValence,

    #[schemars(description = "Intensity, 0.0 to 1.0")]
    pub intensity: f64,

    #[schemars(description = "What the effect was with respect to")]
    pub target: Option<TargetRef>,
}

/// The biomimetic Event form (`hippocampus_write_event`).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WriteEventInput {
    pub title: String,

    #[schemars(description = "What happened; this text is embedded")]
    pub description: String,

    #[schemars(description = "RFC 3339 time the event happened. Defaults to now.")]
    pub happened_at: Option<String>,

    #[serde(rename = "type")]
    pub event_type: Option<EventType>,

    #[schemars(description = "Significance 0.0-1.0. Defaults to 0.5.")]
    pub significance: Option<f64>,

    #[schemars(description = "Emotional valence -1.0-1.0. Defaults to 0.0.")]
    pub emotional_valence: Option<f64>,

    #[serde(default)]
    pub who: Vec<ParticipantRef>,

    #[serde(default)]
    #[schemars(description = "Catalysts: why it happened")]
    pub why: Vec<String>,

    #[serde(default)]
    #[schemars(description = "Entities present in the event")]
    pub what_entities: Vec<EntityRef>,

    #[serde(default)]
    #[schemars(description = "Entities the event produced ('modified' via relation)")]
    pub what_produced: Vec<EntityRef>,

    #[serde(rename = "where")]
    pub place: Option<String>,

    #[serde(default)]
    pub effects: Vec<EffectInput>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ReflectionInput {
    pub summary: String,

    #[schemars(description = "Valence of the interpretation, -1.0 to 1.0")]
    pub valence: f64,

    #[schemars(description = "Targets the agent considered while reflecting")]
    pub considered_targets: Option<Vec<String>>,

    #[schemars(description = "Who else is in frame; the agent is always listed first")]
    pub who_context: Option<Vec<String>>,

    pub where_context: Option<String>,

    pub how_context: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WriteReflectionInput {
    pub event_id: String,
    pub agent_id: String,
    pub reflection: ReflectionInput,
}

// ── Outputs ───────────────────────────────────────────────────────────────────

/// Projection returned by [`encode_memory`], re-read after commit.
#[derive(Debug, Clone, Serialize)]
pub struct EncodedMemory {
    pub event_id: String,
    pub timestamp: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub valence: f64,
    pub significance: f64,
    pub involves: Vec<BoundEntity>,
    pub preceded_by: Vec<PrecedingEvent>,
    pub consolidations: Vec<Consolidation>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WrittenEvent {
    pub event_id: String,
    pub timestamp: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reflection {
    pub reflection_id: String,
    pub event_id: String,
    pub agent_id: String,
    pub summary: String,
    pub valence: f64,
    pub entry_date: String,
    pub who_context: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub where_context: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub how_context: Option<String>,
    pub considered_targets: Vec<String>,
}

// ── Validation ────────────────────────────────────────────────────────────────

impl EncodeMemoryInput {
    pub fn validate(&self) -> MemoryResult<()> {
        let e = &self.event;
        check_not_blank("event.context_summary", &e.context_summary)?;
        check_signed_unit("event.emotional_valence", e.emotional_valence)?;
        check_unit("event.significance", e.significance)?;
        if let Some(ts) = &e.timestamp {
            parse_timestamp("event.timestamp", ts)?;
        }
        if let Some(place) = &e.place {
            check_not_blank("event.place", place)?;
        }
        validate_participants(&e.participants)?;
        for c in &e.catalysts {
            check_not_blank("event.catalysts[]", c)?;
        }
        validate_entities("involves", &self.involves)?;
        for p in &self.precedes {
            check_not_blank("precedes[].event_id", &p.event_id)?;
            check_optional_unit("precedes[].causal_strength", p.causal_strength)?;
        }
        for c in &self.consolidates_to {
            check_not_blank("consolidates_to[].target_name", &c.target_name)?;
            check_optional_unit("consolidates_to[].strength", c.strength)?;
        }
        Ok(())
    }

    /// Text embedded for this Event: the summary, then the full content if any.
    pub fn embedding_text(&self) -> String {
        match &self.event.full_content {
            Some(full) if !full.trim().is_empty() => {
                format!("{}\n\n{}", self.event.context_summary, full)
            }
            _ => self.event.context_summary.clone(),
        }
    }
}

impl WriteEventInput {
    pub fn validate(&self) -> MemoryResult<()> {
        check_not_blank("title", &self.title)?;
        check_not_blank("description", &self.description)?;
        if let Some(ts) = &self.happened_at {
            parse_timestamp("happened_at", ts)?;
        }
        check_optional_unit("significance", self.significance)?;
        if let Some(v) = self.emotional_valence {
            check_signed_unit("emotional_valence", v)?;
        }
        if let Some(place) = &self.place {
            check_not_blank("where", place)?;
        }
        validate_participants(&self.who)?;
        for c in &self.why {
            check_not_blank("why[]", c)?;
        }
        validate_entities("what_entities", &self.what_entities)?;
        validate_entities("what_produced", &self.what_produced)?;
        for effect in &self.effects {
            check_not_blank("effects[].summary", &effect.summary)?;
            check_unit("effects[].intensity", effect.intensity)?;
            if let Some(t) = &effect.target {
                check_not_blank("effects[].target.id", &t.id)?;
                check_not_blank("effects[].target.kind", &t.kind)?;
            }
        }
        Ok(())
    }

    /// The biomimetic form embeds the description alone.
    pub fn embedding_text(&self) -> String {
        self.description.clone()
    }
}

impl WriteReflectionInput {
    pub fn validate(&self) -> MemoryResult<()> {
        check_not_blank("event_id", &self.event_id)?;
        check_not_blank("agent_id", &self.agent_id)?;
        check_not_blank("reflection.summary", &self.reflection.summary)?;
        check_signed_unit("reflection.valence", self.reflection.valence)
    }
}

fn validate_participants(participants: &[ParticipantRef]) -> MemoryResult<()> {
    for p in participants {
        check_not_blank("participant id", &p.id)?;
    }
    Ok(())
}

fn validate_entities(field: &str, entities: &[EntityRef]) -> MemoryResult<()> {
    for e in entities {
        check_not_blank(&format!("{field}[].id"), &e.id)?;
        check_optional_unit(&format!("{field}[].salience"), e.salience)?;
    }
    Ok(())
}

// ── Write paths ───────────────────────────────────────────────────────────────

/// Scalar columns of a new Event row.
struct NewEvent<'a> {
    id: &'a str,
    event_type: Option<EventType>,
    happened_at: &'a str,
    emotional_valence: f64,
    significance: f64,
    context_summary: &'a str,
    full_content: Option<&'a str>,
    title: Option<&'a str>,
    description: Option<&'a str>,
    place: Option<&'a str>,
    embedding_model: &'a str,
    created_at: &'a str,
}

/// Encode one episode with its involvement, causal, and consolidation links.
pub fn encode_memory(
    conn: &mut Connection,
    input: &EncodeMemoryInput,
    embedding: &[f32],
    embedding_model: &str,
) -> MemoryResult<EncodedMemory> {
    input.validate()?;
    super::check_embedding(embedding)?;

    let id = uuid::Uuid::now_v7().to_string();
    let now = super::now_timestamp();
    let happened_at = resolve_time("event.timestamp", input.event.timestamp.as_deref(), &now)?;
    let e = &input.event;

    let tx = conn.transaction()?;

    if let Some(place) = &e.place {
        nodes::upsert_place(&tx, place, &now)?;
    }
    insert_event(
        &tx,
        &NewEvent {
            id: &id,
            event_type: Some(e.event_type),
            happened_at: &happened_at,
            emotional_valence: e.emotional_valence,
            significance: e.significance,
            context_summary: &e.context_summary,
            full_content: e.full_content.as_deref(),
            title: None,
            description: None,
            place: e.place.as_deref(),
            embedding_model,
            created_at: &now,
        },
        embedding,
    )?;
    bind_participants(&tx, &id, &e.participants, &now)?;
    bind_catalysts(&tx, &id, &e.catalysts, &now)?;
    bind_entities(&tx, &id, &input.involves, None, &now)?;
    bind_predecessors(&tx, &id, &input.precedes)?;
    bind_consolidations(&tx, &id, &input.consolidates_to, &now)?;

    tx.commit()?;

    tracing::info!(
        event_id = %id,
        event_type = %e.event_type,
        involves = input.involves.len(),
        preceded_by = input.precedes.len(),
        consolidations = input.consolidates_to.len(),
        "memory encoded"
    );

    load_encoded(conn, &id)
}

/// Write a biomimetic Event with its who / why / what / where / effects blocks.
pub fn write_event(
    conn: &mut Connection,
    input: &WriteEventInput,
    embedding: &[f32],
    embedding_model: &str,
) -> MemoryResult<WrittenEvent> {
    input.validate()?;
    super::check_embedding(embedding)?;

    let id = uuid::Uuid::now_v7().to_string();
    let now = super::now_timestamp();
    let happened_at = resolve_time("happened_at", input.happened_at.as_deref(), &now)?;

    let tx = conn.transaction()?;

    if let Some(place) = &input.place {
        nodes::upsert_place(&tx, place, &now)?;
    }
    insert_event(
        &tx,
        &NewEvent {
            id: &id,
            event_type: input.event_type,
            happened_at: &happened_at,
            emotional_valence: input.emotional_valence.unwrap_or(0.0),
            significance: input.significance.unwrap_or(DEFAULT_EVENT_SIGNIFICANCE),
            context_summary: &input.title,
            full_content: None,
            title: Some(&input.title),
            description: Some(&input.description),
            place: input.place.as_deref(),
            embedding_model,
            created_at: &now,
        },
        embedding,
    )?;
    bind_participants(&tx, &id, &input.who, &now)?;
    bind_catalysts(&tx, &id, &input.why, &now)?;
    bind_entities(&tx, &id, &input.what_entities, None, &now)?;
    bind_entities(&tx, &id, &input.what_produced, Some(Involvement::Produced), &now)?;
    bind_effects(&tx, &id, &input.effects, &now)?;

    tx.commit()?;

    tracing::info!(
        event_id = %id,
        who = input.who.len(),
        what = input.what_entities.len() + input.what_produced.len(),
        effects = input.effects.len(),
        "event written"
    );

    Ok(WrittenEvent {
        event_id: id,
        timestamp: happened_at,
        title: input.title.clone(),
    })
}

/// Attach an agent's interpretation to an existing Event.
///
/// Reflections are write-once: a second call for the same (agent, event)
/// adds another reflection rather than replacing the first.
pub fn write_reflection(
    conn: &mut Connection,
    input: &WriteReflectionInput,
) -> MemoryResult<Reflection> {
    input.validate()?;

    let id = uuid::Uuid::now_v7().to_string();
    let now = super::now_timestamp();
    let r = &input.reflection;

    let mut who_context = vec![input.agent_id.clone()];
    for who in r.who_context.iter().flatten() {
        if !who_context.contains(who) {
            who_context.push(who.clone());
        }
    }
    let considered_targets = r.considered_targets.clone().unwrap_or_default();

    let tx = conn.transaction()?;

    if !nodes::event_exists(&tx, &input.event_id)? {
        return Err(MemoryError::Reference(format!(
            "event not found: {}",
            input.event_id
        )));
    }
    nodes::upsert_agent(&tx, &input.agent_id, &now)?;

    tx.execute(
        "INSERT INTO reflections (id, event_id, agent_id, summary, valence, entry_date, \
         who_context, where_context, how_context, considered_targets) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            id,
            input.event_id,
            input.agent_id,
            r.summary,
            r.valence,
            now,
            serde_json::to_string(&who_context)?,
            r.where_context,
            r.how_context,
            serde_json::to_string(&considered_targets)?,
        ],
    )?;

    tx.commit()?;

    tracing::info!(
        reflection_id = %id,
        event_id = %input.event_id,
        agent_id = %input.agent_id,
        "reflection written"
    );

    Ok(Reflection {
        reflection_id: id,
        event_id: input.event_id.clone(),
        agent_id: input.agent_id.clone(),
        summary: r.summary.clone(),
        valence: r.valence,
        entry_date: now,
        who_context,
        where_context: r.where_context.clone(),
        how_context: r.how_context.clone(),
        considered_targets,
    })
}

fn resolve_time(field: &str, supplied: Option<&str>, now: &str) -> MemoryResult<String> {
    match supplied {
        Some(ts) => Ok(super::format_timestamp(parse_timestamp(field, ts)?)),
        None => Ok(now.to_string()),
    }
}

fn insert_event(tx: &Transaction, event: &NewEvent, embedding: &[f32]) -> MemoryResult<()> {
    tx.execute(
        "INSERT INTO events (id, event_type, happened_at, emotional_valence, significance, \
         context_summary, full_content, title, description, place, embedding_model, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            event.id,
            event.event_type.map(|t| t.as_str()),
            event.happened_at,
            event.emotional_valence,
            event.significance,
            event.context_summary,
            event.full_content,
            event.title,
            event.description,
            event.place,
            event.embedding_model,
            event.created_at,
        ],
    )?;
    tx.execute(
        "INSERT INTO events_vec (id, embedding) VALUES (?1, ?2)",
        params![event.id, super::embedding_to_bytes(embedding)],
    )?;
    Ok(())
}

fn bind_participants(
    tx: &Transaction,
    event_id: &str,
    participants: &[ParticipantRef],
    now: &str,
) -> MemoryResult<()> {
    for p in participants {
        nodes::upsert_participant(tx, p.kind, &p.id, now)?;
        tx.execute(
            "INSERT INTO participated_in (event_id, participant_kind, participant_id, role) \
             VALUES (?1, ?2, ?3, ?4) \
             ON CONFLICT(event_id, participant_kind, participant_id) DO UPDATE SET \
                 role = COALESCE(excluded.role, role)",
            params![event_id, p.kind.as_str(), p.id, p.role],
        )?;
    }
    Ok(())
}

fn bind_catalysts(
    tx: &Transaction,
    event_id: &str,
    catalysts: &[String],
    now: &str,
) -> MemoryResult<()> {
    for c in catalysts {
        nodes::upsert_catalyst(tx, c, now)?;
        tx.execute(
            "INSERT OR IGNORE INTO catalyzed_by (event_id, catalyst) VALUES (?1, ?2)",
            params![event_id, c],
        )?;
    }
    Ok(())
}

/// Bind entities as involved or as outputs. `output_default` reinterprets an
/// unspecified (`Involved`) relation, used for the `what_produced` block.
fn bind_entities(
    tx: &Transaction,
    event_id: &str,
    entities: &[EntityRef],
    output_default: Option<Involvement>,
    now: &str,
) -> MemoryResult<()> {
    for entity in entities {
        nodes::upsert_entity(tx, entity, now)?;
        let relation = match (entity.relation, output_default) {
            (Involvement::Involved, Some(default)) => default,
            (relation, _) => relation,
        };
        match relation {
            Involvement::Involved => {
                tx.execute(
                    "INSERT INTO involved_in (event_id, entity_id, role, salience) \
                     VALUES (?1, ?2, ?3, ?4) \
                     ON CONFLICT(event_id, entity_id) DO UPDATE SET \
                         role = COALESCE(excluded.role, role), \
                         salience = COALESCE(excluded.salience, salience)",
                    params![event_id, entity.id, entity.role, entity.salience],
                )?;
            }
            Involvement::Produced | Involvement::Modified => {
                tx.execute(
                    "INSERT OR IGNORE INTO event_outputs (event_id, entity_id, relation) \
                     VALUES (?1, ?2, ?3)",
                    params![event_id, entity.id, relation.as_str()],
                )?;
            }
        }
    }
    Ok(())
}

fn bind_predecessors(
    tx: &Transaction,
    event_id: &str,
    precedes: &[PrecedesRef],
) -> MemoryResult<()> {
    for p in precedes {
        if !nodes::event_exists(tx, &p.event_id)? {
            return Err(MemoryError::Reference(format!(
                "preceding event not found: {}",
                p.event_id
            )));
        }
        tx.execute(
            "INSERT INTO preceded (from_event, to_event, causal_strength) VALUES (?1, ?2, ?3) \
             ON CONFLICT(from_event, to_event) DO UPDATE SET \
                 causal_strength = COALESCE(excluded.causal_strength, causal_strength)",
            params![p.event_id, event_id, p.causal_strength],
        )?;
    }
    Ok(())
}

fn bind_consolidations(
    tx: &Transaction,
    event_id: &str,
    consolidations: &[ConsolidationRef],
    now: &str,
) -> MemoryResult<()> {
    for c in consolidations {
        nodes::upsert_consolidation_target(tx, c.target_kind, &c.target_name, now)?;
        tx.execute(
            "INSERT INTO consolidated_to (event_id, target_kind, target_name, strength, \
             consolidation_type, rehearsal_count) VALUES (?1, ?2, ?3, ?4, ?5, ?6) \
             ON CONFLICT(event_id, target_kind, target_name) DO UPDATE SET \
                 strength = excluded.strength, \
                 consolidation_type = excluded.consolidation_type, \
                 rehearsal_count = excluded.rehearsal_count",
            params![
                event_id,
                c.target_kind.as_str(),
                c.target_name,
                c.strength.unwrap_or(DEFAULT_CONSOLIDATION_STRENGTH),
                c.consolidation_type.as_deref().unwrap_or(DEFAULT_CONSOLIDATION_TYPE),
                c.rehearsal_count.unwrap_or(0),
            ],
        )?;
    }
    Ok(())
}

fn bind_effects(
    tx: &Transaction,
    event_id: &str,
    effects: &[EffectInput],
    now: &str,
) -> MemoryResult<()> {
    for effect in effects {
        if let Some(target) = &effect.target {
            nodes::upsert_target(tx, target, now)?;
        }
        // Effects are occurrences: identical text still creates a new node.
        tx.execute(
            "INSERT INTO effects (id, event_id, summary, valence, intensity, target_id, \
             target_kind, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                uuid::Uuid::now_v7().to_string(),
                event_id,
                effect.summary,
                effect.valence.as_str(),
                effect.intensity,
                effect.target.as_ref().map(|t| t.id.as_str()),
                effect.target.as_ref().map(|t| t.kind.as_str()),
                now,
            ],
        )?;
    }
    Ok(())
}

// ── Read-back ─────────────────────────────────────────────────────────────────

fn load_encoded(conn: &Connection, event_id: &str) -> MemoryResult<EncodedMemory> {
    let row = conn
        .query_row(
            "SELECT happened_at, event_type, emotional_valence, significance \
             FROM events WHERE id = ?1",
            params![event_id],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, Option<String>>(1)?,
                    row.get::<_, f64>(2)?,
                    row.get::<_, f64>(3)?,
                ))
            },
        )
        .optional()?;
    let (timestamp, event_type, valence, significance) = row.ok_or_else(|| {
        MemoryError::Internal(format!("event {event_id} missing after commit"))
    })?;

    Ok(EncodedMemory {
        event_id: event_id.to_string(),
        timestamp,
        event_type: event_type.unwrap_or_default(),
        valence,
        significance,
        involves: bound_entities(conn, event_id)?,
        preceded_by: preceding_events(conn, event_id)?,
        consolidations: consolidations_of(conn, event_id)?,
    })
}

/// Entities bound to an Event, involvement first, then outputs.
pub fn bound_entities(conn: &Connection, event_id: &str) -> MemoryResult<Vec<BoundEntity>> {
    let mut stmt = conn.prepare_cached(
        "SELECT ent.id, ent.name, ent.kind, ent.scale, 'involved', i.role, i.salience \
         FROM involved_in i JOIN entities ent ON ent.id = i.entity_id \
         WHERE i.event_id = ?1 \
         UNION ALL \
         SELECT ent.id, ent.name, ent.kind, ent.scale, o.relation, NULL, NULL \
         FROM event_outputs o JOIN entities ent ON ent.id = o.entity_id \
         WHERE o.event_id = ?1 \
         ORDER BY 5, 1",
    )?;
    let rows = stmt
        .query_map(params![event_id], |row| {
            Ok(BoundEntity {
                entity_id: row.get(0)?,
                name: row.get(1)?,
                kind: row.get(2)?,
                scale: row.get(3)?,
                relation: row.get(4)?,
                role: row.get(5)?,
                salience: row.get(6)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn preceding_events(conn: &Connection, event_id: &str) -> MemoryResult<Vec<PrecedingEvent>> {
    let mut stmt = conn.prepare_cached(
        "SELECT from_event, causal_strength FROM preceded WHERE to_event = ?1 ORDER BY from_event",
    )?;
    let rows = stmt
        .query_map(params![event_id], |row| {
            Ok(PrecedingEvent {
                event_id: row.get(0)?,
                causal_strength: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn consolidations_of(conn: &Connection, event_id: &str) -> MemoryResult<Vec<Consolidation>> {
    let mut stmt = conn.prepare_cached(
        "SELECT target_kind, target_name, strength, consolidation_type, rehearsal_count \
         FROM consolidated_to WHERE event_id = ?1 ORDER BY target_kind, target_name",
    )?;
    let rows = stmt
        .query_map(params![event_id], |row| {
            Ok(Consolidation {
                target_kind: row.get(0)?,
                target_name: row.get(1)?,
                strength: row.get(2)?,
                consolidation_type: row.get(3)?,
                rehearsal_count: row.get(4)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// All reflections on an Event, oldest first.
pub fn reflections_on(conn: &Connection, event_id: &str) -> MemoryResult<Vec<Reflection>> {
    let mut stmt = conn.prepare_cached(
        "SELECT id, event_id, agent_id, summary, valence, entry_date, who_context, \
         where_context, how_context, considered_targets \
         FROM reflections WHERE event_id = ?1 ORDER BY entry_date, id",
    )?;
    let raw = stmt
        .query_map(params![event_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, f64>(4)?,
                row.get::<_, String>(5)?,
                row.get::<_, String>(6)?,
                row.get::<_, Option<String>>(7)?,
                row.get::<_, Option<String>>(8)?,
                row.get::<_, String>(9)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    raw.into_iter()
        .map(
            |(
                id,
                event_id,
                agent_id,
                summary,
                valence,
                entry_date,
                who,
                where_context,
                how_context,
                targets,
            )| {
                Ok(Reflection {
                    reflection_id: id,
                    event_id,
                    agent_id,
                    summary,
                    valence,
                    entry_date,
                    who_context: serde_json::from_str(&who)?,
                    where_context,
                    how_context,
                    considered_targets: serde_json::from_str(&targets)?,
                })
            },
        )
        .collect()
}
