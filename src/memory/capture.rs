//! Capture intake: raw, pre-filtering observations keyed by `capture_id`.
//!
//! A capture is not bound into the graph. Re-sending a known id overwrites its
//! descriptive fields and bumps `updated_at`; `created_at` is kept.

use rusqlite::{params, Connection, OptionalExtension};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::error::{MemoryError, MemoryResult};
use super::validate::{check_not_blank, check_unit, parse_timestamp};

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CaptureInput {
    #[schemars(description = "Caller-chosen stable id; re-sending it updates the capture")]
    pub capture_id: String,

    #[schemars(description = "RFC 3339 time of the observation. Defaults to now.")]
    pub timestamp: Option<String>,

    pub description: String,

    #[schemars(description = "Significance 0.0-1.0")]
    pub significance: f64,

    #[schemars(description = "Emotional intensity 0.0-1.0")]
    pub emotional_intensity: f64,

    pub project: Option<String>,

    #[schemars(description = "How it was observed, e.g. 'chat', 'voice', 'screen'")]
    pub modality: Option<String>,

    pub location: Option<String>,

    pub affect: Option<String>,

    #[serde(default)]
    pub tags: Vec<String>,

    pub source: Option<String>,

    #[schemars(description = "Optional RFC 3339 deadline")]
    pub deadline: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Capture {
    pub capture_id: String,
    pub timestamp: String,
    pub description: String,
    pub significance: f64,
    pub emotional_intensity: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modality: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub affect: Option<String>,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl CaptureInput {
    pub fn validate(&self) -> MemoryResult<()> {
        check_not_blank("capture_id", &self.capture_id)?;
        check_not_blank("description", &self.description)?;
        check_unit("significance", self.significance)?;
        check_unit("emotional_intensity", self.emotional_intensity)?;
        if let Some(ts) = &self.timestamp {
            parse_timestamp("timestamp", ts)?;
        }
        if let Some(d) = &self.deadline {
            parse_timestamp("deadline", d)?;
        }
        Ok(())
    }
}

pub fn write_capture(conn: &Connection, input: &CaptureInput) -> MemoryResult<Capture> {
    input.validate()?;

    let now = super::now_timestamp();
    let timestamp = match &input.timestamp {
        Some(ts) => super::format_timestamp(parse_timestamp("timestamp", ts)?),
        None => now.clone(),
    };
    let deadline = input
        .deadline
        .as_deref()
        .map(|d| parse_timestamp("deadline", d).map(super::format_timestamp))
        .transpose()?;

    conn.execute(
        "INSERT INTO captures (capture_id, timestamp, description, significance, \
         emotional_intensity, project, modality, location, affect, tags, source, deadline, \
         created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?13) \
         ON CONFLICT(capture_id) DO UPDATE SET \
             timestamp = excluded.timestamp, \
             description = excluded.description, \
             significance = excluded.significance, \
             emotional_intensity = excluded.emotional_intensity, \
             project = excluded.project, \
             modality = excluded.modality, \
             location = excluded.location, \
             affect = excluded.affect, \
             tags = excluded.tags, \
             source = excluded.source, \
             deadline = excluded.deadline, \
             updated_at = excluded.updated_at",
        params![
            input.capture_id,
            timestamp,
            input.description,
            input.significance,
            input.emotional_intensity,
            input.project,
            input.modality,
            input.location,
            input.affect,
            serde_json::to_string(&input.tags)?,
            input.source,
            deadline,
            now,
        ],
    )?;

    tracing::info!(capture_id = %input.capture_id, "capture written");

    get_capture(conn, &input.capture_id)?.ok_or_else(|| {
        MemoryError::Internal(format!("capture {} missing after write", input.capture_id))
    })
}

pub fn get_capture(conn: &Connection, capture_id: &str) -> MemoryResult<Option<Capture>> {
    let row = conn
        .query_row(
            "SELECT capture_id, timestamp, description, significance, emotional_intensity, \
             project, modality, location, affect, tags, source, deadline, created_at, updated_at \
             FROM captures WHERE capture_id = ?1",
            params![capture_id],
            |row| {
                Ok((
                    Capture {
                        capture_id: row.get(0)?,
                        timestamp: row.get(1)?,
                        description: row.get(2)?,
                        significance: row.get(3)?,
                        emotional_intensity: row.get(4)?,
                        project: row.get(5)?,
                        modality: row.get(6)?,
                        location: row.get(7)?,
                        affect: row.get(8)?,
                        tags: Vec::new(),
                        source: row.get(10)?,
                        deadline: row.get(11)?,
                        created_at: row.get(12)?,
                        updated_at: row.get(13)?,
                    },
                    row.get::<_, String>(9)?,
                ))
            },
        )
        .optional()?;

    row.map(|(mut capture, tags)| {
        capture.tags = serde_json::from_str(&tags)?;
        Ok(capture)
    })
    .transpose()
}
