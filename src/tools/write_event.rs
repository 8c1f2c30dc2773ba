//! MCP `hippocampus_write_event` tool parameter definition.

use hippograph::memory::encode::WriteEventInput;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// The biomimetic event arrives nested under `event`.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct WriteEventParams {
    #[schemars(
        description = "Event with title, description, happened_at, who, why, what_entities, what_produced, where, effects"
    )]
    pub event: WriteEventInput,
}
