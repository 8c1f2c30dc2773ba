//! MCP `graph_stats` tool parameter definition.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the `graph_stats` MCP tool. Takes no arguments.
#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct GraphStatsParams {}
