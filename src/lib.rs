//! Episodic memory as a typed graph, served over MCP.
//!
//! hippograph stores each episode as an Event bound to the people, agents,
//! entities, places, reasons, and effects that make it up, and lets agents get
//! those episodes back in two ways: hybrid recall (vector similarity blended
//! with significance) and pattern completion (rebuild whole episodes from any
//! partial cue). Directed bonds between entities evolve over time and keep
//! their full history.
//!
//! | Operation | Purpose |
//! |-----------|---------|
//! | `encode_memory` | Write one Event with its involvement, causal, and consolidation links |
//! | `recall_memory` | Ranked retrieval: `0.7 × similarity + 0.3 × significance` |
//! | `hippocampus_write_event` | Biomimetic Event form: who / what / where / why / effects |
//! | `hippocampus_write_reflection` | Attach an agent's interpretation to an Event |
//! | `hippocampus_search_events` | Pattern completion over sparse cues |
//! | `evolve_bond` | Create or update a directed bond and append to its trajectory |
//!
//! # Architecture
//!
//! - **Storage**: SQLite tables for node and edge kinds, with
//!   [sqlite-vec](https://github.com/asg017/sqlite-vec) as the Event vector index
//! - **Embeddings**: Local ONNX Runtime with all-MiniLM-L6-v2 (384 dimensions)
//! - **Writes**: one SQLite transaction per operation; nothing is half-bound
//! - **Transport**: MCP over stdio (primary) or Streamable HTTP
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from TOML files and environment variables
//! - [`db`]: SQLite initialization, schema, migrations, and health checks
//! - [`embedding`]: Text-to-vector embedding providers
//! - [`memory`]: The graph operations: encode, recall, search, bonds, captures
//! - [`engine`]: Async facade and the structured result envelope

pub mod config;
pub mod db;
pub mod embedding;
pub mod engine;
pub mod memory;
