pub mod graph_stats;
pub mod write_event;

use std::time::Instant;

use graph_stats::GraphStatsParams;
use hippograph::engine::{envelope, MemoryEngine};
use hippograph::memory::bonds::EvolveBondInput;
use hippograph::memory::capture::CaptureInput;
use hippograph::memory::encode::{EncodeMemoryInput, WriteReflectionInput};
use hippograph::memory::episodes::SearchEventsRequest;
use hippograph::memory::recall::RecallRequest;
use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::{tool, tool_handler, tool_router, ServerHandler};
use write_event::WriteEventParams;

/// The hippograph MCP tool handler. Every tool answers with the structured
/// result object from [`envelope`], so failures never surface as protocol errors.
#[derive(Clone)]
pub struct HippoTools {
    tool_router: ToolRouter<Self>,
    engine: MemoryEngine,
}

#[tool_router]
impl HippoTools {
    pub fn new(engine: MemoryEngine) -> Self {
        Self {
            tool_router: Self::tool_router(),
            engine,
        }
    }

    #[tool(description = "Encode an episode: one event with participants, catalysts, place, involved entities, preceding events, and consolidation targets. Written atomically.")]
    async fn encode_memory(
        &self,
        Parameters(params): Parameters<EncodeMemoryInput>,
    ) -> Result<String, String> {
        let started = Instant::now();
        tracing::info!(
            event_type = %params.event.event_type,
            involves = params.involves.len(),
            "encode_memory called"
        );
        Ok(envelope(started, self.engine.encode_memory(params).await).to_string())
    }

    #[tool(description = "Recall events ranked by 0.7 x semantic similarity + 0.3 x significance. Without a query, ranks by significance. Filters: emotional_range, temporal_range, significance_threshold, involves_entities, event_types.")]
    async fn recall_memory(
        &self,
        Parameters(params): Parameters<RecallRequest>,
    ) -> Result<String, String> {
        let started = Instant::now();
        tracing::info!(has_query = params.query.is_some(), "recall_memory called");
        Ok(envelope(started, self.engine.recall_memory(params).await).to_string())
    }

    #[tool(description = "Write an event in who / what / where / why / effects form. The description is embedded for later search.")]
    async fn hippocampus_write_event(
        &self,
        Parameters(params): Parameters<WriteEventParams>,
    ) -> Result<String, String> {
        let started = Instant::now();
        tracing::info!(title = %params.event.title, "hippocampus_write_event called");
        Ok(envelope(started, self.engine.write_event(params.event).await).to_string())
    }

    #[tool(description = "Attach an agent's reflection (summary, valence, considered targets) to an existing event.")]
    async fn hippocampus_write_reflection(
        &self,
        Parameters(params): Parameters<WriteReflectionInput>,
    ) -> Result<String, String> {
        let started = Instant::now();
        tracing::info!(
            event_id = %params.event_id,
            agent_id = %params.agent_id,
            "hippocampus_write_reflection called"
        );
        Ok(envelope(started, self.engine.write_reflection(params).await).to_string())
    }

    #[tool(description = "Reconstruct whole episodes from partial cues: semantic_query, time_range, participants, entities, place, effects_on, min_effect_intensity. Most recent first.")]
    async fn hippocampus_search_events(
        &self,
        Parameters(params): Parameters<SearchEventsRequest>,
    ) -> Result<String, String> {
        let started = Instant::now();
        tracing::info!(
            participants = params.participants.len(),
            entities = params.entities.len(),
            "hippocampus_search_events called"
        );
        Ok(envelope(started, self.engine.search_events(params).await).to_string())
    }

    #[tool(description = "Create or update the directed bond between two entities. Strength is replaced; every call appends a trajectory snapshot.")]
    async fn evolve_bond(
        &self,
        Parameters(params): Parameters<EvolveBondInput>,
    ) -> Result<String, String> {
        let started = Instant::now();
        tracing::info!(
            from = %params.from_entity_id,
            to = %params.to_entity_id,
            "evolve_bond called"
        );
        Ok(envelope(started, self.engine.evolve_bond(params).await).to_string())
    }

    #[tool(description = "Record or update a raw capture (pre-filtering observation) by capture_id.")]
    async fn capture_write(
        &self,
        Parameters(params): Parameters<CaptureInput>,
    ) -> Result<String, String> {
        let started = Instant::now();
        tracing::info!(capture_id = %params.capture_id, "capture_write called");
        Ok(envelope(started, self.engine.write_capture(params).await).to_string())
    }

    #[tool(description = "Counts of events, nodes, edges, and bonds in the memory graph.")]
    async fn graph_stats(
        &self,
        Parameters(_params): Parameters<GraphStatsParams>,
    ) -> Result<String, String> {
        let started = Instant::now();
        tracing::info!("graph_stats called");
        Ok(envelope(started, self.engine.graph_stats().await).to_string())
    }
}

#[tool_handler]
impl ServerHandler for HippoTools {
    fn get_info(&self) -> rmcp::model::ServerInfo {
        rmcp::model::ServerInfo {
            instructions: Some(
                "hippograph is an episodic memory graph. Use encode_memory or \
                 hippocampus_write_event to record episodes, recall_memory to rank them, \
                 hippocampus_search_events to rebuild whole episodes from partial cues, \
                 and evolve_bond to track relationships between entities."
                    .into(),
            ),
            capabilities: rmcp::model::ServerCapabilities::builder()
                .enable_tools()
                .build(),
            ..Default::default()
        }
    }
}
