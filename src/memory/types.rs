//! Node, edge, and reference types of the memory graph.
//!
//! The enums mirror the CHECK constraints in [`crate::db::schema`]. The `*Ref`
//! structs are the inline references an episode carries to the reference nodes
//! it binds (participants, entities, targets, consolidation targets); they
//! double as tool input schemas.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

macro_rules! str_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $($(#[$vmeta:meta])* $variant:ident => $s:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $name {
            /// SQL-compatible string representation.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant),)+
                    _ => Err(format!(concat!("unknown ", stringify!($name), ": {}"), s)),
                }
            }
        }
    };
}

str_enum!(
    /// What kind of episode an Event records. Corrections are new Events, never edits.
    EventType {
        Conversation => "conversation",
        Realization => "realization",
        Correction => "correction",
        Collaboration => "collaboration",
        Genesis => "genesis",
    }
);

str_enum!(
    /// Direction of an Effect.
    EffectValence {
        Positive => "positive",
        Negative => "negative",
        Neutral => "neutral",
        Mixed => "mixed",
    }
);

str_enum!(
    /// Granularity at which an Entity is referenced.
    EntityScale {
        Micro => "micro",
        Meso => "meso",
        Macro => "macro",
    }
);

str_enum!(
    /// Human (`Person`, keyed by name) or non-human (`Agent`, keyed by id).
    #[derive(Default)]
    ParticipantKind {
        #[default]
        Person => "person",
        Agent => "agent",
    }
);

str_enum!(
    /// How an Entity is bound to an Event: present (`INVOLVED_IN`) or an output
    /// (`PRODUCED` / `MODIFIED`).
    #[derive(Default)]
    Involvement {
        #[default]
        Involved => "involved",
        Produced => "produced",
        Modified => "modified",
    }
);

str_enum!(
    /// Kind of longer-lived node an Event consolidates into.
    ConsolidationKind {
        Concept => "concept",
        Person => "person",
        Project => "project",
    }
);

/// A Person or Agent taking part in an Event.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ParticipantRef {
    /// Person name or Agent id.
    #[schemars(description = "Person name or agent id")]
    pub id: String,

    #[serde(default)]
    #[schemars(description = "'person' (default) or 'agent'")]
    pub kind: ParticipantKind,

    #[schemars(description = "Role in the event, e.g. 'subject', 'observer'")]
    pub role: Option<String>,
}

/// An Entity bound to an Event. Upserted by `id`; descriptive fields fill in
/// or refresh the stored node when supplied.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct EntityRef {
    #[schemars(description = "Stable entity identifier")]
    pub id: String,

    #[schemars(description = "Display name (defaults to the id for new entities)")]
    pub name: Option<String>,

    #[schemars(description = "Free-form kind: framework, paper, module, ...")]
    pub kind: Option<String>,

    #[schemars(description = "Granularity: 'micro', 'meso', or 'macro'")]
    pub scale: Option<EntityScale>,

    #[schemars(description = "Optional JSON metadata blob")]
    pub metadata: Option<serde_json::Value>,

    #[schemars(description = "Role of the entity in the event")]
    pub role: Option<String>,

    #[schemars(description = "Salience of the entity in the event, 0.0-1.0")]
    pub salience: Option<f64>,

    #[serde(default)]
    #[schemars(description = "'involved' (default), 'produced', or 'modified'")]
    pub relation: Involvement,
}

impl EntityRef {
    /// Bare reference by id, with every optional field unset.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            kind: None,
            scale: None,
            metadata: None,
            role: None,
            salience: None,
            relation: Involvement::Involved,
        }
    }
}

/// Recipient of an Effect, de-duplicated by `(id, kind)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TargetRef {
    pub id: String,
    #[schemars(description = "Kind of target, e.g. 'person', 'project', 'entity'")]
    pub kind: String,
}

/// An Event that came before the one being encoded.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PrecedesRef {
    #[schemars(description = "Id of an existing event that preceded this one")]
    pub event_id: String,

    #[schemars(description = "Strength of the causal link, 0.0-1.0")]
    pub causal_strength: Option<f64>,
}

/// A consolidation link from an Event to a Concept, Person, or Project.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ConsolidationRef {
    #[schemars(description = "'concept', 'person', or 'project'")]
    pub target_kind: ConsolidationKind,

    #[schemars(description = "Name of the consolidation target")]
    pub target_name: String,

    #[schemars(description = "Consolidation strength 0.0-1.0. Defaults to 0.5.")]
    pub strength: Option<f64>,

    #[schemars(description = "Consolidation type label. Defaults to 'episodic_to_semantic'.")]
    pub consolidation_type: Option<String>,

    #[schemars(description = "Number of rehearsals so far. Defaults to 0.")]
    pub rehearsal_count: Option<u32>,
}

pub const DEFAULT_CONSOLIDATION_STRENGTH: f64 = 0.5;
pub const DEFAULT_CONSOLIDATION_TYPE: &str = "episodic_to_semantic";

/// A stored consolidation edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Consolidation {
    pub target_kind: String,
    pub target_name: String,
    pub strength: f64,
    pub consolidation_type: String,
    pub rehearsal_count: u32,
}

/// An Entity as projected onto an Event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundEntity {
    pub entity_id: String,
    pub name: String,
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale: Option<String>,
    pub relation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salience: Option<f64>,
}

/// A `PRECEDED` edge as seen from the later Event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrecedingEvent {
    pub event_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub causal_strength: Option<f64>,
}
