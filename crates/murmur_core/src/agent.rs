//! Agent seam for the Murmur relay.
//!
//! The conversational agent itself lives outside this workspace. These types
//! define the boundary the relay drives: a factory that builds an agent for a
//! behavior profile, and an interaction that yields a finite stream of
//! events.

use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

use crate::{Result, config::MurmurConfig};

/// One-shot event sequence produced by a single agent interaction.
///
/// The stream is finite and lazy; items may fail mid-sequence.
pub type AgentEventStream = BoxStream<'static, Result<AgentEvent>>;

/// Events an agent interaction can emit, in stream order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentEvent {
    /// Assistant-authored output text.
    Assistant { content: Option<String> },
    /// The user's input echoed back into the transcript.
    UserMessage { content: Option<String> },
    /// Outcome of a tool invocation; `error` is set when the tool failed.
    ToolResult {
        content: Option<String>,
        error: Option<String>,
    },
    /// Intermediate reasoning the agent chose to surface.
    Reasoning { content: Option<String> },
}

/// Construction parameters handed to an [`AgentFactory`].
#[derive(Debug, Clone)]
pub struct AgentSpec {
    /// Full configuration, passed through to the agent unchanged.
    pub config: MurmurConfig,
    /// Behavior profile the agent should run under.
    pub profile: String,
    /// Whether the agent should stream partial output.
    pub streaming: bool,
}

/// A conversational agent the relay can drive.
#[async_trait]
pub trait Agent: Send + Sync {
    /// Submit `input` and return the event sequence describing the response.
    async fn act(&self, input: &str) -> Result<AgentEventStream>;
}

/// Builds agents at composition time.
#[async_trait]
pub trait AgentFactory: Send + Sync {
    async fn create(&self, spec: AgentSpec) -> Result<Arc<dyn Agent>>;
}
