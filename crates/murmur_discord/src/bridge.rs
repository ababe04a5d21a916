//! Bridge between Discord messages and the conversational agent.
//!
//! The bridge owns the agent handle, lazily constructed on the first message,
//! and turns each inbound message into a single reply string by draining the
//! agent's event stream.

use std::sync::Arc;

use async_trait::async_trait;
use futures::TryStreamExt;
use tokio::sync::OnceCell;
use tracing::{error, info};

use murmur_core::{Agent, AgentEvent, AgentFactory, AgentSpec, MurmurConfig, Result};

use crate::bot::MessageHandler;

/// Behavior profile the relay runs the agent under.
const AGENT_PROFILE: &str = "auto-approve";

/// Replies are cut to this many characters before they are chunked for
/// transport, so a bridge reply always fits one Discord message.
const RESPONSE_CHAR_LIMIT: usize = 1800;

/// Posted when the agent finishes without producing any text.
const NO_OUTPUT_PLACEHOLDER: &str = "🤔 I'm thinking...";

/// Drives the agent for each inbound Discord message.
pub struct AgentBridge {
    config: MurmurConfig,
    factory: Arc<dyn AgentFactory>,
    agent: OnceCell<Arc<dyn Agent>>,
}

impl AgentBridge {
    pub fn new(config: MurmurConfig, factory: Arc<dyn AgentFactory>) -> Self {
        Self {
            config,
            factory,
            agent: OnceCell::new(),
        }
    }

    /// Fetch the agent handle, constructing it on first use.
    ///
    /// Construction happens at most once per bridge, even under concurrent
    /// calls; a failed attempt leaves the cell empty so the next message
    /// retries.
    async fn agent(&self) -> Result<&Arc<dyn Agent>> {
        self.agent
            .get_or_try_init(|| async {
                info!("Constructing '{AGENT_PROFILE}' agent");
                self.factory
                    .create(AgentSpec {
                        config: self.config.clone(),
                        profile: AGENT_PROFILE.to_string(),
                        streaming: false,
                    })
                    .await
            })
            .await
    }

    /// Drain one interaction's event stream into a reply string.
    async fn collect_response(&self, input: &str) -> Result<String> {
        let agent = self.agent().await?;
        let mut events = agent.act(input).await?;

        let mut parts: Vec<String> = Vec::new();
        while let Some(event) = events.try_next().await? {
            match event {
                AgentEvent::Assistant { content }
                | AgentEvent::UserMessage { content }
                | AgentEvent::Reasoning { content } => {
                    if let Some(text) = content.filter(|text| !text.is_empty()) {
                        parts.push(text);
                    }
                }
                AgentEvent::ToolResult { content, error } => {
                    if let Some(text) = content.filter(|text| !text.is_empty()) {
                        parts.push(text);
                    }
                    if let Some(failure) = error.filter(|failure| !failure.is_empty()) {
                        parts.push(format!("⚠️ Tool error: {failure}"));
                    }
                }
            }
        }

        if parts.is_empty() {
            return Ok(NO_OUTPUT_PLACEHOLDER.to_string());
        }

        Ok(truncate_chars(&parts.concat(), RESPONSE_CHAR_LIMIT))
    }
}

#[async_trait]
impl MessageHandler for AgentBridge {
    async fn handle_message(&self, content: &str) -> Result<String> {
        match self.collect_response(content).await {
            Ok(response) => Ok(response),
            Err(e) => {
                error!("Agent processing error: {e}");
                Ok(format!("❌ Sorry, I encountered an error: {e}"))
            }
        }
    }
}

fn truncate_chars(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use futures::StreamExt;
    use murmur_core::{AgentEventStream, CoreError, DiscordConfig};
    use pretty_assertions::assert_eq;

    use crate::bot::{MESSAGE_CHUNK_LIMIT, chunk_message};

    type Script = Vec<murmur_core::Result<AgentEvent>>;

    /// Agent double that replays one scripted event sequence per `act` call.
    struct ScriptedAgent {
        script: Mutex<VecDeque<Script>>,
    }

    impl ScriptedAgent {
        fn new(script: Vec<Script>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script.into()),
            })
        }
    }

    #[async_trait]
    impl Agent for ScriptedAgent {
        async fn act(&self, _input: &str) -> murmur_core::Result<AgentEventStream> {
            let events = self.script.lock().unwrap().pop_front().unwrap_or_default();
            Ok(futures::stream::iter(events).boxed())
        }
    }

    /// Factory double that counts constructions and records the last spec.
    struct CountingFactory {
        agent: Arc<ScriptedAgent>,
        calls: AtomicUsize,
        last_spec: Mutex<Option<AgentSpec>>,
    }

    impl CountingFactory {
        fn new(agent: Arc<ScriptedAgent>) -> Arc<Self> {
            Arc::new(Self {
                agent,
                calls: AtomicUsize::new(0),
                last_spec: Mutex::new(None),
            })
        }
    }

    #[async_trait]
    impl AgentFactory for CountingFactory {
        async fn create(&self, spec: AgentSpec) -> murmur_core::Result<Arc<dyn Agent>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_spec.lock().unwrap() = Some(spec);
            Ok(self.agent.clone())
        }
    }

    /// Factory double whose first construction attempt fails.
    struct FlakyFactory {
        agent: Arc<ScriptedAgent>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl AgentFactory for FlakyFactory {
        async fn create(&self, _spec: AgentSpec) -> murmur_core::Result<Arc<dyn Agent>> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                return Err(CoreError::construction(AGENT_PROFILE, "no backend available"));
            }
            Ok(self.agent.clone())
        }
    }

    fn assistant(text: &str) -> murmur_core::Result<AgentEvent> {
        Ok(AgentEvent::Assistant {
            content: Some(text.to_string()),
        })
    }

    fn bridge_with(script: Vec<Script>) -> (AgentBridge, Arc<CountingFactory>) {
        let factory = CountingFactory::new(ScriptedAgent::new(script));
        let bridge = AgentBridge::new(MurmurConfig::default(), factory.clone());
        (bridge, factory)
    }

    #[tokio::test]
    async fn relays_assistant_content() {
        let (bridge, _) = bridge_with(vec![vec![assistant("hi there")]]);

        let response = bridge.handle_message("hello").await.unwrap();

        assert_eq!(response, "hi there");
        assert_eq!(chunk_message(&response, MESSAGE_CHUNK_LIMIT), ["hi there"]);
    }

    #[tokio::test]
    async fn concatenates_in_stream_order() {
        let (bridge, _) = bridge_with(vec![vec![
            assistant("plan. "),
            Ok(AgentEvent::Reasoning {
                content: Some("thinking. ".to_string()),
            }),
            Ok(AgentEvent::ToolResult {
                content: Some("ran tool. ".to_string()),
                error: Some("exit 1".to_string()),
            }),
            assistant("done."),
        ]]);

        let response = bridge.handle_message("go").await.unwrap();

        assert_eq!(
            response,
            "plan. thinking. ran tool. ⚠️ Tool error: exit 1done."
        );
    }

    #[tokio::test]
    async fn skips_contentless_events() {
        let (bridge, _) = bridge_with(vec![vec![
            Ok(AgentEvent::Assistant { content: None }),
            Ok(AgentEvent::UserMessage {
                content: Some(String::new()),
            }),
            Ok(AgentEvent::ToolResult {
                content: None,
                error: None,
            }),
        ]]);

        let response = bridge.handle_message("go").await.unwrap();

        assert_eq!(response, NO_OUTPUT_PLACEHOLDER);
    }

    #[tokio::test]
    async fn placeholder_when_stream_is_empty() {
        let (bridge, _) = bridge_with(vec![vec![]]);

        let response = bridge.handle_message("go").await.unwrap();

        assert_eq!(response, NO_OUTPUT_PLACEHOLDER);
    }

    #[tokio::test]
    async fn truncates_to_response_limit() {
        let (bridge, _) = bridge_with(vec![vec![
            assistant(&"a".repeat(1000)),
            assistant(&"b".repeat(1000)),
        ]]);

        let response = bridge.handle_message("go").await.unwrap();

        assert_eq!(response.len(), RESPONSE_CHAR_LIMIT);
        assert_eq!(response, format!("{}{}", "a".repeat(1000), "b".repeat(800)));
    }

    #[tokio::test]
    async fn interaction_error_becomes_message() {
        let (bridge, _) = bridge_with(vec![vec![
            assistant("partial"),
            Err(CoreError::interaction("boom")),
        ]]);

        let response = bridge.handle_message("go").await.unwrap();

        assert!(response.starts_with("❌ Sorry, I encountered an error:"));
        assert!(response.contains("boom"));
    }

    #[tokio::test]
    async fn constructs_agent_once_across_messages() {
        let (bridge, factory) = bridge_with(vec![
            vec![assistant("first")],
            vec![assistant("second")],
        ]);

        assert_eq!(bridge.handle_message("one").await.unwrap(), "first");
        assert_eq!(bridge.handle_message("two").await.unwrap(), "second");
        assert_eq!(factory.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn construction_spec_uses_relay_profile() {
        let config = MurmurConfig {
            discord: DiscordConfig {
                token: "abc123".to_string(),
                channel_id: 42,
            },
            ..MurmurConfig::default()
        };

        let factory = CountingFactory::new(ScriptedAgent::new(vec![vec![assistant("ok")]]));
        let bridge = AgentBridge::new(config, factory.clone());

        bridge.handle_message("hello").await.unwrap();

        let spec = factory.last_spec.lock().unwrap().take().unwrap();
        assert_eq!(spec.profile, "auto-approve");
        assert!(!spec.streaming);
        assert_eq!(spec.config.discord.token, "abc123");
    }

    #[tokio::test]
    async fn failed_construction_is_reported_and_retried() {
        let factory = Arc::new(FlakyFactory {
            agent: ScriptedAgent::new(vec![vec![assistant("recovered")]]),
            calls: AtomicUsize::new(0),
        });
        let bridge = AgentBridge::new(MurmurConfig::default(), factory.clone());

        let first = bridge.handle_message("one").await.unwrap();
        assert!(first.starts_with("❌ Sorry, I encountered an error:"));
        assert!(first.contains("no backend available"));

        assert_eq!(bridge.handle_message("two").await.unwrap(), "recovered");
        assert_eq!(factory.calls.load(Ordering::SeqCst), 2);
    }
}
