//! Discord side of the relay.
//!
//! [`DiscordBot`] owns the gateway session; [`ChannelListener`] filters
//! inbound messages from the monitored channel and drives the injected
//! [`MessageHandler`], chunking whatever it returns back onto the channel.

use std::sync::Arc;

use async_trait::async_trait;
use once_cell::sync::OnceCell;
use serenity::all::{
    ChannelId, Client, Context, EventHandler, GatewayIntents, Message, Ready, ShardManager, UserId,
};
use tracing::{error, info};

use murmur_core::config::DiscordConfig;

use crate::error::{DiscordError, Result};

/// Discord's per-message size limit; longer replies are chunked to fit.
pub const MESSAGE_CHUNK_LIMIT: usize = 2000;

/// Injected callback the listener drives for each accepted message.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    /// Handle one inbound message and return the text to post back.
    async fn handle_message(&self, content: &str) -> murmur_core::Result<String>;
}

/// Discord bot that relays messages from one channel to a [`MessageHandler`].
pub struct DiscordBot {
    client: Client,
    shard_manager: Arc<ShardManager>,
}

/// Clonable handle for stopping a running [`DiscordBot`] from another task.
#[derive(Clone)]
pub struct ShutdownHandle {
    shard_manager: Arc<ShardManager>,
}

impl ShutdownHandle {
    pub async fn shutdown(&self) {
        self.shard_manager.shutdown_all().await;
    }
}

impl DiscordBot {
    /// Build the Discord client around a [`ChannelListener`] for the
    /// configured channel.
    pub async fn new(config: &DiscordConfig, handler: Arc<dyn MessageHandler>) -> Result<Self> {
        if config.channel_id == 0 {
            return Err(DiscordError::ChannelNotConfigured);
        }

        let listener = ChannelListener::new(ChannelId::new(config.channel_id), handler);

        let intents = GatewayIntents::GUILD_MESSAGES
            | GatewayIntents::DIRECT_MESSAGES
            | GatewayIntents::MESSAGE_CONTENT;

        let client = Client::builder(&config.token, intents)
            .event_handler(listener)
            .await
            .map_err(|cause| DiscordError::AuthenticationFailed {
                cause,
                token_preview: token_preview(&config.token),
            })?;

        let shard_manager = client.shard_manager.clone();

        Ok(Self {
            client,
            shard_manager,
        })
    }

    /// Run the gateway session until it disconnects or the bot is stopped.
    pub async fn start(&mut self) -> Result<()> {
        info!("Starting Discord relay");
        self.client
            .start()
            .await
            .map_err(|cause| DiscordError::ConnectionFailed { cause })
    }

    /// Shut down the gateway session.
    ///
    /// Safe to call repeatedly, and after a failed start. A blocked
    /// [`start`](Self::start) returns once shutdown completes.
    pub async fn stop(&self) {
        info!("Shutting down Discord relay");
        self.shard_manager.shutdown_all().await;
    }

    /// Handle for stopping the bot while [`start`](Self::start) is running.
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            shard_manager: self.shard_manager.clone(),
        }
    }
}

/// Event handler that watches a single channel and relays its messages.
pub struct ChannelListener {
    channel_id: ChannelId,
    handler: Arc<dyn MessageHandler>,
    bot_user_id: OnceCell<UserId>,
}

impl ChannelListener {
    pub fn new(channel_id: ChannelId, handler: Arc<dyn MessageHandler>) -> Self {
        Self {
            channel_id,
            handler,
            bot_user_id: OnceCell::new(),
        }
    }

    /// Whether an inbound message should reach the handler.
    ///
    /// Rejects the bot's own messages, traffic on other channels, and
    /// messages whose trimmed content is empty.
    fn accepts(&self, author: UserId, channel: ChannelId, content: &str) -> bool {
        if self.bot_user_id.get() == Some(&author) {
            return false;
        }
        if channel != self.channel_id {
            return false;
        }
        !content.trim().is_empty()
    }
}

#[async_trait]
impl EventHandler for ChannelListener {
    async fn ready(&self, _ctx: Context, ready: Ready) {
        info!("Logged in as {} (ID: {})", ready.user.name, ready.user.id);
        info!("Monitoring channel {}", self.channel_id);

        let _ = self.bot_user_id.set(ready.user.id);
    }

    async fn message(&self, ctx: Context, msg: Message) {
        if !self.accepts(msg.author.id, msg.channel_id, &msg.content) {
            return;
        }

        info!("Received message from {}: {}", msg.author.name, msg.content);

        match self.handler.handle_message(&msg.content).await {
            Ok(response) => {
                if response.is_empty() {
                    return;
                }
                if let Err(e) = send_chunked(&ctx, msg.channel_id, &response).await {
                    error!("Failed to relay response: {e}");
                }
            }
            Err(e) => {
                error!("Error processing message: {e}");
                if let Err(send_err) = msg.channel_id.say(&ctx.http, error_notice(&e)).await {
                    error!("Failed to send error notice: {send_err}");
                }
            }
        }
    }
}

/// Send `content` to `channel_id`, split into transport-sized chunks.
async fn send_chunked(ctx: &Context, channel_id: ChannelId, content: &str) -> Result<()> {
    for chunk in chunk_message(content, MESSAGE_CHUNK_LIMIT) {
        channel_id
            .say(&ctx.http, chunk)
            .await
            .map_err(|cause| DiscordError::MessageSendFailed {
                channel_id: channel_id.get(),
                message_length: content.len(),
                cause,
            })?;
    }
    Ok(())
}

/// Split a message into chunks that fit Discord's message length limit.
///
/// Windows are consecutive and character-based, starting at offset zero; the
/// final window may be shorter. Empty input produces no chunks.
pub fn chunk_message(content: &str, max_length: usize) -> Vec<String> {
    content
        .chars()
        .collect::<Vec<_>>()
        .chunks(max_length)
        .map(|chunk| chunk.iter().collect())
        .collect()
}

/// User-visible notice for a handler failure.
fn error_notice(err: &murmur_core::CoreError) -> String {
    format!("❌ Error: {err}")
}

/// First and last few characters of the token, for log-safe diagnostics.
fn token_preview(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 8 {
        return "<short token>".to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}…{tail}")
}
