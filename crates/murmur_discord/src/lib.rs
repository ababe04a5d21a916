//! Murmur Discord - Channel-to-Agent Relay
//!
//! This crate connects a single Discord channel to the conversational agent
//! behind the [`murmur_core`] seam: a listener that filters inbound messages,
//! a bridge that drives the agent and reassembles its event stream, and the
//! chunking needed to fit Discord's message-size limit.

pub mod bot;
pub mod bridge;
pub mod error;

pub use bot::{
    ChannelListener, DiscordBot, MESSAGE_CHUNK_LIMIT, MessageHandler, ShutdownHandle,
    chunk_message,
};
pub use bridge::AgentBridge;
pub use error::{DiscordError, Result};

// Re-export serenity for convenience
pub use serenity;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::{
        AgentBridge, ChannelListener, DiscordBot, DiscordError, MessageHandler, Result,
        ShutdownHandle, chunk_message,
    };
}
