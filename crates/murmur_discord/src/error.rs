use miette::Diagnostic;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DiscordError>;

#[derive(Error, Diagnostic, Debug)]
pub enum DiscordError {
    #[error("Discord authentication failed")]
    #[diagnostic(
        code(murmur_discord::auth_failed),
        help("Check that your Discord bot token is valid and has not been regenerated")
    )]
    AuthenticationFailed {
        #[source]
        cause: serenity::Error,
        token_preview: String,
    },

    #[error("Discord gateway connection failed")]
    #[diagnostic(
        code(murmur_discord::connection_failed),
        help("Check network connectivity and the intents enabled in the Discord Developer Portal")
    )]
    ConnectionFailed {
        #[source]
        cause: serenity::Error,
    },

    #[error("Message send failed")]
    #[diagnostic(
        code(murmur_discord::message_send_failed),
        help("Failed to send message to channel {channel_id}")
    )]
    MessageSendFailed {
        channel_id: u64,
        message_length: usize,
        #[source]
        cause: serenity::Error,
    },

    #[error("No monitored channel configured")]
    #[diagnostic(
        code(murmur_discord::channel_not_configured),
        help("Set discord.channel_id to the channel the relay should watch")
    )]
    ChannelNotConfigured,
}
