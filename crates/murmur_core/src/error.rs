use miette::Diagnostic;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CoreError>;

#[derive(Error, Diagnostic, Debug)]
pub enum CoreError {
    #[error("failed to construct agent '{profile}': {cause}")]
    #[diagnostic(
        code(murmur_core::agent_construction_failed),
        help("Check the agent profile name and the [agent] section of your configuration")
    )]
    AgentConstructionFailed {
        profile: String,
        cause: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("agent interaction failed: {0}")]
    #[diagnostic(
        code(murmur_core::agent_interaction_failed),
        help("The agent gave up mid-response; the input is not retried")
    )]
    AgentInteraction(Box<dyn std::error::Error + Send + Sync>),

    #[error("Configuration file not found at {path}")]
    #[diagnostic(
        code(murmur_core::config_not_found),
        help("Create the file or point MURMUR_CONFIG at an existing one")
    )]
    ConfigNotFound { path: String },

    #[error("Failed to parse configuration")]
    #[diagnostic(
        code(murmur_core::config_parse_failed),
        help("Check the TOML syntax of your configuration file")
    )]
    ConfigParseFailed {
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid configuration: {field}")]
    #[diagnostic(code(murmur_core::config_invalid), help("{reason}"))]
    ConfigInvalid { field: String, reason: String },
}

impl CoreError {
    /// Wrap a failure raised while building an agent for `profile`.
    pub fn construction(
        profile: impl Into<String>,
        cause: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::AgentConstructionFailed {
            profile: profile.into(),
            cause: cause.into(),
        }
    }

    /// Wrap a failure raised while an agent interaction was being consumed.
    pub fn interaction(cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::AgentInteraction(cause.into())
    }
}
