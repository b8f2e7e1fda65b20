//! Layered error definitions
//!
//! Categorized by source: config / lifecycle / scene / transport
//!
//! Non-fatal conditions (sensor faults, transport degradation) are NOT errors:
//! they surface as `valid = false` in the snapshot or as degradation counters.

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum EnvError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Lifecycle Errors =====
    /// Operation called out of required lifecycle order
    #[error("sequencing error: '{operation}' not legal in state {state}")]
    Sequencing { operation: String, state: String },

    // ===== Scene Errors =====
    /// Scene id unknown to the scene provider
    #[error("scene not found: {scene_id}")]
    SceneNotFound { scene_id: String },

    /// Scene loaded but failed integrity checks
    #[error("scene '{scene_id}' invalid: {message}")]
    SceneInvalid { scene_id: String, message: String },

    // ===== Transport Errors =====
    /// Transport middleware failure (setup or per-channel)
    #[error("transport error on '{channel}': {message}")]
    Transport { channel: String, message: String },

    /// Message encode/decode error
    #[error("codec error on '{channel}': {message}")]
    Codec { channel: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl EnvError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create sequencing error
    pub fn sequencing(operation: impl Into<String>, state: impl std::fmt::Display) -> Self {
        Self::Sequencing {
            operation: operation.into(),
            state: state.to_string(),
        }
    }

    /// Create scene-invalid error
    pub fn scene_invalid(scene_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SceneInvalid {
            scene_id: scene_id.into(),
            message: message.into(),
        }
    }

    /// Create transport error
    pub fn transport(channel: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            channel: channel.into(),
            message: message.into(),
        }
    }

    /// True for errors that must abort the episode (everything except transport)
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Transport { .. } | Self::Codec { .. })
    }
}
