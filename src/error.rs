//! Error types with fix suggestions
//!
//! Error code ranges:
//! - DV-001-009: Input files (changeset, events, instance state)
//! - DV-010-019: Event stream errors
//! - DV-020-029: Engine errors
//! - DV-030-039: Configuration errors
//! - DV-040-049: Terminal errors

use thiserror::Error;

pub type Result<T> = std::result::Result<T, DeployViewError>;

/// Trait for errors that provide fix suggestions
pub trait FixSuggestion {
    fn fix_suggestion(&self) -> Option<&str>;
}

#[derive(Error, Debug)]
pub enum DeployViewError {
    // ═══════════════════════════════════════════
    // INPUT FILES (001-009)
    // ═══════════════════════════════════════════
    #[error("[DV-001] Input file not found: {path}")]
    FileNotFound { path: String },

    #[error("[DV-002] Failed to parse changeset '{path}': {details}")]
    ChangesetParse { path: String, details: String },

    #[error("[DV-003] Failed to parse instance state '{path}': {details}")]
    InstanceStateParse { path: String, details: String },

    // ═══════════════════════════════════════════
    // EVENT STREAM (010-019)
    // ═══════════════════════════════════════════
    #[error("[DV-010] Malformed deploy event on line {line}: {details}")]
    EventParse { line: usize, details: String },

    #[error("[DV-011] Event stream closed before the deployment finished")]
    StreamClosed,

    // ═══════════════════════════════════════════
    // ENGINE (020-029)
    // ═══════════════════════════════════════════
    #[error("[DV-020] Deploy engine error: {reason}")]
    Engine { reason: String },

    #[error("[DV-021] Blueprint instance '{instance_id}' not available")]
    InstanceNotFound { instance_id: String },

    // ═══════════════════════════════════════════
    // CONFIG (030-039)
    // ═══════════════════════════════════════════
    #[error("[DV-030] Configuration error: {reason}")]
    Config { reason: String },

    // ═══════════════════════════════════════════
    // TERMINAL (040-049)
    // ═══════════════════════════════════════════
    #[error("[DV-040] Terminal error: {0}")]
    Terminal(String),

    #[error("[DV-041] IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DeployViewError {
    /// Error code prefix (e.g. `DV-010`)
    pub fn code(&self) -> &'static str {
        match self {
            Self::FileNotFound { .. } => "DV-001",
            Self::ChangesetParse { .. } => "DV-002",
            Self::InstanceStateParse { .. } => "DV-003",
            Self::EventParse { .. } => "DV-010",
            Self::StreamClosed => "DV-011",
            Self::Engine { .. } => "DV-020",
            Self::InstanceNotFound { .. } => "DV-021",
            Self::Config { .. } => "DV-030",
            Self::Terminal(_) => "DV-040",
            Self::Io(_) => "DV-041",
        }
    }
}

impl FixSuggestion for DeployViewError {
    fn fix_suggestion(&self) -> Option<&str> {
        match self {
            Self::FileNotFound { .. } => Some("Check the file path exists"),
            Self::ChangesetParse { .. } => {
                Some("Export the changeset as JSON (or YAML with a .yaml extension)")
            }
            Self::InstanceStateParse { .. } => {
                Some("Pass the JSON returned by the engine's get-instance call")
            }
            Self::EventParse { .. } => {
                Some("Each line must be one JSON event object with a \"type\" field")
            }
            Self::StreamClosed => Some("Re-attach to the deployment once the engine is reachable"),
            Self::Engine { .. } => Some("Check the deploy engine is running and reachable"),
            Self::InstanceNotFound { .. } => {
                Some("Verify the instance ID or pass --instance-state")
            }
            Self::Config { .. } => Some("Fix or delete the config file (see `deploy-view config`)"),
            Self::Terminal(_) => {
                Some("Run with --headless when no interactive terminal is available")
            }
            Self::Io(_) => Some("Check file path and permissions"),
        }
    }
}
