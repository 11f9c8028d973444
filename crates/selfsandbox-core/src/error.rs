//! Error types for sandbox operations

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for sandbox operations
pub type Result<T> = std::result::Result<T, SandboxError>;

/// Errors that can occur while building or applying a sandbox
#[derive(Error, Debug)]
pub enum SandboxError {
    #[error("Unsupported platform: {0}")]
    UnsupportedPlatform(String),

    #[error("Path unavailable for rule {}: {source}", .path.display())]
    PathUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Rule capacity exceeded (limit {limit})")]
    CapacityExceeded { limit: usize },

    #[error("Capability unavailable: {0}")]
    CapabilityUnavailable(String),

    #[error("landlock_create_ruleset failed: {0}")]
    RulesetCreationFailed(#[source] io::Error),

    #[error("landlock_add_rule failed for {rule}: {source}")]
    RuleInsertionFailed {
        rule: String,
        #[source]
        source: io::Error,
    },

    #[error("landlock_restrict_self failed: {0}")]
    RestrictionCommitFailed(#[source] io::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Policy error: {0}")]
    Policy(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Coarse classification of a [`SandboxError`], used by callers to decide
/// between retrying, falling back, or aborting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The mechanism is not available at all. Not retryable.
    Platform,
    /// Bad input for a single call. Fix the input and retry that call.
    Resource,
    /// The kernel refused a ruleset, rule, or commit. Destroy the context.
    KernelRejection,
    /// Malformed configuration or policy.
    Config,
}

impl SandboxError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SandboxError::UnsupportedPlatform(_) | SandboxError::CapabilityUnavailable(_) => {
                ErrorKind::Platform
            }
            SandboxError::PathUnavailable { .. } | SandboxError::CapacityExceeded { .. } => {
                ErrorKind::Resource
            }
            SandboxError::RulesetCreationFailed(_)
            | SandboxError::RuleInsertionFailed { .. }
            | SandboxError::RestrictionCommitFailed(_) => ErrorKind::KernelRejection,
            SandboxError::InvalidConfig(_) | SandboxError::Policy(_) | SandboxError::Io(_) => {
                ErrorKind::Config
            }
        }
    }

    /// Whether the failed call can be retried on the same context after
    /// fixing its input.
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Resource
    }
}
