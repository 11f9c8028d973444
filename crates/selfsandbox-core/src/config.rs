//! Sandbox context configuration

use serde::{Deserialize, Serialize};

use crate::{Result, SandboxError};

/// Default maximum number of rules per rule sequence.
pub const DEFAULT_MAX_RULES: usize = 200;

/// Tunables for a sandbox context
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SandboxConfig {
    /// Capacity of each rule sequence (filesystem and network separately)
    pub max_rules: usize,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            max_rules: DEFAULT_MAX_RULES,
        }
    }
}

impl SandboxConfig {
    /// Set the rule capacity
    pub fn max_rules(mut self, max: usize) -> Self {
        self.max_rules = max;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_rules == 0 {
            return Err(SandboxError::InvalidConfig(
                "max_rules must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
