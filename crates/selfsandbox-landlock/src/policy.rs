//! Declarative allow-list policies
//!
//! A policy is a JSON document listing the rules to add to a context:
//!
//! ```json
//! {
//!   "config": { "max_rules": 64 },
//!   "fs": [
//!     { "path": "/usr", "access": "EXEC | READ_FILE | READ_DIR" },
//!     { "path": "/tmp/work", "access": "READ_FILE | WRITE_FILE | NEW_FILE" }
//!   ],
//!   "net": [{ "port": 443, "access": "CONNECT_TCP" }],
//!   "skip_unsupported_net": true
//! }
//! ```

use std::path::{Path, PathBuf};

use log::debug;
use serde::{Deserialize, Serialize};
use selfsandbox_core::{AccessFlags, Features, NetAccess, Result, SandboxConfig};

use crate::context::SandboxContext;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FsRuleSpec {
    pub path: PathBuf,
    pub access: AccessFlags,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NetRuleSpec {
    pub port: u16,
    pub access: NetAccess,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SandboxPolicy {
    pub config: SandboxConfig,
    pub fs: Vec<FsRuleSpec>,
    pub net: Vec<NetRuleSpec>,
    /// Skip network rules instead of failing when the kernel lacks them.
    pub skip_unsupported_net: bool,
}

impl SandboxPolicy {
    pub fn from_json(json: &str) -> Result<Self> {
        let policy: SandboxPolicy = serde_json::from_str(json)?;
        policy.config.validate()?;
        Ok(policy)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Probe the kernel and create a context configured by this policy,
    /// with every rule loaded.
    pub fn create_context(&self) -> Result<SandboxContext> {
        let mut ctx = SandboxContext::with_config(self.config.clone())?;
        self.load_into(&mut ctx)?;
        Ok(ctx)
    }

    /// Add every rule to `ctx` in order, stopping at the first failure.
    pub fn load_into(&self, ctx: &mut SandboxContext) -> Result<()> {
        for rule in &self.fs {
            ctx.add_fs_restriction(&rule.path, rule.access)?;
        }

        if !self.net.is_empty()
            && self.skip_unsupported_net
            && !ctx.features().contains(Features::NET)
        {
            debug!(
                "skipping {} network rules, not supported by landlock ABI {}",
                self.net.len(),
                ctx.abi().version()
            );
            return Ok(());
        }
        for rule in &self.net {
            ctx.add_net_restriction(rule.port, rule.access)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use selfsandbox_core::SandboxError;

    fn policy_for(dir: &Path) -> String {
        format!(
            r#"{{
                "config": {{ "max_rules": 8 }},
                "fs": [
                    {{ "path": {path:?}, "access": "READ_FILE | READ_DIR" }},
                    {{ "path": {path:?}, "access": "NEW_FILE" }}
                ],
                "net": [{{ "port": 443, "access": "CONNECT_TCP" }}]
            }}"#,
            path = dir.display().to_string()
        )
    }

    #[test]
    fn parses_rules() {
        let dir = tempfile::tempdir().unwrap();
        let policy = SandboxPolicy::from_json(&policy_for(dir.path())).unwrap();
        assert_eq!(policy.config.max_rules, 8);
        assert_eq!(policy.fs.len(), 2);
        assert_eq!(policy.fs[0].access, AccessFlags::read_only());
        assert_eq!(policy.net[0].port, 443);
        assert!(!policy.skip_unsupported_net);
    }

    #[test]
    fn empty_document_is_default() {
        assert_eq!(SandboxPolicy::from_json("{}").unwrap(), SandboxPolicy::default());
    }

    #[test]
    fn rejects_bad_documents() {
        let err = SandboxPolicy::from_json(r#"{"fs": [{"path": "/", "access": "READ"}]}"#)
            .unwrap_err();
        assert!(matches!(err, SandboxError::Policy(_)));

        let err = SandboxPolicy::from_json(r#"{"config": {"max_rules": 0}}"#).unwrap_err();
        assert!(matches!(err, SandboxError::InvalidConfig(_)));

        let err = SandboxPolicy::from_file("/nonexistent/policy.json").unwrap_err();
        assert!(matches!(err, SandboxError::Io(_)));
    }

    #[test]
    fn loads_into_context_with_network() {
        let dir = tempfile::tempdir().unwrap();
        let policy = SandboxPolicy::from_json(&policy_for(dir.path())).unwrap();
        let mut ctx = SandboxContext::from_abi(4, policy.config.clone()).unwrap();
        policy.load_into(&mut ctx).unwrap();
        assert_eq!(ctx.fs_rule_count(), 2);
        assert_eq!(ctx.net_rule_count(), 1);
    }

    #[test]
    fn network_rules_fail_without_support() {
        let dir = tempfile::tempdir().unwrap();
        let policy = SandboxPolicy::from_json(&policy_for(dir.path())).unwrap();
        let mut ctx = SandboxContext::from_abi(3, policy.config.clone()).unwrap();
        let err = policy.load_into(&mut ctx).unwrap_err();
        assert!(matches!(err, SandboxError::CapabilityUnavailable(_)));
    }

    #[test]
    fn network_rules_can_be_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let mut policy = SandboxPolicy::from_json(&policy_for(dir.path())).unwrap();
        policy.skip_unsupported_net = true;
        let mut ctx = SandboxContext::from_abi(3, policy.config.clone()).unwrap();
        policy.load_into(&mut ctx).unwrap();
        assert_eq!(ctx.fs_rule_count(), 2);
        assert_eq!(ctx.net_rule_count(), 0);
    }

    #[test]
    fn reads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("policy.json");
        std::fs::write(&file, policy_for(dir.path())).unwrap();
        let policy = SandboxPolicy::from_file(&file).unwrap();
        assert_eq!(policy.fs[1].access, AccessFlags::NEW_FILE);
    }
}
