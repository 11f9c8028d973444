//! Kernel ruleset construction and commit

use std::os::fd::OwnedFd;

use log::debug;
use selfsandbox_core::{Result, SandboxError};

use crate::rules::{FsRule, NetRule, RuleList};
use crate::sys;

/// A kernel-side ruleset being built. Dropping it closes the descriptor.
#[derive(Debug)]
pub struct Ruleset {
    fd: OwnedFd,
}

impl Ruleset {
    /// Create a ruleset that handles exactly the given native rights.
    pub fn create(handled_fs: u64, handled_net: u64) -> Result<Self> {
        let attr = sys::RulesetAttr {
            handled_access_fs: handled_fs,
            handled_access_net: handled_net,
        };
        let fd = sys::create_ruleset(&attr).map_err(SandboxError::RulesetCreationFailed)?;
        debug!(
            "created landlock ruleset (fs {:#x}, net {:#x})",
            handled_fs, handled_net
        );
        Ok(Self { fd })
    }

    /// Insert every filesystem rule, in order. Rules granting nothing are
    /// skipped since the kernel rejects them.
    pub fn add_fs_rules(&self, rules: &RuleList<FsRule>) -> Result<()> {
        for rule in rules.iter() {
            if rule.access() == 0 {
                debug!("skipping empty rule for {}", rule.path().display());
                continue;
            }
            sys::add_path_beneath_rule(&self.fd, rule.handle(), rule.access()).map_err(
                |source| SandboxError::RuleInsertionFailed {
                    rule: rule.path().display().to_string(),
                    source,
                },
            )?;
        }
        Ok(())
    }

    pub fn add_net_rules(&self, rules: &RuleList<NetRule>) -> Result<()> {
        for rule in rules.iter() {
            if rule.access == 0 {
                debug!("skipping empty rule for port {}", rule.port);
                continue;
            }
            sys::add_net_port_rule(&self.fd, rule.port, rule.access).map_err(|source| {
                SandboxError::RuleInsertionFailed {
                    rule: format!("tcp port {}", rule.port),
                    source,
                }
            })?;
        }
        Ok(())
    }

    /// Commit the ruleset to the calling process. Irreversible.
    pub fn restrict_self(self) -> Result<()> {
        sys::restrict_self(&self.fd).map_err(SandboxError::RestrictionCommitFailed)
    }
}
