//! Sandbox context: accumulate rules, then restrict the calling process
//!
//! Data flows strictly forward:
//! `new` -> (`add_fs_restriction` | `add_net_restriction`)* -> `apply` -> `destroy`.

use std::path::Path;

use log::{debug, info, warn};
use selfsandbox_core::{AccessFlags, Features, NetAccess, Result, SandboxConfig, SandboxError};

use crate::abi::Abi;
use crate::access;
use crate::rules::{FsRule, NetRule, RuleList};
use crate::ruleset::Ruleset;
use crate::sys;

/// One self-sandboxing attempt for the calling process.
///
/// Owns an open handle per filesystem rule until the rules are consumed by
/// [`apply`](Self::apply) or the context is dropped.
#[derive(Debug)]
pub struct SandboxContext {
    abi: Abi,
    fs_ceiling: u64,
    net_ceiling: u64,
    no_new_privs_applied: bool,
    fs_rules: RuleList<FsRule>,
    /// `None` when the negotiated ABI has no network rules.
    net_rules: Option<RuleList<NetRule>>,
}

impl SandboxContext {
    /// Probe the kernel and create a context with the default configuration.
    pub fn new() -> Result<Self> {
        Self::with_config(SandboxConfig::default())
    }

    /// Probe the kernel and create a context.
    pub fn with_config(config: SandboxConfig) -> Result<Self> {
        let abi = Abi::probe()?;
        Self::from_abi(abi.version(), config)
    }

    /// Create a context for an already-known ABI version, clamped like a
    /// probed one.
    pub fn from_abi(version: u32, config: SandboxConfig) -> Result<Self> {
        config.validate()?;

        let abi = Abi::new(version);
        let fs_ceiling = abi.fs_ceiling();
        let net_ceiling = abi.net_ceiling();
        let net_rules = if net_ceiling != 0 {
            Some(RuleList::new(config.max_rules))
        } else {
            None
        };

        debug!(
            "sandbox context: ABI {}, fs ceiling {:#x}, net ceiling {:#x}, {} rules max",
            abi.version(),
            fs_ceiling,
            net_ceiling,
            config.max_rules
        );

        Ok(Self {
            abi,
            fs_ceiling,
            net_ceiling,
            no_new_privs_applied: false,
            fs_rules: RuleList::new(config.max_rules),
            net_rules,
        })
    }

    pub fn abi(&self) -> Abi {
        self.abi
    }

    /// Restriction capabilities of the negotiated ABI.
    pub fn features(&self) -> Features {
        self.abi.features()
    }

    pub fn has_truncate(&self) -> bool {
        self.abi.has_truncate()
    }

    /// The subset of `flags` the negotiated ABI can enforce. Anything else is
    /// silently left out of rules.
    pub fn enforceable(&self, flags: AccessFlags) -> AccessFlags {
        access::fs_from_native(access::fs_to_native(flags) & self.fs_ceiling)
    }

    /// Allow `flags` on `path` and everything beneath it.
    ///
    /// Overlapping and duplicate rules are kept as independent entries.
    pub fn add_fs_restriction(
        &mut self,
        path: impl AsRef<Path>,
        flags: AccessFlags,
    ) -> Result<()> {
        let path = path.as_ref();
        self.fs_rules.ensure_room()?;

        let requested = access::fs_to_native(flags);
        let allowed = requested & self.fs_ceiling;
        if allowed != requested {
            debug!(
                "ABI {} cannot enforce {:?} on {}, rule will not grant it",
                self.abi.version(),
                access::fs_from_native(requested & !allowed),
                path.display()
            );
        }

        let rule = FsRule::open(path, allowed)?;
        debug!("fs rule {} -> {:#x}", path.display(), rule.access());
        self.fs_rules.push(rule)
    }

    /// Allow `flags` on TCP `port`. Requires [`Features::NET`].
    pub fn add_net_restriction(&mut self, port: u16, flags: NetAccess) -> Result<()> {
        let ceiling = self.net_ceiling;
        let abi = self.abi.version();
        let Some(rules) = self.net_rules.as_mut() else {
            return Err(SandboxError::CapabilityUnavailable(format!(
                "network rules need landlock ABI 4, kernel provides {}",
                abi
            )));
        };

        let access = access::net_to_native(flags) & ceiling;
        rules.push(NetRule { port, access })?;
        debug!("net rule port {} -> {:#x}", port, access);
        Ok(())
    }

    /// Build a ruleset from the accumulated rules and restrict the calling
    /// process to it.
    ///
    /// Every right the negotiated ABI can enforce is handled, so anything not
    /// granted by some rule is denied once this returns `Ok`. If ruleset
    /// creation or rule insertion fails the rules stay owned by the context.
    /// Once the commit is attempted the rules are drained whatever its
    /// outcome.
    pub fn apply(&mut self) -> Result<()> {
        let handled_fs = self.fs_ceiling;
        let handled_net = self.net_ceiling;

        if handled_fs == 0 && handled_net == 0 {
            debug!("landlock ABI 0, nothing to enforce");
            self.set_no_new_privs();
            self.drain();
            return Ok(());
        }

        debug!(
            "rules grant fs {:#x} of {:#x}, net {:#x} of {:#x}",
            self.fs_rules.granted(),
            handled_fs,
            self.net_rules.as_ref().map_or(0, |r| r.granted()),
            handled_net
        );

        let ruleset = Ruleset::create(handled_fs, handled_net)?;
        ruleset.add_fs_rules(&self.fs_rules)?;
        if let Some(net_rules) = &self.net_rules {
            ruleset.add_net_rules(net_rules)?;
        }

        self.set_no_new_privs();

        let fs_count = self.fs_rules.len();
        let net_count = self.net_rule_count();
        let committed = ruleset.restrict_self();
        self.drain();
        committed?;

        info!(
            "landlock ruleset committed: {} fs rules, {} net rules (ABI {})",
            fs_count,
            net_count,
            self.abi.version()
        );
        Ok(())
    }

    /// Release the context and every handle it still owns.
    pub fn destroy(self) {
        debug!(
            "destroying sandbox context, releasing {} handles",
            self.open_handle_count()
        );
    }

    pub fn fs_rule_count(&self) -> usize {
        self.fs_rules.len()
    }

    pub fn net_rule_count(&self) -> usize {
        self.net_rules.as_ref().map_or(0, |r| r.len())
    }

    /// Number of path handles currently owned.
    pub fn open_handle_count(&self) -> usize {
        self.fs_rules.len()
    }

    pub fn no_new_privs_applied(&self) -> bool {
        self.no_new_privs_applied
    }

    pub fn max_rules(&self) -> usize {
        self.fs_rules.capacity()
    }

    fn set_no_new_privs(&mut self) {
        if self.no_new_privs_applied {
            return;
        }
        if let Err(e) = sys::set_no_new_privs() {
            warn!("PR_SET_NO_NEW_PRIVS failed: {}", e);
        }
        self.no_new_privs_applied = true;
    }

    fn drain(&mut self) {
        self.fs_rules.clear();
        if let Some(net_rules) = self.net_rules.as_mut() {
            net_rules.clear();
        }
    }
}
