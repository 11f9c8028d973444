//! selfsandbox-landlock: unprivileged self-sandboxing via the Landlock LSM (Linux 5.13+)
//!
//! A process uses this crate to restrict its *own* future filesystem and
//! network access before running untrusted code, without root.
//!
//! # Example
//!
//! ```ignore
//! use selfsandbox_landlock::{AccessFlags, Features, NetAccess, SandboxContext};
//!
//! let mut ctx = SandboxContext::new()?;
//! ctx.add_fs_restriction("/usr", AccessFlags::EXEC | AccessFlags::read_only())?;
//! ctx.add_fs_restriction("/tmp/work", AccessFlags::read_write())?;
//! if ctx.features().contains(Features::NET) {
//!     ctx.add_net_restriction(443, NetAccess::CONNECT_TCP)?;
//! }
//! ctx.apply()?; // irreversible
//! ctx.destroy();
//! ```

pub mod abi;
pub mod access;
pub mod context;
pub mod policy;
pub mod rules;
pub mod ruleset;
pub mod sys;

pub use abi::{Abi, MAX_KNOWN_ABI};
pub use context::SandboxContext;
pub use policy::{FsRuleSpec, NetRuleSpec, SandboxPolicy};
pub use selfsandbox_core::{
    AccessFlags, ErrorKind, Features, NetAccess, Result, SandboxConfig, SandboxError,
    DEFAULT_MAX_RULES,
};
