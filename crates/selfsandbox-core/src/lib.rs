//! selfsandbox-core: shared types, errors, and configuration for selfsandbox
//!
//! This crate provides the foundational types used by the selfsandbox crates:
//! - Error types, their classification, and the Result alias
//! - The stable access vocabulary (filesystem, network, feature bits)
//! - Context configuration

pub mod capabilities;
pub mod config;
pub mod error;

pub use capabilities::{landlock_abi, AccessFlags, Features, NetAccess};
pub use config::{SandboxConfig, DEFAULT_MAX_RULES};
pub use error::{ErrorKind, Result, SandboxError};
