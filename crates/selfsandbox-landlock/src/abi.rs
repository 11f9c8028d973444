//! Landlock ABI negotiation
//!
//! The kernel reports the highest ABI it implements. We clamp that to the
//! highest ABI we have translation tables for and derive, once, the ceiling
//! of native rights enforceable at that level.

use log::{debug, warn};
use selfsandbox_core::{Features, Result, SandboxError};

use crate::sys;

/// Highest Landlock ABI this crate understands.
pub const MAX_KNOWN_ABI: u32 = 5;

/// Rights lost when the ABI drops below `below`, in descending order.
struct Degradation {
    below: u32,
    fs: u64,
    net: u64,
}

const DEGRADATIONS: [Degradation; 4] = [
    Degradation {
        below: 2,
        fs: sys::ACCESS_FS_REFER,
        net: 0,
    },
    Degradation {
        below: 3,
        fs: sys::ACCESS_FS_TRUNCATE,
        net: 0,
    },
    Degradation {
        below: 4,
        fs: 0,
        net: sys::ACCESS_NET_ALL,
    },
    Degradation {
        below: 5,
        fs: sys::ACCESS_FS_IOCTL_DEV,
        net: 0,
    },
];

/// A negotiated Landlock ABI level, already clamped to [`MAX_KNOWN_ABI`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Abi(u32);

impl Abi {
    /// Wrap a kernel-reported version, clamping unknown future versions.
    pub fn new(reported: u32) -> Self {
        if reported > MAX_KNOWN_ABI {
            debug!(
                "kernel reports landlock ABI {}, using {}",
                reported, MAX_KNOWN_ABI
            );
        }
        Abi(reported.min(MAX_KNOWN_ABI))
    }

    /// Probe the running kernel.
    pub fn probe() -> Result<Self> {
        match sys::abi_version() {
            Ok(v) => {
                let abi = Abi::new(v);
                debug!("negotiated landlock ABI {}", abi.version());
                Ok(abi)
            }
            Err(e) => {
                let reason = match e.raw_os_error() {
                    Some(libc::ENOSYS) => "landlock not supported by kernel".to_string(),
                    Some(libc::EOPNOTSUPP) => "landlock is disabled in kernel".to_string(),
                    _ => format!("landlock ABI probe failed: {}", e),
                };
                warn!("{}", reason);
                Err(SandboxError::UnsupportedPlatform(reason))
            }
        }
    }

    pub fn version(self) -> u32 {
        self.0
    }

    /// Ceiling of native filesystem rights enforceable at this ABI.
    pub fn fs_ceiling(self) -> u64 {
        if self.0 == 0 {
            return 0;
        }
        DEGRADATIONS
            .iter()
            .filter(|d| self.0 < d.below)
            .fold(sys::ACCESS_FS_ALL, |mask, d| mask & !d.fs)
    }

    /// Ceiling of native network rights enforceable at this ABI.
    pub fn net_ceiling(self) -> u64 {
        if self.0 == 0 {
            return 0;
        }
        DEGRADATIONS
            .iter()
            .filter(|d| self.0 < d.below)
            .fold(sys::ACCESS_NET_ALL, |mask, d| mask & !d.net)
    }

    pub fn has_truncate(self) -> bool {
        self.fs_ceiling() & sys::ACCESS_FS_TRUNCATE != 0
    }

    /// Capability bits for this ABI. ABI 0 enforces nothing.
    pub fn features(self) -> Features {
        let mut features = Features::empty();
        if self.fs_ceiling() != 0 {
            features |= Features::FS;
        }
        if self.net_ceiling() != 0 {
            features |= Features::NET;
        }
        if self.has_truncate() {
            features |= Features::TRUNCATE;
        }
        features
    }
}
