//! Stable, kernel-independent permission vocabulary
//!
//! These flags never change meaning across kernel versions. The landlock
//! crate translates them to the native bit layout of the negotiated ABI.

use std::io;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Filesystem access a rule may grant beneath a path.
    ///
    /// Combine with bitwise OR: `AccessFlags::READ_FILE | AccessFlags::READ_DIR`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct AccessFlags: u64 {
        /// Execute a file
        const EXEC        = 1 << 0;
        /// Open a file for writing
        const WRITE_FILE  = 1 << 1;
        /// Open a file for reading
        const READ_FILE   = 1 << 2;
        /// Truncate a file (ABI 3+)
        const TRUNCATE    = 1 << 3;
        /// List a directory
        const READ_DIR    = 1 << 4;
        /// Remove an empty directory or rename one
        const REMOVE_DIR  = 1 << 5;
        /// Unlink or rename a file
        const REMOVE_FILE = 1 << 6;
        /// Create, rename or link a regular file
        const NEW_FILE    = 1 << 7;
    }
}

impl AccessFlags {
    /// Read-only access to files and directory listings.
    pub fn read_only() -> Self {
        AccessFlags::READ_FILE | AccessFlags::READ_DIR
    }

    /// Read plus every mutating right in the vocabulary.
    pub fn read_write() -> Self {
        Self::read_only()
            | AccessFlags::WRITE_FILE
            | AccessFlags::TRUNCATE
            | AccessFlags::REMOVE_DIR
            | AccessFlags::REMOVE_FILE
            | AccessFlags::NEW_FILE
    }
}

bitflags! {
    /// Network access a port rule may grant.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct NetAccess: u64 {
        /// Bind a TCP socket to the port
        const BIND_TCP    = 1 << 0;
        /// Connect a TCP socket to the port
        const CONNECT_TCP = 1 << 1;
    }
}

bitflags! {
    /// Restriction capabilities available on the negotiated ABI.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Features: u64 {
        /// Filesystem restrictions can be enforced
        const FS       = 1 << 0;
        /// Network port restrictions can be enforced (ABI 4+)
        const NET      = 1 << 1;
        /// Truncation can be restricted (ABI 3+)
        const TRUNCATE = 1 << 2;
    }
}

/// Highest Landlock ABI the running kernel supports.
///
/// Fails with `ENOSYS` when the kernel was built without Landlock and with
/// `EOPNOTSUPP` when it is compiled in but disabled at boot.
pub fn landlock_abi() -> io::Result<u32> {
    // SAFETY: a null attr with size 0 and LANDLOCK_CREATE_RULESET_VERSION
    // only queries the ABI. The return value is a version, not a descriptor.
    let ret = unsafe {
        libc::syscall(
            libc::SYS_landlock_create_ruleset,
            std::ptr::null::<libc::c_void>(),
            0usize,
            1u32, // LANDLOCK_CREATE_RULESET_VERSION
        )
    };
    if ret < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(ret as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_bits_are_stable() {
        assert_eq!(AccessFlags::EXEC.bits(), 1);
        assert_eq!(AccessFlags::WRITE_FILE.bits(), 2);
        assert_eq!(AccessFlags::READ_FILE.bits(), 4);
        assert_eq!(AccessFlags::TRUNCATE.bits(), 8);
        assert_eq!(AccessFlags::READ_DIR.bits(), 16);
        assert_eq!(AccessFlags::REMOVE_DIR.bits(), 32);
        assert_eq!(AccessFlags::REMOVE_FILE.bits(), 64);
        assert_eq!(AccessFlags::NEW_FILE.bits(), 128);
        assert_eq!(AccessFlags::all().bits(), 0xff);
    }

    #[test]
    fn presets_nest() {
        assert!(AccessFlags::read_write().contains(AccessFlags::read_only()));
        assert!(!AccessFlags::read_write().contains(AccessFlags::EXEC));
    }

    #[test]
    fn access_flags_parse_from_text() {
        let flags: AccessFlags = serde_json::from_str("\"READ_FILE | READ_DIR\"").unwrap();
        assert_eq!(flags, AccessFlags::read_only());

        let text = serde_json::to_string(&(AccessFlags::EXEC | AccessFlags::NEW_FILE)).unwrap();
        assert_eq!(text, "\"EXEC | NEW_FILE\"");
    }

    #[test]
    fn unknown_flag_names_are_rejected() {
        assert!(serde_json::from_str::<AccessFlags>("\"READ_FILE | CHMOD\"").is_err());
        assert!(serde_json::from_str::<NetAccess>("\"BIND_UDP\"").is_err());
    }

    #[test]
    fn landlock_abi_is_at_least_one_or_unsupported() {
        match landlock_abi() {
            Ok(v) => assert!(v >= 1),
            Err(e) => {
                let errno = e.raw_os_error().unwrap_or(0);
                // EPERM comes from seccomp filters in some containers
                assert!(
                    matches!(errno, libc::ENOSYS | libc::EOPNOTSUPP | libc::EPERM),
                    "unexpected error: {e}"
                );
            }
        }
    }
}
