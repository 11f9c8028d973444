//! Raw Landlock syscall wrappers
//!
//! Thin, unchecked bindings to `landlock_create_ruleset`, `landlock_add_rule`
//! and `landlock_restrict_self`, plus `PR_SET_NO_NEW_PRIVS`. Everything above
//! this module works with owned descriptors and native bitmasks.
//!
//! | ABI | Kernel | Adds |
//! |-----|--------|------|
//! | 1 | 5.13 | Basic filesystem access |
//! | 2 | 5.19 | `REFER` (cross-directory rename/link) |
//! | 3 | 6.2  | `TRUNCATE` |
//! | 4 | 6.7  | TCP bind/connect port rules |
//! | 5 | 6.10 | `IOCTL_DEV` |

use std::io;
use std::os::fd::{AsRawFd, BorrowedFd, FromRawFd, OwnedFd, RawFd};

const LANDLOCK_RULE_PATH_BENEATH: u32 = 1;
const LANDLOCK_RULE_NET_PORT: u32 = 2;

// ABI v1
pub const ACCESS_FS_EXECUTE: u64 = 1 << 0;
pub const ACCESS_FS_WRITE_FILE: u64 = 1 << 1;
pub const ACCESS_FS_READ_FILE: u64 = 1 << 2;
pub const ACCESS_FS_READ_DIR: u64 = 1 << 3;
pub const ACCESS_FS_REMOVE_DIR: u64 = 1 << 4;
pub const ACCESS_FS_REMOVE_FILE: u64 = 1 << 5;
pub const ACCESS_FS_MAKE_CHAR: u64 = 1 << 6;
pub const ACCESS_FS_MAKE_DIR: u64 = 1 << 7;
pub const ACCESS_FS_MAKE_REG: u64 = 1 << 8;
pub const ACCESS_FS_MAKE_SOCK: u64 = 1 << 9;
pub const ACCESS_FS_MAKE_FIFO: u64 = 1 << 10;
pub const ACCESS_FS_MAKE_BLOCK: u64 = 1 << 11;
pub const ACCESS_FS_MAKE_SYM: u64 = 1 << 12;

// ABI v2
pub const ACCESS_FS_REFER: u64 = 1 << 13;

// ABI v3
pub const ACCESS_FS_TRUNCATE: u64 = 1 << 14;

// ABI v4
pub const ACCESS_NET_BIND_TCP: u64 = 1 << 0;
pub const ACCESS_NET_CONNECT_TCP: u64 = 1 << 1;

// ABI v5
pub const ACCESS_FS_IOCTL_DEV: u64 = 1 << 15;

/// Every filesystem right this crate knows about.
pub const ACCESS_FS_ALL: u64 = ACCESS_FS_EXECUTE
    | ACCESS_FS_WRITE_FILE
    | ACCESS_FS_READ_FILE
    | ACCESS_FS_READ_DIR
    | ACCESS_FS_REMOVE_DIR
    | ACCESS_FS_REMOVE_FILE
    | ACCESS_FS_MAKE_CHAR
    | ACCESS_FS_MAKE_DIR
    | ACCESS_FS_MAKE_REG
    | ACCESS_FS_MAKE_SOCK
    | ACCESS_FS_MAKE_FIFO
    | ACCESS_FS_MAKE_BLOCK
    | ACCESS_FS_MAKE_SYM
    | ACCESS_FS_REFER
    | ACCESS_FS_TRUNCATE
    | ACCESS_FS_IOCTL_DEV;

/// Rights the kernel accepts on a path-beneath rule whose handle is not a
/// directory.
pub const ACCESS_FS_FILE: u64 = ACCESS_FS_EXECUTE
    | ACCESS_FS_WRITE_FILE
    | ACCESS_FS_READ_FILE
    | ACCESS_FS_TRUNCATE
    | ACCESS_FS_IOCTL_DEV;

pub const ACCESS_NET_ALL: u64 = ACCESS_NET_BIND_TCP | ACCESS_NET_CONNECT_TCP;

#[repr(C)]
#[derive(Debug, Default)]
pub struct RulesetAttr {
    pub handled_access_fs: u64,
    pub handled_access_net: u64,
}

#[repr(C, packed)]
pub struct PathBeneathAttr {
    pub allowed_access: u64,
    pub parent_fd: RawFd,
}

#[repr(C)]
#[derive(Debug)]
pub struct NetPortAttr {
    pub allowed_access: u64,
    pub port: u64,
}

/// Queries the highest Landlock ABI version supported by the kernel.
pub fn abi_version() -> io::Result<u32> {
    selfsandbox_core::landlock_abi()
}

/// Creates a ruleset handling the given access rights.
pub fn create_ruleset(attr: &RulesetAttr) -> io::Result<OwnedFd> {
    // SAFETY: attr points to a live RulesetAttr of the given size.
    let ret = unsafe {
        libc::syscall(
            libc::SYS_landlock_create_ruleset,
            attr as *const RulesetAttr,
            std::mem::size_of::<RulesetAttr>(),
            0u32,
        )
    };
    if ret < 0 {
        return Err(io::Error::last_os_error());
    }
    // SAFETY: on success the kernel returns a fresh descriptor we now own.
    Ok(unsafe { OwnedFd::from_raw_fd(ret as RawFd) })
}

/// Adds a path-beneath rule to `ruleset`.
pub fn add_path_beneath_rule(
    ruleset: &OwnedFd,
    parent: BorrowedFd<'_>,
    allowed_access: u64,
) -> io::Result<()> {
    let attr = PathBeneathAttr {
        allowed_access,
        parent_fd: parent.as_raw_fd(),
    };
    add_rule(ruleset, LANDLOCK_RULE_PATH_BENEATH, &attr as *const _ as *const libc::c_void)
}

/// Adds a TCP port rule to `ruleset`.
pub fn add_net_port_rule(ruleset: &OwnedFd, port: u16, allowed_access: u64) -> io::Result<()> {
    let attr = NetPortAttr {
        allowed_access,
        port: u64::from(port),
    };
    add_rule(ruleset, LANDLOCK_RULE_NET_PORT, &attr as *const _ as *const libc::c_void)
}

fn add_rule(ruleset: &OwnedFd, rule_type: u32, attr: *const libc::c_void) -> io::Result<()> {
    // SAFETY: ruleset is a live descriptor and attr points to the struct
    // matching rule_type, valid for the duration of the call.
    let ret = unsafe {
        libc::syscall(
            libc::SYS_landlock_add_rule,
            ruleset.as_raw_fd(),
            rule_type,
            attr,
            0u32,
        )
    };
    if ret < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

/// Restricts the calling thread, and every thread it later creates, to
/// `ruleset`. Irreversible.
pub fn restrict_self(ruleset: &OwnedFd) -> io::Result<()> {
    // SAFETY: ruleset is a live descriptor.
    let ret = unsafe { libc::syscall(libc::SYS_landlock_restrict_self, ruleset.as_raw_fd(), 0u32) };
    if ret < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

/// Sets `PR_SET_NO_NEW_PRIVS` on the calling thread.
pub fn set_no_new_privs() -> io::Result<()> {
    // SAFETY: plain prctl with integer arguments.
    let ret = unsafe { libc::prctl(libc::PR_SET_NO_NEW_PRIVS, 1, 0, 0, 0) };
    if ret != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}
