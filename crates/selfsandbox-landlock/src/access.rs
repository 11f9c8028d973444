//! Translation between the stable access vocabulary and native Landlock bits

use selfsandbox_core::{AccessFlags, NetAccess};

use crate::sys;

const FS_TABLE: [(AccessFlags, u64); 8] = [
    (AccessFlags::EXEC, sys::ACCESS_FS_EXECUTE),
    (AccessFlags::WRITE_FILE, sys::ACCESS_FS_WRITE_FILE),
    (AccessFlags::READ_FILE, sys::ACCESS_FS_READ_FILE),
    (AccessFlags::TRUNCATE, sys::ACCESS_FS_TRUNCATE),
    (AccessFlags::READ_DIR, sys::ACCESS_FS_READ_DIR),
    (AccessFlags::REMOVE_DIR, sys::ACCESS_FS_REMOVE_DIR),
    (AccessFlags::REMOVE_FILE, sys::ACCESS_FS_REMOVE_FILE),
    (AccessFlags::NEW_FILE, sys::ACCESS_FS_MAKE_REG),
];

const NET_TABLE: [(NetAccess, u64); 2] = [
    (NetAccess::BIND_TCP, sys::ACCESS_NET_BIND_TCP),
    (NetAccess::CONNECT_TCP, sys::ACCESS_NET_CONNECT_TCP),
];

pub fn fs_to_native(flags: AccessFlags) -> u64 {
    FS_TABLE
        .iter()
        .filter(|(stable, _)| flags.contains(*stable))
        .fold(0, |native, (_, bit)| native | bit)
}

pub fn fs_from_native(native: u64) -> AccessFlags {
    FS_TABLE
        .iter()
        .filter(|(_, bit)| native & bit != 0)
        .fold(AccessFlags::empty(), |flags, (stable, _)| flags | *stable)
}

pub fn net_to_native(flags: NetAccess) -> u64 {
    NET_TABLE
        .iter()
        .filter(|(stable, _)| flags.contains(*stable))
        .fold(0, |native, (_, bit)| native | bit)
}

pub fn net_from_native(native: u64) -> NetAccess {
    NET_TABLE
        .iter()
        .filter(|(_, bit)| native & bit != 0)
        .fold(NetAccess::empty(), |flags, (stable, _)| flags | *stable)
}
