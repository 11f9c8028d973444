//! Accumulated restriction rules
//!
//! Every filesystem rule owns an `O_PATH` handle to its path until the rule
//! is dropped. Clearing or dropping a [`RuleList`] closes all of them.

use std::fs::OpenOptions;
use std::os::fd::{AsFd, BorrowedFd, OwnedFd};
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};

use log::debug;
use selfsandbox_core::{Result, SandboxError};

use crate::sys;

/// A path-beneath rule: a live handle plus the native rights it grants.
#[derive(Debug)]
pub struct FsRule {
    path: PathBuf,
    handle: OwnedFd,
    access: u64,
}

impl FsRule {
    /// Open `path` for reference-by-descriptor and bind it to `access`.
    ///
    /// Non-directories only keep file-applicable rights.
    pub fn open(path: &Path, access: u64) -> Result<Self> {
        let unavailable = |source| SandboxError::PathUnavailable {
            path: path.to_path_buf(),
            source,
        };

        let file = OpenOptions::new()
            .read(true)
            .custom_flags(libc::O_PATH)
            .open(path)
            .map_err(unavailable)?;
        let is_dir = file.metadata().map_err(unavailable)?.is_dir();

        let access = if is_dir {
            access
        } else {
            let kept = access & sys::ACCESS_FS_FILE;
            if kept != access {
                debug!(
                    "{} is not a directory, dropping rights {:#x}",
                    path.display(),
                    access & !kept
                );
            }
            kept
        };

        Ok(Self {
            path: path.to_path_buf(),
            handle: OwnedFd::from(file),
            access,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn access(&self) -> u64 {
        self.access
    }

    pub fn handle(&self) -> BorrowedFd<'_> {
        self.handle.as_fd()
    }
}

/// A TCP port rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetRule {
    pub port: u16,
    pub access: u64,
}

/// Native rights a rule grants, used to compute the handled mask.
pub trait Grant {
    fn granted(&self) -> u64;
}

impl Grant for FsRule {
    fn granted(&self) -> u64 {
        self.access
    }
}

impl Grant for NetRule {
    fn granted(&self) -> u64 {
        self.access
    }
}

/// Append-only, capacity-bounded rule sequence.
#[derive(Debug)]
pub struct RuleList<T> {
    rules: Vec<T>,
    capacity: usize,
}

impl<T: Grant> RuleList<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            rules: Vec::new(),
            capacity,
        }
    }

    /// Fail with `CapacityExceeded` if another rule would not fit.
    pub fn ensure_room(&self) -> Result<()> {
        if self.rules.len() >= self.capacity {
            return Err(SandboxError::CapacityExceeded {
                limit: self.capacity,
            });
        }
        Ok(())
    }

    pub fn push(&mut self, rule: T) -> Result<()> {
        self.ensure_room()?;
        self.rules.push(rule);
        Ok(())
    }

    /// Union of the rights granted by every rule.
    pub fn granted(&self) -> u64 {
        self.rules.iter().fold(0, |mask, r| mask | r.granted())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drop every rule, releasing any handles they own.
    pub fn clear(&mut self) {
        self.rules.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn net(port: u16, access: u64) -> NetRule {
        NetRule { port, access }
    }

    #[test]
    fn push_until_full() {
        let mut list = RuleList::new(2);
        list.push(net(80, sys::ACCESS_NET_BIND_TCP)).unwrap();
        list.push(net(443, sys::ACCESS_NET_CONNECT_TCP)).unwrap();

        let err = list.push(net(8080, sys::ACCESS_NET_BIND_TCP)).unwrap_err();
        assert!(matches!(err, SandboxError::CapacityExceeded { limit: 2 }));
        assert_eq!(list.len(), 2);
        assert_eq!(list.granted(), sys::ACCESS_NET_ALL);
    }

    #[test]
    fn clear_empties() {
        let mut list = RuleList::new(4);
        list.push(net(22, sys::ACCESS_NET_CONNECT_TCP)).unwrap();
        list.clear();
        assert!(list.is_empty());
        assert_eq!(list.granted(), 0);
    }

    #[test]
    fn open_missing_path_fails() {
        let err = FsRule::open(Path::new("/nonexistent/selfsandbox"), sys::ACCESS_FS_READ_FILE)
            .unwrap_err();
        match err {
            SandboxError::PathUnavailable { path, source } => {
                assert_eq!(path, PathBuf::from("/nonexistent/selfsandbox"));
                assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn directory_keeps_all_rights() {
        let dir = tempfile::tempdir().unwrap();
        let access = sys::ACCESS_FS_READ_DIR | sys::ACCESS_FS_MAKE_REG;
        let rule = FsRule::open(dir.path(), access).unwrap();
        assert_eq!(rule.access(), access);
        assert_eq!(rule.path(), dir.path());
    }

    #[test]
    fn regular_file_drops_directory_rights() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("data.txt");
        std::fs::write(&file, b"x").unwrap();

        let rule = FsRule::open(
            &file,
            sys::ACCESS_FS_READ_FILE | sys::ACCESS_FS_READ_DIR | sys::ACCESS_FS_MAKE_REG,
        )
        .unwrap();
        assert_eq!(rule.access(), sys::ACCESS_FS_READ_FILE);
    }
}
