//! Transport abstraction over the remote backup store.

use crate::error::{EngineResult, SyncError};
use parking_lot::Mutex;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Remote store operations the engine needs.
///
/// The production implementation speaks WebDAV over HTTP; tests use
/// [`MemoryDavServer`]. Paths are relative to the configured backup
/// collection, and the empty path addresses the collection itself.
pub trait DavTransport: Send + Sync {
    /// Checks whether a remote path exists.
    ///
    /// Returns `Ok(false)` for a missing path; `Err` is reserved for
    /// authentication and transport failures.
    fn exists(&self, path: &str) -> EngineResult<bool>;

    /// Creates the collection at `path` if it does not already exist.
    fn ensure_directory(&self, path: &str) -> EngineResult<()>;

    /// Fetches the contents of a remote file.
    ///
    /// A missing file is a [`SyncError::NotFound`] so callers can
    /// distinguish first-sync from transport failures.
    fn get(&self, path: &str) -> EngineResult<Vec<u8>>;

    /// Writes a remote file, replacing any previous contents.
    fn put(&self, path: &str, bytes: &[u8]) -> EngineResult<()>;
}

impl<T: DavTransport + ?Sized> DavTransport for Arc<T> {
    fn exists(&self, path: &str) -> EngineResult<bool> {
        (**self).exists(path)
    }

    fn ensure_directory(&self, path: &str) -> EngineResult<()> {
        (**self).ensure_directory(path)
    }

    fn get(&self, path: &str) -> EngineResult<Vec<u8>> {
        (**self).get(path)
    }

    fn put(&self, path: &str, bytes: &[u8]) -> EngineResult<()> {
        (**self).put(path, bytes)
    }
}

/// Which class of operation a [`MemoryDavServer`] should fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailMode {
    /// Every operation fails with an authentication error.
    Auth,
    /// Reads (`exists`, `get`) fail with a transport error.
    Read,
    /// Writes (`ensure_directory`, `put`) fail with a transport error.
    Write,
}

/// In-memory remote store for tests.
///
/// Behaves like an empty WebDAV collection: files are stored by path,
/// every `put` is logged in order, and a [`FailMode`] can be injected
/// to simulate server failures. Share one instance between engines via
/// `Arc` to simulate two devices syncing against the same server.
#[derive(Debug, Default)]
pub struct MemoryDavServer {
    files: Mutex<BTreeMap<String, Vec<u8>>>,
    directories: Mutex<BTreeSet<String>>,
    put_log: Mutex<Vec<String>>,
    fail_mode: Mutex<Option<FailMode>>,
}

impl MemoryDavServer {
    /// Creates an empty server.
    pub fn new() -> Self {
        Self::default()
    }

    /// Injects a failure mode, or clears it with `None`.
    pub fn set_fail_mode(&self, mode: Option<FailMode>) {
        *self.fail_mode.lock() = mode;
    }

    /// Stores a file directly, bypassing failure injection.
    pub fn seed_file(&self, path: &str, bytes: Vec<u8>) {
        self.files.lock().insert(path.to_string(), bytes);
    }

    /// Returns the stored contents of a file, if present.
    pub fn file(&self, path: &str) -> Option<Vec<u8>> {
        self.files.lock().get(path).cloned()
    }

    /// Returns the number of stored files.
    pub fn file_count(&self) -> usize {
        self.files.lock().len()
    }

    /// Returns the paths written via `put`, in order.
    pub fn put_log(&self) -> Vec<String> {
        self.put_log.lock().clone()
    }

    fn check(&self, write: bool) -> EngineResult<()> {
        match *self.fail_mode.lock() {
            Some(FailMode::Auth) => Err(SyncError::auth("401 Unauthorized")),
            Some(FailMode::Read) if !write => Err(SyncError::transport("simulated read failure")),
            Some(FailMode::Write) if write => Err(SyncError::transport("simulated write failure")),
            _ => Ok(()),
        }
    }
}

impl DavTransport for MemoryDavServer {
    fn exists(&self, path: &str) -> EngineResult<bool> {
        self.check(false)?;
        if path.is_empty() {
            return Ok(true);
        }
        Ok(self.files.lock().contains_key(path) || self.directories.lock().contains(path))
    }

    fn ensure_directory(&self, path: &str) -> EngineResult<()> {
        self.check(true)?;
        self.directories.lock().insert(path.to_string());
        Ok(())
    }

    fn get(&self, path: &str) -> EngineResult<Vec<u8>> {
        self.check(false)?;
        self.files
            .lock()
            .get(path)
            .cloned()
            .ok_or_else(|| SyncError::not_found(path))
    }

    fn put(&self, path: &str, bytes: &[u8]) -> EngineResult<()> {
        self.check(true)?;
        self.put_log.lock().push(path.to_string());
        self.files.lock().insert(path.to_string(), bytes.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_then_get_roundtrips() {
        let server = MemoryDavServer::new();
        server.put("manifest.json", b"{}").unwrap();

        assert!(server.exists("manifest.json").unwrap());
        assert_eq!(server.get("manifest.json").unwrap(), b"{}");
        assert_eq!(server.file_count(), 1);
    }

    #[test]
    fn missing_file_is_not_found() {
        let server = MemoryDavServer::new();
        let err = server.get("data.json").unwrap_err();
        assert!(err.is_not_found());
        assert!(!server.exists("data.json").unwrap());
    }

    #[test]
    fn root_collection_always_exists() {
        let server = MemoryDavServer::new();
        assert!(server.exists("").unwrap());
    }

    #[test]
    fn ensure_directory_is_idempotent() {
        let server = MemoryDavServer::new();
        server.ensure_directory("archive").unwrap();
        server.ensure_directory("archive").unwrap();
        assert!(server.exists("archive").unwrap());
    }

    #[test]
    fn put_log_preserves_order() {
        let server = MemoryDavServer::new();
        server.put("data.json", b"1").unwrap();
        server.put("manifest.json", b"2").unwrap();
        assert_eq!(server.put_log(), vec!["data.json", "manifest.json"]);
    }

    #[test]
    fn auth_failure_hits_every_operation() {
        let server = MemoryDavServer::new();
        server.set_fail_mode(Some(FailMode::Auth));

        assert!(server.exists("").unwrap_err().is_auth());
        assert!(server.get("data.json").unwrap_err().is_auth());
        assert!(server.put("data.json", b"x").unwrap_err().is_auth());

        server.set_fail_mode(None);
        assert!(server.exists("").unwrap());
    }

    #[test]
    fn read_and_write_failures_are_scoped() {
        let server = MemoryDavServer::new();
        server.put("data.json", b"x").unwrap();

        server.set_fail_mode(Some(FailMode::Read));
        assert!(server.get("data.json").is_err());
        assert!(server.put("other.json", b"y").is_ok());

        server.set_fail_mode(Some(FailMode::Write));
        assert!(server.get("data.json").is_ok());
        assert!(server.put("other.json", b"z").is_err());
    }

    #[test]
    fn arc_wrapper_is_a_transport() {
        let server = Arc::new(MemoryDavServer::new());
        server.put("data.json", b"x").unwrap();

        fn takes_transport<T: DavTransport>(transport: &T) -> bool {
            transport.exists("data.json").unwrap()
        }
        assert!(takes_transport(&server));
    }
}
