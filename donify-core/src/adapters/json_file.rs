//! File-backed key-value store
//!
//! Each key is stored as `<dir>/<key>.json`. Writes take an exclusive lock
//! on `<dir>/.lock` and replace the file atomically, so compare-and-swap is
//! safe across processes sharing the directory.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tempfile::NamedTempFile;

use crate::domain::result::{Error, Result};
use crate::ports::KeyValueStore;

const LOCK_FILE: &str = ".lock";

pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    /// Open (and create if needed) a store rooted at `dir`
    pub fn new(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(Error::storage(format!("invalid key: {:?}", key)));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }

    /// Hold the directory lock for the duration of `f`
    fn with_lock<T>(&self, f: impl FnOnce() -> Result<T>) -> Result<T> {
        let lock = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(self.dir.join(LOCK_FILE))?;
        lock.lock_exclusive()?;
        let result = f();
        // Unlock errors are not actionable; the lock is released on close anyway
        let _ = FileExt::unlock(&lock);
        result
    }

    fn read(path: &Path) -> Result<Option<String>> {
        match fs::read_to_string(path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write_atomic(&self, path: &Path, value: &str) -> Result<()> {
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(value.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| Error::Io(e.error))?;
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Self::read(&self.path_for(key)?)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key)?;
        self.with_lock(|| self.write_atomic(&path, value))
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.path_for(key)?;
        self.with_lock(|| match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        })
    }

    fn compare_and_swap(&self, key: &str, expected: Option<&str>, value: &str) -> Result<bool> {
        let path = self.path_for(key)?;
        self.with_lock(|| {
            let current = Self::read(&path)?;
            if current.as_deref() != expected {
                return Ok(false);
            }
            self.write_atomic(&path, value)?;
            Ok(true)
        })
    }
}
