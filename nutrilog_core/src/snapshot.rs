//! Locked, atomic snapshot files.
//!
//! Every persisted key (profile, log collection) is a single JSON document.
//! Readers take a shared lock; writers replace the whole file through a
//! locked temp file so a crash never leaves a half-written snapshot.

use crate::{Error, Result};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Read a snapshot with a shared lock
///
/// Returns `None` if the file doesn't exist.
pub fn read_locked(path: &Path) -> Result<Option<String>> {
    if !path.exists() {
        return Ok(None);
    }

    let file = File::open(path)?;
    file.lock_shared()?;

    let mut contents = String::new();
    let mut reader = std::io::BufReader::new(&file);
    let read = reader.read_to_string(&mut contents);
    file.unlock()?;
    read?;

    tracing::debug!("Read {} bytes from {:?}", contents.len(), path);
    Ok(Some(contents))
}

/// Replace a snapshot atomically
///
/// 1. Write to a temp file in the same directory
/// 2. Sync to disk
/// 3. Rename over the original
pub fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path.parent().ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::Other, "snapshot path missing parent")
    })?;
    std::fs::create_dir_all(parent)?;

    let temp = NamedTempFile::new_in(parent)?;

    // Serialize concurrent writers on the temp file
    temp.as_file().lock_exclusive()?;

    {
        let mut writer = std::io::BufWriter::new(temp.as_file());
        writer.write_all(contents.as_bytes())?;
        writer.flush()?;
    }

    temp.as_file().sync_all()?;
    temp.as_file().unlock()?;

    temp.persist(path).map_err(|e| Error::Io(e.error))?;

    tracing::debug!("Wrote snapshot {:?}", path);
    Ok(())
}

/// Exclusive lock on `<name>.lock`, released on drop
///
/// Held by a writer from the read of a snapshot until its replacement is
/// persisted. The snapshot itself is swapped by rename, so the lock lives
/// on a sibling file that is never replaced.
#[derive(Debug)]
pub struct WriteLock {
    file: File,
}

impl WriteLock {
    /// Block until no other writer holds the lock for `path`
    pub fn acquire(path: &Path) -> Result<Self> {
        let mut name = path.as_os_str().to_owned();
        name.push(".lock");
        let lock_path = PathBuf::from(name);
        if let Some(parent) = lock_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .open(&lock_path)?;
        file.lock_exclusive()?;
        tracing::debug!("Acquired write lock {:?}", lock_path);
        Ok(Self { file })
    }
}

impl Drop for WriteLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

/// Move an unreadable snapshot aside as `<name>.corrupt`
///
/// Keeps the bytes around for manual recovery instead of overwriting them
/// on the next save.
pub fn quarantine(path: &Path) -> Result<PathBuf> {
    let mut name = path.as_os_str().to_owned();
    name.push(".corrupt");
    let target = PathBuf::from(name);
    std::fs::rename(path, &target)?;
    tracing::warn!("Moved unreadable snapshot {:?} to {:?}", path, target);
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_and_read_roundtrip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("nested").join("logs.json");

        write_atomic(&path, "[1,2,3]").unwrap();
        assert_eq!(read_locked(&path).unwrap().as_deref(), Some("[1,2,3]"));
    }

    #[test]
    fn test_read_missing_returns_none() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("missing.json");

        assert!(read_locked(&path).unwrap().is_none());
    }

    #[test]
    fn test_atomic_write_leaves_no_temp_files() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("profile.json");

        write_atomic(&path, "{}").unwrap();
        write_atomic(&path, "{\"a\":1}").unwrap();

        let extras: Vec<_> = std::fs::read_dir(temp_dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name() != "profile.json")
            .collect();
        assert!(
            extras.is_empty(),
            "Expected only profile.json, found extras: {:?}",
            extras
        );
    }

    #[test]
    fn test_write_lock_excludes_second_holder() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("logs.json");

        let held = WriteLock::acquire(&path).unwrap();
        let other = File::open(temp_dir.path().join("logs.json.lock")).unwrap();
        assert!(other.try_lock_exclusive().is_err());

        drop(held);
        assert!(other.try_lock_exclusive().is_ok());
        other.unlock().unwrap();
    }

    #[test]
    fn test_quarantine_moves_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("logs.json");
        std::fs::write(&path, "garbage").unwrap();

        let moved = quarantine(&path).unwrap();

        assert!(!path.exists());
        assert_eq!(moved, temp_dir.path().join("logs.json.corrupt"));
        assert_eq!(std::fs::read_to_string(moved).unwrap(), "garbage");
    }
}
