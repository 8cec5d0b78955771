//! Single-flight gate for analysis.
//!
//! Only one extraction may be outstanding per data directory. The gate is
//! a non-blocking exclusive lock on `analysis.lock`, released on drop.

use fs2::FileExt;
use nutrilog_core::{Error, Result};
use std::fs::{File, OpenOptions};
use std::path::Path;

const LOCK_FILE: &str = "analysis.lock";

pub struct AnalysisGate {
    file: File,
}

impl AnalysisGate {
    /// Take the gate, failing fast if another analysis holds it
    pub fn acquire(data_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(data_dir)?;
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .open(data_dir.join(LOCK_FILE))?;

        match file.try_lock_exclusive() {
            Ok(()) => {
                tracing::debug!("Acquired analysis gate in {:?}", data_dir);
                Ok(Self { file })
            }
            Err(e) if e.raw_os_error() == fs2::lock_contended_error().raw_os_error() => {
                Err(Error::AnalysisInProgress)
            }
            Err(e) => Err(Error::Io(e)),
        }
    }
}

impl Drop for AnalysisGate {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}
