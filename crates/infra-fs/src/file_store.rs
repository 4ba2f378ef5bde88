// File-backed counter store
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use dailyseq_core::domain::SequenceNumber;
use dailyseq_core::port::{SequenceStore, StoreError};
use tracing::debug;

/// Counter persisted as a single plain-text positive integer
///
/// Writes go to a temp file in the same directory which is fsynced and then
/// renamed over the target, so a crash leaves either the old or the new value.
pub struct FileSequenceStore {
    path: PathBuf,
}

impl FileSequenceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }

    fn parent_dir(&self) -> &Path {
        match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        }
    }
}

impl SequenceStore for FileSequenceStore {
    fn read(&self) -> Result<Option<SequenceNumber>, StoreError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "Counter file absent");
                return Ok(None);
            }
            Err(e) => return Err(self.io_error(e)),
        };

        let value = contents
            .parse::<SequenceNumber>()
            .map_err(|e| StoreError::Corrupt {
                location: self.path.display().to_string(),
                reason: e.to_string(),
            })?;

        debug!(path = %self.path.display(), value = %value, "Counter read");
        Ok(Some(value))
    }

    fn write(&self, value: SequenceNumber) -> Result<(), StoreError> {
        let dir = self.parent_dir();
        fs::create_dir_all(dir).map_err(|e| self.io_error(e))?;

        // NamedTempFile::new_in uses O_EXCL + random name in the target directory
        let mut temp = tempfile::NamedTempFile::new_in(dir).map_err(|e| self.io_error(e))?;
        temp.as_file_mut()
            .write_all(value.to_string().as_bytes())
            .map_err(|e| self.io_error(e))?;
        temp.as_file().sync_all().map_err(|e| self.io_error(e))?;

        temp.persist(&self.path)
            .map_err(|e| self.io_error(e.error))?;

        debug!(path = %self.path.display(), value = %value, "Counter written");
        Ok(())
    }

    fn ensure_writable(&self) -> Result<(), StoreError> {
        let dir = self.parent_dir();
        fs::create_dir_all(dir).map_err(|e| self.io_error(e))?;

        // Same temp-file route a write takes; dropped (and removed) right away
        tempfile::NamedTempFile::new_in(dir).map_err(|e| self.io_error(e))?;

        match fs::OpenOptions::new().write(true).open(&self.path) {
            Ok(_) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_error(e)),
        }
    }
}
