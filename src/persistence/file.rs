//! Flat-file snapshot sink.
//!
//! Writes go to `<dest>.tmp` in the destination's directory first and
//! are atomically renamed over the destination once flushed and synced,
//! so a partial or crashed write never replaces a good snapshot. Saves
//! through one sink are serialized, since they share the temp path.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use bytes::Bytes;
use parking_lot::Mutex;
use tracing::debug;

use super::SnapshotSink;
use crate::error::SinkError;

/// Snapshot sink backed by a single JSON file.
#[derive(Debug)]
pub struct FileSink {
    path: PathBuf,
    tmp_path: PathBuf,

    /// Held for the whole write-sync-rename sequence
    write_lock: Mutex<()>,
}

impl FileSink {
    /// Prepares a sink writing to `path`, creating its parent directory.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SinkError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let mut tmp_name = path
            .file_name()
            .map(|name| name.to_os_string())
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "snapshot path has no file name"))?;
        tmp_name.push(".tmp");
        let tmp_path = path.with_file_name(tmp_name);

        Ok(Self {
            path,
            tmp_path,
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SnapshotSink for FileSink {
    fn save(&self, payload: &[u8]) -> Result<(), SinkError> {
        let _guard = self.write_lock.lock();
        let result = (|| {
            let mut file = File::create(&self.tmp_path)?;
            file.write_all(payload)?;
            file.sync_all()?;
            fs::rename(&self.tmp_path, &self.path)
        })();

        if result.is_err() {
            // best-effort cleanup of the incomplete temp file
            let _ = fs::remove_file(&self.tmp_path);
        }
        result?;

        debug!(path = %self.path.display(), bytes = payload.len(), "snapshot file written");
        Ok(())
    }

    fn load(&self) -> Result<Option<Bytes>, SinkError> {
        match fs::read(&self.path) {
            Ok(data) => Ok(Some(Bytes::from(data))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn name(&self) -> &'static str {
        "file"
    }
}
