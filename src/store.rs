// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2025 Daniel Negri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Persistence façade.
//!
//! A save overwrites the entire collection; last writer wins, no merge. The
//! ledger never calls a store implicitly: persistence is an explicit step the
//! caller sequences after each mutation.
//!
//! Backends are interchangeable collaborators behind [`ProcessStore`]:
//! [`FileStore`] for local durable storage, [`MemoryStore`] for tests and as
//! the in-process stand-in for a remote blob store.

use crate::error::StoreError;
use crate::process::Process;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Abstract save/load contract consumed by the application shell.
pub trait ProcessStore {
    /// Persists the whole collection, replacing any previous snapshot.
    fn save(&self, processes: &[Process]) -> Result<(), StoreError>;

    /// Loads the last persisted collection. An absent snapshot is an empty
    /// collection, not an error.
    fn load(&self) -> Result<Vec<Process>, StoreError>;
}

/// JSON-file-backed store.
///
/// Writes go through a temporary file in the same directory followed by a
/// rename, so a crash mid-write never leaves a truncated snapshot behind.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ProcessStore for FileStore {
    fn save(&self, processes: &[Process]) -> Result<(), StoreError> {
        let json = serde_json::to_vec(processes)?;

        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(map_write_error)?;
        tmp.write_all(&json).map_err(map_write_error)?;
        tmp.flush().map_err(map_write_error)?;
        tmp.persist(&self.path)
            .map_err(|e| map_write_error(e.error))?;
        Ok(())
    }

    fn load(&self) -> Result<Vec<Process>, StoreError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::debug!("no snapshot at {}, starting empty", self.path.display());
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// A disk-full write degrades to the recoverable quota error; the in-memory
/// state is retained and only a reload risks loss.
fn map_write_error(e: std::io::Error) -> StoreError {
    match e.kind() {
        ErrorKind::StorageFull | ErrorKind::QuotaExceeded => {
            log::warn!("local storage full: {e}");
            StoreError::QuotaExceeded(e.to_string())
        }
        _ => StoreError::Io(e),
    }
}

/// In-memory store.
///
/// Shares the blob-store shape of a remote backend (whole-collection
/// upsert/download) without the network; integration tests point the shell
/// at this.
#[derive(Debug, Default)]
pub struct MemoryStore {
    snapshot: Mutex<Option<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProcessStore for MemoryStore {
    fn save(&self, processes: &[Process]) -> Result<(), StoreError> {
        let json = serde_json::to_string(processes)?;
        *self.snapshot.lock().expect("store mutex poisoned") = Some(json);
        Ok(())
    }

    fn load(&self) -> Result<Vec<Process>, StoreError> {
        let snapshot = self.snapshot.lock().expect("store mutex poisoned");
        match snapshot.as_deref() {
            Some(json) => Ok(serde_json::from_str(json)?),
            None => Ok(Vec::new()),
        }
    }
}
