//! JSON-file-based storage backend.
//!
//! The whole collection lives in one pretty-printed JSON array (default:
//! `temp_free_games.json` in the working directory).

use core::future::{self, Future};
use std::ffi::OsString;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::error::{FreebiesError, Result};
use crate::models::DiscoveredGame;

/// Default file name of the discoveries collection.
pub const DEFAULT_DATA_FILE: &str = "temp_free_games.json";

/// Suffix of the temporary file used for atomic writes.
const TMP_SUFFIX: &str = ".tmp";

/// Suffix of the copy kept when the collection fails to parse.
const CORRUPT_SUFFIX: &str = ".corrupt";

/// File-backed storage that persists discoveries as a JSON array.
///
/// # Recovery
///
/// A missing file reads as an empty collection. A file that does not
/// parse also reads as empty (logged at error level); before that, its
/// contents are copied to `<file>.corrupt`, because the next successful
/// discovery rewrites the file from the empty collection.
///
/// # Concurrency
///
/// An in-process [`Mutex`] serializes load-check-append-save. Nothing
/// guards against a second process writing the same file.
///
/// # File layout
///
/// ```text
/// <file>            (JSON array of DiscoveredGame)
/// <file>.tmp        (transient, during writes)
/// <file>.corrupt    (only after a failed parse)
/// ```
#[derive(Debug)]
pub struct FileStorage {
    /// Path of the JSON document.
    path: PathBuf,
    /// Mutex serializing concurrent in-process access.
    lock: Mutex<()>,
}

impl FileStorage {
    /// Creates a storage backed by the file at `path`.
    ///
    /// The file is not touched until the first read or write.
    #[inline]
    #[must_use]
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Returns the path of the JSON document.
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the full collection.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read. Parse
    /// failures are not errors; see the type-level docs.
    #[inline]
    pub fn load(&self) -> Result<Vec<DiscoveredGame>> {
        let _guard = self.acquire();
        self.read_games()
    }

    /// Overwrites the file with `games`.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or any file operation fails.
    #[inline]
    pub fn save(&self, games: &[DiscoveredGame]) -> Result<()> {
        let _guard = self.acquire();
        self.write_games(games)
    }

    // ── Private helpers ─────────────────────────────────────────────

    /// Acquires the in-process mutex. A poisoned lock is taken over: it
    /// guards no data, and the file is rewritten atomically.
    fn acquire(&self) -> MutexGuard<'_, ()> {
        self.lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns a path next to the collection with `suffix` appended to the
    /// file name.
    fn sibling(&self, suffix: &str) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map_or_else(OsString::new, ToOwned::to_owned);
        name.push(suffix);
        self.path.with_file_name(name)
    }

    /// Reads and deserializes the file. Returns an empty `Vec` if the file
    /// does not exist or does not parse.
    fn read_games(&self) -> Result<Vec<DiscoveredGame>> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) if err.kind() == ErrorKind::InvalidData => {
                self.recover_corrupt(&err);
                return Ok(Vec::new());
            }
            Err(err) => return Err(storage_io_error(err)),
        };
        match serde_json::from_str(&contents) {
            Ok(games) => Ok(games),
            Err(err) => {
                self.recover_corrupt(&err);
                Ok(Vec::new())
            }
        }
    }

    /// Logs a parse failure and keeps a copy of the unreadable file.
    fn recover_corrupt(&self, err: &dyn core::error::Error) {
        tracing::error!(
            path = %self.path.display(),
            error = %err,
            "discoveries file is not valid JSON; continuing with an empty collection"
        );
        let backup = self.sibling(CORRUPT_SUFFIX);
        match fs::copy(&self.path, &backup) {
            Ok(_bytes) => tracing::warn!(
                backup = %backup.display(),
                "kept a copy of the unreadable discoveries file"
            ),
            Err(copy_err) => tracing::error!(
                backup = %backup.display(),
                error = %copy_err,
                "failed to back up the unreadable discoveries file"
            ),
        }
    }

    /// Atomically writes the collection (write-to-tmp then rename).
    fn write_games(&self, games: &[DiscoveredGame]) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(storage_io_error)?;
        }
        let tmp_path = self.sibling(TMP_SUFFIX);
        let json = serde_json::to_string_pretty(games).map_err(FreebiesError::from)?;
        fs::write(&tmp_path, json).map_err(storage_io_error)?;
        fs::rename(&tmp_path, &self.path).map_err(storage_io_error)?;
        Ok(())
    }

    /// Loads, appends if the id is new, and saves, all under the mutex.
    fn insert_locked(&self, game: DiscoveredGame) -> Result<bool> {
        let _guard = self.acquire();
        let mut games = self.read_games()?;
        if !super::append_if_absent(&mut games, game) {
            return Ok(false);
        }
        self.write_games(&games)?;
        Ok(true)
    }
}

impl Default for FileStorage {
    #[inline]
    fn default() -> Self {
        Self::new(DEFAULT_DATA_FILE)
    }
}

// ── Free-standing helpers ───────────────────────────────────────────────

/// Wraps an I/O error into a [`FreebiesError::Storage`].
fn storage_io_error(err: std::io::Error) -> FreebiesError {
    FreebiesError::Storage(Box::new(err))
}

// ── Storage implementation ──────────────────────────────────────────────

impl super::Storage for FileStorage {
    #[inline]
    fn discoveries(&self) -> impl Future<Output = Result<Vec<DiscoveredGame>>> + Send {
        future::ready(self.load())
    }

    #[inline]
    fn insert_if_absent(&self, game: DiscoveredGame) -> impl Future<Output = Result<bool>> + Send {
        future::ready(self.insert_locked(game))
    }
}
