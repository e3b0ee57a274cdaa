//! Pluggable storage backends for the discovered-games collection.
//!
//! [`FileStorage`] keeps the collection in a single JSON document;
//! [`InMemoryStorage`] holds it in memory for tests and embedders.

mod file;
mod memory;

pub use file::{DEFAULT_DATA_FILE, FileStorage};
pub use memory::InMemoryStorage;

use core::future::Future;

use crate::error::Result;
use crate::models::DiscoveredGame;

/// Async storage backend for discovered games.
///
/// All methods take `&self`; implementations should use interior
/// mutability (e.g. `Mutex`) so the check-then-append in
/// [`Storage::insert_if_absent`] is not interleaved with another writer in
/// the same process.
pub trait Storage: core::fmt::Debug + Send + Sync {
    /// Returns all recorded games in insertion order.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage backend fails to read.
    fn discoveries(&self) -> impl Future<Output = Result<Vec<DiscoveredGame>>> + Send;

    /// Appends `game` unless a record with the same id already exists.
    ///
    /// Returns `true` if the record was added, `false` if the id was
    /// already known (the stored record is left untouched).
    ///
    /// # Errors
    ///
    /// Returns an error if the storage backend fails to read or write.
    fn insert_if_absent(&self, game: DiscoveredGame) -> impl Future<Output = Result<bool>> + Send;
}

/// Appends `game` to `games` if its id is not present yet.
fn append_if_absent(games: &mut Vec<DiscoveredGame>, game: DiscoveredGame) -> bool {
    if games.iter().any(|existing| existing.id == game.id) {
        return false;
    }
    games.push(game);
    true
}
