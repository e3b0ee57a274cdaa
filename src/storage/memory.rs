//! In-memory storage backend for testing.
//!
//! Provides [`InMemoryStorage`], a thread-safe implementation of
//! [`super::Storage`] with the same dedupe semantics as
//! [`super::FileStorage`] and no file I/O.

use core::future::{self, Future};
use std::sync::{Mutex, MutexGuard};

use crate::error::{FreebiesError, Result};
use crate::models::DiscoveredGame;

/// Thread-safe in-memory storage.
///
/// # Example
///
/// ```rust
/// use steam_freebies::storage::InMemoryStorage;
///
/// let storage = InMemoryStorage::new();
/// assert!(storage.snapshot().unwrap().is_empty());
/// ```
#[derive(Debug, Default)]
pub struct InMemoryStorage {
    /// Recorded games in insertion order.
    games: Mutex<Vec<DiscoveredGame>>,
}

impl InMemoryStorage {
    /// Creates an empty storage.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a storage pre-populated with `games`.
    #[inline]
    #[must_use]
    pub const fn with_games(games: Vec<DiscoveredGame>) -> Self {
        Self {
            games: Mutex::new(games),
        }
    }

    /// Returns a copy of the recorded games.
    ///
    /// # Errors
    ///
    /// Returns an error if the internal mutex is poisoned.
    #[inline]
    pub fn snapshot(&self) -> Result<Vec<DiscoveredGame>> {
        Ok(self.lock()?.clone())
    }

    /// Acquires the internal mutex.
    fn lock(&self) -> Result<MutexGuard<'_, Vec<DiscoveredGame>>> {
        self.games
            .lock()
            .map_err(|err| FreebiesError::Storage(err.to_string().into()))
    }

    /// Appends `game` if its id is new.
    fn insert(&self, game: DiscoveredGame) -> Result<bool> {
        let mut games = self.lock()?;
        Ok(super::append_if_absent(&mut games, game))
    }
}

impl super::Storage for InMemoryStorage {
    #[inline]
    fn discoveries(&self) -> impl Future<Output = Result<Vec<DiscoveredGame>>> + Send {
        future::ready(self.snapshot())
    }

    #[inline]
    fn insert_if_absent(&self, game: DiscoveredGame) -> impl Future<Output = Result<bool>> + Send {
        future::ready(self.insert(game))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AppId;
    use crate::storage::Storage;

    fn test_game(id: u32) -> DiscoveredGame {
        DiscoveredGame {
            id: AppId::new(id),
            name: format!("Game {id}"),
            found_date: "2024-03-01 12:00:00".to_owned(),
            original_price: "$1.99".to_owned(),
            end_date: "2024-03-08 12:00:00".to_owned(),
        }
    }

    #[tokio::test]
    async fn starts_empty() {
        let storage = InMemoryStorage::new();
        assert!(storage.discoveries().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn first_discovery_wins() {
        let storage = InMemoryStorage::with_games(vec![test_game(1)]);
        let mut renamed = test_game(1);
        renamed.name = "Other".to_owned();

        assert!(!storage.insert_if_absent(renamed).await.unwrap());
        assert!(storage.insert_if_absent(test_game(2)).await.unwrap());

        let games = storage.discoveries().await.unwrap();
        assert_eq!(games, vec![test_game(1), test_game(2)]);
    }
}
