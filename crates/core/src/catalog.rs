//! Game inventory store backed by a flat JSON file.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use chrono::Utc;
use parking_lot::RwLock;
use tracing::warn;

use crate::{
    error::StoreError,
    models::{AgeRating, GameRecord},
};

/// Input accepted by [`CatalogStore::add`]. Only title and category are
/// required; everything else falls back to the documented defaults.
#[derive(Debug, Clone, Default)]
pub struct NewGame {
    /// Game title. Required.
    pub title: String,
    /// Category or genre. Required.
    pub category: String,
    /// Release year, when known.
    pub release_year: Option<i32>,
    /// Developer credit. Defaults to "Unknown".
    pub developer: Option<String>,
    /// Publisher credit. Defaults to "Unknown".
    pub publisher: Option<String>,
    /// Age rating. Defaults to `Free`.
    pub age_rating: Option<AgeRating>,
    /// Review score. Defaults to 0.
    pub score: Option<f64>,
}

/// Partial update merged over an existing record by [`CatalogStore::update`].
///
/// The record's id and creation timestamp can never be overwritten, and the
/// availability flag moves only through [`CatalogStore::set_available`].
#[derive(Debug, Clone, Default)]
pub struct GamePatch {
    /// Replacement title; ignored when blank.
    pub title: Option<String>,
    /// Replacement category; ignored when blank.
    pub category: Option<String>,
    /// Replacement release year.
    pub release_year: Option<i32>,
    /// Replacement developer credit.
    pub developer: Option<String>,
    /// Replacement publisher credit.
    pub publisher: Option<String>,
    /// Replacement age rating.
    pub age_rating: Option<AgeRating>,
    /// Replacement score.
    pub score: Option<f64>,
}

/// Handle to the game inventory. Cheap to clone; all clones share state.
#[derive(Clone)]
pub struct CatalogStore {
    inner: Arc<RwLock<Inner>>,
}

struct Inner {
    path: PathBuf,
    games: Vec<GameRecord>,
    next_id: u64,
}

impl CatalogStore {
    /// Open the store over the given backing file.
    ///
    /// A missing or unreadable file is an empty collection, never an
    /// error. The id counter starts at one past the highest stored id.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let games = read_games(&path);
        let next_id = games.iter().map(|game| game.id).max().map_or(1, |id| id + 1);
        Self {
            inner: Arc::new(RwLock::new(Inner {
                path,
                games,
                next_id,
            })),
        }
    }

    /// Register a new game. Fails when title or category is blank.
    pub fn add(&self, input: NewGame) -> Result<GameRecord, StoreError> {
        if input.title.trim().is_empty() {
            return Err(StoreError::MissingField("title"));
        }
        if input.category.trim().is_empty() {
            return Err(StoreError::MissingField("category"));
        }

        let mut inner = self.inner.write();
        let record = GameRecord {
            id: inner.next_id,
            title: input.title.trim().to_string(),
            category: input.category.trim().to_string(),
            release_year: input.release_year,
            developer: non_blank(input.developer).unwrap_or_else(|| "Unknown".to_string()),
            publisher: non_blank(input.publisher).unwrap_or_else(|| "Unknown".to_string()),
            age_rating: input.age_rating.unwrap_or_default(),
            score: input.score.unwrap_or(0.0),
            available: true,
            created_at: Utc::now(),
        };
        inner.next_id += 1;
        inner.games.push(record.clone());
        inner.persist();
        Ok(record)
    }

    /// Snapshot of every record, in insertion order.
    pub fn all(&self) -> Vec<GameRecord> {
        self.inner.read().games.clone()
    }

    /// Look up a single record by exact id.
    pub fn get(&self, id: u64) -> Option<GameRecord> {
        self.inner
            .read()
            .games
            .iter()
            .find(|game| game.id == id)
            .cloned()
    }

    /// Merge the patch over the record with the given id.
    pub fn update(&self, id: u64, patch: GamePatch) -> Result<GameRecord, StoreError> {
        let mut inner = self.inner.write();
        let record = inner
            .games
            .iter_mut()
            .find(|game| game.id == id)
            .ok_or(StoreError::GameNotFound(id))?;

        if let Some(title) = non_blank(patch.title) {
            record.title = title;
        }
        if let Some(category) = non_blank(patch.category) {
            record.category = category;
        }
        if let Some(year) = patch.release_year {
            record.release_year = Some(year);
        }
        if let Some(developer) = non_blank(patch.developer) {
            record.developer = developer;
        }
        if let Some(publisher) = non_blank(patch.publisher) {
            record.publisher = publisher;
        }
        if let Some(rating) = patch.age_rating {
            record.age_rating = rating;
        }
        if let Some(score) = patch.score {
            record.score = score;
        }

        let updated = record.clone();
        inner.persist();
        Ok(updated)
    }

    /// Delete the record with the given id. Rental history referencing it
    /// is left untouched.
    pub fn remove(&self, id: u64) -> Result<(), StoreError> {
        let mut inner = self.inner.write();
        let index = inner
            .games
            .iter()
            .position(|game| game.id == id)
            .ok_or(StoreError::GameNotFound(id))?;
        inner.games.remove(index);
        inner.persist();
        Ok(())
    }

    /// Case-insensitive substring search on the title. A blank term
    /// matches nothing rather than everything.
    pub fn search_by_title(&self, term: &str) -> Vec<GameRecord> {
        let needle = term.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }
        self.inner
            .read()
            .games
            .iter()
            .filter(|game| game.title.to_lowercase().contains(&needle))
            .cloned()
            .collect()
    }

    /// Exact case-insensitive category match.
    pub fn filter_by_category(&self, category: &str) -> Vec<GameRecord> {
        let needle = category.trim().to_lowercase();
        self.inner
            .read()
            .games
            .iter()
            .filter(|game| game.category.to_lowercase() == needle)
            .cloned()
            .collect()
    }

    /// Flip a game's availability flag. Reserved for the rental ledger,
    /// which is the only component allowed to move it.
    pub fn set_available(&self, id: u64, available: bool) -> Result<(), StoreError> {
        let mut inner = self.inner.write();
        let record = inner
            .games
            .iter_mut()
            .find(|game| game.id == id)
            .ok_or(StoreError::GameNotFound(id))?;
        record.available = available;
        inner.persist();
        Ok(())
    }
}

impl Inner {
    /// Rewrite the whole backing file. A write failure only logs a
    /// warning; the in-memory collection remains authoritative.
    fn persist(&self) {
        if let Some(parent) = self.path.parent() {
            if let Err(err) = fs::create_dir_all(parent) {
                warn!("failed to create {}: {err}", parent.display());
                return;
            }
        }
        match serde_json::to_vec_pretty(&self.games) {
            Ok(serialised) => {
                if let Err(err) = fs::write(&self.path, serialised) {
                    warn!("failed to write {}: {err}", self.path.display());
                }
            }
            Err(err) => warn!("failed to serialise catalogue: {err}"),
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn read_games(path: &Path) -> Vec<GameRecord> {
    if !path.exists() {
        return Vec::new();
    }
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) => {
            warn!("failed to read {}: {err}", path.display());
            return Vec::new();
        }
    };
    match serde_json::from_str(&content) {
        Ok(games) => games,
        Err(err) => {
            warn!("failed to parse {}: {err}", path.display());
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample(title: &str, category: &str) -> NewGame {
        NewGame {
            title: title.to_string(),
            category: category.to_string(),
            ..NewGame::default()
        }
    }

    #[test]
    fn add_assigns_sequential_ids_and_defaults() {
        let dir = tempdir().expect("tempdir");
        let store = CatalogStore::open(dir.path().join("games.json"));

        let first = store.add(sample("Chrono Quest", "RPG")).expect("add");
        let second = store.add(sample("Warframe", "Action")).expect("add");

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert!(first.available);
        assert_eq!(first.developer, "Unknown");
        assert_eq!(first.publisher, "Unknown");
        assert_eq!(first.age_rating, AgeRating::Free);
        assert_eq!(first.score, 0.0);

        let fetched = store.get(1).expect("get");
        assert_eq!(fetched.title, "Chrono Quest");
        assert!(fetched.available);
    }

    #[test]
    fn add_rejects_blank_required_fields() {
        let dir = tempdir().expect("tempdir");
        let store = CatalogStore::open(dir.path().join("games.json"));

        assert_eq!(
            store.add(sample("  ", "RPG")),
            Err(StoreError::MissingField("title"))
        );
        assert_eq!(
            store.add(sample("Chrono Quest", "")),
            Err(StoreError::MissingField("category"))
        );
        assert!(store.all().is_empty());
    }

    #[test]
    fn id_counter_survives_runtime_deletion() {
        let dir = tempdir().expect("tempdir");
        let store = CatalogStore::open(dir.path().join("games.json"));

        let first = store.add(sample("Chrono Quest", "RPG")).expect("add");
        store.remove(first.id).expect("remove");
        let second = store.add(sample("Warframe", "Action")).expect("add");

        // Ids are never reused within a session even when the shelf empties.
        assert_eq!(second.id, 2);
    }

    #[test]
    fn id_counter_resets_only_for_an_empty_collection_at_open() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("games.json");

        {
            let store = CatalogStore::open(&path);
            let game = store.add(sample("Chrono Quest", "RPG")).expect("add");
            store.remove(game.id).expect("remove");
        }

        // The file now holds an empty collection, so a fresh open starts
        // the counter back at one.
        let reopened = CatalogStore::open(&path);
        let game = reopened.add(sample("Warframe", "Action")).expect("add");
        assert_eq!(game.id, 1);
    }

    #[test]
    fn update_merges_fields_but_never_id_or_created_at() {
        let dir = tempdir().expect("tempdir");
        let store = CatalogStore::open(dir.path().join("games.json"));
        let original = store.add(sample("Chrono Quest", "RPG")).expect("add");

        let updated = store
            .update(
                original.id,
                GamePatch {
                    title: Some("Chrono Quest II".to_string()),
                    ..GamePatch::default()
                },
            )
            .expect("update");

        assert_eq!(updated.id, original.id);
        assert_eq!(updated.created_at, original.created_at);
        assert_eq!(updated.title, "Chrono Quest II");
        assert_eq!(updated.category, "RPG");

        assert_eq!(
            store.update(99, GamePatch::default()),
            Err(StoreError::GameNotFound(99))
        );
    }

    #[test]
    fn remove_unknown_id_fails() {
        let dir = tempdir().expect("tempdir");
        let store = CatalogStore::open(dir.path().join("games.json"));
        assert_eq!(store.remove(7), Err(StoreError::GameNotFound(7)));
    }

    #[test]
    fn title_search_is_substring_and_case_insensitive() {
        let dir = tempdir().expect("tempdir");
        let store = CatalogStore::open(dir.path().join("games.json"));
        store.add(sample("Warframe", "Action")).expect("add");
        store.add(sample("Total War", "Strategy")).expect("add");
        store.add(sample("Starcraft", "Strategy")).expect("add");

        let hits = store.search_by_title("war");
        let titles: Vec<_> = hits.iter().map(|game| game.title.as_str()).collect();
        assert_eq!(titles, vec!["Warframe", "Total War"]);

        assert!(store.search_by_title("").is_empty());
        assert!(store.search_by_title("   ").is_empty());
    }

    #[test]
    fn category_filter_is_exact_and_case_insensitive() {
        let dir = tempdir().expect("tempdir");
        let store = CatalogStore::open(dir.path().join("games.json"));
        store.add(sample("Warframe", "Action")).expect("add");
        store.add(sample("Total War", "Strategy")).expect("add");

        let hits = store.filter_by_category("strategy");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "Total War");
        // Substrings do not match.
        assert!(store.filter_by_category("strat").is_empty());
    }

    #[test]
    fn all_returns_a_defensive_copy() {
        let dir = tempdir().expect("tempdir");
        let store = CatalogStore::open(dir.path().join("games.json"));
        store.add(sample("Chrono Quest", "RPG")).expect("add");

        let mut snapshot = store.all();
        snapshot[0].title = "Tampered".to_string();
        snapshot.clear();

        assert_eq!(store.get(1).expect("get").title, "Chrono Quest");
    }

    #[test]
    fn collection_round_trips_through_the_backing_file() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("games.json");

        {
            let store = CatalogStore::open(&path);
            store
                .add(NewGame {
                    title: "Chrono Quest".to_string(),
                    category: "RPG".to_string(),
                    release_year: Some(1999),
                    score: Some(9.1),
                    ..NewGame::default()
                })
                .expect("add");
        }

        let reopened = CatalogStore::open(&path);
        let games = reopened.all();
        assert_eq!(games.len(), 1);
        assert_eq!(games[0].release_year, Some(1999));
        assert_eq!(games[0].score, 9.1);

        let next = reopened.add(sample("Warframe", "Action")).expect("add");
        assert_eq!(next.id, 2);
    }

    #[test]
    fn unreadable_file_loads_as_empty_collection() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("games.json");
        fs::write(&path, "not json at all").expect("write");

        let store = CatalogStore::open(&path);
        assert!(store.all().is_empty());
        let game = store.add(sample("Chrono Quest", "RPG")).expect("add");
        assert_eq!(game.id, 1);
    }
}
