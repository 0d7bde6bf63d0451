//! Rental transactions and their coupling to game availability.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use chrono::Utc;
use parking_lot::RwLock;
use rand::Rng;
use tracing::warn;

use crate::{
    catalog::CatalogStore,
    error::StoreError,
    models::{Customer, RentalRecord},
};

/// Handle to the rental ledger. Cheap to clone; all clones share state.
///
/// The ledger owns the rental collection and coordinates with the
/// catalogue: opening a rental flips the game's availability off, closing
/// it flips it back on. The availability flag is the only guard against
/// double-renting.
#[derive(Clone)]
pub struct RentalLedger {
    inner: Arc<RwLock<Inner>>,
    catalog: CatalogStore,
}

struct Inner {
    path: PathBuf,
    rentals: Vec<RentalRecord>,
}

impl RentalLedger {
    /// Open the ledger over the given backing file, coordinating
    /// availability through the given catalogue handle.
    ///
    /// A missing or unreadable file is an empty ledger, never an error.
    pub fn open(path: impl Into<PathBuf>, catalog: CatalogStore) -> Self {
        let path = path.into();
        let rentals = read_rentals(&path);
        Self {
            inner: Arc::new(RwLock::new(Inner { path, rentals })),
            catalog,
        }
    }

    /// Open a rental against an available game.
    ///
    /// Fails with [`StoreError::GameNotFound`] for an unknown id and
    /// [`StoreError::GameUnavailable`] for a game already out on rental.
    pub fn rent(&self, game_id: u64, customer: Customer) -> Result<RentalRecord, StoreError> {
        let game = self
            .catalog
            .get(game_id)
            .ok_or(StoreError::GameNotFound(game_id))?;
        if !game.available {
            return Err(StoreError::GameUnavailable(game_id));
        }

        let mut inner = self.inner.write();
        let mut code = generate_code();
        while inner.rentals.iter().any(|rental| rental.code == code) {
            code = generate_code();
        }

        let record = RentalRecord {
            code,
            game_id,
            title: game.title,
            customer,
            rented_at: Utc::now(),
            returned: false,
            returned_at: None,
        };

        self.catalog.set_available(game_id, false)?;
        inner.rentals.push(record.clone());
        inner.persist();
        Ok(record)
    }

    /// Close the rental with the given code.
    ///
    /// Fails with [`StoreError::RentalNotFound`] for an unknown code and
    /// [`StoreError::AlreadyReturned`] for a rental already closed. A
    /// referenced game that was removed from the catalogue in the meantime
    /// is logged and the return still completes.
    pub fn return_rental(&self, code: &str) -> Result<RentalRecord, StoreError> {
        let mut inner = self.inner.write();
        let rental = inner
            .rentals
            .iter_mut()
            .find(|rental| rental.code == code)
            .ok_or_else(|| StoreError::RentalNotFound(code.to_string()))?;
        if rental.returned {
            return Err(StoreError::AlreadyReturned(code.to_string()));
        }

        rental.returned = true;
        rental.returned_at = Some(Utc::now());
        let record = rental.clone();

        if let Err(err) = self.catalog.set_available(record.game_id, true) {
            warn!(
                "game {} missing while returning rental {code}: {err}",
                record.game_id
            );
        }
        inner.persist();
        Ok(record)
    }

    /// Snapshot of every rental, open and closed, in append order.
    pub fn all(&self) -> Vec<RentalRecord> {
        self.inner.read().rentals.clone()
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
        match serde_json::to_vec_pretty(&self.rentals) {
            Ok(serialised) => {
                if let Err(err) = fs::write(&self.path, serialised) {
                    warn!("failed to write {}: {err}", self.path.display());
                }
            }
            Err(err) => warn!("failed to serialise ledger: {err}"),
        }
    }
}

fn read_rentals(path: &Path) -> Vec<RentalRecord> {
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
        Ok(rentals) => rentals,
        Err(err) => {
            warn!("failed to parse {}: {err}", path.display());
            Vec::new()
        }
    }
}

/// Generate a rental code: millisecond timestamp in base 36 plus a random
/// three-digit suffix. Collisions within one session are re-drawn by the
/// caller.
fn generate_code() -> String {
    let millis = Utc::now().timestamp_millis().unsigned_abs();
    let suffix: u16 = rand::thread_rng().gen_range(0..1000);
    format!("LOC-{}-{suffix:03}", to_base36(millis))
}

fn to_base36(mut value: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_string();
    }
    let mut out = String::new();
    while value > 0 {
        out.insert(0, DIGITS[(value % 36) as usize] as char);
        value /= 36;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::NewGame;
    use tempfile::tempdir;

    fn customer(name: &str) -> Customer {
        Customer {
            name: name.to_string(),
            document_id: "123".to_string(),
            contact: None,
        }
    }

    fn fixture(dir: &Path) -> (CatalogStore, RentalLedger) {
        let catalog = CatalogStore::open(dir.join("games.json"));
        let ledger = RentalLedger::open(dir.join("rentals.json"), catalog.clone());
        (catalog, ledger)
    }

    #[test]
    fn rental_lifecycle_end_to_end() {
        let dir = tempdir().expect("tempdir");
        let (catalog, ledger) = fixture(dir.path());

        let game = catalog
            .add(NewGame {
                title: "Chrono Quest".to_string(),
                category: "RPG".to_string(),
                ..NewGame::default()
            })
            .expect("add");
        assert_eq!(game.id, 1);
        assert!(game.available);

        let rental = ledger.rent(1, customer("Ana")).expect("rent");
        assert_eq!(rental.game_id, 1);
        assert_eq!(rental.title, "Chrono Quest");
        assert!(!rental.returned);
        assert!(rental.returned_at.is_none());
        assert!(!catalog.get(1).expect("get").available);

        // The availability flag blocks a second rental of the same game.
        assert_eq!(
            ledger.rent(1, customer("Bruno")),
            Err(StoreError::GameUnavailable(1))
        );

        let closed = ledger.return_rental(&rental.code).expect("return");
        assert!(closed.returned);
        assert!(closed.returned_at.is_some());
        assert!(catalog.get(1).expect("get").available);

        assert_eq!(
            ledger.return_rental(&rental.code),
            Err(StoreError::AlreadyReturned(rental.code.clone()))
        );
    }

    #[test]
    fn renting_an_unknown_game_fails() {
        let dir = tempdir().expect("tempdir");
        let (_catalog, ledger) = fixture(dir.path());
        assert_eq!(
            ledger.rent(42, customer("Ana")),
            Err(StoreError::GameNotFound(42))
        );
        assert!(ledger.all().is_empty());
    }

    #[test]
    fn returning_an_unknown_code_fails() {
        let dir = tempdir().expect("tempdir");
        let (_catalog, ledger) = fixture(dir.path());
        assert_eq!(
            ledger.return_rental("LOC-nope-000"),
            Err(StoreError::RentalNotFound("LOC-nope-000".to_string()))
        );
    }

    #[test]
    fn game_becomes_rentable_again_after_return() {
        let dir = tempdir().expect("tempdir");
        let (catalog, ledger) = fixture(dir.path());
        catalog
            .add(NewGame {
                title: "Warframe".to_string(),
                category: "Action".to_string(),
                ..NewGame::default()
            })
            .expect("add");

        let first = ledger.rent(1, customer("Ana")).expect("rent");
        ledger.return_rental(&first.code).expect("return");
        let second = ledger.rent(1, customer("Bruno")).expect("rent again");

        assert_ne!(first.code, second.code);
        assert_eq!(ledger.all().len(), 2);
    }

    #[test]
    fn returning_survives_a_removed_game() {
        let dir = tempdir().expect("tempdir");
        let (catalog, ledger) = fixture(dir.path());
        catalog
            .add(NewGame {
                title: "Warframe".to_string(),
                category: "Action".to_string(),
                ..NewGame::default()
            })
            .expect("add");

        let rental = ledger.rent(1, customer("Ana")).expect("rent");
        catalog.remove(1).expect("remove");

        // The rental keeps its snapshot and can still be closed.
        let closed = ledger.return_rental(&rental.code).expect("return");
        assert_eq!(closed.title, "Warframe");
        assert_eq!(closed.game_id, 1);
    }

    #[test]
    fn ledger_round_trips_through_the_backing_file() {
        let dir = tempdir().expect("tempdir");
        let code;
        {
            let (catalog, ledger) = fixture(dir.path());
            catalog
                .add(NewGame {
                    title: "Chrono Quest".to_string(),
                    category: "RPG".to_string(),
                    ..NewGame::default()
                })
                .expect("add");
            code = ledger.rent(1, customer("Ana")).expect("rent").code;
        }

        let (catalog, ledger) = fixture(dir.path());
        let rentals = ledger.all();
        assert_eq!(rentals.len(), 1);
        assert_eq!(rentals[0].code, code);
        assert!(!rentals[0].returned);
        // Availability was persisted by the catalogue as well.
        assert!(!catalog.get(1).expect("get").available);

        ledger.return_rental(&code).expect("return");
        assert!(catalog.get(1).expect("get").available);
    }

    #[test]
    fn generated_codes_carry_the_expected_shape() {
        let code = generate_code();
        let parts: Vec<_> = code.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "LOC");
        assert!(!parts[1].is_empty());
        assert_eq!(parts[2].len(), 3);
        assert!(parts[2].chars().all(|ch| ch.is_ascii_digit()));
    }

    #[test]
    fn base36_encodes_known_values() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "z");
        assert_eq!(to_base36(36), "10");
        assert_eq!(to_base36(1295), "zz");
    }
}
