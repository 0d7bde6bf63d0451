#![warn(clippy::all, missing_docs)]

//! Core domain logic for the ludoteca rental tracker.
//!
//! This crate hosts the data models, configuration handling,
//! authentication, and the two persistent stores (game catalogue and
//! rental ledger) used by the terminal UI and any future frontends.

pub mod auth;
pub mod catalog;
pub mod config;
pub mod error;
pub mod ledger;
pub mod models;

pub use auth::{authenticate, Role, Session};
pub use catalog::{CatalogStore, GamePatch, NewGame};
pub use config::AppConfig;
pub use error::StoreError;
pub use ledger::RentalLedger;
pub use models::{AgeRating, Customer, GameRecord, RentalRecord};
