//! Shared domain records.
//!
//! Field names on disk are the camelCase names used by the pre-existing
//! JSON data files, so an old catalogue loads unchanged.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Age rating assigned to a game.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgeRating {
    /// Suitable for all ages.
    #[default]
    Free,
    /// Ten years and older.
    #[serde(rename = "10+")]
    TenPlus,
    /// Twelve years and older.
    #[serde(rename = "12+")]
    TwelvePlus,
    /// Fourteen years and older.
    #[serde(rename = "14+")]
    FourteenPlus,
    /// Sixteen years and older.
    #[serde(rename = "16+")]
    SixteenPlus,
    /// Adults only.
    #[serde(rename = "18+")]
    EighteenPlus,
}

impl AgeRating {
    /// Every rating, in ascending order of restriction.
    pub const ALL: [AgeRating; 6] = [
        AgeRating::Free,
        AgeRating::TenPlus,
        AgeRating::TwelvePlus,
        AgeRating::FourteenPlus,
        AgeRating::SixteenPlus,
        AgeRating::EighteenPlus,
    ];

    /// The label shown to users and written to disk.
    pub fn label(&self) -> &'static str {
        match self {
            AgeRating::Free => "Free",
            AgeRating::TenPlus => "10+",
            AgeRating::TwelvePlus => "12+",
            AgeRating::FourteenPlus => "14+",
            AgeRating::SixteenPlus => "16+",
            AgeRating::EighteenPlus => "18+",
        }
    }
}

impl fmt::Display for AgeRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Error returned when a string is not one of the rating labels.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognised age rating")]
pub struct ParseRatingError;

impl FromStr for AgeRating {
    type Err = ParseRatingError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        AgeRating::ALL
            .into_iter()
            .find(|rating| rating.label().eq_ignore_ascii_case(input.trim()))
            .ok_or(ParseRatingError)
    }
}

/// A game held in the rental catalogue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameRecord {
    /// Unique identifier, never reused after deletion.
    pub id: u64,
    /// Game title.
    pub title: String,
    /// Category or genre.
    pub category: String,
    /// Release year, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_year: Option<i32>,
    /// Studio that developed the game.
    #[serde(default = "unknown_company")]
    pub developer: String,
    /// Company that published the game.
    #[serde(default = "unknown_company")]
    pub publisher: String,
    /// Age rating label.
    #[serde(default)]
    pub age_rating: AgeRating,
    /// Review score, 0 to 10.
    #[serde(default)]
    pub score: f64,
    /// Whether the game is on the shelf or out on rental.
    pub available: bool,
    /// Timestamp of first registration, immutable afterwards.
    pub created_at: DateTime<Utc>,
}

impl GameRecord {
    /// Returns a user-facing label combining title and release year.
    pub fn display_title(&self) -> String {
        match self.release_year {
            Some(year) => format!("{} ({year})", self.title),
            None => self.title.clone(),
        }
    }
}

fn unknown_company() -> String {
    "Unknown".to_string()
}

/// Customer details captured when a rental is opened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    /// Full name.
    pub name: String,
    /// Identity document number.
    pub document_id: String,
    /// Optional phone or e-mail.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
}

/// A rental transaction, open or closed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RentalRecord {
    /// Generated rental code, the transaction's key.
    pub code: String,
    /// Id of the rented game at rental time. Not kept in sync with
    /// later catalogue deletions.
    pub game_id: u64,
    /// Snapshot of the game's title at rental time.
    pub title: String,
    /// Who rented the game.
    pub customer: Customer,
    /// When the rental was opened.
    pub rented_at: DateTime<Utc>,
    /// Whether the game has come back.
    pub returned: bool,
    /// When the rental was closed, if it has been.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub returned_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rating_labels_round_trip() {
        for rating in AgeRating::ALL {
            assert_eq!(rating.label().parse::<AgeRating>(), Ok(rating));
        }
        assert_eq!("free".parse::<AgeRating>(), Ok(AgeRating::Free));
        assert_eq!(" 18+ ".parse::<AgeRating>(), Ok(AgeRating::EighteenPlus));
        assert!("17+".parse::<AgeRating>().is_err());
    }

    #[test]
    fn game_record_serialises_with_legacy_field_names() {
        let record = GameRecord {
            id: 3,
            title: "Chrono Quest".to_string(),
            category: "RPG".to_string(),
            release_year: None,
            developer: "Unknown".to_string(),
            publisher: "Unknown".to_string(),
            age_rating: AgeRating::TwelvePlus,
            score: 8.5,
            available: true,
            created_at: Utc::now(),
        };

        let value = serde_json::to_value(&record).expect("serialise record");
        let object = value.as_object().expect("object");
        assert!(object.contains_key("createdAt"));
        assert_eq!(object["ageRating"], "12+");
        // Absent year is omitted entirely, matching the legacy files.
        assert!(!object.contains_key("releaseYear"));
    }

    #[test]
    fn rental_record_serialises_with_legacy_field_names() {
        let record = RentalRecord {
            code: "LOC-abc-001".to_string(),
            game_id: 1,
            title: "Chrono Quest".to_string(),
            customer: Customer {
                name: "Ana".to_string(),
                document_id: "123".to_string(),
                contact: None,
            },
            rented_at: Utc::now(),
            returned: false,
            returned_at: None,
        };

        let value = serde_json::to_value(&record).expect("serialise record");
        let object = value.as_object().expect("object");
        assert!(object.contains_key("gameId"));
        assert!(object.contains_key("rentedAt"));
        assert!(!object.contains_key("returnedAt"));
        let customer = object["customer"].as_object().expect("customer object");
        assert!(customer.contains_key("documentId"));
        assert!(!customer.contains_key("contact"));
    }
}
