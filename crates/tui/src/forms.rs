//! Modal input state for the login, game, and rental forms.
//!
//! Raw input is validated here, before the core stores are called: required
//! fields, 4-digit years, rating membership, and the 0-10 score range.

use once_cell::sync::Lazy;
use regex::Regex;

use ludoteca_core::{
    catalog::{GamePatch, NewGame},
    models::{AgeRating, Customer, GameRecord},
};

const MAX_FIELD_LEN: usize = 64;

static YEAR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}$").expect("failed to compile year regex"));

/// One editable line in a modal form.
#[derive(Debug, Clone)]
pub struct TextField {
    pub label: &'static str,
    pub value: String,
    pub masked: bool,
}

impl TextField {
    fn new(label: &'static str) -> Self {
        Self {
            label,
            value: String::new(),
            masked: false,
        }
    }

    fn with_value(label: &'static str, value: String) -> Self {
        Self {
            label,
            value,
            masked: false,
        }
    }

    fn masked(label: &'static str) -> Self {
        Self {
            label,
            value: String::new(),
            masked: true,
        }
    }

    pub fn push(&mut self, ch: char) {
        if self.value.len() >= MAX_FIELD_LEN {
            return;
        }
        if ch.is_ascii() && !ch.is_ascii_control() {
            self.value.push(ch);
        }
    }

    pub fn backspace(&mut self) {
        self.value.pop();
    }

    /// The text rendered in the form; masked fields show asterisks.
    pub fn display_value(&self) -> String {
        if self.masked {
            "*".repeat(self.value.chars().count())
        } else {
            self.value.clone()
        }
    }
}

/// Shared cursor behaviour for the fixed-size field lists below.
fn step(cursor: &mut usize, len: usize, delta: isize) {
    let last = len.saturating_sub(1) as isize;
    let mut next = *cursor as isize + delta;
    if next < 0 {
        next = 0;
    } else if next > last {
        next = last;
    }
    *cursor = next as usize;
}

/// Username/password prompt shown before any other screen.
#[derive(Debug, Clone)]
pub struct LoginForm {
    pub fields: [TextField; 2],
    pub cursor: usize,
    pub error: Option<String>,
}

impl LoginForm {
    pub fn new() -> Self {
        Self {
            fields: [TextField::new("Username"), TextField::masked("Password")],
            cursor: 0,
            error: None,
        }
    }

    pub fn active_mut(&mut self) -> &mut TextField {
        &mut self.fields[self.cursor]
    }

    pub fn focus_next(&mut self) {
        step(&mut self.cursor, self.fields.len(), 1);
    }

    pub fn focus_prev(&mut self) {
        step(&mut self.cursor, self.fields.len(), -1);
    }

    pub fn username(&self) -> &str {
        self.fields[0].value.trim()
    }

    pub fn password(&self) -> &str {
        &self.fields[1].value
    }

    /// Clear the password and report a failed attempt.
    pub fn reject(&mut self, message: impl Into<String>) {
        self.fields[1].value.clear();
        self.cursor = 0;
        self.error = Some(message.into());
    }
}

/// Validated game input, ready to become a [`NewGame`] or [`GamePatch`].
#[derive(Debug, Clone)]
pub struct GameDraft {
    pub title: String,
    pub category: String,
    pub release_year: Option<i32>,
    pub developer: Option<String>,
    pub publisher: Option<String>,
    pub age_rating: Option<AgeRating>,
    pub score: Option<f64>,
}

impl GameDraft {
    pub fn into_new_game(self) -> NewGame {
        NewGame {
            title: self.title,
            category: self.category,
            release_year: self.release_year,
            developer: self.developer,
            publisher: self.publisher,
            age_rating: self.age_rating,
            score: self.score,
        }
    }

    pub fn into_patch(self) -> GamePatch {
        GamePatch {
            title: Some(self.title),
            category: Some(self.category),
            release_year: self.release_year,
            developer: self.developer,
            publisher: self.publisher,
            age_rating: self.age_rating,
            score: self.score,
        }
    }
}

const FIELD_TITLE: usize = 0;
const FIELD_CATEGORY: usize = 1;
const FIELD_YEAR: usize = 2;
const FIELD_DEVELOPER: usize = 3;
const FIELD_PUBLISHER: usize = 4;
const FIELD_RATING: usize = 5;
const FIELD_SCORE: usize = 6;

/// Add/edit form for a catalogue entry.
#[derive(Debug, Clone)]
pub struct GameForm {
    /// Id of the record being edited; `None` when adding.
    pub editing: Option<u64>,
    pub fields: [TextField; 7],
    pub cursor: usize,
    pub error: Option<String>,
}

impl GameForm {
    pub fn for_new() -> Self {
        Self {
            editing: None,
            fields: [
                TextField::new("Title"),
                TextField::new("Category"),
                TextField::new("Release year"),
                TextField::new("Developer"),
                TextField::new("Publisher"),
                TextField::new("Age rating"),
                TextField::new("Score"),
            ],
            cursor: 0,
            error: None,
        }
    }

    pub fn for_edit(game: &GameRecord) -> Self {
        Self {
            editing: Some(game.id),
            fields: [
                TextField::with_value("Title", game.title.clone()),
                TextField::with_value("Category", game.category.clone()),
                TextField::with_value(
                    "Release year",
                    game.release_year.map(|year| year.to_string()).unwrap_or_default(),
                ),
                TextField::with_value("Developer", game.developer.clone()),
                TextField::with_value("Publisher", game.publisher.clone()),
                TextField::with_value("Age rating", game.age_rating.label().to_string()),
                TextField::with_value("Score", format!("{}", game.score)),
            ],
            cursor: 0,
            error: None,
        }
    }

    pub fn active_mut(&mut self) -> &mut TextField {
        &mut self.fields[self.cursor]
    }

    pub fn focus_next(&mut self) {
        step(&mut self.cursor, self.fields.len(), 1);
    }

    pub fn focus_prev(&mut self) {
        step(&mut self.cursor, self.fields.len(), -1);
    }

    pub fn on_last_field(&self) -> bool {
        self.cursor + 1 == self.fields.len()
    }

    /// Check every field and build a draft, or explain what is wrong.
    pub fn validate(&self) -> Result<GameDraft, String> {
        let title = self.fields[FIELD_TITLE].value.trim();
        if title.is_empty() {
            return Err("Title is required".to_string());
        }
        let category = self.fields[FIELD_CATEGORY].value.trim();
        if category.is_empty() {
            return Err("Category is required".to_string());
        }

        let year_input = self.fields[FIELD_YEAR].value.trim();
        let release_year = if year_input.is_empty() {
            None
        } else if YEAR_RE.is_match(year_input) {
            year_input.parse::<i32>().ok()
        } else {
            return Err("Release year must be a 4-digit year".to_string());
        };

        let rating_input = self.fields[FIELD_RATING].value.trim();
        let age_rating = if rating_input.is_empty() {
            None
        } else {
            match rating_input.parse::<AgeRating>() {
                Ok(rating) => Some(rating),
                Err(_) => {
                    let labels: Vec<_> = AgeRating::ALL
                        .iter()
                        .map(|rating| rating.label())
                        .collect();
                    return Err(format!("Age rating must be one of: {}", labels.join(", ")));
                }
            }
        };

        let score_input = self.fields[FIELD_SCORE].value.trim();
        let score = if score_input.is_empty() {
            None
        } else {
            match score_input.parse::<f64>() {
                Ok(score) if (0.0..=10.0).contains(&score) => Some(score),
                _ => return Err("Score must be a number between 0 and 10".to_string()),
            }
        };

        Ok(GameDraft {
            title: title.to_string(),
            category: category.to_string(),
            release_year,
            developer: non_blank(&self.fields[FIELD_DEVELOPER].value),
            publisher: non_blank(&self.fields[FIELD_PUBLISHER].value),
            age_rating,
            score,
        })
    }
}

/// Customer prompt shown when opening a rental for a selected game.
#[derive(Debug, Clone)]
pub struct RentForm {
    pub game_id: u64,
    pub game_label: String,
    pub fields: [TextField; 3],
    pub cursor: usize,
    pub error: Option<String>,
}

impl RentForm {
    pub fn new(game: &GameRecord) -> Self {
        Self {
            game_id: game.id,
            game_label: game.display_title(),
            fields: [
                TextField::new("Customer name"),
                TextField::new("Document id"),
                TextField::new("Contact"),
            ],
            cursor: 0,
            error: None,
        }
    }

    pub fn active_mut(&mut self) -> &mut TextField {
        &mut self.fields[self.cursor]
    }

    pub fn focus_next(&mut self) {
        step(&mut self.cursor, self.fields.len(), 1);
    }

    pub fn focus_prev(&mut self) {
        step(&mut self.cursor, self.fields.len(), -1);
    }

    pub fn on_last_field(&self) -> bool {
        self.cursor + 1 == self.fields.len()
    }

    /// Check the customer fields, contact being the only optional one.
    pub fn validate(&self) -> Result<Customer, String> {
        let name = self.fields[0].value.trim();
        if name.is_empty() {
            return Err("Customer name is required".to_string());
        }
        let document_id = self.fields[1].value.trim();
        if document_id.is_empty() {
            return Err("Document id is required".to_string());
        }
        Ok(Customer {
            name: name.to_string(),
            document_id: document_id.to_string(),
            contact: non_blank(&self.fields[2].value),
        })
    }
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled_game_form() -> GameForm {
        let mut form = GameForm::for_new();
        form.fields[FIELD_TITLE].value = "Chrono Quest".to_string();
        form.fields[FIELD_CATEGORY].value = "RPG".to_string();
        form
    }

    #[test]
    fn minimal_game_form_validates_with_defaults_left_unset() {
        let draft = filled_game_form().validate().expect("valid draft");
        assert_eq!(draft.title, "Chrono Quest");
        assert_eq!(draft.category, "RPG");
        assert!(draft.release_year.is_none());
        assert!(draft.age_rating.is_none());
        assert!(draft.score.is_none());
    }

    #[test]
    fn game_form_requires_title_and_category() {
        let form = GameForm::for_new();
        assert_eq!(form.validate().unwrap_err(), "Title is required");

        let mut form = GameForm::for_new();
        form.fields[FIELD_TITLE].value = "Chrono Quest".to_string();
        assert_eq!(form.validate().unwrap_err(), "Category is required");
    }

    #[test]
    fn game_form_rejects_bad_year_rating_and_score() {
        let mut form = filled_game_form();
        form.fields[FIELD_YEAR].value = "99".to_string();
        assert!(form.validate().unwrap_err().contains("4-digit"));

        let mut form = filled_game_form();
        form.fields[FIELD_RATING].value = "17+".to_string();
        assert!(form.validate().unwrap_err().contains("Age rating"));

        let mut form = filled_game_form();
        form.fields[FIELD_SCORE].value = "11".to_string();
        assert!(form.validate().unwrap_err().contains("between 0 and 10"));
    }

    #[test]
    fn game_form_accepts_the_full_field_set() {
        let mut form = filled_game_form();
        form.fields[FIELD_YEAR].value = "1999".to_string();
        form.fields[FIELD_DEVELOPER].value = "Square".to_string();
        form.fields[FIELD_RATING].value = "12+".to_string();
        form.fields[FIELD_SCORE].value = "9.5".to_string();

        let draft = form.validate().expect("valid draft");
        assert_eq!(draft.release_year, Some(1999));
        assert_eq!(draft.developer.as_deref(), Some("Square"));
        assert_eq!(draft.age_rating, Some(AgeRating::TwelvePlus));
        assert_eq!(draft.score, Some(9.5));
    }

    #[test]
    fn rent_form_requires_name_and_document() {
        let game = GameRecord {
            id: 1,
            title: "Chrono Quest".to_string(),
            category: "RPG".to_string(),
            release_year: None,
            developer: "Unknown".to_string(),
            publisher: "Unknown".to_string(),
            age_rating: AgeRating::Free,
            score: 0.0,
            available: true,
            created_at: chrono::Utc::now(),
        };

        let mut form = RentForm::new(&game);
        assert!(form.validate().is_err());
        form.fields[0].value = "Ana".to_string();
        assert!(form.validate().is_err());
        form.fields[1].value = "123".to_string();
        let customer = form.validate().expect("valid customer");
        assert_eq!(customer.name, "Ana");
        assert!(customer.contact.is_none());
    }

    #[test]
    fn password_field_is_masked() {
        let mut form = LoginForm::new();
        form.focus_next();
        form.active_mut().push('a');
        form.active_mut().push('b');
        assert_eq!(form.fields[1].display_value(), "**");
        assert_eq!(form.password(), "ab");
    }
}
