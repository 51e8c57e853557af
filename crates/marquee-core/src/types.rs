// SPDX-FileCopyrightText: 2026 Marquee Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain records and their request-side input shapes.

use std::fmt;

use chrono::Datelike;
use serde::{Deserialize, Serialize};

use crate::filters::Filters;
use crate::password::Password;
use crate::runtime::Runtime;
use crate::validator::{self, EMAIL_RX, MAX_TEXT_BYTES, Validator};

/// Columns a movie listing may be sorted by.
pub const MOVIE_SORT_SAFELIST: &[&str] = &["id", "title", "year", "runtime"];

/// Earliest year a movie may claim.
pub const MIN_YEAR: i32 = 1888;

pub const MAX_GENRES: usize = 5;
pub const MIN_PASSWORD_BYTES: usize = 8;
pub const MAX_PASSWORD_BYTES: usize = 72;

fn is_zero_i32(n: &i32) -> bool {
    *n == 0
}

/// A catalog entry. `id`, `created_at` and `version` are owned by the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Movie {
    pub id: i64,
    #[serde(skip)]
    pub created_at: String,
    pub title: String,
    #[serde(skip_serializing_if = "is_zero_i32")]
    pub year: i32,
    #[serde(skip_serializing_if = "Runtime::is_zero")]
    pub runtime: Runtime,
    #[serde(rename = "genre", skip_serializing_if = "Vec::is_empty")]
    pub genres: Vec<String>,
    #[serde(rename = "info_version")]
    pub version: i64,
}

impl Movie {
    pub fn validate(&self, v: &mut Validator) {
        v.check(!self.title.is_empty(), "title", "must be provided");
        v.check(
            self.title.len() <= MAX_TEXT_BYTES,
            "title",
            "must not be more than 500 bytes",
        );

        v.check(self.year != 0, "year", "must be provided");
        v.check(self.year >= MIN_YEAR, "year", "must be greater than 1888");
        v.check(
            self.year <= chrono::Utc::now().year(),
            "year",
            "must not be in the future",
        );

        v.check(!self.runtime.is_zero(), "runtime", "must be provided");
        v.check(
            self.runtime.minutes() > 0,
            "runtime",
            "must be a positive integer",
        );

        v.check(
            !self.genres.is_empty(),
            "genres",
            "must contain at least 1 genre",
        );
        v.check(
            self.genres.len() <= MAX_GENRES,
            "genres",
            "must not contain more than 5 genres",
        );
        v.check(
            validator::unique(&self.genres),
            "genres",
            "must not contain duplicate values",
        );
        v.check(
            self.genres.iter().all(|g| !g.is_empty()),
            "genres",
            "must not contain empty values",
        );
    }

    /// Applies the fields present in `patch`, leaving the rest untouched.
    pub fn apply(&mut self, patch: MoviePatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(year) = patch.year {
            self.year = year;
        }
        if let Some(runtime) = patch.runtime {
            self.runtime = runtime;
        }
        if let Some(genres) = patch.genres {
            self.genres = genres;
        }
    }
}

/// Request body for creating a movie. Missing fields decode as zero values
/// and are then reported by validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NewMovie {
    pub title: String,
    pub year: i32,
    pub runtime: Runtime,
    pub genres: Vec<String>,
}

impl From<NewMovie> for Movie {
    fn from(input: NewMovie) -> Self {
        Movie {
            title: input.title,
            year: input.year,
            runtime: input.runtime,
            genres: input.genres,
            ..Movie::default()
        }
    }
}

/// Request body for a partial update. `None` means the field was not sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MoviePatch {
    pub title: Option<String>,
    pub year: Option<i32>,
    pub runtime: Option<Runtime>,
    pub genres: Option<Vec<String>>,
}

/// Search and paging parameters for listing movies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovieQuery {
    /// Plain words that must all appear in the title; empty matches all.
    pub title: String,
    /// Genres the movie must carry; empty matches all.
    pub genres: Vec<String>,
    pub filters: Filters,
}

/// A registered account. The password never appears in serialized output.
#[derive(Serialize)]
pub struct User {
    pub id: i64,
    pub created_at: String,
    pub name: String,
    pub email: String,
    #[serde(skip)]
    pub password: Password,
    pub activated: bool,
    #[serde(skip)]
    pub version: i64,
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("created_at", &self.created_at)
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &self.password)
            .field("activated", &self.activated)
            .field("version", &self.version)
            .finish()
    }
}

impl User {
    /// Builds an unsaved, inactive user, hashing `password`.
    pub fn new(name: String, email: String, password: &str) -> Result<Self, crate::MarqueeError> {
        Ok(Self {
            id: 0,
            created_at: String::new(),
            name,
            email,
            password: Password::set(password)?,
            activated: false,
            version: 0,
        })
    }

    pub fn validate(&self, v: &mut Validator) {
        v.check(!self.name.is_empty(), "name", "must be provided");
        v.check(
            self.name.len() <= MAX_TEXT_BYTES,
            "name",
            "must not be more than 500 bytes",
        );
        validate_email(v, &self.email);
        if let Some(plaintext) = self.password.plaintext() {
            validate_password_plaintext(v, plaintext);
        }
    }
}

pub fn validate_email(v: &mut Validator, email: &str) {
    v.check(!email.is_empty(), "email", "must be provided");
    v.check(
        validator::matches(email, &EMAIL_RX),
        "email",
        "must be a valid email address",
    );
}

pub fn validate_password_plaintext(v: &mut Validator, password: &str) {
    v.check(!password.is_empty(), "password", "must be provided");
    v.check(
        password.len() >= MIN_PASSWORD_BYTES,
        "password",
        "must be at least 8 bytes long",
    );
    v.check(
        password.len() <= MAX_PASSWORD_BYTES,
        "password",
        "must not be more than 72 bytes long",
    );
}

/// Request body for registering a user.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_movie() -> Movie {
        Movie {
            title: "Pathaan".into(),
            year: 2023,
            runtime: Runtime(146),
            genres: vec!["Action".into()],
            ..Movie::default()
        }
    }

    fn errors_for(movie: &Movie) -> Validator {
        let mut v = Validator::new();
        movie.validate(&mut v);
        v
    }

    #[test]
    fn valid_movie_passes() {
        assert!(errors_for(&valid_movie()).is_valid());
    }

    #[test]
    fn empty_movie_reports_every_field() {
        let v = errors_for(&Movie::default());
        let errs = v.errors();
        assert_eq!(errs["title"], "must be provided");
        assert_eq!(errs["year"], "must be provided");
        assert_eq!(errs["runtime"], "must be provided");
        assert_eq!(errs["genres"], "must contain at least 1 genre");
    }

    #[test]
    fn year_bounds() {
        let this_year = chrono::Utc::now().year();
        for (year, ok) in [
            (1887, false),
            (1888, true),
            (this_year, true),
            (this_year + 1, false),
        ] {
            let movie = Movie {
                year,
                ..valid_movie()
            };
            let v = errors_for(&movie);
            assert_eq!(!v.errors().contains_key("year"), ok, "year {year}");
        }
    }

    #[test]
    fn genre_rules() {
        let cases: [(Vec<&str>, Option<&str>); 4] = [
            (vec![], Some("must contain at least 1 genre")),
            (
                vec!["a", "b", "c", "d", "e", "f"],
                Some("must not contain more than 5 genres"),
            ),
            (vec!["drama", "drama"], Some("must not contain duplicate values")),
            (vec!["a", "b", "c", "d", "e"], None),
        ];
        for (genres, expected) in cases {
            let movie = Movie {
                genres: genres.iter().map(|g| g.to_string()).collect(),
                ..valid_movie()
            };
            let v = errors_for(&movie);
            assert_eq!(v.errors().get("genres").map(String::as_str), expected);
        }
    }

    #[test]
    fn long_title_and_negative_runtime() {
        let movie = Movie {
            title: "x".repeat(501),
            runtime: Runtime(-5),
            ..valid_movie()
        };
        let v = errors_for(&movie);
        assert_eq!(v.errors()["title"], "must not be more than 500 bytes");
        assert_eq!(v.errors()["runtime"], "must be a positive integer");
    }

    #[test]
    fn movie_wire_shape() {
        let movie = Movie {
            id: 7,
            created_at: "2024-01-01T00:00:00Z".into(),
            version: 1,
            ..valid_movie()
        };
        let json = serde_json::to_value(&movie).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "id": 7,
                "title": "Pathaan",
                "year": 2023,
                "runtime": "146 mins",
                "genre": ["Action"],
                "info_version": 1
            })
        );
    }

    #[test]
    fn zero_fields_are_omitted() {
        let movie = Movie {
            id: 1,
            title: "Untitled".into(),
            version: 1,
            ..Movie::default()
        };
        let json = serde_json::to_value(&movie).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"id": 1, "title": "Untitled", "info_version": 1})
        );
    }

    #[test]
    fn patch_preserves_absent_fields() {
        let mut movie = valid_movie();
        let patch: MoviePatch = serde_json::from_str(r#"{"year": 2024}"#).unwrap();
        movie.apply(patch);
        assert_eq!(movie.year, 2024);
        assert_eq!(movie.title, "Pathaan");
        assert_eq!(movie.runtime, Runtime(146));
        assert_eq!(movie.genres, vec!["Action".to_string()]);
    }

    #[test]
    fn new_movie_rejects_unknown_fields() {
        let err = serde_json::from_str::<NewMovie>(r#"{"title":"X","bogus":1}"#).unwrap_err();
        assert!(err.to_string().contains("unknown field `bogus`"));
    }

    #[test]
    fn user_serialization_hides_secrets() {
        let user = User::new("Alice".into(), "alice@example.com".into(), "pa55word-long").unwrap();
        let json = serde_json::to_value(&user).unwrap();
        let obj = json.as_object().unwrap();
        assert_eq!(
            obj.keys().map(String::as_str).collect::<Vec<_>>(),
            vec!["id", "created_at", "name", "email", "activated"]
        );
        assert!(!json.to_string().contains("pa55word"));
        assert!(!format!("{user:?}").contains("pa55word"));
    }

    #[test]
    fn user_validation() {
        let user = User::new(String::new(), "nope".into(), "short").unwrap();
        let mut v = Validator::new();
        user.validate(&mut v);
        assert_eq!(v.errors()["name"], "must be provided");
        assert_eq!(v.errors()["email"], "must be a valid email address");
        assert_eq!(v.errors()["password"], "must be at least 8 bytes long");

        let user = User::new("Bob".into(), "bob@example.com".into(), &"p".repeat(73)).unwrap();
        let mut v = Validator::new();
        user.validate(&mut v);
        assert_eq!(v.errors().len(), 1);
        assert_eq!(v.errors()["password"], "must not be more than 72 bytes long");
    }

    #[test]
    fn stored_user_skips_password_rules() {
        let user = User {
            id: 1,
            created_at: "2024-01-01T00:00:00Z".into(),
            name: "Carol".into(),
            email: "carol@example.com".into(),
            password: Password::from_hash(b"$argon2id$stub".to_vec()),
            activated: true,
            version: 2,
        };
        let mut v = Validator::new();
        user.validate(&mut v);
        assert!(v.is_valid());
    }
}
