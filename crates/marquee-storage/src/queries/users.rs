// SPDX-FileCopyrightText: 2026 Marquee Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! User account persistence. Emails are unique, compared case-insensitively.

use marquee_core::{MarqueeError, Password, User};
use rusqlite::{OptionalExtension, params};

use crate::database::{Database, is_unique_violation, map_tr_err};
use crate::queries::RecordStamp;

fn map_write_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> MarqueeError {
    if is_unique_violation(&e) {
        MarqueeError::DuplicateEmail
    } else {
        map_tr_err(e)
    }
}

/// Inserts a user and returns its store-assigned columns.
pub async fn insert_user(db: &Database, user: &User) -> Result<RecordStamp, MarqueeError> {
    let name = user.name.clone();
    let email = user.email.clone();
    let hash = user.password.hash().to_vec();
    let activated = user.activated;

    let conn = db.acquire().await?;
    conn.call(move |conn| {
        conn.query_row(
            "INSERT INTO users (name, email, password_hash, activated)
             VALUES (?1, ?2, ?3, ?4)
             RETURNING id, created_at, version",
            params![name, email, hash, activated],
            RecordStamp::from_row,
        )
    })
    .await
    .map_err(map_write_err)
}

/// Looks a user up by email.
pub async fn get_user_by_email(db: &Database, email: &str) -> Result<User, MarqueeError> {
    let email = email.to_string();

    let conn = db.acquire().await?;
    conn.call(move |conn| {
        conn.query_row(
            "SELECT id, created_at, name, email, password_hash, activated, version
             FROM users WHERE email = ?1",
            params![email],
            |row| {
                Ok(User {
                    id: row.get(0)?,
                    created_at: row.get(1)?,
                    name: row.get(2)?,
                    email: row.get(3)?,
                    password: Password::from_hash(row.get(4)?),
                    activated: row.get(5)?,
                    version: row.get(6)?,
                })
            },
        )
        .optional()
    })
    .await
    .map_err(map_tr_err)?
    .ok_or(MarqueeError::NotFound)
}

/// Writes `user` if its version is current and returns the new version.
pub async fn update_user(db: &Database, user: &User) -> Result<i64, MarqueeError> {
    let id = user.id;
    let expected_version = user.version;
    let name = user.name.clone();
    let email = user.email.clone();
    let hash = user.password.hash().to_vec();
    let activated = user.activated;

    let conn = db.acquire().await?;
    conn.call(move |conn| {
        conn.query_row(
            "UPDATE users
             SET name = ?1, email = ?2, password_hash = ?3, activated = ?4, version = version + 1
             WHERE id = ?5 AND version = ?6
             RETURNING version",
            params![name, email, hash, activated, id, expected_version],
            |row| row.get(0),
        )
        .optional()
    })
    .await
    .map_err(map_write_err)?
    .ok_or(MarqueeError::EditConflict)
}
