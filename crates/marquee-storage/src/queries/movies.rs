// SPDX-FileCopyrightText: 2026 Marquee Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Movie CRUD and search.
//!
//! Genres are stored as a JSON array in a TEXT column and matched with
//! `json_each`. Title search goes through the `movies_fts` FTS5 index.

use marquee_core::{MarqueeError, Movie, MovieQuery, Runtime};
use rusqlite::types::Type;
use rusqlite::{OptionalExtension, params};

use crate::database::{Database, map_tr_err};
use crate::queries::RecordStamp;

const MOVIE_COLUMNS: &str = "id, created_at, title, year, runtime, genres, version";

fn genres_to_json(genres: &[String]) -> Result<String, MarqueeError> {
    serde_json::to_string(genres)
        .map_err(|e| MarqueeError::Internal(format!("failed to encode genres: {e}")))
}

fn movie_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Movie> {
    let genres: String = row.get(5)?;
    let genres = serde_json::from_str(&genres)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(5, Type::Text, Box::new(e)))?;
    Ok(Movie {
        id: row.get(0)?,
        created_at: row.get(1)?,
        title: row.get(2)?,
        year: row.get(3)?,
        runtime: Runtime(row.get(4)?),
        genres,
        version: row.get(6)?,
    })
}

/// Turns free text into an FTS5 query requiring every word, each quoted so
/// that FTS operators in user input are treated as plain words.
///
/// Returns `None` when the text has no words, which means "match all".
pub fn title_match_expression(title: &str) -> Option<String> {
    let terms: Vec<String> = title
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| format!("\"{w}\""))
        .collect();
    (!terms.is_empty()).then(|| terms.join(" "))
}

/// Inserts a movie and returns its store-assigned columns.
pub async fn insert_movie(db: &Database, movie: &Movie) -> Result<RecordStamp, MarqueeError> {
    let title = movie.title.clone();
    let year = movie.year;
    let runtime = movie.runtime.minutes();
    let genres = genres_to_json(&movie.genres)?;

    let conn = db.acquire().await?;
    conn.call(move |conn| {
        conn.query_row(
            "INSERT INTO movies (title, year, runtime, genres)
             VALUES (?1, ?2, ?3, ?4)
             RETURNING id, created_at, version",
            params![title, year, runtime, genres],
            RecordStamp::from_row,
        )
    })
    .await
    .map_err(map_tr_err)
}

/// Fetches a movie by id.
pub async fn get_movie(db: &Database, id: i64) -> Result<Movie, MarqueeError> {
    if id < 1 {
        return Err(MarqueeError::NotFound);
    }

    let conn = db.acquire().await?;
    conn.call(move |conn| {
        conn.query_row(
            &format!("SELECT {MOVIE_COLUMNS} FROM movies WHERE id = ?1"),
            params![id],
            movie_from_row,
        )
        .optional()
    })
    .await
    .map_err(map_tr_err)?
    .ok_or(MarqueeError::NotFound)
}

/// Writes `movie` if its version is current and returns the new version.
pub async fn update_movie(db: &Database, movie: &Movie) -> Result<i64, MarqueeError> {
    let id = movie.id;
    let expected_version = movie.version;
    let title = movie.title.clone();
    let year = movie.year;
    let runtime = movie.runtime.minutes();
    let genres = genres_to_json(&movie.genres)?;

    let conn = db.acquire().await?;
    conn.call(move |conn| {
        conn.query_row(
            "UPDATE movies
             SET title = ?1, year = ?2, runtime = ?3, genres = ?4, version = version + 1
             WHERE id = ?5 AND version = ?6
             RETURNING version",
            params![title, year, runtime, genres, id, expected_version],
            |row| row.get(0),
        )
        .optional()
    })
    .await
    .map_err(map_tr_err)?
    .ok_or(MarqueeError::EditConflict)
}

/// Deletes a movie by id.
pub async fn delete_movie(db: &Database, id: i64) -> Result<(), MarqueeError> {
    if id < 1 {
        return Err(MarqueeError::NotFound);
    }

    let conn = db.acquire().await?;
    let affected = conn
        .call(move |conn| conn.execute("DELETE FROM movies WHERE id = ?1", params![id]))
        .await
        .map_err(map_tr_err)?;
    if affected == 0 {
        return Err(MarqueeError::NotFound);
    }
    Ok(())
}

/// Lists one page of movies matching the title words and genre set, plus
/// the total number of matches.
///
/// # Panics
///
/// Panics if `query.filters` carries a sort key outside its safelist; the
/// filters must have been validated first.
pub async fn list_movies(
    db: &Database,
    query: &MovieQuery,
) -> Result<(Vec<Movie>, i64), MarqueeError> {
    let sql = format!(
        "SELECT {MOVIE_COLUMNS}, count(*) OVER()
         FROM movies
         WHERE (?1 IS NULL OR id IN (SELECT rowid FROM movies_fts WHERE movies_fts MATCH ?1))
           AND NOT EXISTS (
               SELECT 1 FROM json_each(?2) AS wanted
               WHERE wanted.value NOT IN (SELECT value FROM json_each(movies.genres))
           )
         ORDER BY {column} {direction}, id ASC
         LIMIT ?3 OFFSET ?4",
        column = query.filters.sort_column(),
        direction = query.filters.sort_direction().as_sql(),
    );
    let title = title_match_expression(&query.title);
    let genres = genres_to_json(&query.genres)?;
    let limit = query.filters.limit();
    let offset = query.filters.offset();

    let conn = db.acquire().await?;
    conn.call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![title, genres, limit, offset], |row| {
            Ok((movie_from_row(row)?, row.get::<_, i64>(7)?))
        })?;

        let mut movies = Vec::new();
        let mut total = 0;
        for row in rows {
            let (movie, count) = row?;
            total = count;
            movies.push(movie);
        }
        Ok((movies, total))
    })
    .await
    .map_err(map_tr_err)
}
