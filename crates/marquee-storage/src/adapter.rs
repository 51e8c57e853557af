// SPDX-FileCopyrightText: 2026 Marquee Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the movie and user store traits.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use marquee_config::model::StorageConfig;
use marquee_core::{MarqueeError, Movie, MovieQuery, MovieStore, User, UserStore};

use crate::database::Database;
use crate::queries;

/// SQLite-backed store. Every operation, including waiting for a pooled
/// connection, is abandoned with [`MarqueeError::Timeout`] after the
/// configured query timeout.
#[derive(Clone)]
pub struct SqliteStore {
    db: Database,
    timeout: Duration,
}

impl SqliteStore {
    pub fn new(db: Database, timeout: Duration) -> Self {
        Self { db, timeout }
    }

    /// Opens the database, runs migrations, and pings it within
    /// `ping_timeout_secs`.
    pub async fn open(config: &StorageConfig) -> Result<Self, MarqueeError> {
        let db = Database::open(config).await?;
        db.ping(config.ping_timeout()).await?;
        Ok(Self::new(db, config.query_timeout()))
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    async fn with_deadline<T>(
        &self,
        op: &'static str,
        fut: impl Future<Output = Result<T, MarqueeError>>,
    ) -> Result<T, MarqueeError> {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => {
                debug!(op, timeout = ?self.timeout, "store operation timed out");
                Err(MarqueeError::Timeout {
                    duration: self.timeout,
                })
            }
        }
    }
}

#[async_trait]
impl MovieStore for SqliteStore {
    async fn insert_movie(&self, movie: &mut Movie) -> Result<(), MarqueeError> {
        let stamp = self
            .with_deadline("insert_movie", queries::movies::insert_movie(&self.db, movie))
            .await?;
        movie.id = stamp.id;
        movie.created_at = stamp.created_at;
        movie.version = stamp.version;
        Ok(())
    }

    async fn get_movie(&self, id: i64) -> Result<Movie, MarqueeError> {
        self.with_deadline("get_movie", queries::movies::get_movie(&self.db, id))
            .await
    }

    async fn update_movie(&self, movie: &mut Movie) -> Result<(), MarqueeError> {
        movie.version = self
            .with_deadline("update_movie", queries::movies::update_movie(&self.db, movie))
            .await?;
        Ok(())
    }

    async fn delete_movie(&self, id: i64) -> Result<(), MarqueeError> {
        self.with_deadline("delete_movie", queries::movies::delete_movie(&self.db, id))
            .await
    }

    async fn list_movies(&self, query: &MovieQuery) -> Result<(Vec<Movie>, i64), MarqueeError> {
        self.with_deadline("list_movies", queries::movies::list_movies(&self.db, query))
            .await
    }
}

#[async_trait]
impl UserStore for SqliteStore {
    async fn insert_user(&self, user: &mut User) -> Result<(), MarqueeError> {
        let stamp = self
            .with_deadline("insert_user", queries::users::insert_user(&self.db, user))
            .await?;
        user.id = stamp.id;
        user.created_at = stamp.created_at;
        user.version = stamp.version;
        Ok(())
    }

    async fn get_user_by_email(&self, email: &str) -> Result<User, MarqueeError> {
        self.with_deadline(
            "get_user_by_email",
            queries::users::get_user_by_email(&self.db, email),
        )
        .await
    }

    async fn update_user(&self, user: &mut User) -> Result<(), MarqueeError> {
        user.version = self
            .with_deadline("update_user", queries::users::update_user(&self.db, user))
            .await?;
        Ok(())
    }
}
