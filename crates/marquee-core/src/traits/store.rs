// SPDX-FileCopyrightText: 2026 Marquee Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Optimistic-concurrency record store contracts.
//!
//! Every operation is expected to be bounded by the backend's query timeout
//! and to fail with [`MarqueeError::Timeout`] once it elapses.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::MarqueeError;
use crate::types::{Movie, MovieQuery, User};

#[async_trait]
pub trait MovieStore: Send + Sync + 'static {
    /// Persists a new movie, filling in `id`, `created_at` and `version` (1).
    async fn insert_movie(&self, movie: &mut Movie) -> Result<(), MarqueeError>;

    /// Fetches one movie. Ids below 1 are always [`MarqueeError::NotFound`].
    async fn get_movie(&self, id: i64) -> Result<Movie, MarqueeError>;

    /// Writes `movie` if its `version` still matches the stored one, then
    /// stores the new version back into `movie`.
    ///
    /// Fails with [`MarqueeError::EditConflict`] when no row matches both id
    /// and version, which also covers a concurrent delete.
    async fn update_movie(&self, movie: &mut Movie) -> Result<(), MarqueeError>;

    async fn delete_movie(&self, id: i64) -> Result<(), MarqueeError>;

    /// Returns one page of matches plus the total number of matching rows.
    async fn list_movies(&self, query: &MovieQuery) -> Result<(Vec<Movie>, i64), MarqueeError>;
}

#[async_trait]
pub trait UserStore: Send + Sync + 'static {
    /// Persists a new user, filling in `id`, `created_at` and `version` (1).
    ///
    /// Fails with [`MarqueeError::DuplicateEmail`] if the email is taken.
    async fn insert_user(&self, user: &mut User) -> Result<(), MarqueeError>;

    /// Looks a user up by email, case-insensitively.
    async fn get_user_by_email(&self, email: &str) -> Result<User, MarqueeError>;

    /// Version-checked update, same contract as [`MovieStore::update_movie`].
    async fn update_user(&self, user: &mut User) -> Result<(), MarqueeError>;
}

/// The stores handlers work against.
#[derive(Clone)]
pub struct Models {
    pub movies: Arc<dyn MovieStore>,
    pub users: Arc<dyn UserStore>,
}

impl Models {
    /// Uses one backend for every entity.
    pub fn new<S>(store: Arc<S>) -> Self
    where
        S: MovieStore + UserStore,
    {
        Self {
            movies: store.clone(),
            users: store,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Empty;

    #[async_trait]
    impl MovieStore for Empty {
        async fn insert_movie(&self, movie: &mut Movie) -> Result<(), MarqueeError> {
            movie.id = 1;
            movie.version = 1;
            Ok(())
        }
        async fn get_movie(&self, _id: i64) -> Result<Movie, MarqueeError> {
            Err(MarqueeError::NotFound)
        }
        async fn update_movie(&self, _movie: &mut Movie) -> Result<(), MarqueeError> {
            Err(MarqueeError::EditConflict)
        }
        async fn delete_movie(&self, _id: i64) -> Result<(), MarqueeError> {
            Err(MarqueeError::NotFound)
        }
        async fn list_movies(&self, _q: &MovieQuery) -> Result<(Vec<Movie>, i64), MarqueeError> {
            Ok((Vec::new(), 0))
        }
    }

    #[async_trait]
    impl UserStore for Empty {
        async fn insert_user(&self, _user: &mut User) -> Result<(), MarqueeError> {
            Err(MarqueeError::DuplicateEmail)
        }
        async fn get_user_by_email(&self, _email: &str) -> Result<User, MarqueeError> {
            Err(MarqueeError::NotFound)
        }
        async fn update_user(&self, _user: &mut User) -> Result<(), MarqueeError> {
            Err(MarqueeError::EditConflict)
        }
    }

    #[tokio::test]
    async fn models_share_one_backend() {
        let models = Models::new(Arc::new(Empty));
        let mut movie = Movie::default();
        models.movies.insert_movie(&mut movie).await.unwrap();
        assert_eq!(movie.version, 1);
        assert!(matches!(
            models.movies.get_movie(1).await,
            Err(MarqueeError::NotFound)
        ));
        assert!(matches!(
            models.users.get_user_by_email("a@b.c").await,
            Err(MarqueeError::NotFound)
        ));
    }
}
