//! Aggregate reports for the back office.

use std::sync::Arc;

use super::read_error;
use reelhouse_common::{AppError, AppResult};
use sea_orm::{DatabaseConnection, DbBackend, FromQueryResult, Statement};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromQueryResult)]
pub struct TopMovieReport {
    pub title: String,
    pub release_year: Option<i32>,
    pub completion_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromQueryResult)]
pub struct HighestRatedReport {
    pub title: String,
    pub release_year: Option<i32>,
    pub average_rating: f64,
    pub total_reviews_stored: i32,
}

/// Posts, comments and reviews written, summed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromQueryResult)]
pub struct ActiveUserReport {
    pub name: String,
    pub email: String,
    pub activity_score: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromQueryResult)]
pub struct ForumReport {
    pub movie_title: String,
    pub total_posts: i64,
}

/// A row of `view_top10_watched`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromQueryResult)]
pub struct TopWatched {
    pub title: String,
    pub completion_count: i64,
}

/// Dashboard numbers for the back office.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdminStats {
    pub users: i64,
    pub movies: i64,
    pub posts: i64,
    pub completed_movies: i64,
    pub trending: Vec<TopWatched>,
}

#[derive(FromQueryResult)]
struct StatCounts {
    users: i64,
    movies: i64,
    posts: i64,
    completed_movies: i64,
}

/// Report repository. Read-only.
#[derive(Clone)]
pub struct ReportRepository {
    db: Arc<DatabaseConnection>,
}

impl ReportRepository {
    /// Create a new report repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Table counts plus the five most watched movies.
    pub async fn stats(&self) -> AppResult<AdminStats> {
        let counts = StatCounts::find_by_statement(Statement::from_string(
            DbBackend::Postgres,
            r"
            SELECT (SELECT COUNT(*) FROM users) AS users,
                   (SELECT COUNT(*) FROM movies) AS movies,
                   (SELECT COUNT(*) FROM posts) AS posts,
                   (SELECT COUNT(*) FROM watchlist WHERE status = 'completed') AS completed_movies
            ",
        ))
        .one(self.db.as_ref())
        .await
        .map_err(read_error)?
        .ok_or_else(|| AppError::Database("count query returned no row".to_string()))?;

        let trending = self.top_watched(5).await?;

        Ok(AdminStats {
            users: counts.users,
            movies: counts.movies,
            posts: counts.posts,
            completed_movies: counts.completed_movies,
            trending,
        })
    }

    /// Leading rows of `view_top10_watched`.
    pub async fn top_watched(&self, limit: u64) -> AppResult<Vec<TopWatched>> {
        TopWatched::find_by_statement(Statement::from_sql_and_values(
            DbBackend::Postgres,
            "SELECT title, completion_count FROM view_top10_watched LIMIT $1",
            [(limit as i64).into()],
        ))
        .all(self.db.as_ref())
        .await
        .map_err(read_error)
    }

    /// Movies with the most completed watchlist entries.
    pub async fn top_movies(&self) -> AppResult<Vec<TopMovieReport>> {
        TopMovieReport::find_by_statement(Statement::from_string(
            DbBackend::Postgres,
            r"
            SELECT m.title, m.release_year, COUNT(w.watchlist_id) AS completion_count
            FROM movies m
            JOIN watchlist w ON m.movie_id = w.movie_id
            WHERE w.status = 'completed'
            GROUP BY m.movie_id, m.title, m.release_year
            ORDER BY completion_count DESC
            LIMIT 10
            ",
        ))
        .all(self.db.as_ref())
        .await
        .map_err(read_error)
    }

    /// Movies by average rating, from `movie_statistics`.
    pub async fn highest_rated(&self) -> AppResult<Vec<HighestRatedReport>> {
        HighestRatedReport::find_by_statement(Statement::from_string(
            DbBackend::Postgres,
            r"
            SELECT m.title, m.release_year, ms.average_rating, ms.total_reviews_stored
            FROM movies m
            JOIN movie_statistics ms ON m.movie_id = ms.movie_id
            ORDER BY ms.average_rating DESC
            LIMIT 10
            ",
        ))
        .all(self.db.as_ref())
        .await
        .map_err(read_error)
    }

    /// Members ranked by posts, comments and reviews written.
    pub async fn active_users(&self) -> AppResult<Vec<ActiveUserReport>> {
        ActiveUserReport::find_by_statement(Statement::from_string(
            DbBackend::Postgres,
            r"
            SELECT u.name, u.email,
                   (SELECT COUNT(*) FROM posts p WHERE p.user_id = u.user_id)
                 + (SELECT COUNT(*) FROM comments c WHERE c.user_id = u.user_id)
                 + (SELECT COUNT(*) FROM reviews r WHERE r.user_id = u.user_id) AS activity_score
            FROM users u
            ORDER BY activity_score DESC
            LIMIT 10
            ",
        ))
        .all(self.db.as_ref())
        .await
        .map_err(read_error)
    }

    /// Forums ranked by post count.
    pub async fn popular_forums(&self) -> AppResult<Vec<ForumReport>> {
        ForumReport::find_by_statement(Statement::from_string(
            DbBackend::Postgres,
            r"
            SELECT m.title AS movie_title, COUNT(p.post_id) AS total_posts
            FROM discussion_forums df
            JOIN movies m ON df.movie_id = m.movie_id
            JOIN posts p ON df.forum_id = p.forum_id
            GROUP BY df.forum_id, m.title
            ORDER BY total_posts DESC
            LIMIT 10
            ",
        ))
        .all(self.db.as_ref())
        .await
        .map_err(read_error)
    }
}
