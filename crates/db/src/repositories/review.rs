//! Review and rating repository.
//!
//! A review and its rating are written together, and `movie_statistics` is
//! refreshed in the same transaction.

use std::sync::Arc;

use super::{read_error, write_error};
use crate::entities::{Rating, Review, rating, review};
use chrono::Utc;
use reelhouse_common::AppResult;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbBackend, DbErr,
    EntityTrait, FromQueryResult, QueryFilter, Set, Statement, TransactionTrait,
    prelude::DateTimeWithTimeZone,
};
use serde::Serialize;

/// Review with author name and rating.
#[derive(Debug, Clone, Serialize, FromQueryResult)]
pub struct ReviewListing {
    pub review_id: i32,
    pub review_text: String,
    pub created_at: DateTimeWithTimeZone,
    pub user_id: i32,
    pub user_name: String,
    pub rating: i32,
}

#[derive(Debug, Clone, Serialize, FromQueryResult)]
pub struct ReviewBrief {
    pub title: String,
    pub review_text: String,
}

/// Review repository for database operations.
#[derive(Clone)]
pub struct ReviewRepository {
    db: Arc<DatabaseConnection>,
}

impl ReviewRepository {
    /// Create a new review repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a review by ID.
    pub async fn find_by_id(&self, id: i32) -> AppResult<Option<review::Model>> {
        Review::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(read_error)
    }

    /// Find a user's review of a movie.
    pub async fn find_by_user_and_movie(
        &self,
        user_id: i32,
        movie_id: i32,
    ) -> AppResult<Option<review::Model>> {
        Review::find()
            .filter(review::Column::UserId.eq(user_id))
            .filter(review::Column::MovieId.eq(movie_id))
            .one(self.db.as_ref())
            .await
            .map_err(read_error)
    }

    /// Reviews of a movie, newest first.
    pub async fn list_for_movie(&self, movie_id: i32) -> AppResult<Vec<ReviewListing>> {
        ReviewListing::find_by_statement(Statement::from_sql_and_values(
            DbBackend::Postgres,
            r"
            SELECT r.review_id, r.review_text, r.created_at, r.user_id,
                   u.name AS user_name,
                   COALESCE(rat.rating_value, 0) AS rating
            FROM reviews r
            JOIN users u ON r.user_id = u.user_id
            LEFT JOIN ratings rat ON r.user_id = rat.user_id AND r.movie_id = rat.movie_id
            WHERE r.movie_id = $1
            ORDER BY r.created_at DESC
            ",
            [movie_id.into()],
        ))
        .all(self.db.as_ref())
        .await
        .map_err(read_error)
    }

    /// A user's latest reviews for the dashboard.
    pub async fn recent_for_user(&self, user_id: i32, limit: u64) -> AppResult<Vec<ReviewBrief>> {
        ReviewBrief::find_by_statement(Statement::from_sql_and_values(
            DbBackend::Postgres,
            r"
            SELECT m.title, r.review_text
            FROM reviews r
            JOIN movies m ON r.movie_id = m.movie_id
            WHERE r.user_id = $1
            ORDER BY r.created_at DESC
            LIMIT $2
            ",
            [user_id.into(), (limit as i64).into()],
        ))
        .all(self.db.as_ref())
        .await
        .map_err(read_error)
    }

    /// Insert a review with its rating and refresh the movie's statistics.
    ///
    /// A second review by the same user surfaces as `AppError::Conflict`.
    pub async fn create_with_rating(
        &self,
        user_id: i32,
        movie_id: i32,
        rating_value: i32,
        review_text: &str,
    ) -> AppResult<review::Model> {
        let txn = self.db.begin().await.map_err(read_error)?;
        let now: DateTimeWithTimeZone = Utc::now().into();

        let created = review::ActiveModel {
            user_id: Set(user_id),
            movie_id: Set(movie_id),
            review_text: Set(review_text.to_string()),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(write_error)?;

        Rating::insert(rating::ActiveModel {
            user_id: Set(user_id),
            movie_id: Set(movie_id),
            rating_value: Set(rating_value),
            created_at: Set(now),
            ..Default::default()
        })
        .exec_without_returning(&txn)
        .await
        .map_err(write_error)?;

        refresh_statistics(&txn, movie_id)
            .await
            .map_err(write_error)?;
        txn.commit().await.map_err(read_error)?;

        Ok(created)
    }

    /// Delete a review with its rating and refresh the movie's statistics.
    pub async fn delete_with_rating(&self, review: &review::Model) -> AppResult<()> {
        let txn = self.db.begin().await.map_err(read_error)?;

        Review::delete_by_id(review.review_id)
            .exec(&txn)
            .await
            .map_err(write_error)?;
        Rating::delete_many()
            .filter(rating::Column::UserId.eq(review.user_id))
            .filter(rating::Column::MovieId.eq(review.movie_id))
            .exec(&txn)
            .await
            .map_err(write_error)?;

        refresh_statistics(&txn, review.movie_id)
            .await
            .map_err(write_error)?;
        txn.commit().await.map_err(read_error)?;

        Ok(())
    }
}

/// Recompute average rating and review count for a movie.
async fn refresh_statistics<C: ConnectionTrait>(conn: &C, movie_id: i32) -> Result<(), DbErr> {
    conn.execute(Statement::from_sql_and_values(
        DbBackend::Postgres,
        r"
        INSERT INTO movie_statistics (movie_id, average_rating, total_reviews_stored, updated_at)
        SELECT $1,
               COALESCE((SELECT AVG(rating_value) FROM ratings WHERE movie_id = $1), 0)::float8,
               (SELECT COUNT(*) FROM reviews WHERE movie_id = $1)::int,
               NOW()
        ON CONFLICT (movie_id) DO UPDATE
        SET average_rating = EXCLUDED.average_rating,
            total_reviews_stored = EXCLUDED.total_reviews_stored,
            updated_at = EXCLUDED.updated_at
        ",
        [movie_id.into()],
    ))
    .await?;

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn create_test_review(id: i32, user_id: i32) -> review::Model {
        review::Model {
            review_id: id,
            user_id,
            movie_id: 7,
            review_text: "Tense and beautifully shot.".to_string(),
            created_at: Utc::now().into(),
        }
    }

    fn exec_ok() -> MockExecResult {
        MockExecResult {
            last_insert_id: 0,
            rows_affected: 1,
        }
    }

    #[tokio::test]
    async fn test_find_by_user_and_movie() {
        let review = create_test_review(3, 4);
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[review.clone()]])
                .into_connection(),
        );

        let repo = ReviewRepository::new(db);
        let found = repo.find_by_user_and_movie(4, 7).await.unwrap();

        assert_eq!(found, Some(review));
    }

    #[tokio::test]
    async fn test_create_with_rating_refreshes_statistics() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_review(3, 4)]])
                .append_exec_results([exec_ok(), exec_ok()])
                .into_connection(),
        );

        let repo = ReviewRepository::new(db);
        let created = repo
            .create_with_rating(4, 7, 5, "Tense and beautifully shot.")
            .await
            .unwrap();

        assert_eq!(created.review_id, 3);
    }

    #[tokio::test]
    async fn test_delete_with_rating() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([exec_ok(), exec_ok(), exec_ok()])
                .into_connection(),
        );

        let repo = ReviewRepository::new(db);
        repo.delete_with_rating(&create_test_review(3, 4))
            .await
            .unwrap();
    }
}
