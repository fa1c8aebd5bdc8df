//! Movie reviews and ratings.

use reelhouse_common::{AppError, AppResult};
use reelhouse_db::{
    entities::review,
    repositories::{MovieRepository, ReviewListing, ReviewRepository},
};
use serde::Deserialize;
use tracing::info;

const ALREADY_REVIEWED: &str = "You have already reviewed this movie.";

/// Body of `POST /api/movies/{id}/reviews`.
#[derive(Debug, Default, Deserialize)]
pub struct ReviewInput {
    pub rating: Option<i32>,
    #[serde(default)]
    pub review_text: String,
}

/// Review service.
#[derive(Clone)]
pub struct ReviewService {
    review_repo: ReviewRepository,
    movie_repo: MovieRepository,
}

impl ReviewService {
    /// Create a new review service.
    #[must_use]
    pub const fn new(review_repo: ReviewRepository, movie_repo: MovieRepository) -> Self {
        Self {
            review_repo,
            movie_repo,
        }
    }

    /// Reviews of a movie with each author's rating, newest first.
    pub async fn list(&self, movie_id: i32) -> AppResult<Vec<ReviewListing>> {
        self.review_repo.list_for_movie(movie_id).await
    }

    /// Review a movie once. The rating and the movie's statistics are
    /// written in the same transaction.
    pub async fn create(
        &self,
        user_id: i32,
        movie_id: i32,
        input: ReviewInput,
    ) -> AppResult<review::Model> {
        let rating = match input.rating {
            Some(r) if !input.review_text.trim().is_empty() => r,
            _ => {
                return Err(AppError::BadRequest(
                    "Missing rating or text".to_string(),
                ));
            }
        };
        if !(1..=5).contains(&rating) {
            return Err(AppError::BadRequest(
                "Rating must be between 1 and 5".to_string(),
            ));
        }

        if self.movie_repo.find_by_id(movie_id).await?.is_none() {
            return Err(AppError::NotFound("Movie not found".to_string()));
        }
        if self
            .review_repo
            .find_by_user_and_movie(user_id, movie_id)
            .await?
            .is_some()
        {
            return Err(AppError::BadRequest(ALREADY_REVIEWED.to_string()));
        }

        let created = self
            .review_repo
            .create_with_rating(user_id, movie_id, rating, &input.review_text)
            .await
            .map_err(already_reviewed)?;

        info!(review_id = created.review_id, user_id, movie_id, "Review posted");
        Ok(created)
    }

    /// Delete one's own review together with its rating.
    pub async fn delete(&self, user_id: i32, review_id: i32) -> AppResult<()> {
        let review = self
            .review_repo
            .find_by_id(review_id)
            .await?
            .filter(|r| r.user_id == user_id)
            .ok_or_else(|| AppError::Forbidden("Not authorized".to_string()))?;

        self.review_repo.delete_with_rating(&review).await
    }
}

/// A lost race on the one-review-per-movie key reads as a repeat review.
fn already_reviewed(err: AppError) -> AppError {
    if err.is_conflict() {
        AppError::BadRequest(ALREADY_REVIEWED.to_string())
    } else {
        err
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use reelhouse_db::entities::movie;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::Arc;

    fn service(db: MockDatabase) -> ReviewService {
        let db = Arc::new(db.into_connection());
        ReviewService::new(ReviewRepository::new(db.clone()), MovieRepository::new(db))
    }

    fn test_review(author: i32) -> review::Model {
        review::Model {
            review_id: 5,
            user_id: author,
            movie_id: 4,
            review_text: "Slow and wonderful.".to_string(),
            created_at: Utc::now().into(),
        }
    }

    fn input(rating: Option<i32>, text: &str) -> ReviewInput {
        ReviewInput {
            rating,
            review_text: text.to_string(),
        }
    }

    #[tokio::test]
    async fn test_missing_rating_or_text() {
        let reviews = service(MockDatabase::new(DatabaseBackend::Postgres));

        let err = reviews.create(9, 4, input(None, "ok")).await.unwrap_err();
        assert_eq!(err.to_string(), "Missing rating or text");

        let err = reviews.create(9, 4, input(Some(4), " ")).await.unwrap_err();
        assert_eq!(err.to_string(), "Missing rating or text");
    }

    #[tokio::test]
    async fn test_rating_out_of_range() {
        let reviews = service(MockDatabase::new(DatabaseBackend::Postgres));

        let err = reviews.create(9, 4, input(Some(6), "great")).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_second_review_is_rejected() {
        let reviews = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[movie::Model {
                    movie_id: 4,
                    title: "Stalker".to_string(),
                    release_year: Some(1979),
                    duration_minutes: Some(161),
                    synopsis: None,
                    poster_image: None,
                    created_by: None,
                    created_at: Utc::now().into(),
                }]])
                .append_query_results([[test_review(9)]]),
        );

        let err = reviews.create(9, 4, input(Some(4), "again")).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
        assert_eq!(err.to_string(), ALREADY_REVIEWED);
    }

    #[test]
    fn test_unique_violation_on_insert_reads_as_repeat_review() {
        let err = already_reviewed(AppError::Conflict(
            "duplicate key value violates unique constraint \"reviews_user_id_movie_id_key\""
                .to_string(),
        ));
        assert!(matches!(err, AppError::BadRequest(_)));
        assert_eq!(err.to_string(), ALREADY_REVIEWED);

        let err = already_reviewed(AppError::Database("connection reset".to_string()));
        assert!(matches!(err, AppError::Database(_)));
    }

    #[tokio::test]
    async fn test_only_author_may_delete() {
        let reviews = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_review(2)]]),
        );

        let err = reviews.delete(9, 5).await.unwrap_err();
        assert_eq!(err.to_string(), "Not authorized");
    }

    #[tokio::test]
    async fn test_author_deletes_review() {
        let reviews = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_review(9)]])
                .append_exec_results([
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 1,
                    },
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 1,
                    },
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 1,
                    },
                ]),
        );

        reviews.delete(9, 5).await.unwrap();
    }
}
