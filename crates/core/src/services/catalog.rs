//! Movie catalog.

use reelhouse_common::{AppError, AppResult};
use reelhouse_db::{
    entities::{audit_log::AuditTarget, genre, movie},
    repositories::{
        AuditAction, AuditEntry, MovieInput, MovieListing, MovieRepository, RecommendedMovie,
        TrendingMovie,
    },
};
use serde::Deserialize;
use tracing::info;

/// How many movies the recommendation and trending lists show.
const SHORTLIST_LEN: u64 = 10;

/// Back-office movie form.
#[derive(Debug, Default, Deserialize)]
pub struct MovieForm {
    /// Only read on edits.
    pub movie_id: Option<i32>,
    #[serde(default)]
    pub title: String,
    pub release_year: Option<i32>,
    pub duration_minutes: Option<i32>,
    pub synopsis: Option<String>,
    pub poster_image: Option<String>,
    #[serde(default)]
    pub genres: Vec<i32>,
}

impl MovieForm {
    fn into_parts(self) -> AppResult<(MovieInput, Vec<i32>)> {
        let title = self.title.trim().to_string();
        if title.is_empty() {
            return Err(AppError::BadRequest("Title is required".to_string()));
        }

        Ok((
            MovieInput {
                title,
                release_year: self.release_year,
                duration_minutes: self.duration_minutes,
                synopsis: self.synopsis,
                poster_image: self.poster_image,
            },
            self.genres,
        ))
    }
}

/// Catalog service.
#[derive(Clone)]
pub struct CatalogService {
    movie_repo: MovieRepository,
}

impl CatalogService {
    /// Create a new catalog service.
    #[must_use]
    pub const fn new(movie_repo: MovieRepository) -> Self {
        Self { movie_repo }
    }

    /// Every movie, newest first, with genres and ratings.
    pub async fn list(&self) -> AppResult<Vec<MovieListing>> {
        self.movie_repo.list_with_stats().await
    }

    /// Every genre, by name.
    pub async fn genres(&self) -> AppResult<Vec<genre::Model>> {
        self.movie_repo.list_genres().await
    }

    /// Best rated movies.
    pub async fn recommendations(&self) -> AppResult<Vec<RecommendedMovie>> {
        self.movie_repo.recommendations(SHORTLIST_LEN).await
    }

    /// Most completed movies.
    pub async fn trending(&self) -> AppResult<Vec<TrendingMovie>> {
        self.movie_repo.trending(SHORTLIST_LEN).await
    }

    /// Add a movie with its genres and write an audit row.
    pub async fn create(&self, admin_id: i32, form: MovieForm) -> AppResult<movie::Model> {
        let (input, genres) = form.into_parts()?;
        let audit = AuditEntry::new(
            admin_id,
            AuditAction::Insert,
            AuditTarget::Movies,
            format!("Created movie: {}", input.title),
        );

        let created = self
            .movie_repo
            .create_with_audit(input, &genres, audit)
            .await?;
        info!(movie_id = created.movie_id, admin_id, "Movie created");
        Ok(created)
    }

    /// Replace a movie's fields and genres and write an audit row.
    pub async fn update(&self, admin_id: i32, form: MovieForm) -> AppResult<()> {
        let movie_id = form
            .movie_id
            .ok_or_else(|| AppError::BadRequest("Missing movie id".to_string()))?;
        let (input, genres) = form.into_parts()?;
        let audit = AuditEntry::new(
            admin_id,
            AuditAction::Update,
            AuditTarget::Movies,
            format!("Updated movie: {}", input.title),
        );

        if self
            .movie_repo
            .update_with_audit(movie_id, input, &genres, audit)
            .await?
        {
            Ok(())
        } else {
            Err(AppError::NotFound("Movie not found".to_string()))
        }
    }

    /// Delete a movie. Its events, reviews, watchlist rows and forum go with it.
    pub async fn delete(&self, admin_id: i32, movie_id: i32) -> AppResult<()> {
        let audit = AuditEntry::new(
            admin_id,
            AuditAction::Delete,
            AuditTarget::Movies,
            "Deleted movie",
        );

        if self.movie_repo.delete_with_audit(movie_id, audit).await? {
            info!(movie_id, admin_id, "Movie deleted");
            Ok(())
        } else {
            Err(AppError::NotFound("Movie not found".to_string()))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use reelhouse_db::entities::audit_log;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::Arc;

    fn service(db: MockDatabase) -> CatalogService {
        CatalogService::new(MovieRepository::new(Arc::new(db.into_connection())))
    }

    fn test_movie() -> movie::Model {
        movie::Model {
            movie_id: 12,
            title: "Paris, Texas".to_string(),
            release_year: Some(1984),
            duration_minutes: Some(147),
            synopsis: None,
            poster_image: None,
            created_by: Some(1),
            created_at: Utc::now().into(),
        }
    }

    fn audit_row() -> audit_log::Model {
        audit_log::Model {
            log_id: 1,
            admin_id: Some(1),
            action_type: "INSERT".to_string(),
            target_table: AuditTarget::Movies,
            target_record_id: Some(12),
            action_details: Some("Created movie: Paris, Texas".to_string()),
            performed_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_title_required() {
        let catalog = service(MockDatabase::new(DatabaseBackend::Postgres));
        let err = catalog
            .create(1, MovieForm::default())
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Title is required");
    }

    #[tokio::test]
    async fn test_create_with_genres() {
        let catalog = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_movie()]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 2,
                }])
                .append_query_results([[audit_row()]]),
        );

        let created = catalog
            .create(
                1,
                MovieForm {
                    title: "Paris, Texas".to_string(),
                    genres: vec![3, 1, 3],
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(created.movie_id, 12);
    }

    #[tokio::test]
    async fn test_delete_writes_one_audit_row() {
        let mut deleted = audit_row();
        deleted.action_type = "DELETE".to_string();
        deleted.target_record_id = Some(7);
        deleted.action_details = Some("Deleted movie".to_string());
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .append_query_results([[deleted]])
                .into_connection(),
        );
        let catalog = CatalogService::new(MovieRepository::new(db.clone()));

        catalog.delete(1, 7).await.unwrap();
        drop(catalog);

        let db = Arc::try_unwrap(db).unwrap_or_else(|_| panic!("connection still shared"));
        let log = format!("{:?}", db.into_transaction_log());
        assert_eq!(log.matches("INSERT INTO").count(), 1);
        assert!(log.contains("audit_log"));
        assert!(log.contains("DELETE FROM"));
        assert!(log.contains("String(Some(\"DELETE\"))"));
        assert!(log.contains("String(Some(\"Movies\"))"));
        assert!(log.contains("Int(Some(7))"));
    }

    #[tokio::test]
    async fn test_delete_missing_movie() {
        let catalog = service(MockDatabase::new(DatabaseBackend::Postgres).append_exec_results([
            MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            },
        ]));

        let err = catalog.delete(1, 404).await.unwrap_err();
        assert_eq!(err.to_string(), "Movie not found");
    }
}
