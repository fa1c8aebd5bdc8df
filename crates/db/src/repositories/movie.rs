//! Movie catalog repository.

use std::sync::Arc;

use super::audit::{AuditEntry, record};
use super::{read_error, write_error};
use crate::entities::{Genre, Movie, MovieGenre, genre, movie, movie_genre};
use chrono::Utc;
use reelhouse_common::AppResult;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbBackend, DbErr,
    EntityTrait, FromQueryResult, PaginatorTrait, QueryFilter, QueryOrder, Set, Statement,
    TransactionTrait, prelude::DateTimeWithTimeZone, sea_query::Expr,
};
use serde::{Deserialize, Serialize};

/// Editable movie fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct MovieInput {
    pub title: String,
    pub release_year: Option<i32>,
    pub duration_minutes: Option<i32>,
    pub synopsis: Option<String>,
    pub poster_image: Option<String>,
}

/// Catalog row with genres and rating statistics.
#[derive(Debug, Clone, Serialize, FromQueryResult)]
pub struct MovieListing {
    pub movie_id: i32,
    pub title: String,
    pub release_year: Option<i32>,
    pub duration_minutes: Option<i32>,
    pub synopsis: Option<String>,
    pub poster_image: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    /// Comma-joined genre names
    pub genre_name: Option<String>,
    /// Comma-joined genre ids
    pub genre_ids: Option<String>,
    pub average_rating: f64,
    pub total_reviews: i32,
}

#[derive(Debug, Clone, Serialize, FromQueryResult)]
pub struct RecommendedMovie {
    pub movie_id: i32,
    pub title: String,
    pub poster_image: Option<String>,
    pub release_year: Option<i32>,
    pub rating: f64,
    pub genre_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, FromQueryResult)]
pub struct TrendingMovie {
    pub movie_id: i32,
    pub title: String,
    pub poster_image: Option<String>,
    pub release_year: Option<i32>,
    pub views: i64,
}

/// Movie repository for database operations.
#[derive(Clone)]
pub struct MovieRepository {
    db: Arc<DatabaseConnection>,
}

impl MovieRepository {
    /// Create a new movie repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a movie by ID.
    pub async fn find_by_id(&self, id: i32) -> AppResult<Option<movie::Model>> {
        Movie::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(read_error)
    }

    /// Find movies by IDs.
    pub async fn find_by_ids(&self, ids: &[i32]) -> AppResult<Vec<movie::Model>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        Movie::find()
            .filter(movie::Column::MovieId.is_in(ids.to_vec()))
            .all(self.db.as_ref())
            .await
            .map_err(read_error)
    }

    /// Count all movies.
    pub async fn count(&self) -> AppResult<u64> {
        Movie::find().count(self.db.as_ref()).await.map_err(read_error)
    }

    /// Whole catalog, newest first.
    pub async fn list_with_stats(&self) -> AppResult<Vec<MovieListing>> {
        MovieListing::find_by_statement(Statement::from_string(
            DbBackend::Postgres,
            r"
            SELECT m.movie_id, m.title, m.release_year, m.duration_minutes, m.synopsis,
                   m.poster_image, m.created_at,
                   (SELECT string_agg(g.genre_name, ', ' ORDER BY g.genre_name)
                    FROM genres g JOIN movie_genres mg ON g.genre_id = mg.genre_id
                    WHERE mg.movie_id = m.movie_id) AS genre_name,
                   (SELECT string_agg(g.genre_id::text, ',' ORDER BY g.genre_name)
                    FROM genres g JOIN movie_genres mg ON g.genre_id = mg.genre_id
                    WHERE mg.movie_id = m.movie_id) AS genre_ids,
                   COALESCE(ms.average_rating, 0)::float8 AS average_rating,
                   COALESCE(ms.total_reviews_stored, 0) AS total_reviews
            FROM movies m
            LEFT JOIN movie_statistics ms ON m.movie_id = ms.movie_id
            ORDER BY m.created_at DESC, m.movie_id DESC
            ",
        ))
        .all(self.db.as_ref())
        .await
        .map_err(read_error)
    }

    /// All genres by name.
    pub async fn list_genres(&self) -> AppResult<Vec<genre::Model>> {
        Genre::find()
            .order_by_asc(genre::Column::GenreName)
            .all(self.db.as_ref())
            .await
            .map_err(read_error)
    }

    /// Best-rated movies.
    pub async fn recommendations(&self, limit: u64) -> AppResult<Vec<RecommendedMovie>> {
        RecommendedMovie::find_by_statement(Statement::from_sql_and_values(
            DbBackend::Postgres,
            r"
            SELECT m.movie_id, m.title, m.poster_image, m.release_year,
                   COALESCE(ms.average_rating, 0)::float8 AS rating,
                   (SELECT string_agg(g.genre_name, ', ' ORDER BY g.genre_name)
                    FROM genres g JOIN movie_genres mg ON g.genre_id = mg.genre_id
                    WHERE mg.movie_id = m.movie_id) AS genre_name
            FROM movies m
            LEFT JOIN movie_statistics ms ON m.movie_id = ms.movie_id
            ORDER BY rating DESC, m.movie_id
            LIMIT $1
            ",
            [(limit as i64).into()],
        ))
        .all(self.db.as_ref())
        .await
        .map_err(read_error)
    }

    /// Movies with the most completed watchlist entries.
    pub async fn trending(&self, limit: u64) -> AppResult<Vec<TrendingMovie>> {
        TrendingMovie::find_by_statement(Statement::from_sql_and_values(
            DbBackend::Postgres,
            r"
            SELECT m.movie_id, m.title, m.poster_image, m.release_year,
                   COUNT(w.user_id) AS views
            FROM movies m
            JOIN watchlist w ON m.movie_id = w.movie_id
            WHERE w.status = 'completed'
            GROUP BY m.movie_id, m.title, m.poster_image, m.release_year
            ORDER BY views DESC, m.movie_id
            LIMIT $1
            ",
            [(limit as i64).into()],
        ))
        .all(self.db.as_ref())
        .await
        .map_err(read_error)
    }

    /// Insert a movie with its genre links and an audit row, atomically.
    pub async fn create_with_audit(
        &self,
        input: MovieInput,
        genre_ids: &[i32],
        audit: AuditEntry,
    ) -> AppResult<movie::Model> {
        let txn = self.db.begin().await.map_err(read_error)?;

        let created = movie::ActiveModel {
            title: Set(input.title),
            release_year: Set(input.release_year),
            duration_minutes: Set(input.duration_minutes),
            synopsis: Set(input.synopsis),
            poster_image: Set(input.poster_image),
            created_by: Set(Some(audit.admin_id)),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(write_error)?;

        link_genres(&txn, created.movie_id, genre_ids)
            .await
            .map_err(write_error)?;
        record(&txn, audit.on_record(created.movie_id))
            .await
            .map_err(write_error)?;
        txn.commit().await.map_err(read_error)?;

        Ok(created)
    }

    /// Update a movie, replace its genre links and write an audit row.
    ///
    /// Returns `false` when the movie does not exist.
    pub async fn update_with_audit(
        &self,
        movie_id: i32,
        input: MovieInput,
        genre_ids: &[i32],
        audit: AuditEntry,
    ) -> AppResult<bool> {
        let txn = self.db.begin().await.map_err(read_error)?;

        let result = Movie::update_many()
            .col_expr(movie::Column::Title, Expr::value(input.title))
            .col_expr(movie::Column::ReleaseYear, Expr::value(input.release_year))
            .col_expr(movie::Column::DurationMinutes, Expr::value(input.duration_minutes))
            .col_expr(movie::Column::Synopsis, Expr::value(input.synopsis))
            .col_expr(movie::Column::PosterImage, Expr::value(input.poster_image))
            .filter(movie::Column::MovieId.eq(movie_id))
            .exec(&txn)
            .await
            .map_err(write_error)?;

        if result.rows_affected == 0 {
            txn.rollback().await.map_err(read_error)?;
            return Ok(false);
        }

        MovieGenre::delete_many()
            .filter(movie_genre::Column::MovieId.eq(movie_id))
            .exec(&txn)
            .await
            .map_err(write_error)?;
        link_genres(&txn, movie_id, genre_ids)
            .await
            .map_err(write_error)?;
        record(&txn, audit.on_record(movie_id))
            .await
            .map_err(write_error)?;
        txn.commit().await.map_err(read_error)?;

        Ok(true)
    }

    /// Delete a movie (dependents cascade) and write an audit row.
    ///
    /// Returns `false` when the movie does not exist.
    pub async fn delete_with_audit(&self, movie_id: i32, audit: AuditEntry) -> AppResult<bool> {
        let txn = self.db.begin().await.map_err(read_error)?;

        let result = Movie::delete_by_id(movie_id)
            .exec(&txn)
            .await
            .map_err(write_error)?;

        if result.rows_affected == 0 {
            txn.rollback().await.map_err(read_error)?;
            return Ok(false);
        }

        record(&txn, audit.on_record(movie_id))
            .await
            .map_err(write_error)?;
        txn.commit().await.map_err(read_error)?;

        Ok(true)
    }
}

async fn link_genres<C: ConnectionTrait>(
    conn: &C,
    movie_id: i32,
    genre_ids: &[i32],
) -> Result<(), DbErr> {
    if genre_ids.is_empty() {
        return Ok(());
    }

    let mut ids = genre_ids.to_vec();
    ids.sort_unstable();
    ids.dedup();

    MovieGenre::insert_many(ids.into_iter().map(|genre_id| movie_genre::ActiveModel {
        movie_id: Set(movie_id),
        genre_id: Set(genre_id),
    }))
    .exec_without_returning(conn)
    .await?;

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::entities::audit_log::{self, AuditTarget};
    use crate::repositories::AuditAction;
    use maplit::btreemap;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Value};

    fn create_test_movie(id: i32, duration: Option<i32>) -> movie::Model {
        movie::Model {
            movie_id: id,
            title: "Heat".to_string(),
            release_year: Some(1995),
            duration_minutes: duration,
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
            target_record_id: Some(7),
            action_details: Some("Created movie: Heat".to_string()),
            performed_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_find_by_ids_empty_skips_query() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let repo = MovieRepository::new(db);

        assert!(repo.find_by_ids(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_with_stats() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![btreemap! {
                    "movie_id" => Value::from(7),
                    "title" => Value::from("Heat"),
                    "release_year" => Value::from(1995),
                    "duration_minutes" => Value::from(170),
                    "synopsis" => Value::String(None),
                    "poster_image" => Value::String(None),
                    "created_at" => Value::from(DateTimeWithTimeZone::from(Utc::now())),
                    "genre_name" => Value::from("Crime, Thriller"),
                    "genre_ids" => Value::from("2,5"),
                    "average_rating" => Value::from(4.5_f64),
                    "total_reviews" => Value::from(2),
                }]])
                .into_connection(),
        );

        let repo = MovieRepository::new(db);
        let movies = repo.list_with_stats().await.unwrap();

        assert_eq!(movies.len(), 1);
        assert_eq!(movies[0].genre_name.as_deref(), Some("Crime, Thriller"));
        assert_eq!(movies[0].total_reviews, 2);
    }

    #[tokio::test]
    async fn test_create_with_audit() {
        let movie = create_test_movie(7, Some(170));
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[movie.clone()]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 2,
                }])
                .append_query_results([[audit_row()]])
                .into_connection(),
        );

        let repo = MovieRepository::new(db);
        let input = MovieInput {
            title: "Heat".to_string(),
            release_year: Some(1995),
            duration_minutes: Some(170),
            ..Default::default()
        };
        let audit = AuditEntry::new(1, AuditAction::Insert, AuditTarget::Movies, "Created movie: Heat");
        let created = repo.create_with_audit(input, &[5, 2], audit).await.unwrap();

        assert_eq!(created.movie_id, 7);
    }

    #[tokio::test]
    async fn test_delete_missing_movie_returns_false() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );

        let repo = MovieRepository::new(db);
        let audit = AuditEntry::new(1, AuditAction::Delete, AuditTarget::Movies, "Deleted movie");

        assert!(!repo.delete_with_audit(99, audit).await.unwrap());
    }
}
