//! Post, forum and like repository.

use std::sync::Arc;

use super::audit::{AuditEntry, record};
use super::{read_error, write_error};
use crate::entities::{
    DiscussionForum, Like, Post, discussion_forum, like,
    post::{self, ContentStatus},
};
use chrono::Utc;
use reelhouse_common::AppResult;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbBackend, DbErr,
    EntityTrait, FromQueryResult, PaginatorTrait, QueryFilter, Set, Statement, TransactionTrait,
    prelude::DateTimeWithTimeZone, sea_query::Expr,
};
use serde::Serialize;

/// Feed row with author, movie and counters.
#[derive(Debug, Clone, Serialize, FromQueryResult)]
pub struct PostListing {
    pub post_id: i32,
    pub user_id: i32,
    pub forum_id: Option<i32>,
    pub content: String,
    pub status: String,
    pub created_at: DateTimeWithTimeZone,
    pub author_name: String,
    pub movie_id: Option<i32>,
    pub movie_title: Option<String>,
    pub like_count: i64,
    pub comment_count: i64,
}

#[derive(Debug, Clone, Serialize, FromQueryResult)]
pub struct ForumPost {
    pub post_id: i32,
    pub content: String,
    pub created_at: DateTimeWithTimeZone,
    pub user_name: String,
}

#[derive(Debug, Clone, Serialize, FromQueryResult)]
pub struct ProfilePost {
    pub post_id: i32,
    pub content: String,
    pub created_at: DateTimeWithTimeZone,
    pub movie_title: Option<String>,
}

#[derive(Debug, Clone, Serialize, FromQueryResult)]
pub struct AdminPostListing {
    pub post_id: i32,
    pub content: String,
    pub created_at: DateTimeWithTimeZone,
    pub status: String,
    pub author: String,
}

/// Post or comment waiting for a moderation decision.
#[derive(Debug, Clone, Serialize, FromQueryResult)]
pub struct ModerationItem {
    #[serde(rename = "type")]
    pub item_type: String,
    pub id: i32,
    pub content: String,
    pub author: String,
    pub status: String,
    pub created_at: DateTimeWithTimeZone,
}

/// Post repository for database operations.
#[derive(Clone)]
pub struct PostRepository {
    db: Arc<DatabaseConnection>,
}

impl PostRepository {
    /// Create a new post repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a post by ID.
    pub async fn find_by_id(&self, id: i32) -> AppResult<Option<post::Model>> {
        Post::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(read_error)
    }

    /// Count all posts.
    pub async fn count(&self) -> AppResult<u64> {
        Post::find().count(self.db.as_ref()).await.map_err(read_error)
    }

    /// Count a user's posts.
    pub async fn count_by_user(&self, user_id: i32) -> AppResult<u64> {
        Post::find()
            .filter(post::Column::UserId.eq(user_id))
            .count(self.db.as_ref())
            .await
            .map_err(read_error)
    }

    /// Active posts, newest first.
    pub async fn list_active(&self) -> AppResult<Vec<PostListing>> {
        PostListing::find_by_statement(Statement::from_string(
            DbBackend::Postgres,
            r"
            SELECT p.post_id, p.user_id, p.forum_id, p.content, p.status, p.created_at,
                   u.name AS author_name, m.movie_id, m.title AS movie_title,
                   (SELECT COUNT(*) FROM likes l WHERE l.post_id = p.post_id) AS like_count,
                   (SELECT COUNT(*) FROM comments c
                    WHERE c.post_id = p.post_id AND c.status = 'active') AS comment_count
            FROM posts p
            JOIN users u ON p.user_id = u.user_id
            LEFT JOIN discussion_forums df ON p.forum_id = df.forum_id
            LEFT JOIN movies m ON df.movie_id = m.movie_id
            WHERE p.status = 'active'
            ORDER BY p.created_at DESC, p.post_id DESC
            ",
        ))
        .all(self.db.as_ref())
        .await
        .map_err(read_error)
    }

    /// A user's active posts with their movie, newest first.
    pub async fn list_by_user(&self, user_id: i32) -> AppResult<Vec<ProfilePost>> {
        ProfilePost::find_by_statement(Statement::from_sql_and_values(
            DbBackend::Postgres,
            r"
            SELECT p.post_id, p.content, p.created_at, m.title AS movie_title
            FROM posts p
            LEFT JOIN discussion_forums df ON p.forum_id = df.forum_id
            LEFT JOIN movies m ON df.movie_id = m.movie_id
            WHERE p.user_id = $1 AND p.status = 'active'
            ORDER BY p.created_at DESC
            ",
            [user_id.into()],
        ))
        .all(self.db.as_ref())
        .await
        .map_err(read_error)
    }

    /// Find the forum of a movie.
    pub async fn find_forum(&self, movie_id: i32) -> AppResult<Option<discussion_forum::Model>> {
        DiscussionForum::find()
            .filter(discussion_forum::Column::MovieId.eq(movie_id))
            .one(self.db.as_ref())
            .await
            .map_err(read_error)
    }

    /// Find the forum of a movie, creating it when absent.
    pub async fn ensure_forum(&self, movie_id: i32) -> AppResult<discussion_forum::Model> {
        forum_for_movie(self.db.as_ref(), movie_id)
            .await
            .map_err(write_error)
    }

    /// Active posts of a forum, newest first.
    pub async fn list_forum_posts(&self, forum_id: i32) -> AppResult<Vec<ForumPost>> {
        ForumPost::find_by_statement(Statement::from_sql_and_values(
            DbBackend::Postgres,
            r"
            SELECT p.post_id, p.content, p.created_at, u.name AS user_name
            FROM posts p
            JOIN users u ON p.user_id = u.user_id
            WHERE p.forum_id = $1 AND p.status = 'active'
            ORDER BY p.created_at DESC
            ",
            [forum_id.into()],
        ))
        .all(self.db.as_ref())
        .await
        .map_err(read_error)
    }

    /// Post into a movie's forum, creating the forum first if needed.
    pub async fn create_in_movie_forum(
        &self,
        user_id: i32,
        movie_id: i32,
        content: &str,
        status: ContentStatus,
    ) -> AppResult<post::Model> {
        let txn = self.db.begin().await.map_err(read_error)?;

        let forum = forum_for_movie(&txn, movie_id)
            .await
            .map_err(write_error)?;

        let created = post::ActiveModel {
            user_id: Set(user_id),
            forum_id: Set(Some(forum.forum_id)),
            content: Set(content.to_string()),
            status: Set(status),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(write_error)?;

        txn.commit().await.map_err(read_error)?;
        Ok(created)
    }

    /// Whether the user already liked the post.
    pub async fn has_liked(&self, user_id: i32, post_id: i32) -> AppResult<bool> {
        let count = Like::find()
            .filter(like::Column::UserId.eq(user_id))
            .filter(like::Column::PostId.eq(post_id))
            .count(self.db.as_ref())
            .await
            .map_err(read_error)?;
        Ok(count > 0)
    }

    /// Record a like. A repeated like surfaces as `AppError::Conflict`.
    pub async fn add_like(&self, user_id: i32, post_id: i32) -> AppResult<like::Model> {
        like::ActiveModel {
            user_id: Set(user_id),
            post_id: Set(post_id),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        }
        .insert(self.db.as_ref())
        .await
        .map_err(write_error)
    }

    /// Move an active post into the review queue.
    pub async fn report(&self, post_id: i32) -> AppResult<bool> {
        let result = Post::update_many()
            .col_expr(post::Column::Status, Expr::value(ContentStatus::UnderReview))
            .filter(post::Column::PostId.eq(post_id))
            .filter(post::Column::Status.eq(ContentStatus::Active))
            .exec(self.db.as_ref())
            .await
            .map_err(read_error)?;
        Ok(result.rows_affected > 0)
    }

    /// Every post with its author, newest first.
    pub async fn list_for_admin(&self) -> AppResult<Vec<AdminPostListing>> {
        AdminPostListing::find_by_statement(Statement::from_string(
            DbBackend::Postgres,
            r"
            SELECT p.post_id, p.content, p.created_at, p.status, u.name AS author
            FROM posts p
            JOIN users u ON p.user_id = u.user_id
            ORDER BY p.created_at DESC
            ",
        ))
        .all(self.db.as_ref())
        .await
        .map_err(read_error)
    }

    /// Posts and comments that are flagged or under review, oldest first.
    pub async fn moderation_queue(&self) -> AppResult<Vec<ModerationItem>> {
        ModerationItem::find_by_statement(Statement::from_string(
            DbBackend::Postgres,
            r"
            SELECT 'post' AS item_type, p.post_id AS id, p.content, u.name AS author,
                   p.status, p.created_at
            FROM posts p JOIN users u ON p.user_id = u.user_id
            WHERE p.status IN ('flagged', 'under_review')
            UNION ALL
            SELECT 'comment' AS item_type, c.comment_id AS id, c.content, u.name AS author,
                   c.status, c.created_at
            FROM comments c JOIN users u ON c.user_id = u.user_id
            WHERE c.status IN ('flagged', 'under_review')
            ORDER BY created_at ASC
            ",
        ))
        .all(self.db.as_ref())
        .await
        .map_err(read_error)
    }

    /// Delete a post (comments and likes cascade) and write an audit row.
    ///
    /// Returns `false` when the post does not exist.
    pub async fn delete_with_audit(&self, post_id: i32, audit: AuditEntry) -> AppResult<bool> {
        let txn = self.db.begin().await.map_err(read_error)?;

        let result = Post::delete_by_id(post_id)
            .exec(&txn)
            .await
            .map_err(write_error)?;

        if result.rows_affected == 0 {
            txn.rollback().await.map_err(read_error)?;
            return Ok(false);
        }

        record(&txn, audit.on_record(post_id))
            .await
            .map_err(write_error)?;
        txn.commit().await.map_err(read_error)?;

        Ok(true)
    }

    /// Set a post's moderation status and write an audit row.
    ///
    /// Returns `false` when the post does not exist.
    pub async fn moderate_with_audit(
        &self,
        post_id: i32,
        status: ContentStatus,
        audit: AuditEntry,
    ) -> AppResult<bool> {
        let txn = self.db.begin().await.map_err(read_error)?;

        let result = Post::update_many()
            .col_expr(post::Column::Status, Expr::value(status))
            .filter(post::Column::PostId.eq(post_id))
            .exec(&txn)
            .await
            .map_err(write_error)?;

        if result.rows_affected == 0 {
            txn.rollback().await.map_err(read_error)?;
            return Ok(false);
        }

        record(&txn, audit.on_record(post_id))
            .await
            .map_err(write_error)?;
        txn.commit().await.map_err(read_error)?;

        Ok(true)
    }
}

/// Find or create the forum of a movie on the given connection.
async fn forum_for_movie<C: ConnectionTrait>(
    conn: &C,
    movie_id: i32,
) -> Result<discussion_forum::Model, DbErr> {
    let existing = DiscussionForum::find()
        .filter(discussion_forum::Column::MovieId.eq(movie_id))
        .one(conn)
        .await?;

    if let Some(forum) = existing {
        return Ok(forum);
    }

    discussion_forum::ActiveModel {
        movie_id: Set(movie_id),
        created_at: Set(Utc::now().into()),
        ..Default::default()
    }
    .insert(conn)
    .await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn create_test_post(id: i32, user_id: i32, status: ContentStatus) -> post::Model {
        post::Model {
            post_id: id,
            user_id,
            forum_id: Some(2),
            content: "Who else loved the heist scene?".to_string(),
            status,
            created_at: Utc::now().into(),
        }
    }

    fn create_test_forum(movie_id: i32) -> discussion_forum::Model {
        discussion_forum::Model {
            forum_id: 2,
            movie_id,
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_create_in_existing_forum() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_forum(7)]])
                .append_query_results([[create_test_post(1, 4, ContentStatus::Active)]])
                .into_connection(),
        );

        let repo = PostRepository::new(db);
        let created = repo
            .create_in_movie_forum(4, 7, "Who else loved the heist scene?", ContentStatus::Active)
            .await
            .unwrap();

        assert_eq!(created.forum_id, Some(2));
    }

    #[tokio::test]
    async fn test_create_makes_forum_when_missing() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<discussion_forum::Model>::new()])
                .append_query_results([[create_test_forum(7)]])
                .append_query_results([[create_test_post(1, 4, ContentStatus::Flagged)]])
                .into_connection(),
        );

        let repo = PostRepository::new(db);
        let created = repo
            .create_in_movie_forum(4, 7, "text", ContentStatus::Flagged)
            .await
            .unwrap();

        assert_eq!(created.status, ContentStatus::Flagged);
    }

    #[tokio::test]
    async fn test_report_only_moves_active_posts() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );

        let repo = PostRepository::new(db);
        assert!(!repo.report(1).await.unwrap());
    }
}
