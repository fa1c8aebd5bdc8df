//! Posts, movie forums, likes, comments and member reports.

use reelhouse_common::{AppError, AppResult};
use reelhouse_db::{
    entities::{comment, post},
    repositories::{
        CommentListing, CommentRepository, ForumPost, MovieRepository, PostListing,
        PostRepository, RestrictedWordRepository,
    },
};
use serde::Deserialize;
use tracing::info;

use super::moderation::screen;
use super::notification::NotificationService;
use crate::principal::Principal;

const ALREADY_LIKED: &str = "You have already liked this post.";

/// Body of `POST /api/posts`.
#[derive(Debug, Default, Deserialize)]
pub struct CreatePostInput {
    pub movie_id: Option<i32>,
    #[serde(default)]
    pub content: String,
}

/// Body carrying only text, used for forum posts and comments.
#[derive(Debug, Default, Deserialize)]
pub struct ContentInput {
    #[serde(default)]
    pub content: String,
}

/// Post service.
#[derive(Clone)]
pub struct PostService {
    post_repo: PostRepository,
    comment_repo: CommentRepository,
    word_repo: RestrictedWordRepository,
    movie_repo: MovieRepository,
    notifications: NotificationService,
}

impl PostService {
    /// Create a new post service.
    #[must_use]
    pub const fn new(
        post_repo: PostRepository,
        comment_repo: CommentRepository,
        word_repo: RestrictedWordRepository,
        movie_repo: MovieRepository,
        notifications: NotificationService,
    ) -> Self {
        Self {
            post_repo,
            comment_repo,
            word_repo,
            movie_repo,
            notifications,
        }
    }

    /// Active posts, newest first.
    pub async fn list(&self) -> AppResult<Vec<PostListing>> {
        self.post_repo.list_active().await
    }

    /// Post to a movie's forum from the community feed.
    ///
    /// Content with a restricted word is stored as flagged and waits for review.
    pub async fn create_post(
        &self,
        author: &Principal,
        input: CreatePostInput,
    ) -> AppResult<post::Model> {
        let Some(movie_id) = input.movie_id else {
            return Err(AppError::BadRequest("Missing details".to_string()));
        };
        if input.content.trim().is_empty() {
            return Err(AppError::BadRequest("Missing details".to_string()));
        }

        self.write_post(author, movie_id, &input.content).await
    }

    /// Active posts of a movie's forum. The forum is created on first visit.
    pub async fn forum_posts(&self, movie_id: i32) -> AppResult<Vec<ForumPost>> {
        self.require_movie(movie_id).await?;

        let forum = self.post_repo.ensure_forum(movie_id).await?;
        self.post_repo.list_forum_posts(forum.forum_id).await
    }

    /// Post directly inside a movie's forum.
    pub async fn post_to_forum(
        &self,
        author: &Principal,
        movie_id: i32,
        content: &str,
    ) -> AppResult<post::Model> {
        if content.trim().is_empty() {
            return Err(AppError::BadRequest(
                "Post content cannot be empty".to_string(),
            ));
        }

        self.write_post(author, movie_id, content).await
    }

    /// Like someone else's post, once.
    pub async fn like(&self, liker: &Principal, post_id: i32) -> AppResult<()> {
        let post = self.require_post(post_id).await?;

        if post.user_id == liker.id {
            return Err(AppError::BadRequest(
                "You cannot like your own post.".to_string(),
            ));
        }
        if self.post_repo.has_liked(liker.id, post_id).await? {
            return Err(AppError::BadRequest(ALREADY_LIKED.to_string()));
        }

        self.post_repo
            .add_like(liker.id, post_id)
            .await
            .map_err(|e| {
                if e.is_conflict() {
                    AppError::BadRequest(ALREADY_LIKED.to_string())
                } else {
                    e
                }
            })?;

        self.notifications
            .post_liked(post.user_id, liker, post_id)
            .await;
        Ok(())
    }

    /// Active comments of a post, oldest first.
    pub async fn comments(&self, post_id: i32) -> AppResult<Vec<CommentListing>> {
        self.comment_repo.list_active(post_id).await
    }

    /// Comment on an active post and notify its author.
    pub async fn add_comment(
        &self,
        commenter: &Principal,
        post_id: i32,
        content: &str,
    ) -> AppResult<comment::Model> {
        if content.trim().is_empty() {
            return Err(AppError::BadRequest("Empty comment".to_string()));
        }

        let post = self.require_post(post_id).await?;
        let status = screen(&self.word_repo, content).await?;

        let created = self
            .comment_repo
            .create(post_id, commenter.id, content, status)
            .await?;

        if status.awaits_moderation() {
            info!(comment_id = created.comment_id, "Comment flagged for review");
        }

        if post.user_id != commenter.id {
            self.notifications
                .post_commented(post.user_id, commenter, post_id)
                .await;
        }

        Ok(created)
    }

    /// Send an active post to the moderation queue.
    pub async fn report_post(&self, reporter: &Principal, post_id: i32) -> AppResult<()> {
        self.require_post(post_id).await?;

        if self.post_repo.report(post_id).await? {
            info!(post_id, reporter_id = reporter.id, "Post reported");
        }
        Ok(())
    }

    /// Send an active comment to the moderation queue.
    pub async fn report_comment(&self, reporter: &Principal, comment_id: i32) -> AppResult<()> {
        self.comment_repo
            .find_by_id(comment_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Comment not found".to_string()))?;

        if self.comment_repo.report(comment_id).await? {
            info!(comment_id, reporter_id = reporter.id, "Comment reported");
        }
        Ok(())
    }

    async fn write_post(
        &self,
        author: &Principal,
        movie_id: i32,
        content: &str,
    ) -> AppResult<post::Model> {
        self.require_movie(movie_id).await?;
        let status = screen(&self.word_repo, content).await?;

        let created = self
            .post_repo
            .create_in_movie_forum(author.id, movie_id, content, status)
            .await?;

        if status.awaits_moderation() {
            info!(post_id = created.post_id, "Post flagged for review");
        }
        Ok(created)
    }

    async fn require_movie(&self, movie_id: i32) -> AppResult<()> {
        self.movie_repo
            .find_by_id(movie_id)
            .await?
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound("Movie not found".to_string()))
    }

    async fn require_post(&self, post_id: i32) -> AppResult<post::Model> {
        self.post_repo
            .find_by_id(post_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Post not found".to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::principal::Role;
    use chrono::Utc;
    use reelhouse_db::{
        entities::{discussion_forum, like, movie, notification, post::ContentStatus, restricted_word},
        repositories::NotificationRepository,
    };
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn member(id: i32) -> Principal {
        Principal {
            id,
            name: "Rosa".to_string(),
            role: Role::User,
            email: "rosa@example.com".to_string(),
        }
    }

    fn test_movie() -> movie::Model {
        movie::Model {
            movie_id: 4,
            title: "Alien".to_string(),
            release_year: Some(1979),
            duration_minutes: Some(117),
            synopsis: None,
            poster_image: None,
            created_by: None,
            created_at: Utc::now().into(),
        }
    }

    fn test_post(id: i32, author: i32, status: ContentStatus) -> post::Model {
        post::Model {
            post_id: id,
            user_id: author,
            forum_id: Some(1),
            content: "In space no one can hear you scream".to_string(),
            status,
            created_at: Utc::now().into(),
        }
    }

    fn test_forum() -> discussion_forum::Model {
        discussion_forum::Model {
            forum_id: 1,
            movie_id: 4,
            created_at: Utc::now().into(),
        }
    }

    fn test_word(word: &str) -> restricted_word::Model {
        restricted_word::Model {
            word_id: 1,
            restricted_word: word.to_string(),
            added_by: Some(1),
            is_active: true,
            created_at: Utc::now().into(),
        }
    }

    fn test_notification() -> notification::Model {
        notification::Model {
            notification_id: 1,
            user_id: 2,
            sender_id: Some(9),
            notification_type: notification::NotificationType::Like,
            reference_id: Some(3),
            message: "Rosa liked your post.".to_string(),
            is_seen: false,
            created_at: Utc::now().into(),
        }
    }

    fn service(db: MockDatabase) -> PostService {
        let db = Arc::new(db.into_connection());
        PostService::new(
            PostRepository::new(db.clone()),
            CommentRepository::new(db.clone()),
            RestrictedWordRepository::new(db.clone()),
            MovieRepository::new(db.clone()),
            NotificationService::new(NotificationRepository::new(db)),
        )
    }

    #[tokio::test]
    async fn test_create_post_requires_movie_and_content() {
        let posts = service(MockDatabase::new(DatabaseBackend::Postgres));
        let err = posts
            .create_post(
                &member(9),
                CreatePostInput {
                    movie_id: None,
                    content: "hello".to_string(),
                },
            )
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Missing details");
    }

    #[tokio::test]
    async fn test_post_with_restricted_word_is_flagged() {
        let posts = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_movie()]])
                .append_query_results([[test_word("spoiler")]])
                .append_query_results([[test_forum()]])
                .append_query_results([[test_post(3, 9, ContentStatus::Flagged)]]),
        );

        let created = posts
            .post_to_forum(&member(9), 4, "Big SPOILER: the cat lives")
            .await
            .unwrap();

        assert_eq!(created.status, ContentStatus::Flagged);
    }

    #[tokio::test]
    async fn test_cannot_like_own_post() {
        let posts = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_post(3, 9, ContentStatus::Active)]]),
        );

        let err = posts.like(&member(9), 3).await.unwrap_err();
        assert_eq!(err.to_string(), "You cannot like your own post.");
    }

    #[tokio::test]
    async fn test_like_twice() {
        let posts = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_post(3, 2, ContentStatus::Active)]])
                .append_query_results([[maplit::btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(1)),
                }]]),
        );

        let err = posts.like(&member(9), 3).await.unwrap_err();
        assert_eq!(err.to_string(), ALREADY_LIKED);
    }

    #[tokio::test]
    async fn test_like_notifies_author() {
        let posts = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_post(3, 2, ContentStatus::Active)]])
                .append_query_results([[maplit::btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(0)),
                }]])
                .append_query_results([[like::Model {
                    like_id: 1,
                    user_id: 9,
                    post_id: 3,
                    created_at: Utc::now().into(),
                }]])
                .append_query_results([[test_notification()]]),
        );

        posts.like(&member(9), 3).await.unwrap();
    }

    #[tokio::test]
    async fn test_like_missing_post() {
        let posts = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<post::Model>::new()]),
        );

        let err = posts.like(&member(9), 3).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_empty_comment() {
        let posts = service(MockDatabase::new(DatabaseBackend::Postgres));
        let err = posts.add_comment(&member(9), 3, "  ").await.unwrap_err();

        assert_eq!(err.to_string(), "Empty comment");
    }
}
