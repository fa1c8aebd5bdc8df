//! Back-office: statistics, user and content management, audit trail and reports.

use reelhouse_common::{AppError, AppResult};
use reelhouse_db::{
    entities::{audit_log::AuditTarget, user},
    repositories::{
        ActiveUserReport, AdminCommentListing, AdminPostListing, AdminStats, AuditAction,
        AuditEntry, AuditLogListing, AuditRepository, CommentRepository, ForumReport,
        HighestRatedReport, PostRepository, ReportRepository, TopMovieReport, UserRepository,
    },
};
use tracing::info;

/// Audit rows shown in the back office.
const AUDIT_PAGE: u64 = 50;

/// Characters of deleted content kept in the audit trail.
const SNIPPET_CHARS: usize = 50;

/// Admin service.
#[derive(Clone)]
pub struct AdminService {
    user_repo: UserRepository,
    post_repo: PostRepository,
    comment_repo: CommentRepository,
    audit_repo: AuditRepository,
    report_repo: ReportRepository,
}

impl AdminService {
    /// Create a new admin service.
    #[must_use]
    pub const fn new(
        user_repo: UserRepository,
        post_repo: PostRepository,
        comment_repo: CommentRepository,
        audit_repo: AuditRepository,
        report_repo: ReportRepository,
    ) -> Self {
        Self {
            user_repo,
            post_repo,
            comment_repo,
            audit_repo,
            report_repo,
        }
    }

    /// Headline counts for the back-office home page.
    pub async fn stats(&self) -> AppResult<AdminStats> {
        self.report_repo.stats().await
    }

    // ========== Users ==========

    /// Every member, oldest first.
    pub async fn users(&self) -> AppResult<Vec<user::Model>> {
        self.user_repo.list_all().await
    }

    /// One member by id.
    pub async fn user(&self, user_id: i32) -> AppResult<user::Model> {
        self.user_repo
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    /// Delete a member and everything they own.
    pub async fn delete_user(&self, admin_id: i32, user_id: i32) -> AppResult<()> {
        let audit = AuditEntry::new(
            admin_id,
            AuditAction::Delete,
            AuditTarget::Users,
            "Deleted user account",
        );

        if !self.user_repo.delete_with_audit(user_id, audit).await? {
            return Err(AppError::NotFound("User not found".to_string()));
        }

        info!(user_id, admin_id, "User deleted");
        Ok(())
    }

    // ========== Content ==========

    /// Every post, whatever its status.
    pub async fn posts(&self) -> AppResult<Vec<AdminPostListing>> {
        self.post_repo.list_for_admin().await
    }

    /// Every comment of a post, whatever its status.
    pub async fn post_comments(&self, post_id: i32) -> AppResult<Vec<AdminCommentListing>> {
        self.comment_repo.list_for_admin(post_id).await
    }

    /// Delete a post with its comments and likes, and audit it.
    pub async fn delete_post(&self, admin_id: i32, post_id: i32) -> AppResult<()> {
        let post = self
            .post_repo
            .find_by_id(post_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;
        let audit = AuditEntry::new(
            admin_id,
            AuditAction::Delete,
            AuditTarget::Posts,
            format!("Deleted post: {}...", snippet(&post.content)),
        );

        if !self.post_repo.delete_with_audit(post_id, audit).await? {
            return Err(AppError::NotFound("Post not found".to_string()));
        }
        Ok(())
    }

    /// Delete a comment and audit it.
    pub async fn delete_comment(&self, admin_id: i32, comment_id: i32) -> AppResult<()> {
        let comment = self
            .comment_repo
            .find_by_id(comment_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Comment not found".to_string()))?;
        let audit = AuditEntry::new(
            admin_id,
            AuditAction::Delete,
            AuditTarget::Comments,
            format!("Deleted comment: {}...", snippet(&comment.content)),
        );

        if !self.comment_repo.delete_with_audit(comment_id, audit).await? {
            return Err(AppError::NotFound("Comment not found".to_string()));
        }
        Ok(())
    }

    /// Latest audit rows, newest first.
    pub async fn audit_logs(&self) -> AppResult<Vec<AuditLogListing>> {
        self.audit_repo.latest(AUDIT_PAGE).await
    }

    // ========== Reports ==========

    pub async fn top_movies(&self) -> AppResult<Vec<TopMovieReport>> {
        self.report_repo.top_movies().await
    }

    pub async fn highest_rated(&self) -> AppResult<Vec<HighestRatedReport>> {
        self.report_repo.highest_rated().await
    }

    pub async fn active_users(&self) -> AppResult<Vec<ActiveUserReport>> {
        self.report_repo.active_users().await
    }

    pub async fn popular_forums(&self) -> AppResult<Vec<ForumReport>> {
        self.report_repo.popular_forums().await
    }
}

/// First characters of deleted content, cut on a char boundary.
fn snippet(content: &str) -> String {
    content.chars().take(SNIPPET_CHARS).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use reelhouse_db::entities::{audit_log, post};
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::Arc;

    fn service(db: MockDatabase) -> AdminService {
        let db = Arc::new(db.into_connection());
        AdminService::new(
            UserRepository::new(db.clone()),
            PostRepository::new(db.clone()),
            CommentRepository::new(db.clone()),
            AuditRepository::new(db.clone()),
            ReportRepository::new(db),
        )
    }

    #[test]
    fn test_snippet_respects_char_boundaries() {
        let long = "é".repeat(80);
        assert_eq!(snippet(&long).chars().count(), SNIPPET_CHARS);
        assert_eq!(snippet("short"), "short");
    }

    #[tokio::test]
    async fn test_delete_missing_user() {
        let admin = service(MockDatabase::new(DatabaseBackend::Postgres).append_exec_results([
            MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            },
        ]));

        let err = admin.delete_user(1, 404).await.unwrap_err();
        assert_eq!(err.to_string(), "User not found");
    }

    #[tokio::test]
    async fn test_delete_post_writes_snippet() {
        let admin = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[post::Model {
                    post_id: 3,
                    user_id: 9,
                    forum_id: Some(1),
                    content: "Spoiler".to_string(),
                    status: post::ContentStatus::Flagged,
                    created_at: Utc::now().into(),
                }]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .append_query_results([[audit_log::Model {
                    log_id: 1,
                    admin_id: Some(1),
                    action_type: "DELETE".to_string(),
                    target_table: AuditTarget::Posts,
                    target_record_id: Some(3),
                    action_details: Some("Deleted post: Spoiler...".to_string()),
                    performed_at: Utc::now().into(),
                }]]),
        );

        admin.delete_post(1, 3).await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_missing_comment() {
        let admin = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<reelhouse_db::entities::comment::Model>::new()]),
        );

        let err = admin.delete_comment(1, 404).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
