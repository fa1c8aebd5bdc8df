//! Moderation: restricted-word screening, the review queue and the word list.

use reelhouse_common::{AppError, AppResult};
use reelhouse_db::{
    entities::{audit_log::AuditTarget, post::ContentStatus, restricted_word},
    repositories::{
        AuditAction, AuditEntry, CommentRepository, ModerationItem, PostRepository,
        RestrictedWordRepository,
    },
};
use regex::RegexBuilder;
use serde::Deserialize;
use tracing::info;

use crate::principal::Principal;

/// Whether `content` contains any of `words` as a whole word, ignoring case.
pub fn contains_restricted_word(content: &str, words: &[String]) -> AppResult<bool> {
    let alternatives: Vec<String> = words
        .iter()
        .map(|w| w.trim())
        .filter(|w| !w.is_empty())
        .map(regex::escape)
        .collect();

    if alternatives.is_empty() {
        return Ok(false);
    }

    // Edges are judged by the neighbouring characters, not by `\b`.
    let pattern = format!(r"(?:^|\W)(?:{})(?:$|\W)", alternatives.join("|"));
    let regex = RegexBuilder::new(&pattern)
        .case_insensitive(true)
        .build()
        .map_err(|e| AppError::Internal(format!("Invalid restricted word pattern: {e}")))?;

    Ok(regex.is_match(content))
}

/// Status a newly written post or comment is stored with.
pub(crate) async fn screen(
    words: &RestrictedWordRepository,
    content: &str,
) -> AppResult<ContentStatus> {
    let active = words.active_words().await?;

    if contains_restricted_word(content, &active)? {
        Ok(ContentStatus::Flagged)
    } else {
        Ok(ContentStatus::Active)
    }
}

/// Body of a moderation decision.
#[derive(Debug, Default, Deserialize)]
pub struct FlaggedReviewInput {
    #[serde(rename = "type", default)]
    pub item_type: String,
    pub id: Option<i32>,
    #[serde(default)]
    pub action: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Decision {
    Approve,
    Reject,
}

impl Decision {
    fn parse(action: &str) -> AppResult<Self> {
        match action {
            "approve" => Ok(Self::Approve),
            "reject" => Ok(Self::Reject),
            _ => Err(AppError::BadRequest("Invalid action".to_string())),
        }
    }

    const fn status(self) -> ContentStatus {
        match self {
            Self::Approve => ContentStatus::Active,
            Self::Reject => ContentStatus::Removed,
        }
    }

    const fn audit_action(self) -> AuditAction {
        match self {
            Self::Approve => AuditAction::ModerateApprove,
            Self::Reject => AuditAction::ModerateReject,
        }
    }

    const fn details(self) -> &'static str {
        match self {
            Self::Approve => "Approved flagged content.",
            Self::Reject => "Rejected flagged content.",
        }
    }
}

/// Back-office moderation.
#[derive(Clone)]
pub struct ModerationService {
    post_repo: PostRepository,
    comment_repo: CommentRepository,
    word_repo: RestrictedWordRepository,
}

impl ModerationService {
    /// Create a new moderation service.
    #[must_use]
    pub const fn new(
        post_repo: PostRepository,
        comment_repo: CommentRepository,
        word_repo: RestrictedWordRepository,
    ) -> Self {
        Self {
            post_repo,
            comment_repo,
            word_repo,
        }
    }

    /// Flagged and reported posts and comments.
    pub async fn queue(&self) -> AppResult<Vec<ModerationItem>> {
        self.post_repo.moderation_queue().await
    }

    /// Approve or reject a queued item.
    pub async fn review(&self, admin: &Principal, input: FlaggedReviewInput) -> AppResult<()> {
        let decision = Decision::parse(&input.action)?;
        let id = input
            .id
            .ok_or_else(|| AppError::BadRequest("Missing id".to_string()))?;

        let (target, found) = match input.item_type.as_str() {
            "post" => {
                let audit = AuditEntry::new(
                    admin.id,
                    decision.audit_action(),
                    AuditTarget::Posts,
                    decision.details(),
                );
                let found = self
                    .post_repo
                    .moderate_with_audit(id, decision.status(), audit)
                    .await?;
                (AuditTarget::Posts, found)
            }
            "comment" => {
                let audit = AuditEntry::new(
                    admin.id,
                    decision.audit_action(),
                    AuditTarget::Comments,
                    decision.details(),
                );
                let found = self
                    .comment_repo
                    .moderate_with_audit(id, decision.status(), audit)
                    .await?;
                (AuditTarget::Comments, found)
            }
            _ => return Err(AppError::BadRequest("Invalid type".to_string())),
        };

        if !found {
            return Err(AppError::NotFound("Item not found".to_string()));
        }

        info!(admin_id = admin.id, ?target, id, ?decision, "Moderation decision recorded");
        Ok(())
    }

    /// Active restricted words.
    pub async fn restricted_words(&self) -> AppResult<Vec<restricted_word::Model>> {
        self.word_repo.list_active().await
    }

    /// Add a restricted word. Words are stored trimmed and lowercased.
    pub async fn add_restricted_word(
        &self,
        admin: &Principal,
        word: &str,
    ) -> AppResult<restricted_word::Model> {
        let word = word.trim().to_lowercase();
        if word.is_empty() {
            return Err(AppError::BadRequest("Word is required".to_string()));
        }

        let audit = AuditEntry::new(
            admin.id,
            AuditAction::Insert,
            AuditTarget::RestrictedWords,
            format!("Added restricted word: {word}"),
        );

        self.word_repo
            .create_with_audit(&word, audit)
            .await
            .map_err(|e| {
                if e.is_conflict() {
                    AppError::BadRequest("Word already exists".to_string())
                } else {
                    e
                }
            })
    }

    /// Remove a restricted word.
    pub async fn remove_restricted_word(&self, admin: &Principal, word_id: i32) -> AppResult<()> {
        let audit = AuditEntry::new(
            admin.id,
            AuditAction::Delete,
            AuditTarget::RestrictedWords,
            "Removed restricted word",
        );

        if self.word_repo.delete_with_audit(word_id, audit).await? {
            Ok(())
        } else {
            Err(AppError::NotFound("Word not found".to_string()))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::principal::Role;
    use chrono::Utc;
    use reelhouse_db::entities::audit_log;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::Arc;

    fn words(list: &[&str]) -> Vec<String> {
        list.iter().map(ToString::to_string).collect()
    }

    fn moderator() -> Principal {
        Principal {
            id: 1,
            name: "mod".to_string(),
            role: Role::ContentModerator,
            email: "mod@example.com".to_string(),
        }
    }

    fn audit_row(target: AuditTarget) -> audit_log::Model {
        audit_log::Model {
            log_id: 1,
            admin_id: Some(1),
            action_type: "MODERATE_REJECT".to_string(),
            target_table: target,
            target_record_id: Some(7),
            action_details: Some("Rejected flagged content.".to_string()),
            performed_at: Utc::now().into(),
        }
    }

    fn service(db: MockDatabase) -> ModerationService {
        let db = Arc::new(db.into_connection());
        ModerationService::new(
            PostRepository::new(db.clone()),
            CommentRepository::new(db.clone()),
            RestrictedWordRepository::new(db),
        )
    }

    #[test]
    fn test_whole_word_case_insensitive() {
        let list = words(&["spoiler"]);

        assert!(contains_restricted_word("Huge SPOILER ahead", &list).unwrap());
        assert!(contains_restricted_word("spoiler.", &list).unwrap());
        assert!(!contains_restricted_word("no spoilers here", &list).unwrap());
    }

    #[test]
    fn test_words_are_matched_literally() {
        let list = words(&["a+b", "  "]);

        assert!(contains_restricted_word("x a+b y", &list).unwrap());
        assert!(!contains_restricted_word("aab", &list).unwrap());
    }

    #[test]
    fn test_words_with_symbol_edges() {
        let list = vec!["@$$".to_string(), "#spoiler".to_string()];
        assert!(contains_restricted_word("what an @$$ move", &list).unwrap());
        assert!(contains_restricted_word("@$$", &list).unwrap());
        assert!(contains_restricted_word("Trending: #SPOILER!", &list).unwrap());
        assert!(!contains_restricted_word("x@$$y", &list).unwrap());
        assert!(!contains_restricted_word("#spoilers", &list).unwrap());
    }

    #[test]
    fn test_empty_list_never_matches() {
        assert!(!contains_restricted_word("anything", &[]).unwrap());
    }

    #[tokio::test]
    async fn test_invalid_action_rejected_before_any_query() {
        let moderation = service(MockDatabase::new(DatabaseBackend::Postgres));
        let input = FlaggedReviewInput {
            item_type: "post".to_string(),
            id: Some(7),
            action: "delete".to_string(),
        };

        let err = moderation.review(&moderator(), input).await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid action");
    }

    #[tokio::test]
    async fn test_invalid_type() {
        let moderation = service(MockDatabase::new(DatabaseBackend::Postgres));
        let input = FlaggedReviewInput {
            item_type: "movie".to_string(),
            id: Some(7),
            action: "approve".to_string(),
        };

        let err = moderation.review(&moderator(), input).await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid type");
    }

    #[tokio::test]
    async fn test_reject_comment() {
        let moderation = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .append_query_results([[audit_row(AuditTarget::Comments)]]),
        );
        let input = FlaggedReviewInput {
            item_type: "comment".to_string(),
            id: Some(7),
            action: "reject".to_string(),
        };

        moderation.review(&moderator(), input).await.unwrap();
    }

    #[tokio::test]
    async fn test_missing_item_is_not_found() {
        let moderation = service(
            MockDatabase::new(DatabaseBackend::Postgres).append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }]),
        );
        let input = FlaggedReviewInput {
            item_type: "post".to_string(),
            id: Some(404),
            action: "approve".to_string(),
        };

        let err = moderation.review(&moderator(), input).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_blank_word_rejected() {
        let moderation = service(MockDatabase::new(DatabaseBackend::Postgres));
        let err = moderation
            .add_restricted_word(&moderator(), "   ")
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Word is required");
    }
}
