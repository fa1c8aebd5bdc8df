//! Friend requests, friendships and friend profiles.

use chrono::{DateTime, FixedOffset};
use reelhouse_common::{AppError, AppResult};
use reelhouse_db::{
    entities::friend_request::{self, FriendRequestStatus},
    repositories::{
        FriendRepository, PendingRequest, PostRepository, ProfilePost, UserRepository,
        UserSummary,
    },
};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::notification::NotificationService;
use crate::principal::Principal;

const ALREADY_CONNECTED: &str = "Friend request already sent or users are already friends.";

/// Maximum people returned by a search.
const SEARCH_LIMIT: u64 = 5;

#[derive(Debug, Default, Deserialize)]
pub struct FriendRequestInput {
    pub receiver_id: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RespondInput {
    pub request_id: Option<i32>,
    #[serde(default)]
    pub action: String,
}

/// What a friend sees of another member.
#[derive(Debug, Clone, Serialize)]
pub struct FriendProfile {
    pub user: ProfileUser,
    pub posts: Vec<ProfilePost>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfileUser {
    pub name: String,
    pub email: String,
    pub created_at: DateTime<FixedOffset>,
}

/// Friend service.
#[derive(Clone)]
pub struct FriendService {
    friend_repo: FriendRepository,
    user_repo: UserRepository,
    post_repo: PostRepository,
    notifications: NotificationService,
}

impl FriendService {
    /// Create a new friend service.
    #[must_use]
    pub const fn new(
        friend_repo: FriendRepository,
        user_repo: UserRepository,
        post_repo: PostRepository,
        notifications: NotificationService,
    ) -> Self {
        Self {
            friend_repo,
            user_repo,
            post_repo,
            notifications,
        }
    }

    /// People the user could send a request to.
    pub async fn search(&self, user_id: i32, query: &str) -> AppResult<Vec<UserSummary>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        self.user_repo
            .search_candidates(user_id, query, SEARCH_LIMIT)
            .await
    }

    /// Ask another member to be friends.
    ///
    /// A request the same sender had declined is reopened instead of
    /// inserting a second row.
    pub async fn send_request(
        &self,
        sender: &Principal,
        input: FriendRequestInput,
    ) -> AppResult<()> {
        let receiver_id = input
            .receiver_id
            .ok_or_else(|| AppError::BadRequest("Missing receiver".to_string()))?;

        if receiver_id == sender.id {
            return Err(AppError::BadRequest(
                "You cannot send a friend request to yourself.".to_string(),
            ));
        }
        if self.user_repo.find_by_id(receiver_id).await?.is_none() {
            return Err(AppError::NotFound("User not found".to_string()));
        }
        if self.friend_repo.are_friends(sender.id, receiver_id).await? {
            return Err(AppError::BadRequest(ALREADY_CONNECTED.to_string()));
        }

        let existing = self
            .friend_repo
            .requests_between(sender.id, receiver_id)
            .await?;
        let request_id = match reusable_request(&existing, sender.id)? {
            Some(request_id) => {
                self.friend_repo.reopen_request(request_id).await?;
                request_id
            }
            None => {
                self.friend_repo
                    .create_request(sender.id, receiver_id)
                    .await
                    .map_err(|e| {
                        if e.is_conflict() {
                            AppError::BadRequest(ALREADY_CONNECTED.to_string())
                        } else {
                            e
                        }
                    })?
                    .request_id
            }
        };

        info!(request_id, sender_id = sender.id, receiver_id, "Friend request sent");
        self.notifications
            .friend_requested(receiver_id, sender, request_id)
            .await;
        Ok(())
    }

    /// Pending requests addressed to the user.
    pub async fn pending(&self, user_id: i32) -> AppResult<Vec<PendingRequest>> {
        self.friend_repo.pending_for(user_id).await
    }

    /// Accept or decline a pending request addressed to `receiver`.
    pub async fn respond(&self, receiver: &Principal, input: RespondInput) -> AppResult<()> {
        let accept = match input.action.as_str() {
            "accepted" => true,
            "declined" => false,
            _ => return Err(AppError::BadRequest("Invalid action".to_string())),
        };
        let request_id = input
            .request_id
            .ok_or_else(|| AppError::BadRequest("Missing request id".to_string()))?;

        let not_found = || AppError::NotFound("Friend request not found".to_string());
        let request = self
            .friend_repo
            .find_pending_for_receiver(request_id, receiver.id)
            .await?
            .ok_or_else(not_found)?;

        if !self.friend_repo.respond(&request, accept).await? {
            return Err(not_found());
        }

        if accept {
            info!(request_id, "Friend request accepted");
            self.notifications
                .friend_accepted(request.sender_id, receiver)
                .await;
        }
        Ok(())
    }

    /// The user's friends by name.
    pub async fn list(&self, user_id: i32) -> AppResult<Vec<UserSummary>> {
        self.friend_repo.list_friends(user_id).await
    }

    /// A friend's profile and posts. Only friends may look.
    pub async fn profile(&self, viewer_id: i32, friend_id: i32) -> AppResult<FriendProfile> {
        if !self.friend_repo.are_friends(viewer_id, friend_id).await? {
            return Err(AppError::Forbidden(
                "You can only view profiles of your friends.".to_string(),
            ));
        }

        let user = self
            .user_repo
            .find_by_id(friend_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
        let posts = self.post_repo.list_by_user(friend_id).await?;

        Ok(FriendProfile {
            user: ProfileUser {
                name: user.name,
                email: user.email,
                created_at: user.created_at,
            },
            posts,
        })
    }
}

/// Decide from the requests between two members whether a new one may be
/// sent. Returns the id of a declined request of the same sender to reopen.
fn reusable_request(
    existing: &[friend_request::Model],
    sender_id: i32,
) -> AppResult<Option<i32>> {
    if existing
        .iter()
        .any(|r| r.status != FriendRequestStatus::Declined)
    {
        return Err(AppError::BadRequest(ALREADY_CONNECTED.to_string()));
    }

    Ok(existing
        .iter()
        .find(|r| r.sender_id == sender_id)
        .map(|r| r.request_id))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::principal::Role;
    use chrono::Utc;
    use maplit::btreemap;
    use reelhouse_db::{entities::user, repositories::NotificationRepository};
    use sea_orm::{DatabaseBackend, MockDatabase, Value};
    use std::sync::Arc;

    fn member(id: i32) -> Principal {
        Principal {
            id,
            name: "Rosa".to_string(),
            role: Role::User,
            email: "rosa@example.com".to_string(),
        }
    }

    fn request(id: i32, sender: i32, receiver: i32, status: FriendRequestStatus) -> friend_request::Model {
        friend_request::Model {
            request_id: id,
            sender_id: sender,
            receiver_id: receiver,
            status,
            sent_at: Utc::now().into(),
            responded_at: None,
        }
    }

    fn test_user(id: i32) -> user::Model {
        user::Model {
            user_id: id,
            email: format!("user{id}@example.com"),
            name: format!("User {id}"),
            password_hash: "x".to_string(),
            created_at: Utc::now().into(),
            last_login: None,
        }
    }

    fn service(db: MockDatabase) -> FriendService {
        let db = Arc::new(db.into_connection());
        FriendService::new(
            FriendRepository::new(db.clone()),
            UserRepository::new(db.clone()),
            PostRepository::new(db.clone()),
            NotificationService::new(NotificationRepository::new(db)),
        )
    }

    #[test]
    fn test_pending_request_blocks_new_one() {
        let existing = [request(1, 3, 9, FriendRequestStatus::Pending)];
        assert!(reusable_request(&existing, 9).is_err());
    }

    #[test]
    fn test_own_declined_request_is_reused() {
        let existing = [request(1, 9, 3, FriendRequestStatus::Declined)];
        assert_eq!(reusable_request(&existing, 9).unwrap(), Some(1));
    }

    #[test]
    fn test_declined_request_from_other_side_allows_new_one() {
        let existing = [request(1, 3, 9, FriendRequestStatus::Declined)];
        assert_eq!(reusable_request(&existing, 9).unwrap(), None);
    }

    #[tokio::test]
    async fn test_request_to_self() {
        let friends = service(MockDatabase::new(DatabaseBackend::Postgres));
        let err = friends
            .send_request(&member(9), FriendRequestInput { receiver_id: Some(9) })
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "You cannot send a friend request to yourself.");
    }

    #[tokio::test]
    async fn test_request_to_unknown_user() {
        let friends = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user::Model>::new()]),
        );

        let err = friends
            .send_request(&member(9), FriendRequestInput { receiver_id: Some(3) })
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_request_to_existing_friend() {
        let friends = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_user(3)]])
                .append_query_results([[btreemap! { "num_items" => Value::BigInt(Some(1)) }]]),
        );

        let err = friends
            .send_request(&member(9), FriendRequestInput { receiver_id: Some(3) })
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), ALREADY_CONNECTED);
    }

    #[tokio::test]
    async fn test_invalid_response_action() {
        let friends = service(MockDatabase::new(DatabaseBackend::Postgres));
        let err = friends
            .respond(
                &member(9),
                RespondInput {
                    request_id: Some(1),
                    action: "maybe".to_string(),
                },
            )
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Invalid action");
    }

    #[tokio::test]
    async fn test_profile_of_stranger_is_forbidden() {
        let friends = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[btreemap! { "num_items" => Value::BigInt(Some(0)) }]]),
        );

        let err = friends.profile(9, 3).await.unwrap_err();
        assert_eq!(err.to_string(), "You can only view profiles of your friends.");
    }

    #[tokio::test]
    async fn test_empty_search() {
        let friends = service(MockDatabase::new(DatabaseBackend::Postgres));
        assert!(friends.search(9, "  ").await.unwrap().is_empty());
    }
}
