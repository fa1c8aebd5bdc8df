//! Notification service.

use chrono::{Duration, Utc};
use reelhouse_common::AppResult;
use reelhouse_db::{
    entities::notification::{self, NotificationType},
    repositories::{NewNotification, NotificationRepository},
};
use tracing::warn;

use crate::principal::Principal;

/// How long a notification is kept before the next fetch purges it.
const RETENTION_HOURS: i64 = 24;

/// Notification service for business logic.
///
/// Delivery is best effort: the action that triggered a notification has
/// already been stored, so a failed insert is logged rather than returned.
#[derive(Clone)]
pub struct NotificationService {
    notification_repo: NotificationRepository,
}

impl NotificationService {
    /// Create a new notification service.
    #[must_use]
    pub const fn new(notification_repo: NotificationRepository) -> Self {
        Self { notification_repo }
    }

    /// Tell an author their post was liked.
    pub async fn post_liked(&self, author_id: i32, liker: &Principal, post_id: i32) {
        self.deliver(
            author_id,
            liker,
            NotificationType::Like,
            Some(post_id),
            format!("{} liked your post.", liker.name),
        )
        .await;
    }

    /// Tell an author their post got a comment.
    pub async fn post_commented(&self, author_id: i32, commenter: &Principal, post_id: i32) {
        self.deliver(
            author_id,
            commenter,
            NotificationType::Comment,
            Some(post_id),
            format!("{} commented on your post.", commenter.name),
        )
        .await;
    }

    /// Tell a member about an incoming friend request.
    pub async fn friend_requested(&self, receiver_id: i32, sender: &Principal, request_id: i32) {
        self.deliver(
            receiver_id,
            sender,
            NotificationType::FriendRequest,
            Some(request_id),
            format!("{} sent you a friend request.", sender.name),
        )
        .await;
    }

    /// Tell the sender their request was accepted.
    pub async fn friend_accepted(&self, sender_id: i32, receiver: &Principal) {
        self.deliver(
            sender_id,
            receiver,
            NotificationType::FriendAccepted,
            None,
            format!("{} accepted your friend request.", receiver.name),
        )
        .await;
    }

    /// Tell a member about a new direct message.
    pub async fn message_received(&self, receiver_id: i32, sender: &Principal, message_id: i32) {
        self.deliver(
            receiver_id,
            sender,
            NotificationType::PrivateMessage,
            Some(message_id),
            format!("{} sent you a private message.", sender.name),
        )
        .await;
    }

    /// Tell a host someone joined their event.
    pub async fn event_joined(
        &self,
        host_id: i32,
        participant: &Principal,
        event_id: i32,
        event_title: &str,
    ) {
        self.deliver(
            host_id,
            participant,
            NotificationType::EventJoined,
            Some(event_id),
            format!("{} joined your event {}.", participant.name, event_title),
        )
        .await;
    }

    /// Purge the user's expired notifications, then return the unseen ones,
    /// newest first.
    pub async fn list_unseen(&self, user_id: i32) -> AppResult<Vec<notification::Model>> {
        let cutoff = Utc::now() - Duration::hours(RETENTION_HOURS);
        self.notification_repo
            .purge_older_than(user_id, cutoff.into())
            .await?;
        self.notification_repo.unseen(user_id).await
    }

    /// Count unseen notifications.
    pub async fn count_unseen(&self, user_id: i32) -> AppResult<u64> {
        self.notification_repo.count_unseen(user_id).await
    }

    /// Mark every notification of the user as seen.
    pub async fn mark_all_seen(&self, user_id: i32) -> AppResult<u64> {
        self.notification_repo.mark_all_seen(user_id).await
    }

    async fn deliver(
        &self,
        user_id: i32,
        sender: &Principal,
        kind: NotificationType,
        reference_id: Option<i32>,
        message: String,
    ) {
        let new = NewNotification {
            user_id,
            sender_id: Some(sender.id),
            kind,
            reference_id,
            message,
        };

        if let Err(e) = self.notification_repo.create(new).await {
            warn!(error = %e, user_id, ?kind, "Failed to store notification");
        }
    }
}
