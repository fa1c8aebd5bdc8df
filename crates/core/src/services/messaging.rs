//! Private messages between friends.

use reelhouse_common::{AppError, AppResult};
use reelhouse_db::{
    entities::private_message,
    repositories::{FriendRepository, MessageRepository, ThreadMessage},
};
use serde::Deserialize;
use tracing::debug;

use super::notification::NotificationService;
use crate::principal::Principal;

/// Body of `POST /api/messages`.
#[derive(Debug, Default, Deserialize)]
pub struct SendMessageInput {
    pub receiver_id: Option<i32>,
    #[serde(default)]
    pub content: String,
}

/// Messaging service.
#[derive(Clone)]
pub struct MessagingService {
    message_repo: MessageRepository,
    friend_repo: FriendRepository,
    notifications: NotificationService,
}

impl MessagingService {
    /// Create a new messaging service.
    #[must_use]
    pub const fn new(
        message_repo: MessageRepository,
        friend_repo: FriendRepository,
        notifications: NotificationService,
    ) -> Self {
        Self {
            message_repo,
            friend_repo,
            notifications,
        }
    }

    /// Send a message to a friend.
    pub async fn send(
        &self,
        sender: &Principal,
        input: SendMessageInput,
    ) -> AppResult<private_message::Model> {
        if input.content.trim().is_empty() {
            return Err(AppError::BadRequest("Empty message".to_string()));
        }
        let receiver_id = input
            .receiver_id
            .ok_or_else(|| AppError::BadRequest("Missing receiver".to_string()))?;

        if !self.friend_repo.are_friends(sender.id, receiver_id).await? {
            return Err(AppError::Forbidden(
                "You can only message your friends.".to_string(),
            ));
        }

        let message = self
            .message_repo
            .create(sender.id, receiver_id, &input.content)
            .await?;

        self.notifications
            .message_received(receiver_id, sender, message.message_id)
            .await;
        Ok(message)
    }

    /// The conversation with a friend, oldest first. Incoming messages are
    /// marked read before the thread is loaded.
    pub async fn thread(&self, user_id: i32, friend_id: i32) -> AppResult<Vec<ThreadMessage>> {
        self.mark_read(user_id, friend_id).await?;
        self.message_repo.thread(user_id, friend_id).await
    }

    /// Mark a friend's messages to `user_id` read. Returns how many changed.
    pub async fn mark_read(&self, user_id: i32, friend_id: i32) -> AppResult<u64> {
        let read = self.message_repo.mark_thread_read(user_id, friend_id).await?;
        debug!(user_id, friend_id, read, "Messages marked read");
        Ok(read)
    }
}
