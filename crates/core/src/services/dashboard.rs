//! Member dashboard.

use reelhouse_common::{AppError, AppResult};
use reelhouse_db::repositories::{
    FriendRepository, MessageRepository, PostRepository, ReviewBrief, ReviewRepository,
    UserRepository, WatchlistBrief, WatchlistRepository,
};
use serde::Serialize;

const RECENT_WATCHLIST: u64 = 5;
const RECENT_REVIEWS: u64 = 3;

#[derive(Debug, Clone, Serialize)]
pub struct DashboardUser {
    pub name: String,
    pub email: String,
}

/// Everything the dashboard page shows.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub user: DashboardUser,
    pub system_id: i32,
    pub watchlist: Vec<WatchlistBrief>,
    pub reviews: Vec<ReviewBrief>,
    pub friend_count: u64,
    pub post_count: u64,
    pub completed_count: u64,
    pub unread_messages: u64,
}

/// Dashboard service.
#[derive(Clone)]
pub struct DashboardService {
    user_repo: UserRepository,
    watchlist_repo: WatchlistRepository,
    review_repo: ReviewRepository,
    friend_repo: FriendRepository,
    post_repo: PostRepository,
    message_repo: MessageRepository,
}

impl DashboardService {
    /// Create a new dashboard service.
    #[must_use]
    pub const fn new(
        user_repo: UserRepository,
        watchlist_repo: WatchlistRepository,
        review_repo: ReviewRepository,
        friend_repo: FriendRepository,
        post_repo: PostRepository,
        message_repo: MessageRepository,
    ) -> Self {
        Self {
            user_repo,
            watchlist_repo,
            review_repo,
            friend_repo,
            post_repo,
            message_repo,
        }
    }

    /// Everything the member dashboard shows, in one value.
    pub async fn load(&self, user_id: i32) -> AppResult<Dashboard> {
        let user = self
            .user_repo
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        let watchlist = self
            .watchlist_repo
            .recent_for_user(user_id, RECENT_WATCHLIST)
            .await?;
        let reviews = self
            .review_repo
            .recent_for_user(user_id, RECENT_REVIEWS)
            .await?;
        let friend_count = self.friend_repo.count_friends(user_id).await?;
        let post_count = self.post_repo.count_by_user(user_id).await?;
        let completed_count = self.watchlist_repo.count_completed(user_id).await?;
        let unread_messages = self.message_repo.count_unread(user_id).await?;

        Ok(Dashboard {
            user: DashboardUser {
                name: user.name,
                email: user.email,
            },
            system_id: user.user_id,
            watchlist,
            reviews,
            friend_count,
            post_count,
            completed_count,
            unread_messages,
        })
    }
}
