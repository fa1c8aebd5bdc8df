//! Business logic services.

#![allow(missing_docs)]

pub mod admin;
pub mod auth;
pub mod catalog;
pub mod dashboard;
pub mod event;
pub mod friend;
pub mod messaging;
pub mod moderation;
pub mod notification;
pub mod post;
pub mod review;
pub mod watchlist;

pub use admin::AdminService;
pub use auth::{AuthService, LoginInput, SignupInput, hash_password};
pub use catalog::{CatalogService, MovieForm};
pub use dashboard::{Dashboard, DashboardService, DashboardUser};
pub use event::{EventForm, EventService};
pub use friend::{FriendProfile, FriendRequestInput, FriendService, ProfileUser, RespondInput};
pub use messaging::{MessagingService, SendMessageInput};
pub use moderation::{FlaggedReviewInput, ModerationService, contains_restricted_word};
pub use notification::NotificationService;
pub use post::{ContentInput, CreatePostInput, PostService};
pub use review::{ReviewInput, ReviewService};
pub use watchlist::{WatchlistInput, WatchlistService};
