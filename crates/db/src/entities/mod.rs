//! Database entities.

#![allow(missing_docs)]

pub mod admin;
pub mod audit_log;
pub mod comment;
pub mod discussion_forum;
pub mod event;
pub mod event_participation;
pub mod friend_request;
pub mod friendship;
pub mod genre;
pub mod history;
pub mod like;
pub mod movie;
pub mod movie_genre;
pub mod movie_statistics;
pub mod notification;
pub mod post;
pub mod private_message;
pub mod rating;
pub mod restricted_word;
pub mod review;
pub mod user;
pub mod watchlist;

pub use admin::Entity as Admin;
pub use audit_log::Entity as AuditLog;
pub use comment::Entity as Comment;
pub use discussion_forum::Entity as DiscussionForum;
pub use event::Entity as Event;
pub use event_participation::Entity as EventParticipation;
pub use friend_request::Entity as FriendRequest;
pub use friendship::Entity as Friendship;
pub use genre::Entity as Genre;
pub use history::Entity as History;
pub use like::Entity as Like;
pub use movie::Entity as Movie;
pub use movie_genre::Entity as MovieGenre;
pub use movie_statistics::Entity as MovieStatistics;
pub use notification::Entity as Notification;
pub use post::Entity as Post;
pub use private_message::Entity as PrivateMessage;
pub use rating::Entity as Rating;
pub use restricted_word::Entity as RestrictedWord;
pub use review::Entity as Review;
pub use user::Entity as User;
pub use watchlist::Entity as Watchlist;
