//! Business logic for reelhouse.
//!
//! Services sit between the HTTP handlers and the repositories. Every
//! operation takes the acting [`Principal`] (or its id) explicitly and
//! returns an [`AppResult`](reelhouse_common::AppResult).

pub mod principal;
pub mod schedule;
pub mod scheduler;
pub mod services;

pub use principal::{Principal, Role};
pub use scheduler::{JobExecutor, run_scheduler};
pub use services::*;
