//! Common utilities and shared types for reelhouse.
//!
//! This crate provides foundational components used across all reelhouse crates:
//!
//! - **Configuration**: Application settings via [`Config`]
//! - **Error handling**: Unified error types via [`AppError`] and [`AppResult`]
//! - **Tokens**: Session identifiers via [`IdGenerator`]
//!
//! # Example
//!
//! ```no_run
//! use reelhouse_common::{Config, IdGenerator, AppResult};
//!
//! fn example() -> AppResult<()> {
//!     let config = Config::load()?;
//!     let token = IdGenerator::new().generate_token();
//!     println!("Listening on {} with session {}", config.server.port, token);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod id;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use id::IdGenerator;
