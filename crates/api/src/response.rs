//! API response types.

use axum::Json;
use serde::Serialize;

/// `{"success": true}`.
#[derive(Debug, Serialize)]
pub struct Success {
    pub success: bool,
}

/// Acknowledge a mutation.
#[must_use]
pub const fn success() -> Json<Success> {
    Json(Success { success: true })
}

/// Login result telling the page where to go next.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub redirect: &'static str,
}

/// A mutation that reports how many rows it touched.
#[derive(Debug, Serialize)]
pub struct CountResponse {
    pub success: bool,
    pub count: u64,
}

/// A bare counter, e.g. unseen notifications.
#[derive(Debug, Serialize)]
pub struct Count {
    pub count: u64,
}
