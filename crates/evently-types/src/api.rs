use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::Role;

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub user_id: Uuid,
    pub token: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub user_id: Uuid,
    pub name: String,
    pub role: Role,
    pub token: String,
}

// -- Password reset --

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub password: String,
}

// -- Tags --

#[derive(Debug, Deserialize)]
pub struct CreateTagRequest {
    pub name: String,
}

// -- Events --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateEventRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub location: Option<String>,
    pub starts_at: chrono::DateTime<chrono::Utc>,
    #[serde(default)]
    pub price_cents: i64,
}

// -- Private messages --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SendMessageRequest {
    pub recipient_id: Uuid,
    pub content: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateMessageRequest {
    pub content: String,
}

/// Result of a scoped mutation. `count` is zero both when the message does
/// not exist and when the caller is not its sender.
#[derive(Debug, Serialize, Deserialize)]
pub struct AffectedResponse {
    pub count: usize,
}

// -- Badges --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AwardBadgeRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub image_url: Option<String>,
}

// -- Payments --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CheckoutRequest {
    pub event_id: Uuid,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CheckoutResponse {
    pub message: String,
    pub reference: String,
}

// -- Uploads --

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub path: String,
}
