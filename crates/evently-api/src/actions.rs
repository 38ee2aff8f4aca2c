//! Server actions: the operations behind the HTTP handlers, callable directly
//! from any server-side code. Each one is a single persistence call plus the
//! shaping around it.

use chrono::{Duration, Utc};
use serde::Serialize;
use tracing::{debug, error, info};
use uuid::Uuid;

use evently_crypto::tokens::{generate_token, hash_token};
use evently_db::models::{PrivateMessageRow, TagRow};
use evently_db::parse_timestamp;
use evently_types::models::{PrivateMessage, Tag};

use crate::auth::{hash_password, validate_password};
use crate::error::{ApiError, ApiResult};
use crate::{AppState, run_blocking};

const RESET_TOKEN_TTL_HOURS: i64 = 1;
const INBOX_LIMIT: u32 = 200;

// -- Tags --

/// Insert a tag. Names are not deduplicated.
pub async fn create_tag(state: &AppState, name: String) -> ApiResult<Tag> {
    let id = Uuid::new_v4();
    let tag = run_blocking(state, move |s| {
        s.db.insert_tag(&id.to_string(), &name)?;
        Ok(Tag { id, name })
    })
    .await?;
    Ok(tag)
}

pub async fn list_tags(state: &AppState) -> ApiResult<Vec<Tag>> {
    let rows = run_blocking(state, |s| s.db.list_tags()).await?;
    let tags = rows
        .into_iter()
        .map(TagRow::into_tag)
        .collect::<anyhow::Result<Vec<_>>>()?;
    Ok(tags)
}

// -- Private messages --

pub async fn send_private_message(
    state: &AppState,
    sender_id: Uuid,
    recipient_id: Uuid,
    content: String,
) -> ApiResult<PrivateMessage> {
    if content.trim().is_empty() {
        return Err(ApiError::bad_request("content must not be empty"));
    }
    let sealed = state.cipher.encrypt(&content)?;
    let id = Uuid::new_v4();

    let delivered = run_blocking(state, move |s| {
        if s.db.get_user_by_id(&recipient_id.to_string())?.is_none() {
            return Ok(false);
        }
        s.db.insert_private_message(
            &id.to_string(),
            &sender_id.to_string(),
            &recipient_id.to_string(),
            &sealed,
        )?;
        Ok(true)
    })
    .await?;

    if !delivered {
        return Err(ApiError::bad_request("unknown recipient"));
    }

    let now = Utc::now();
    Ok(PrivateMessage {
        id,
        sender_id,
        recipient_id,
        content,
        created_at: now,
        updated_at: now,
    })
}

/// Messages the user sent or received, newest first, decrypted.
pub async fn list_private_messages(state: &AppState, user_id: Uuid) -> ApiResult<Vec<PrivateMessage>> {
    let rows = run_blocking(state, move |s| {
        s.db.get_private_messages_for_user(&user_id.to_string(), INBOX_LIMIT)
    })
    .await?;

    rows.into_iter().map(|row| open_message(state, row)).collect()
}

fn open_message(state: &AppState, row: PrivateMessageRow) -> ApiResult<PrivateMessage> {
    Ok(PrivateMessage {
        id: Uuid::parse_str(&row.id).map_err(anyhow::Error::from)?,
        sender_id: Uuid::parse_str(&row.sender_id).map_err(anyhow::Error::from)?,
        recipient_id: Uuid::parse_str(&row.recipient_id).map_err(anyhow::Error::from)?,
        content: state.cipher.decrypt(&row.content)?,
        created_at: parse_timestamp(&row.created_at)?,
        updated_at: parse_timestamp(&row.updated_at)?,
    })
}

/// Scoped update. Returns rows affected; zero for both an unknown message and
/// a message the user did not send.
pub async fn update_private_message(
    state: &AppState,
    message_id: Uuid,
    user_id: Uuid,
    content: String,
) -> ApiResult<usize> {
    if content.trim().is_empty() {
        return Err(ApiError::bad_request("content must not be empty"));
    }
    let sealed = state.cipher.encrypt(&content)?;
    let count = run_blocking(state, move |s| {
        s.db.update_private_message(&message_id.to_string(), &user_id.to_string(), &sealed)
    })
    .await?;
    Ok(count)
}

/// Scoped delete, same collapsed semantics as [`update_private_message`].
pub async fn delete_private_message(
    state: &AppState,
    message_id: Uuid,
    user_id: Uuid,
) -> ApiResult<usize> {
    let count = run_blocking(state, move |s| {
        s.db.delete_private_message(&message_id.to_string(), &user_id.to_string())
    })
    .await?;
    Ok(count)
}

// -- Password reset --

/// Result object of the password reset steps; the routes only branch on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResetOutcome {
    pub success: bool,
    pub error: Option<String>,
}

impl ResetOutcome {
    fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    fn failed(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(msg.into()),
        }
    }
}

/// Issue a single-use reset token and email its link. Unknown emails report
/// success without sending anything.
pub async fn initialize_password_reset(state: &AppState, email: &str) -> ResetOutcome {
    let email = email.trim().to_string();
    let lookup = email.clone();
    let user = match run_blocking(state, move |s| s.db.get_user_by_email(&lookup)).await {
        Ok(user) => user,
        Err(e) => {
            error!("password reset lookup failed: {:#}", e);
            return ResetOutcome::failed("Failed to process password reset request");
        }
    };

    let Some(user) = user else {
        debug!("password reset requested for unknown email");
        return ResetOutcome::ok();
    };

    let token = generate_token();
    let token_hash = hash_token(&token);
    let expires_at = Utc::now() + Duration::hours(RESET_TOKEN_TTL_HOURS);
    let user_id = user.id.clone();
    let stored = run_blocking(state, move |s| {
        s.db.create_password_reset(&Uuid::new_v4().to_string(), &user_id, &token_hash, expires_at)
    })
    .await;
    if let Err(e) = stored {
        error!("storing password reset failed: {:#}", e);
        return ResetOutcome::failed("Failed to process password reset request");
    }

    let link = format!(
        "{}/reset-password/{}",
        state.public_url.trim_end_matches('/'),
        token
    );
    if let Err(e) = state.mailer.send_password_reset(&user.email, &link).await {
        error!("sending password reset email failed: {:#}", e);
        return ResetOutcome::failed("Failed to send password reset email");
    }

    info!("Password reset issued for user {}", user.id);
    ResetOutcome::ok()
}

/// Consume a reset token and set the new password.
pub async fn reset_password(state: &AppState, token: &str, password: &str) -> ResetOutcome {
    if let Err(e) = validate_password(password) {
        return ResetOutcome::failed(e.to_string());
    }
    if token.is_empty() {
        return ResetOutcome::failed("Invalid or expired reset token");
    }

    let password_hash = match hash_password(password) {
        Ok(hash) => hash,
        Err(e) => {
            error!("{:#}", e);
            return ResetOutcome::failed("Failed to reset password");
        }
    };
    let token_hash = hash_token(token);

    match run_blocking(state, move |s| {
        s.db.complete_password_reset(&token_hash, &password_hash, Utc::now())
    })
    .await
    {
        Ok(true) => ResetOutcome::ok(),
        Ok(false) => ResetOutcome::failed("Invalid or expired reset token"),
        Err(e) => {
            error!("completing password reset failed: {:#}", e);
            ResetOutcome::failed("Failed to reset password")
        }
    }
}
