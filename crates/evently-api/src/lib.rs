pub mod actions;
pub mod auth;
pub mod badges;
pub mod error;
pub mod events;
pub mod mailer;
pub mod messages;
pub mod middleware;
pub mod password;
pub mod payments;
pub mod tags;
pub mod trends;
pub mod uploads;
pub mod users;

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    routing::{get, patch, post},
};
use tower_http::services::ServeDir;

use evently_crypto::TextCipher;
use evently_db::{Database, DocStore};

use crate::mailer::Mailer;
use crate::payments::PaymentGateway;
use crate::uploads::UploadDir;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub docs: DocStore,
    pub jwt_secret: String,
    pub cipher: TextCipher,
    pub uploads: UploadDir,
    pub mailer: Arc<dyn Mailer>,
    pub payments: Arc<dyn PaymentGateway>,
    /// Static front-end root, served for any path no API route claims.
    pub public_dir: PathBuf,
    /// Base URL used when building links sent by email.
    pub public_url: String,
    /// Registering with this email grants the admin role.
    pub admin_email: Option<String>,
}

/// Run blocking DB work off the async runtime.
pub(crate) async fn run_blocking<F, T>(state: &AppState, f: F) -> anyhow::Result<T>
where
    F: FnOnce(&AppStateInner) -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state))
        .await
        .map_err(|e| anyhow::anyhow!("spawn_blocking join error: {}", e))?
}

/// The full application: API routes, the static front-end behind the page
/// guard, and uploaded files.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/forgot-password", post(password::forgot_password))
        .route("/api/reset-password", post(password::reset_password))
        .route("/api/tags", get(tags::list_tags).post(tags::create_tag))
        .route("/api/events", get(events::list_events))
        .route("/api/events/{event_id}", get(events::get_event))
        .route("/api/trends", get(trends::top_trends))
        .route("/api/users/{user_id}/badges", get(badges::list_badges))
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route("/api/users/me", get(users::me))
        .route("/api/users/me/avatar", post(users::upload_avatar))
        .route("/api/users/{user_id}/badges", post(badges::award_badge))
        .route("/api/events", post(events::create_event))
        .route(
            "/api/messages",
            get(messages::list_messages).post(messages::send_message),
        )
        .route(
            "/api/messages/{message_id}",
            patch(messages::update_message).delete(messages::delete_message),
        )
        .route("/api/trends/{kind}/{name}", post(trends::bump_trend))
        .route("/api/payments", get(payments::list_payments))
        .route("/api/payments/checkout", post(payments::checkout))
        .layer(DefaultBodyLimit::max(uploads::MAX_UPLOAD_SIZE))
        .layer(from_fn_with_state(state.clone(), middleware::require_auth))
        .with_state(state.clone());

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .fallback_service(ServeDir::new(&state.public_dir))
        .layer(from_fn_with_state(state.clone(), middleware::route_guard))
        .nest_service("/uploads", ServeDir::new(state.uploads.dir()))
        .route("/health", get(|| async { "ok" }))
}
