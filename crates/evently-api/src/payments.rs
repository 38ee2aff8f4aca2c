use std::time::Duration;

use async_trait::async_trait;
use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::WithRejection;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use evently_db::models::PaymentRow;
use evently_types::api::{CheckoutRequest, CheckoutResponse};
use evently_types::models::Claims;

use crate::error::{ApiError, ApiResult};
use crate::{AppState, run_blocking};

pub const CURRENCY: &str = "usd";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChargeRequest {
    pub event_id: Uuid,
    pub user_id: Uuid,
    pub amount_cents: i64,
    pub currency: String,
}

/// What a payment provider reports back. Checkout only branches on `success`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaymentResult {
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub reference: Option<String>,
}

impl PaymentResult {
    pub fn approved(reference: impl Into<String>) -> Self {
        Self {
            success: true,
            error: None,
            reference: Some(reference.into()),
        }
    }

    pub fn declined(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            reference: None,
        }
    }
}

/// External payment provider seam. Transport failures are reported as a
/// declined result, never as an error.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn charge(&self, req: &ChargeRequest) -> PaymentResult;
}

/// POSTs the charge as JSON to a provider endpoint that answers with a
/// [`PaymentResult`] body.
pub struct HttpPaymentGateway {
    client: reqwest::Client,
    url: String,
}

impl HttpPaymentGateway {
    pub fn new(url: impl Into<String>) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
    async fn charge(&self, req: &ChargeRequest) -> PaymentResult {
        let response = match self.client.post(&self.url).json(req).send().await {
            Ok(resp) => resp,
            Err(e) => {
                warn!("Payment provider unreachable: {}", e);
                return PaymentResult::declined("Payment provider unavailable");
            }
        };

        let status = response.status();
        match response.json::<PaymentResult>().await {
            Ok(result) => result,
            Err(e) => {
                warn!("Unreadable payment provider response ({}): {}", status, e);
                PaymentResult::declined("Payment provider returned an invalid response")
            }
        }
    }
}

/// Used when no provider is configured: free events go through, priced ones are declined.
pub struct FreeEventsGateway;

#[async_trait]
impl PaymentGateway for FreeEventsGateway {
    async fn charge(&self, req: &ChargeRequest) -> PaymentResult {
        if req.amount_cents == 0 {
            PaymentResult::approved(format!("free-{}", Uuid::new_v4()))
        } else {
            PaymentResult::declined("Payments are not configured")
        }
    }
}

/// POST /api/payments/checkout: 200 `{message, reference}` when the provider
/// approves, 402 `{error}` when it declines.
pub async fn checkout(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    WithRejection(Json(req), _): WithRejection<Json<CheckoutRequest>, ApiError>,
) -> ApiResult<Response> {
    let event_id = req.event_id.to_string();
    let event = run_blocking(&state, move |s| s.db.get_event(&event_id))
        .await?
        .ok_or(ApiError::NotFound)?;

    let charge = ChargeRequest {
        event_id: req.event_id,
        user_id: claims.sub,
        amount_cents: event.price_cents,
        currency: CURRENCY.to_string(),
    };
    let result = state.payments.charge(&charge).await;

    if !result.success {
        let error = result.error.unwrap_or_else(|| "Payment failed".to_string());
        info!("Payment for event {} by {} declined: {}", charge.event_id, claims.sub, error);
        return Ok((StatusCode::PAYMENT_REQUIRED, Json(json!({ "error": error }))).into_response());
    }

    let reference = result
        .reference
        .unwrap_or_else(|| format!("local-{}", Uuid::new_v4()));
    let payment_id = Uuid::new_v4();
    let stored = reference.clone();
    run_blocking(&state, move |s| {
        s.db.insert_payment(
            &payment_id.to_string(),
            &charge.event_id.to_string(),
            &charge.user_id.to_string(),
            charge.amount_cents,
            &stored,
        )
    })
    .await?;

    info!("Payment {} recorded for event {} ({})", payment_id, req.event_id, reference);
    Ok(Json(CheckoutResponse {
        message: "Payment successful".into(),
        reference,
    })
    .into_response())
}

/// The caller's own payments, newest first.
pub async fn list_payments(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    let user_id = claims.sub.to_string();
    let rows = run_blocking(&state, move |s| s.db.get_payments_for_user(&user_id)).await?;
    let payments = rows
        .into_iter()
        .map(PaymentRow::into_payment)
        .collect::<anyhow::Result<Vec<_>>>()?;
    Ok(Json(payments))
}
