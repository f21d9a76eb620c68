use crate::{
    entity::{sea_orm_active_enums::OrderStatus, stripe_event},
    error::ApiError,
    orders::{self, Settlement},
    state::AppState,
};
use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use sea_orm::{ActiveModelTrait, ActiveValue::Set, EntityTrait};
use stripe::{Event, EventObject, EventType, Webhook};

#[tracing::instrument(name = "POST /webhook/stripe", skip(state, headers, payload))]
pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let webhook_secret = state
        .config
        .stripe_webhook_secret
        .as_deref()
        .ok_or_else(|| ApiError::service_unavailable("Webhook secret not configured"))?;

    let signature = headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::bad_request("Missing stripe-signature header"))?;

    let payload_str = std::str::from_utf8(&payload)
        .map_err(|_| ApiError::bad_request("Invalid UTF-8 in payload"))?;

    let event = Webhook::construct_event(payload_str, signature, webhook_secret)
        .map_err(|e| ApiError::bad_request(format!("Failed to verify webhook signature: {}", e)))?;

    let event_id = event.id.to_string();
    if is_event_processed(&state, &event_id).await? {
        tracing::info!(event_id = %event_id, "Duplicate event, skipping");
        return Ok(StatusCode::OK);
    }

    match handle_stripe_event(&state, &event).await {
        Ok(_) => {
            mark_event_processed(&state, &event_id, &event.type_.to_string()).await?;
            Ok(StatusCode::OK)
        }
        Err(e) => {
            tracing::error!(event_id = %event_id, "Failed to process webhook");
            Err(e)
        }
    }
}

async fn is_event_processed(state: &AppState, event_id: &str) -> Result<bool, ApiError> {
    let existing = stripe_event::Entity::find_by_id(event_id)
        .one(&state.db)
        .await?;

    Ok(existing.is_some())
}

async fn mark_event_processed(
    state: &AppState,
    event_id: &str,
    event_type: &str,
) -> Result<(), ApiError> {
    let new_event = stripe_event::ActiveModel {
        id: Set(event_id.to_string()),
        event_type: Set(event_type.to_string()),
        processed_at: Set(chrono::Utc::now().naive_utc()),
    };

    new_event.insert(&state.db).await?;
    Ok(())
}

async fn handle_stripe_event(state: &AppState, event: &Event) -> Result<(), ApiError> {
    match event.type_ {
        EventType::CheckoutSessionCompleted | EventType::CheckoutSessionAsyncPaymentSucceeded => {
            if let EventObject::CheckoutSession(session) = &event.data.object {
                handle_checkout_completed(state, session).await?;
            }
        }
        EventType::CheckoutSessionExpired | EventType::CheckoutSessionAsyncPaymentFailed => {
            if let EventObject::CheckoutSession(session) = &event.data.object {
                handle_checkout_expired(state, session).await?;
            }
        }
        _ => {
            tracing::debug!(event_type = %event.type_, "Unhandled event type");
        }
    }

    Ok(())
}

/// Asks the provider to retry when the session arrives before the order
/// recorded it.
fn settlement_result(settlement: Settlement, session_id: &str) -> Result<(), ApiError> {
    match settlement {
        Settlement::Skipped(OrderStatus::AwaitingSession) => Err(ApiError::conflict(format!(
            "Order for session {session_id} has no session attached yet"
        ))),
        _ => Ok(()),
    }
}

async fn handle_checkout_completed(
    state: &AppState,
    session: &stripe::CheckoutSession,
) -> Result<(), ApiError> {
    let session_id = session.id.to_string();

    tracing::info!(
        session_id = %session_id,
        client_reference_id = ?session.client_reference_id,
        payment_status = ?session.payment_status,
        "Processing checkout.session.completed"
    );

    // delayed methods complete the session before the money arrives
    if session.payment_status != stripe::CheckoutSessionPaymentStatus::Paid {
        tracing::info!(session_id = %session_id, "Session completed but not paid yet");
        return Ok(());
    }

    let settlement = orders::complete_session(
        &state.db,
        &session_id,
        session.client_reference_id.as_deref(),
        chrono::Utc::now().naive_utc(),
    )
    .await?;
    settlement_result(settlement, &session_id)
}

async fn handle_checkout_expired(
    state: &AppState,
    session: &stripe::CheckoutSession,
) -> Result<(), ApiError> {
    let session_id = session.id.to_string();

    tracing::info!(
        session_id = %session_id,
        client_reference_id = ?session.client_reference_id,
        "Processing checkout session expiry"
    );

    let settlement = orders::expire_session(
        &state.db,
        &session_id,
        session.client_reference_id.as_deref(),
        chrono::Utc::now().naive_utc(),
    )
    .await?;
    settlement_result(settlement, &session_id)
}
