use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use shutterlink::Money;
use utoipa::ToSchema;

use crate::{
    error::ApiError,
    orders::{self, NewCheckout},
    state::AppState,
    validation::Validator,
};

/// Largest quantity accepted for a single image.
pub const MAX_QUANTITY: i64 = 100;

fn default_quantity() -> i64 {
    1
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutItem {
    #[serde(default)]
    pub image_id: String,
    #[serde(default = "default_quantity")]
    pub quantity: i64,
    /// Price the client displayed. Ignored; stored prices are charged.
    #[serde(default)]
    pub price: Option<f64>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    #[serde(default)]
    pub gallery_id: String,
    #[serde(default)]
    pub items: Vec<CheckoutItem>,
    #[serde(default)]
    pub client_email: String,
    #[serde(default)]
    pub client_name: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    /// Hosted payment page to redirect the client to
    pub url: String,
    pub order_id: String,
    pub total: Money,
}

#[utoipa::path(
    post,
    path = "/checkout",
    tag = "checkout",
    request_body = CheckoutRequest,
    responses(
        (status = 200, description = "Order created and payment session opened", body = CheckoutResponse),
        (status = 400, description = "Empty cart, invalid item or email"),
        (status = 404, description = "Gallery not found or inactive"),
        (status = 410, description = "Gallery has expired"),
        (status = 500, description = "Payment session could not be created; the order is marked failed"),
        (status = 503, description = "No payment provider configured")
    )
)]
#[tracing::instrument(name = "POST /checkout", skip(state, body))]
pub async fn checkout(
    State(state): State<AppState>,
    Json(body): Json<CheckoutRequest>,
) -> Result<Json<CheckoutResponse>, ApiError> {
    let mut v = Validator::new();
    v.require("galleryId", &body.gallery_id);
    v.email("clientEmail", &body.client_email);
    if body.items.is_empty() {
        v.push("items", "select at least one image");
    }
    let mut items = Vec::with_capacity(body.items.len());
    for (index, item) in body.items.iter().enumerate() {
        if item.image_id.trim().is_empty() {
            v.push(format!("items[{index}].imageId"), "is required");
        }
        if !(1..=MAX_QUANTITY).contains(&item.quantity) {
            v.push(
                format!("items[{index}].quantity"),
                format!("must be between 1 and {MAX_QUANTITY}"),
            );
            continue;
        }
        items.push((item.image_id.trim().to_string(), item.quantity as u32));
    }
    v.finish()?;

    let checkout = NewCheckout {
        gallery_id: body.gallery_id.trim().to_string(),
        client_email: body.client_email.trim().to_string(),
        client_name: body.client_name,
        items,
    };

    let outcome = orders::start_checkout(&state, checkout, chrono::Utc::now().naive_utc()).await?;

    Ok(Json(CheckoutResponse {
        url: outcome.url,
        order_id: outcome.order_id,
        total: outcome.total,
    }))
}
