use std::collections::HashMap;

use axum::{
    Extension, Json,
    extract::{Path, State},
};
use chrono::NaiveDateTime;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::Serialize;
use shutterlink::Money;
use utoipa::ToSchema;

use crate::{
    entity::{order, order_item, sea_orm_active_enums::OrderStatus},
    error::ApiError,
    middleware::jwt::AppUser,
    state::AppState,
};

use super::owned_gallery;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemResponse {
    pub image_id: String,
    pub price: Money,
    pub quantity: i32,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub id: String,
    pub client_email: String,
    pub client_name: String,
    pub total: Money,
    pub currency: String,
    pub status: OrderStatus,
    pub failure_reason: Option<String>,
    pub created_at: NaiveDateTime,
    pub paid_at: Option<NaiveDateTime>,
    pub items: Vec<OrderItemResponse>,
}

fn money(cents: i64, what: &str) -> Result<Money, ApiError> {
    Money::from_minor(cents).map_err(|e| ApiError::internal(format!("{what} is corrupt: {e}")))
}

#[utoipa::path(
    get,
    path = "/galleries/{gallery_id}/orders",
    tag = "galleries",
    params(("gallery_id" = String, Path, description = "Gallery id")),
    responses(
        (status = 200, description = "Orders placed in this gallery, newest first", body = Vec<OrderResponse>),
        (status = 401, description = "Not signed in"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "No such gallery")
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(name = "GET /galleries/{gallery_id}/orders", skip(state, user))]
pub async fn list_orders(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
    Path(gallery_id): Path<String>,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let sub = user.sub()?;
    let gallery = owned_gallery(&state, &sub, &gallery_id).await?;

    let orders = order::Entity::find()
        .filter(order::Column::GalleryId.eq(&gallery.id))
        .order_by_desc(order::Column::CreatedAt)
        .all(&state.db)
        .await?;

    let order_ids: Vec<String> = orders.iter().map(|o| o.id.clone()).collect();
    let mut items: HashMap<String, Vec<OrderItemResponse>> = HashMap::new();
    if !order_ids.is_empty() {
        for item in order_item::Entity::find()
            .filter(order_item::Column::OrderId.is_in(order_ids))
            .order_by_asc(order_item::Column::Id)
            .all(&state.db)
            .await?
        {
            items
                .entry(item.order_id.clone())
                .or_default()
                .push(OrderItemResponse {
                    price: money(item.price, "order item price")?,
                    image_id: item.image_id,
                    quantity: item.quantity,
                });
        }
    }

    let response = orders
        .into_iter()
        .map(|o| {
            Ok(OrderResponse {
                total: money(o.total, "order total")?,
                items: items.remove(&o.id).unwrap_or_default(),
                id: o.id,
                client_email: o.client_email,
                client_name: o.client_name,
                currency: o.currency,
                status: o.status,
                failure_reason: o.failure_reason,
                created_at: o.created_at,
                paid_at: o.paid_at,
            })
        })
        .collect::<Result<Vec<_>, ApiError>>()?;

    Ok(Json(response))
}
