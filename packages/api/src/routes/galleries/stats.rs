use axum::{Extension, Json, extract::State};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QuerySelect};
use serde::Serialize;
use shutterlink::Money;
use utoipa::ToSchema;

use crate::{
    entity::{gallery, order, sea_orm_active_enums::OrderStatus},
    error::ApiError,
    middleware::jwt::AppUser,
    state::AppState,
};

use super::list_galleries::counts;

/// Dashboard numbers across all of the caller's galleries.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GalleryStats {
    pub total_galleries: u64,
    pub active_galleries: u64,
    pub total_images: u64,
    pub total_views: i64,
    pub total_orders: u64,
    pub paid_orders: u64,
    pub revenue: Money,
}

#[utoipa::path(
    get,
    path = "/galleries/stats",
    tag = "galleries",
    responses(
        (status = 200, description = "Totals for the dashboard", body = GalleryStats),
        (status = 401, description = "Not signed in")
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(name = "GET /galleries/stats", skip(state, user))]
pub async fn get_stats(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
) -> Result<Json<GalleryStats>, ApiError> {
    let sub = user.sub()?;

    let galleries = gallery::Entity::find()
        .filter(gallery::Column::PhotographerId.eq(&sub))
        .all(&state.db)
        .await?;
    let ids: Vec<String> = galleries.iter().map(|g| g.id.clone()).collect();
    let (image_counts, order_counts) = counts(&state.db, &ids).await?;

    let paid_totals: Vec<i64> = if ids.is_empty() {
        Vec::new()
    } else {
        order::Entity::find()
            .select_only()
            .column(order::Column::Total)
            .filter(order::Column::GalleryId.is_in(ids))
            .filter(order::Column::Status.eq(OrderStatus::Paid))
            .into_tuple()
            .all(&state.db)
            .await?
    };

    let revenue = paid_totals
        .iter()
        .try_fold(Money::ZERO, |sum, cents| {
            Money::from_minor(*cents).and_then(|m| sum.checked_add(m))
        })
        .map_err(|e| ApiError::internal(format!("revenue could not be summed: {e}")))?;

    Ok(Json(GalleryStats {
        total_galleries: galleries.len() as u64,
        active_galleries: galleries.iter().filter(|g| g.is_active).count() as u64,
        total_images: image_counts.values().sum(),
        total_views: galleries.iter().map(|g| g.views).sum(),
        total_orders: order_counts.values().sum(),
        paid_orders: paid_totals.len() as u64,
        revenue,
    }))
}
