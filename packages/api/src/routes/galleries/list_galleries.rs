use std::collections::HashMap;

use axum::{Extension, Json, extract::State};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
};

use crate::{
    entity::{gallery, image, order},
    error::ApiError,
    middleware::jwt::AppUser,
    state::AppState,
};

use super::GalleryResponse;

/// Image and order counts per gallery, keyed by gallery id.
pub(crate) async fn counts<C: ConnectionTrait>(
    db: &C,
    gallery_ids: &[String],
) -> Result<(HashMap<String, u64>, HashMap<String, u64>), DbErr> {
    if gallery_ids.is_empty() {
        return Ok((HashMap::new(), HashMap::new()));
    }

    let images: Vec<(String, i64)> = image::Entity::find()
        .select_only()
        .column(image::Column::GalleryId)
        .column_as(image::Column::Id.count(), "count")
        .filter(image::Column::GalleryId.is_in(gallery_ids.iter().cloned()))
        .group_by(image::Column::GalleryId)
        .into_tuple()
        .all(db)
        .await?;

    let orders: Vec<(String, i64)> = order::Entity::find()
        .select_only()
        .column(order::Column::GalleryId)
        .column_as(order::Column::Id.count(), "count")
        .filter(order::Column::GalleryId.is_in(gallery_ids.iter().cloned()))
        .group_by(order::Column::GalleryId)
        .into_tuple()
        .all(db)
        .await?;

    let to_map = |rows: Vec<(String, i64)>| {
        rows.into_iter()
            .map(|(id, count)| (id, count.max(0) as u64))
            .collect::<HashMap<_, _>>()
    };
    Ok((to_map(images), to_map(orders)))
}

#[utoipa::path(
    get,
    path = "/galleries",
    tag = "galleries",
    responses(
        (status = 200, description = "Galleries of the caller, newest first", body = Vec<GalleryResponse>),
        (status = 401, description = "Not signed in")
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(name = "GET /galleries", skip(state, user))]
pub async fn list_galleries(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
) -> Result<Json<Vec<GalleryResponse>>, ApiError> {
    let sub = user.sub()?;

    let galleries = gallery::Entity::find()
        .filter(gallery::Column::PhotographerId.eq(&sub))
        .order_by_desc(gallery::Column::CreatedAt)
        .all(&state.db)
        .await?;

    let ids: Vec<String> = galleries.iter().map(|g| g.id.clone()).collect();
    let (image_counts, order_counts) = counts(&state.db, &ids).await?;

    let response = galleries
        .into_iter()
        .map(|g| {
            let images = image_counts.get(&g.id).copied().unwrap_or(0);
            let orders = order_counts.get(&g.id).copied().unwrap_or(0);
            GalleryResponse::new(g, images, orders)
        })
        .collect();

    Ok(Json(response))
}
