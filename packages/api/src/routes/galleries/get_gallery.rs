use axum::{
    Extension, Json,
    extract::{Path, State},
};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};

use crate::{
    entity::image, error::ApiError, middleware::jwt::AppUser, state::AppState,
};

use super::{GalleryResponse, ImageResponse, list_galleries::counts, owned_gallery};

/// Builds the full single-gallery view: counts plus images, newest first.
pub(crate) async fn gallery_detail(
    state: &AppState,
    gallery: crate::entity::gallery::Model,
) -> Result<GalleryResponse, ApiError> {
    let images = image::Entity::find()
        .filter(image::Column::GalleryId.eq(&gallery.id))
        .order_by_desc(image::Column::UploadedAt)
        .order_by_desc(image::Column::Id)
        .all(&state.db)
        .await?;

    let (_, order_counts) = counts(&state.db, std::slice::from_ref(&gallery.id)).await?;
    let order_count = order_counts.get(&gallery.id).copied().unwrap_or(0);

    let mut response = GalleryResponse::new(gallery, images.len() as u64, order_count);
    response.images = Some(
        images
            .into_iter()
            .map(ImageResponse::from_model)
            .collect::<Result<_, _>>()?,
    );
    Ok(response)
}

#[utoipa::path(
    get,
    path = "/galleries/{gallery_id}",
    tag = "galleries",
    params(("gallery_id" = String, Path, description = "Gallery id")),
    responses(
        (status = 200, description = "Gallery with images", body = GalleryResponse),
        (status = 401, description = "Not signed in"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "No such gallery")
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(name = "GET /galleries/{gallery_id}", skip(state, user))]
pub async fn get_gallery(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
    Path(gallery_id): Path<String>,
) -> Result<Json<GalleryResponse>, ApiError> {
    let sub = user.sub()?;
    let gallery = owned_gallery(&state, &sub, &gallery_id).await?;
    Ok(Json(gallery_detail(&state, gallery).await?))
}
