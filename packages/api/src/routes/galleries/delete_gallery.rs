use axum::{
    Extension, Json,
    extract::{Path, State},
};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QuerySelect, TransactionTrait};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    entity::{gallery, image, order, order_item},
    error::ApiError,
    middleware::jwt::AppUser,
    state::AppState,
};

use super::owned_gallery;

#[derive(Debug, Serialize, ToSchema)]
pub struct DeleteGalleryResponse {
    pub message: String,
}

#[utoipa::path(
    delete,
    path = "/galleries/{gallery_id}",
    tag = "galleries",
    params(("gallery_id" = String, Path, description = "Gallery id")),
    responses(
        (status = 200, description = "Gallery, its images and orders removed", body = DeleteGalleryResponse),
        (status = 401, description = "Not signed in"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "No such gallery")
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(name = "DELETE /galleries/{gallery_id}", skip(state, user))]
pub async fn delete_gallery(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
    Path(gallery_id): Path<String>,
) -> Result<Json<DeleteGalleryResponse>, ApiError> {
    let sub = user.sub()?;
    let gallery = owned_gallery(&state, &sub, &gallery_id).await?;

    let id = gallery.id.clone();
    state
        .db
        .transaction::<_, (), ApiError>(|txn| {
            Box::pin(async move {
                let order_ids: Vec<String> = order::Entity::find()
                    .select_only()
                    .column(order::Column::Id)
                    .filter(order::Column::GalleryId.eq(&id))
                    .into_tuple()
                    .all(txn)
                    .await?;

                if !order_ids.is_empty() {
                    order_item::Entity::delete_many()
                        .filter(order_item::Column::OrderId.is_in(order_ids))
                        .exec(txn)
                        .await?;
                }
                order::Entity::delete_many()
                    .filter(order::Column::GalleryId.eq(&id))
                    .exec(txn)
                    .await?;
                image::Entity::delete_many()
                    .filter(image::Column::GalleryId.eq(&id))
                    .exec(txn)
                    .await?;
                gallery::Entity::delete_by_id(id.as_str()).exec(txn).await?;
                Ok(())
            })
        })
        .await?;

    // rows are gone either way; leftover objects only cost storage
    match state.store.delete_gallery(&gallery.id).await {
        Ok(removed) => tracing::info!(gallery_id = %gallery.id, removed, "Gallery deleted"),
        Err(err) => tracing::warn!(
            gallery_id = %gallery.id,
            error = %err,
            "Gallery deleted but stored files could not be removed"
        ),
    }

    Ok(Json(DeleteGalleryResponse {
        message: "Gallery deleted successfully".to_string(),
    }))
}
