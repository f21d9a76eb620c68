use axum::{
    Router,
    routing::{get, put},
};
use chrono::NaiveDateTime;
use sea_orm::EntityTrait;
use serde::Serialize;
use shutterlink::Money;
use utoipa::ToSchema;

use crate::{
    entity::{gallery, image},
    error::ApiError,
    state::AppState,
};

pub mod create_gallery;
pub mod delete_gallery;
pub mod get_gallery;
pub mod list_galleries;
pub mod list_orders;
pub mod stats;
pub mod update_gallery;
pub mod update_pricing;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(list_galleries::list_galleries).post(create_gallery::create_gallery),
        )
        .route("/stats", get(stats::get_stats))
        .route(
            "/{gallery_id}",
            get(get_gallery::get_gallery)
                .put(update_gallery::update_gallery)
                .delete(delete_gallery::delete_gallery),
        )
        .route("/{gallery_id}/pricing", put(update_pricing::update_pricing))
        .route("/{gallery_id}/orders", get(list_orders::list_orders))
}

/// Loads a gallery and checks `sub` owns it.
pub(crate) async fn owned_gallery(
    state: &AppState,
    sub: &str,
    gallery_id: &str,
) -> Result<gallery::Model, ApiError> {
    let gallery = gallery::Entity::find_by_id(gallery_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found("Gallery not found"))?;

    if gallery.photographer_id != sub {
        return Err(ApiError::forbidden("Gallery belongs to another photographer"));
    }
    Ok(gallery)
}

pub(crate) fn stored_price(image: &image::Model) -> Result<Money, ApiError> {
    Money::from_minor(image.price)
        .map_err(|e| ApiError::internal(format!("image {} has a corrupt price: {e}", image.id)))
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImageResponse {
    pub id: String,
    pub filename: String,
    pub original_url: String,
    pub thumbnail_url: String,
    pub size: i64,
    pub width: i32,
    pub height: i32,
    pub price: Money,
    pub uploaded_at: NaiveDateTime,
}

impl ImageResponse {
    pub fn from_model(image: image::Model) -> Result<Self, ApiError> {
        let price = stored_price(&image)?;
        Ok(Self {
            id: image.id,
            filename: image.filename,
            original_url: image.original_url,
            thumbnail_url: image.thumbnail_url,
            size: image.size,
            width: image.width,
            height: image.height,
            price,
            uploaded_at: image.uploaded_at,
        })
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GalleryResponse {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub client_name: String,
    pub client_email: String,
    pub access_code: String,
    pub is_active: bool,
    pub expires_at: Option<NaiveDateTime>,
    pub views: i64,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub image_count: u64,
    pub order_count: u64,
    /// Only filled when a single gallery is requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<ImageResponse>>,
}

impl GalleryResponse {
    pub fn new(gallery: gallery::Model, image_count: u64, order_count: u64) -> Self {
        Self {
            id: gallery.id,
            name: gallery.name,
            description: gallery.description,
            client_name: gallery.client_name,
            client_email: gallery.client_email,
            access_code: gallery.access_code,
            is_active: gallery.is_active,
            expires_at: gallery.expires_at,
            views: gallery.views,
            created_at: gallery.created_at,
            updated_at: gallery.updated_at,
            image_count,
            order_count,
            images: None,
        }
    }
}
