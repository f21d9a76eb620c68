//! Public routes a client reaches through their access code.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use chrono::NaiveDateTime;
use serde::Serialize;
use shutterlink::Money;
use utoipa::ToSchema;

use crate::{
    entity::image,
    error::ApiError,
    gallery_access::{self, ResolvedGallery},
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/{code}", get(get_gallery))
        .route("/{code}/view", post(record_view))
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClientImage {
    pub id: String,
    pub filename: String,
    pub original_url: String,
    pub thumbnail_url: String,
    pub width: i32,
    pub height: i32,
    pub price: Money,
    pub uploaded_at: NaiveDateTime,
}

impl ClientImage {
    fn from_model(image: image::Model) -> Result<Self, ApiError> {
        let price = Money::from_minor(image.price)
            .map_err(|e| ApiError::internal(format!("image {} has a corrupt price: {e}", image.id)))?;
        Ok(Self {
            id: image.id,
            filename: image.filename,
            original_url: image.original_url,
            thumbnail_url: image.thumbnail_url,
            width: image.width,
            height: image.height,
            price,
            uploaded_at: image.uploaded_at,
        })
    }
}

/// The only photographer fields a client gets to see.
#[derive(Debug, Serialize, ToSchema)]
pub struct PhotographerContact {
    pub name: Option<String>,
    pub email: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClientGallery {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub client_name: String,
    pub expires_at: Option<NaiveDateTime>,
    pub photographer: Option<PhotographerContact>,
    /// Newest upload first
    pub images: Vec<ClientImage>,
}

impl ClientGallery {
    fn from_resolved(resolved: ResolvedGallery) -> Result<Self, ApiError> {
        let ResolvedGallery {
            gallery,
            images,
            photographer,
        } = resolved;
        Ok(Self {
            id: gallery.id,
            name: gallery.name,
            description: gallery.description,
            client_name: gallery.client_name,
            expires_at: gallery.expires_at,
            photographer: photographer.map(|p| PhotographerContact {
                name: p.name,
                email: p.email,
            }),
            images: images
                .into_iter()
                .map(ClientImage::from_model)
                .collect::<Result<_, _>>()?,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ViewRecorded {
    pub success: bool,
}

#[utoipa::path(
    get,
    path = "/gallery-by-code/{code}",
    tag = "client",
    params(("code" = String, Path, description = "Gallery access code")),
    responses(
        (status = 200, description = "Gallery with its images", body = ClientGallery),
        (status = 404, description = "Unknown code or inactive gallery"),
        (status = 410, description = "Gallery has expired")
    )
)]
#[tracing::instrument(name = "GET /gallery-by-code/{code}", skip(state, code))]
pub async fn get_gallery(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<ClientGallery>, ApiError> {
    let now = chrono::Utc::now().naive_utc();
    let resolved = gallery_access::resolve_by_code(&state.db, &code, now).await?;

    // counting must never hold up or fail the page
    let db = state.db.clone();
    let gallery_id = resolved.gallery.id.clone();
    tokio::spawn(async move {
        match gallery_access::record_view(&db, &gallery_id).await {
            Ok(_) => {
                metrics::counter!("gallery_views_total", "source" => "resolve").increment(1)
            }
            Err(err) => tracing::warn!(gallery_id = %gallery_id, error = %err, "Failed to record view"),
        }
    });

    Ok(Json(ClientGallery::from_resolved(resolved)?))
}

#[utoipa::path(
    post,
    path = "/gallery-by-code/{code}/view",
    tag = "client",
    params(("code" = String, Path, description = "Gallery access code")),
    responses(
        (status = 200, description = "View counted", body = ViewRecorded),
        (status = 404, description = "Unknown code")
    )
)]
#[tracing::instrument(name = "POST /gallery-by-code/{code}/view", skip(state, code))]
pub async fn record_view(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<ViewRecorded>, ApiError> {
    if !gallery_access::record_view_by_code(&state.db, &code).await? {
        return Err(ApiError::not_found("Gallery not found"));
    }
    metrics::counter!("gallery_views_total", "source" => "explicit").increment(1);
    Ok(Json(ViewRecorded { success: true }))
}
