use axum::{Extension, Json, extract::State};
use sea_orm::{ActiveModelTrait, ActiveValue::Set};
use serde::Deserialize;
use shutterlink::access::generate_access_code;
use shutterlink_types::create_id;
use utoipa::ToSchema;

use crate::{
    entity::gallery, error::ApiError, middleware::jwt::AppUser, state::AppState,
    validation::Validator,
};

use super::GalleryResponse;

pub(crate) const MAX_NAME_LEN: usize = 200;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateGalleryRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub client_name: String,
    #[serde(default)]
    pub client_email: String,
    /// ISO 8601; a bare date means the end of that day
    #[serde(default)]
    pub expires_at: Option<String>,
}

#[utoipa::path(
    post,
    path = "/galleries",
    tag = "galleries",
    request_body = CreateGalleryRequest,
    responses(
        (status = 200, description = "Gallery created with a fresh access code", body = GalleryResponse),
        (status = 400, description = "Validation failed"),
        (status = 401, description = "Not signed in")
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(name = "POST /galleries", skip(state, user, body))]
pub async fn create_gallery(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
    Json(body): Json<CreateGalleryRequest>,
) -> Result<Json<GalleryResponse>, ApiError> {
    user.sub()?;

    let mut v = Validator::new();
    v.require("name", &body.name);
    v.max_len("name", &body.name, MAX_NAME_LEN);
    v.require("clientName", &body.client_name);
    v.email("clientEmail", &body.client_email);
    let expires_at = v.timestamp("expiresAt", body.expires_at.as_deref());
    v.finish()?;

    let photographer = user.photographer(&state).await?;
    let now = chrono::Utc::now().naive_utc();

    let record = gallery::ActiveModel {
        id: Set(create_id()),
        name: Set(body.name.trim().to_string()),
        description: Set(body
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty())),
        photographer_id: Set(photographer.id),
        client_name: Set(body.client_name.trim().to_string()),
        client_email: Set(body.client_email.trim().to_string()),
        access_code: Set(generate_access_code()),
        is_active: Set(true),
        expires_at: Set(expires_at),
        views: Set(0),
        created_at: Set(now),
        updated_at: Set(now),
    };
    let created = record.insert(&state.db).await?;

    tracing::info!(gallery_id = %created.id, "Gallery created");

    let mut response = GalleryResponse::new(created, 0, 0);
    response.images = Some(Vec::new());
    Ok(Json(response))
}
