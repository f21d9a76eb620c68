use axum::{
    Extension, Json,
    extract::{Path, State},
};
use sea_orm::{ActiveModelTrait, ActiveValue::Set};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::{
    entity::gallery,
    error::ApiError,
    middleware::jwt::AppUser,
    state::AppState,
    validation::{Validator, deserialize_some},
};

use super::{
    GalleryResponse, create_gallery::MAX_NAME_LEN, get_gallery::gallery_detail, owned_gallery,
};

/// Absent fields stay untouched. `description` and `expiresAt` can be
/// cleared with an explicit `null`.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateGalleryRequest {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_some")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
    pub client_name: Option<String>,
    pub client_email: Option<String>,
    pub is_active: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_some")]
    #[schema(value_type = Option<String>)]
    pub expires_at: Option<Option<String>>,
}

#[utoipa::path(
    put,
    path = "/galleries/{gallery_id}",
    tag = "galleries",
    params(("gallery_id" = String, Path, description = "Gallery id")),
    request_body = UpdateGalleryRequest,
    responses(
        (status = 200, description = "Updated gallery", body = GalleryResponse),
        (status = 400, description = "Validation failed"),
        (status = 401, description = "Not signed in"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "No such gallery")
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(name = "PUT /galleries/{gallery_id}", skip(state, user, body))]
pub async fn update_gallery(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
    Path(gallery_id): Path<String>,
    Json(body): Json<UpdateGalleryRequest>,
) -> Result<Json<GalleryResponse>, ApiError> {
    let sub = user.sub()?;
    let existing = owned_gallery(&state, &sub, &gallery_id).await?;

    let mut v = Validator::new();
    if let Some(name) = &body.name {
        v.require("name", name);
        v.max_len("name", name, MAX_NAME_LEN);
    }
    if let Some(client_name) = &body.client_name {
        v.require("clientName", client_name);
    }
    if let Some(client_email) = &body.client_email {
        v.email("clientEmail", client_email);
    }
    let expires_at = match &body.expires_at {
        Some(Some(raw)) if !raw.trim().is_empty() => {
            Some(v.timestamp("expiresAt", Some(raw.as_str())))
        }
        Some(_) => Some(None),
        None => None,
    };
    v.finish()?;

    let mut active: gallery::ActiveModel = existing.into();
    if let Some(name) = body.name {
        active.name = Set(name.trim().to_string());
    }
    if let Some(description) = body.description {
        active.description = Set(description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty()));
    }
    if let Some(client_name) = body.client_name {
        active.client_name = Set(client_name.trim().to_string());
    }
    if let Some(client_email) = body.client_email {
        active.client_email = Set(client_email.trim().to_string());
    }
    if let Some(is_active) = body.is_active {
        active.is_active = Set(is_active);
    }
    if let Some(expires_at) = expires_at {
        active.expires_at = Set(expires_at);
    }
    active.updated_at = Set(chrono::Utc::now().naive_utc());

    let updated = active.update(&state.db).await?;
    tracing::info!(gallery_id = %updated.id, "Gallery updated");

    Ok(Json(gallery_detail(&state, updated).await?))
}
