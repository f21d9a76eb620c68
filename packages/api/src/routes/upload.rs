use axum::{
    Extension, Json,
    extract::{Multipart, State},
};
use sea_orm::{ActiveModelTrait, ActiveValue::Set, EntityTrait};
use serde::Serialize;
use shutterlink_storage::{
    GalleryStore,
    imaging::{ProcessedImage, UploadRejection},
};
use shutterlink_types::{Bytes, create_id};
use utoipa::ToSchema;

use crate::{
    entity::{gallery, image},
    error::{ApiError, FieldError},
    middleware::jwt::AppUser,
    state::AppState,
};

use super::galleries::ImageResponse;

#[derive(Debug, Serialize, ToSchema)]
pub struct UploadResponse {
    pub message: String,
    pub images: Vec<ImageResponse>,
}

/// Shape of the multipart form, for the API description only.
#[derive(ToSchema)]
#[allow(dead_code)]
#[schema(rename_all = "camelCase")]
pub struct UploadForm {
    gallery_id: String,
    #[schema(value_type = Vec<String>, format = Binary)]
    files: Vec<Vec<u8>>,
}

struct IncomingFile {
    name: String,
    content_type: String,
    data: Bytes,
}

/// Multipart form: one `galleryId` text field and any number of `files`.
/// Every file is checked before anything is stored.
#[utoipa::path(
    post,
    path = "/upload",
    tag = "upload",
    request_body(content = UploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Every file stored", body = UploadResponse),
        (status = 400, description = "Missing gallery id or a file was rejected; nothing stored"),
        (status = 401, description = "Not signed in"),
        (status = 403, description = "Gallery missing or owned by someone else")
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(name = "POST /upload", skip(state, user, multipart))]
pub async fn upload_images(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let sub = user.sub()?;

    let mut gallery_id: Option<String> = None;
    let mut files: Vec<IncomingFile> = Vec::new();
    while let Some(field) = multipart.next_field().await? {
        match field.name() {
            Some("galleryId") => gallery_id = Some(field.text().await?.trim().to_string()),
            Some("files") | Some("file") => {
                let name = field.file_name().unwrap_or("upload").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field.bytes().await?;
                files.push(IncomingFile {
                    name,
                    content_type,
                    data,
                });
            }
            _ => {}
        }
    }

    let gallery_id = gallery_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::validation(vec![FieldError::new("galleryId", "is required")]))?;

    let gallery = gallery::Entity::find_by_id(&gallery_id)
        .one(&state.db)
        .await?
        .filter(|g| g.photographer_id == sub)
        .ok_or_else(|| ApiError::forbidden("Gallery not found or access denied"))?;

    if files.is_empty() {
        return Err(ApiError::validation(vec![FieldError::new(
            "files",
            "at least one file is required",
        )]));
    }

    // decoding and resizing is CPU work
    let policy = state.config.upload.clone();
    let processed: Vec<(IncomingFile, Result<ProcessedImage, UploadRejection>)> =
        tokio::task::spawn_blocking(move || {
            files
                .into_iter()
                .map(|file| {
                    let result = policy.process(&file.data, &file.content_type);
                    (file, result)
                })
                .collect()
        })
        .await
        .map_err(|e| ApiError::internal(format!("Image processing task failed: {e}")))?;

    let rejected: Vec<FieldError> = processed
        .iter()
        .enumerate()
        .filter_map(|(index, (file, result))| {
            result.as_ref().err().map(|rejection| {
                FieldError::new(format!("files[{index}]"), format!("{}: {rejection}", file.name))
            })
        })
        .collect();
    if !rejected.is_empty() {
        return Err(ApiError::validation(rejected));
    }

    let stamp = chrono::Utc::now().timestamp_millis();
    let mut images = Vec::with_capacity(processed.len());
    for (index, (file, result)) in processed.into_iter().enumerate() {
        let Ok(processed) = result else { continue };
        let keys = GalleryStore::image_keys(&gallery.id, stamp + index as i64, &file.name);
        let size = file.data.len() as i64;

        state.store.put(&keys.original, file.data).await?;
        state
            .store
            .put(&keys.thumbnail, Bytes::from(processed.thumbnail))
            .await?;

        let record = image::ActiveModel {
            id: Set(create_id()),
            gallery_id: Set(gallery.id.clone()),
            filename: Set(file.name),
            original_url: Set(state.public_url(&keys.original)),
            thumbnail_url: Set(state.public_url(&keys.thumbnail)),
            storage_key: Set(keys.original.to_string()),
            thumbnail_key: Set(keys.thumbnail.to_string()),
            size: Set(size),
            width: Set(processed.width as i32),
            height: Set(processed.height as i32),
            price: Set(0),
            uploaded_at: Set(chrono::Utc::now().naive_utc()),
        };
        let created = record.insert(&state.db).await?;
        metrics::counter!("uploads_total").increment(1);
        images.push(ImageResponse::from_model(created)?);
    }

    tracing::info!(gallery_id = %gallery.id, count = images.len(), "Images uploaded");

    Ok(Json(UploadResponse {
        message: "Files uploaded successfully".to_string(),
        images,
    }))
}
