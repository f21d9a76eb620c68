//! Resolving a client access code into a viewable gallery.

use chrono::NaiveDateTime;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    sea_query::Expr,
};
use shutterlink::{AccessDenied, access::is_well_formed_code, check_access};

use crate::{
    entity::{gallery, image, photographer},
    error::ApiError,
};

#[derive(Debug, thiserror::Error)]
pub enum GalleryAccessError {
    #[error("no gallery for this access code")]
    NotFound,
    #[error(transparent)]
    Denied(#[from] AccessDenied),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl From<GalleryAccessError> for ApiError {
    fn from(err: GalleryAccessError) -> Self {
        match err {
            // an inactive gallery looks exactly like a missing one
            GalleryAccessError::NotFound | GalleryAccessError::Denied(AccessDenied::Inactive) => {
                ApiError::not_found("Gallery not found")
            }
            GalleryAccessError::Denied(AccessDenied::Expired { .. }) => {
                ApiError::gone("Gallery has expired")
            }
            GalleryAccessError::Database(db) => db.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResolvedGallery {
    pub gallery: gallery::Model,
    /// Newest first
    pub images: Vec<image::Model>,
    pub photographer: Option<photographer::Model>,
}

pub async fn find_by_code<C: ConnectionTrait>(
    db: &C,
    code: &str,
) -> Result<gallery::Model, GalleryAccessError> {
    if !is_well_formed_code(code) {
        return Err(GalleryAccessError::NotFound);
    }
    gallery::Entity::find()
        .filter(gallery::Column::AccessCode.eq(code))
        .one(db)
        .await?
        .ok_or(GalleryAccessError::NotFound)
}

/// Looks a gallery up by code and checks it may be shown at `now`.
pub async fn open_gallery<C: ConnectionTrait>(
    db: &C,
    code: &str,
    now: NaiveDateTime,
) -> Result<gallery::Model, GalleryAccessError> {
    let gallery = find_by_code(db, code).await?;
    check_access(gallery.is_active, gallery.expires_at, now)?;
    Ok(gallery)
}

pub async fn resolve_by_code<C: ConnectionTrait>(
    db: &C,
    code: &str,
    now: NaiveDateTime,
) -> Result<ResolvedGallery, GalleryAccessError> {
    let gallery = open_gallery(db, code, now).await?;

    let images = image::Entity::find()
        .filter(image::Column::GalleryId.eq(&gallery.id))
        .order_by_desc(image::Column::UploadedAt)
        .order_by_desc(image::Column::Id)
        .all(db)
        .await?;

    let photographer = photographer::Entity::find_by_id(&gallery.photographer_id)
        .one(db)
        .await?;

    Ok(ResolvedGallery {
        gallery,
        images,
        photographer,
    })
}

/// Atomic `views = views + 1`. Returns whether a gallery matched.
pub async fn record_view<C: ConnectionTrait>(db: &C, gallery_id: &str) -> Result<bool, DbErr> {
    let result = gallery::Entity::update_many()
        .col_expr(
            gallery::Column::Views,
            Expr::col(gallery::Column::Views).add(1),
        )
        .filter(gallery::Column::Id.eq(gallery_id))
        .exec(db)
        .await?;
    Ok(result.rows_affected > 0)
}

pub async fn record_view_by_code<C: ConnectionTrait>(db: &C, code: &str) -> Result<bool, DbErr> {
    if !is_well_formed_code(code) {
        return Ok(false);
    }
    let result = gallery::Entity::update_many()
        .col_expr(
            gallery::Column::Views,
            Expr::col(gallery::Column::Views).add(1),
        )
        .filter(gallery::Column::AccessCode.eq(code))
        .exec(db)
        .await?;
    Ok(result.rows_affected > 0)
}
