use std::collections::{BTreeMap, HashSet};

use axum::{
    Extension, Json,
    extract::{Path, State},
};
use futures::future::try_join_all;
use sea_orm::{
    ColumnTrait, EntityTrait, QueryFilter, TransactionTrait, sea_query::Expr,
};
use serde::{Deserialize, Serialize};
use shutterlink::{Money, PriceSheet};
use utoipa::ToSchema;

use crate::{
    entity::image, error::ApiError, middleware::jwt::AppUser, state::AppState,
    validation::Validator,
};

use super::{owned_gallery, stored_price};

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdatePricingRequest {
    /// Image id to price in major units, e.g. `12.5`
    pub prices: BTreeMap<String, f64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UpdatePricingResponse {
    pub success: bool,
    /// Images whose price actually changed
    pub updated: u64,
}

#[utoipa::path(
    put,
    path = "/galleries/{gallery_id}/pricing",
    tag = "galleries",
    params(("gallery_id" = String, Path, description = "Gallery id")),
    request_body = UpdatePricingRequest,
    responses(
        (status = 200, description = "All prices saved", body = UpdatePricingResponse),
        (status = 400, description = "A price is invalid or an image is not in this gallery; nothing saved"),
        (status = 401, description = "Not signed in"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "No such gallery")
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(name = "PUT /galleries/{gallery_id}/pricing", skip(state, user, body))]
pub async fn update_pricing(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
    Path(gallery_id): Path<String>,
    Json(body): Json<UpdatePricingRequest>,
) -> Result<Json<UpdatePricingResponse>, ApiError> {
    let sub = user.sub()?;
    let gallery = owned_gallery(&state, &sub, &gallery_id).await?;

    let mut v = Validator::new();
    let mut requested = Vec::with_capacity(body.prices.len());
    for (image_id, price) in &body.prices {
        match Money::from_major(*price) {
            Ok(money) => requested.push((image_id.clone(), money)),
            Err(err) => v.push(format!("prices.{image_id}"), err.to_string()),
        }
    }
    v.finish()?;

    let current = image::Entity::find()
        .filter(image::Column::GalleryId.eq(&gallery.id))
        .all(&state.db)
        .await?;
    let known: HashSet<&str> = current.iter().map(|img| img.id.as_str()).collect();

    let mut v = Validator::new();
    for (image_id, _) in &requested {
        if !known.contains(image_id.as_str()) {
            v.push(
                format!("prices.{image_id}"),
                "image does not belong to this gallery",
            );
        }
    }
    v.finish()?;

    let mut sheet = PriceSheet::new(
        current
            .iter()
            .map(|img| Ok((img.id.clone(), stored_price(img)?)))
            .collect::<Result<Vec<_>, ApiError>>()?,
    );
    for (image_id, price) in requested {
        sheet.set(&image_id, price);
    }
    let changes: Vec<(String, Money)> = sheet.changes().into_iter().collect();

    if changes.is_empty() {
        return Ok(Json(UpdatePricingResponse {
            success: true,
            updated: 0,
        }));
    }

    let scope = gallery.id.clone();
    let expected = changes.len() as u64;
    let updated = state
        .db
        .transaction::<_, u64, ApiError>(|txn| {
            Box::pin(async move {
                // independent rows; order between them does not matter
                let results = try_join_all(changes.iter().map(|(image_id, price)| {
                    image::Entity::update_many()
                        .col_expr(image::Column::Price, Expr::value(price.minor()))
                        .filter(image::Column::Id.eq(image_id.as_str()))
                        .filter(image::Column::GalleryId.eq(scope.as_str()))
                        .exec(txn)
                }))
                .await?;

                let updated: u64 = results.iter().map(|r| r.rows_affected).sum();
                if updated != expected {
                    return Err(ApiError::conflict(
                        "Gallery images changed while prices were being saved",
                    ));
                }
                Ok(updated)
            })
        })
        .await?;

    tracing::info!(gallery_id = %gallery.id, updated, "Prices saved");

    Ok(Json(UpdatePricingResponse {
        success: true,
        updated,
    }))
}
