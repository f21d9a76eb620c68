use crate::{
    entity::photographer,
    error::{ApiError, AuthorizationError},
    state::AppState,
};
use axum::{
    body::Body,
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use sea_orm::{ActiveValue::Set, EntityTrait, sea_query::OnConflict};
use serde::{Deserialize, Serialize};

/// Claims of a photographer session token (HS256).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    pub exp: usize,
}

#[derive(Debug, Clone)]
pub struct PhotographerUser {
    pub sub: String,
    pub email: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone)]
pub enum AppUser {
    Photographer(PhotographerUser),
    Unauthorized,
}

impl AppUser {
    pub fn sub(&self) -> Result<String, AuthorizationError> {
        match self {
            AppUser::Photographer(user) => Ok(user.sub.clone()),
            AppUser::Unauthorized => Err(ApiError::unauthorized("Sign in required")),
        }
    }

    /// Resolves the caller's photographer row, creating it on first sight.
    pub async fn photographer(&self, state: &AppState) -> Result<photographer::Model, ApiError> {
        let AppUser::Photographer(user) = self else {
            return Err(ApiError::unauthorized("Sign in required"));
        };

        if let Some(existing) = photographer::Entity::find_by_id(&user.sub)
            .one(&state.db)
            .await?
        {
            return Ok(existing);
        }

        let email = user
            .email
            .clone()
            .ok_or_else(|| ApiError::unauthorized("Token carries no email"))?;

        let record = photographer::ActiveModel {
            id: Set(user.sub.clone()),
            email: Set(email),
            name: Set(user.name.clone()),
            created_at: Set(chrono::Utc::now().naive_utc()),
        };

        // two first requests may race here
        photographer::Entity::insert(record)
            .on_conflict(
                OnConflict::column(photographer::Column::Id)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&state.db)
            .await?;

        tracing::info!(sub = %user.sub, "Registered photographer");

        photographer::Entity::find_by_id(&user.sub)
            .one(&state.db)
            .await?
            .ok_or_else(|| ApiError::internal("Photographer vanished after insert"))
    }
}

pub async fn jwt_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response<Body>, AuthorizationError> {
    let mut request = request;
    if let Some(auth_header) = request.headers().get(AUTHORIZATION)
        && let Ok(token) = auth_header.to_str()
    {
        let token = token.strip_prefix("Bearer ").unwrap_or(token).trim();
        let claims = state.validate_token(token)?;
        let user = AppUser::Photographer(PhotographerUser {
            sub: claims.sub,
            email: claims.email,
            name: claims.name,
        });
        request.extensions_mut().insert::<AppUser>(user);
        return Ok(next.run(request).await);
    }

    request
        .extensions_mut()
        .insert::<AppUser>(AppUser::Unauthorized);
    Ok(next.run(request).await)
}
