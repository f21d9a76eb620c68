use axum::Json;
use utoipa::{
    Modify, OpenApi,
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
};

/// Security scheme modifier to add authentication methods
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);

        // Photographer session token (HS256 JWT)
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                Http::builder()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .description(Some("Photographer session token"))
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Shutterlink API",
        version = "1.0.0",
        description = "Client galleries for photographers.\n\nClients open a gallery with its access code and pay for selected photos through a hosted checkout. Photographer routes need `Authorization: Bearer <token>`.",
        license(name = "MIT")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "client", description = "Access-code routes used by clients"),
        (name = "galleries", description = "Gallery management for photographers"),
        (name = "upload", description = "Image uploads"),
        (name = "checkout", description = "Order creation and hosted payment")
    ),
    paths(
        crate::routes::health::health,
        crate::routes::health::db_health,
        crate::routes::client::get_gallery,
        crate::routes::client::record_view,
        crate::routes::galleries::list_galleries::list_galleries,
        crate::routes::galleries::create_gallery::create_gallery,
        crate::routes::galleries::get_gallery::get_gallery,
        crate::routes::galleries::update_gallery::update_gallery,
        crate::routes::galleries::delete_gallery::delete_gallery,
        crate::routes::galleries::update_pricing::update_pricing,
        crate::routes::galleries::list_orders::list_orders,
        crate::routes::galleries::stats::get_stats,
        crate::routes::upload::upload_images,
        crate::routes::checkout::checkout,
    ),
    components(schemas(
        crate::error::FieldError,
        crate::entity::sea_orm_active_enums::OrderStatus,
        shutterlink::Money,
    ))
)]
pub struct ApiDoc;

#[tracing::instrument(name = "GET /openapi.json")]
pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
