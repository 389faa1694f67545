//! `OpenAPI` document generated from the route annotations.

use axum::response::Json;
use utoipa::OpenApi;

use crate::api::handlers::{auth, health, onboarding, proxy};

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::login,
        auth::callback,
        auth::logout,
        proxy::unauthenticated,
        proxy::partner,
        onboarding::start_individual,
        onboarding::start_company,
        health::health
    ),
    components(schemas(auth::LogoutResponse)),
    tags(
        (name = "auth", description = "OAuth2 session lifecycle"),
        (name = "proxy", description = "Banking API reverse proxy"),
        (name = "onboarding", description = "Account holder onboarding"),
        (name = "health", description = "Service health")
    )
)]
struct ApiDoc;

#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

pub async fn serve_openapi() -> Json<utoipa::openapi::OpenApi> {
    Json(openapi())
}
