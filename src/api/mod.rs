use crate::{
    api::handlers::{auth, health, onboarding, proxy},
    config::GatewayConfig,
    middleware::{attach_token, refresh_guard},
    oauth::client::OAuthClient,
    onboarding::{OnboardingBridge, PartnerBridge},
    session::SessionStore,
};
use anyhow::{anyhow, Context, Result};
use axum::{
    body::Body,
    extract::MatchedPath,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderName, HeaderValue, Method, Request,
    },
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::PropagateRequestIdLayer,
    set_header::SetRequestHeaderLayer,
    trace::TraceLayer,
};
use tracing::{info, info_span, Span};
use ulid::Ulid;
use url::Url;

pub mod handlers;
mod openapi;

pub use openapi::openapi;

/// Shared gateway state: immutable configuration plus the long-lived
/// clients, constructed once at startup.
pub struct GatewayState {
    pub config: GatewayConfig,
    pub sessions: SessionStore,
    pub oauth: OAuthClient,
    pub bridge: Arc<dyn OnboardingBridge>,
    pub http: reqwest::Client,
}

impl GatewayState {
    /// Wire up the production components from configuration.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_config(config: GatewayConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(crate::APP_USER_AGENT)
            .build()
            .context("Failed to build the HTTP client")?;

        let sessions = SessionStore::new(
            config.cookie_key().clone(),
            config.cookie_domain().map(ToString::to_string),
            config.cookie_secure(),
        );
        let oauth = OAuthClient::new(config.provider.clone(), http.clone());
        let bridge = Arc::new(PartnerBridge::new(
            http.clone(),
            config.upstream.unauthenticated_api_url.clone(),
            config.upstream.partner_api_url.clone(),
        ));

        Ok(Self {
            config,
            sessions,
            oauth,
            bridge,
            http,
        })
    }
}

/// Assemble the router with the interceptor chain in front of every route.
#[must_use]
pub fn router(state: Arc<GatewayState>) -> Router {
    let mut app = Router::new()
        .route("/auth/login", get(auth::login))
        .route("/auth/callback", get(auth::callback))
        .route("/auth/logout", post(auth::logout))
        .route("/api/unauthenticated", post(proxy::unauthenticated))
        .route("/api/partner", post(proxy::partner))
        .route(
            "/onboarding/individual/start",
            get(onboarding::start_individual),
        )
        .route("/onboarding/company/start", get(onboarding::start_company))
        .route("/health", get(health::health))
        .route("/openapi.json", get(openapi::serve_openapi));

    // Interceptor order is part of the contract: attach the stored token
    // first, then let the refresh guard overwrite it or short-circuit.
    app = app.layer(
        ServiceBuilder::new()
            .layer(SetRequestHeaderLayer::if_not_present(
                HeaderName::from_static("x-request-id"),
                |_req: &Request<Body>| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
            ))
            .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                "x-request-id",
            )))
            .layer(TraceLayer::new_for_http().make_span_with(make_span))
            .layer(from_fn_with_state(state.clone(), attach_token))
            .layer(from_fn_with_state(state.clone(), refresh_guard)),
    );

    if let Ok(cors) = cors_layer(&state.config.upstream.banking_url) {
        app = app.layer(cors);
    }

    app.with_state(state)
}

/// Start the server
/// # Errors
/// Return error if failed to bind the listener or serve requests.
pub async fn new(port: u16, state: Arc<GatewayState>) -> Result<()> {
    let app = router(state);

    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}

fn cors_layer(banking_url: &Url) -> Result<CorsLayer> {
    let origin = frontend_origin(banking_url)?;
    Ok(CorsLayer::new()
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_methods([Method::GET, Method::POST])
        .allow_origin(AllowOrigin::exact(origin))
        .allow_credentials(true))
}

fn frontend_origin(base_url: &Url) -> Result<HeaderValue> {
    let host = base_url
        .host_str()
        .ok_or_else(|| anyhow!("Banking base URL must include a valid host: {base_url}"))?;
    let port = base_url
        .port()
        .map_or_else(String::new, |port| format!(":{port}"));
    let origin = format!("{}://{}{}", base_url.scheme(), host, port);
    HeaderValue::from_str(&origin).context("Failed to build frontend origin header")
}
