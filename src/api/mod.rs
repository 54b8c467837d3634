use crate::api::handlers::{
    auth::{
        self, csrf, protected, route_guard::route_guard, session, AuthState, RateLimitSweeper,
    },
    catalog::{banners, products, SharedCatalog},
    health, pages,
};
use anyhow::{Context, Result};
use axum::{
    body::Body,
    extract::MatchedPath,
    http::{HeaderName, HeaderValue, Request, StatusCode},
    middleware,
    routing::{get, post, put},
    Extension, Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::PropagateRequestIdLayer, set_header::SetRequestHeaderLayer, trace::TraceLayer,
};
use tracing::{error, info, info_span, Span};
use ulid::Ulid;

pub mod handlers;
mod openapi;
#[cfg(test)]
pub(crate) mod test_support;

pub use openapi::openapi;

/// Assemble every route with the auth perimeter in place.
///
/// Public reads are plain routes; every write is wrapped in `protected(...)`.
/// `route_guard` sits in front of the admin pages. The caller adds transport
/// layers (request id, tracing) on top.
#[must_use]
pub fn router(auth_state: Arc<AuthState>, catalog: SharedCatalog) -> Router {
    Router::new()
        .route("/health", get(health::health).options(health::health))
        .route("/api/auth/csrf", get(csrf::csrf_token))
        .route(
            "/api/auth/login",
            post(session::login)
                .layer(middleware::from_fn(csrf::require_csrf))
                .fallback(method_not_allowed),
        )
        // Not CSRF-gated: clearing our own cookie is harmless and beacons
        // cannot attach custom headers.
        .route("/api/auth/logout", post(session::logout))
        .route(
            "/api/auth/me",
            protected(get(session::me)).fallback(method_not_allowed),
        )
        .route(
            "/api/products",
            get(products::list_products)
                .merge(protected(post(products::create_product)))
                .fallback(method_not_allowed),
        )
        .route(
            "/api/products/:id",
            get(products::get_product)
                .merge(protected(
                    put(products::update_product).delete(products::delete_product),
                ))
                .fallback(method_not_allowed),
        )
        .route(
            "/api/banners",
            get(banners::list_banners)
                .merge(protected(post(banners::create_banner)))
                .fallback(method_not_allowed),
        )
        .route(
            "/api/banners/:id",
            get(banners::get_banner)
                .merge(protected(
                    put(banners::update_banner).delete(banners::delete_banner),
                ))
                .fallback(method_not_allowed),
        )
        .route(auth::route_guard::LOGIN_PATH, get(pages::login_page))
        .route(auth::route_guard::ADMIN_PREFIX, get(pages::admin_page))
        .route("/admin/*path", get(pages::admin_page))
        .layer(middleware::from_fn(route_guard))
        .layer(Extension(catalog))
        .layer(Extension(auth_state))
}

/// Unmatched methods on a guarded route. Set after the guard layers so the
/// perimeter does not turn a 405 into a 403.
async fn method_not_allowed() -> StatusCode {
    StatusCode::METHOD_NOT_ALLOWED
}

/// Start the server
/// # Errors
/// Return error if failed to start the server
pub async fn new(port: u16, auth_state: Arc<AuthState>, catalog: SharedCatalog) -> Result<()> {
    // Expired rate-limit windows are swept for as long as the server runs.
    let mut sweeper = RateLimitSweeper::start(
        auth_state.rate_limiter().clone(),
        auth_state.config().sweep_interval(),
    );

    let app = router(auth_state, catalog).layer(
        ServiceBuilder::new()
            .layer(SetRequestHeaderLayer::if_not_present(
                HeaderName::from_static("x-request-id"),
                |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
            ))
            .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                "x-request-id",
            )))
            .layer(TraceLayer::new_for_http().make_span_with(make_span)),
    );

    let listener = TcpListener::bind(format!("::0:{port}"))
        .await
        .with_context(|| format!("Failed to bind port {port}"))?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for shutdown signal: {err}");
            }
            info!("Gracefully shutdown");
        })
        .await?;

    sweeper.stop();

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
