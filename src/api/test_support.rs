//! Shared fixtures for router-level tests.

use anyhow::{anyhow, Result};
use axum::{
    body::{to_bytes, Body},
    http::{
        header::{CONTENT_TYPE, COOKIE, SET_COOKIE},
        Request, Response, StatusCode,
    },
    Router,
};
use secrecy::SecretString;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use super::{
    handlers::{
        auth::{admin_record, AuthConfig, AuthState, Environment, MemoryUserStore, RateLimiter},
        catalog::{MemoryCatalogStore, SharedCatalog},
    },
    router,
};

pub(crate) const TEST_SECRET: &str = "test-signing-secret-that-is-long-enough";
pub(crate) const ADMIN_PASSWORD: &str = "correct horse battery staple";

pub(crate) struct TestApp {
    pub router: Router,
    pub auth_state: Arc<AuthState>,
    pub catalog: Arc<MemoryCatalogStore>,
}

impl TestApp {
    pub(crate) fn new() -> Result<Self> {
        let config = AuthConfig::new(SecretString::from(TEST_SECRET), Environment::Test)?;
        let users = MemoryUserStore::new(vec![admin_record(ADMIN_PASSWORD)?])?;
        let auth_state = Arc::new(AuthState::new(
            config,
            RateLimiter::default(),
            Arc::new(users),
        ));
        let catalog = Arc::new(MemoryCatalogStore::new());
        let shared: SharedCatalog = catalog.clone();
        Ok(Self {
            router: router(auth_state.clone(), shared),
            auth_state,
            catalog,
        })
    }

    pub(crate) async fn send(&self, request: Request<Body>) -> Result<Response<Body>> {
        Ok(self.router.clone().oneshot(request).await?)
    }

    /// Bootstrap a CSRF token the way a browser would.
    pub(crate) async fn csrf_token(&self) -> Result<String> {
        let response = self
            .send(Request::builder().uri("/api/auth/csrf").body(Body::empty())?)
            .await?;
        let payload = body_json(response).await?;
        payload["csrfToken"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| anyhow!("missing csrfToken"))
    }

    pub(crate) async fn login(
        &self,
        csrf: &str,
        username: &str,
        password: &str,
        client_ip: &str,
    ) -> Result<Response<Body>> {
        let body = json!({ "username": username, "password": password });
        self.send(
            Request::builder()
                .method("POST")
                .uri("/api/auth/login")
                .header(CONTENT_TYPE, "application/json")
                .header(COOKIE, format!("csrf_token={csrf}"))
                .header("x-csrf-token", csrf)
                .header("x-forwarded-for", client_ip)
                .body(Body::from(body.to_string()))?,
        )
        .await
    }

    /// Log in as the test admin and return `(csrf, session token)`.
    pub(crate) async fn admin_session(&self) -> Result<(String, String)> {
        let csrf = self.csrf_token().await?;
        let response = self.login(&csrf, "admin", ADMIN_PASSWORD, "10.0.0.1").await?;
        if response.status() != StatusCode::OK {
            return Err(anyhow!("login failed: {}", response.status()));
        }
        let token = set_cookie_value(&response, "auth_token")
            .ok_or_else(|| anyhow!("missing auth_token cookie"))?;
        Ok((csrf, token))
    }
}

/// Value of the `Set-Cookie` entry named `name`, if any.
pub(crate) fn set_cookie_value(response: &Response<Body>, name: &str) -> Option<String> {
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find_map(|cookie| {
            let (pair, _) = cookie.split_once(';').unwrap_or((cookie, ""));
            let (key, value) = pair.split_once('=')?;
            (key.trim() == name).then(|| value.trim().to_string())
        })
}

pub(crate) fn set_cookie_header(response: &Response<Body>, name: &str) -> Option<String> {
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find(|cookie| cookie.starts_with(&format!("{name}=")))
        .map(str::to_string)
}

pub(crate) async fn body_json(response: Response<Body>) -> Result<Value> {
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    Ok(serde_json::from_slice(&bytes)?)
}
