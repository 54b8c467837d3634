//! Catalog API tests through the full router.

use anyhow::Result;
use axum::{
    body::Body,
    http::{
        header::{CONTENT_TYPE, COOKIE},
        Request, StatusCode,
    },
};
use serde_json::{json, Value};

use super::CatalogStore;
use crate::api::test_support::{body_json, TestApp};

fn write_request(
    method: &str,
    uri: &str,
    csrf: Option<&str>,
    token: &str,
    body: &Value,
) -> Result<Request<Body>> {
    let mut cookie = format!("auth_token={token}");
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json");
    if let Some(csrf) = csrf {
        cookie.push_str(&format!("; csrf_token={csrf}"));
        builder = builder.header("x-csrf-token", csrf);
    }
    Ok(builder.header(COOKIE, cookie).body(Body::from(body.to_string()))?)
}

#[tokio::test]
async fn create_without_csrf_header_never_reaches_the_store() -> Result<()> {
    let app = TestApp::new()?;
    let (_csrf, token) = app.admin_session().await?;

    let response = app
        .send(write_request(
            "POST",
            "/api/products",
            None,
            &token,
            &json!({"name": "Forged"}),
        )?)
        .await?;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await?["code"], "CSRF_TOKEN_INVALID");
    assert!(app.catalog.list_products().await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn csrf_is_checked_before_the_session() -> Result<()> {
    let app = TestApp::new()?;
    // No session and no CSRF: the CSRF failure wins.
    let response = app
        .send(
            Request::builder()
                .method("DELETE")
                .uri("/api/banners/0190b3c4-0000-7000-8000-000000000000")
                .body(Body::empty())?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn create_with_csrf_but_no_session_is_unauthorized() -> Result<()> {
    let app = TestApp::new()?;
    let csrf = app.csrf_token().await?;
    let response = app
        .send(
            Request::builder()
                .method("POST")
                .uri("/api/products")
                .header(CONTENT_TYPE, "application/json")
                .header(COOKIE, format!("csrf_token={csrf}"))
                .header("x-csrf-token", &csrf)
                .body(Body::from(json!({"name": "Nope"}).to_string()))?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(app.catalog.list_products().await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn product_lifecycle() -> Result<()> {
    let app = TestApp::new()?;
    let (csrf, token) = app.admin_session().await?;

    let created = app
        .send(write_request(
            "POST",
            "/api/products",
            Some(&csrf),
            &token,
            &json!({"name": "Summer Hat", "priceCents": 2500, "imageUrl": "/uploads/hat.png"}),
        )?)
        .await?;
    assert_eq!(created.status(), StatusCode::CREATED);
    let created = body_json(created).await?;
    assert_eq!(created["slug"], "summer-hat");
    assert_eq!(created["published"], false);
    let id = created["id"].as_str().unwrap_or_default().to_string();

    // Unpublished products are hidden from anonymous readers.
    let public = app
        .send(Request::builder().uri("/api/products").body(Body::empty())?)
        .await?;
    assert_eq!(body_json(public).await?, json!([]));
    let hidden = app
        .send(
            Request::builder()
                .uri(format!("/api/products/{id}"))
                .body(Body::empty())?,
        )
        .await?;
    assert_eq!(hidden.status(), StatusCode::NOT_FOUND);

    // Signed-in callers can ask for everything.
    let all = app
        .send(
            Request::builder()
                .uri("/api/products?all=true")
                .header(COOKIE, format!("auth_token={token}"))
                .body(Body::empty())?,
        )
        .await?;
    assert_eq!(body_json(all).await?.as_array().map(Vec::len), Some(1));

    let updated = app
        .send(write_request(
            "PUT",
            &format!("/api/products/{id}"),
            Some(&csrf),
            &token,
            &json!({"published": true}),
        )?)
        .await?;
    assert_eq!(updated.status(), StatusCode::OK);

    let public = app
        .send(Request::builder().uri("/api/products").body(Body::empty())?)
        .await?;
    assert_eq!(body_json(public).await?[0]["name"], "Summer Hat");

    let deleted = app
        .send(write_request(
            "DELETE",
            &format!("/api/products/{id}"),
            Some(&csrf),
            &token,
            &json!({}),
        )?)
        .await?;
    assert_eq!(deleted.status(), StatusCode::NO_CONTENT);

    let missing = app
        .send(write_request(
            "DELETE",
            &format!("/api/products/{id}"),
            Some(&csrf),
            &token,
            &json!({}),
        )?)
        .await?;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn duplicate_slugs_get_a_suffix() -> Result<()> {
    let app = TestApp::new()?;
    let (csrf, token) = app.admin_session().await?;

    let mut slugs = Vec::new();
    for _ in 0..2 {
        let response = app
            .send(write_request(
                "POST",
                "/api/products",
                Some(&csrf),
                &token,
                &json!({"name": "Tote Bag"}),
            )?)
            .await?;
        slugs.push(body_json(response).await?["slug"].clone());
    }
    assert_eq!(slugs, vec![json!("tote-bag"), json!("tote-bag-2")]);
    Ok(())
}

#[tokio::test]
async fn invalid_product_payloads_are_rejected() -> Result<()> {
    let app = TestApp::new()?;
    let (csrf, token) = app.admin_session().await?;

    for body in [
        json!({"name": "   "}),
        json!({"name": "Hat", "priceCents": -1}),
        json!({"name": "Hat", "imageUrl": "javascript:alert(1)"}),
        json!({"name": "!!!"}),
    ] {
        let response = app
            .send(write_request("POST", "/api/products", Some(&csrf), &token, &body)?)
            .await?;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{body}");
        assert_eq!(body_json(response).await?["code"], "VALIDATION_ERROR");
    }
    assert!(app.catalog.list_products().await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn banners_are_listed_by_position_and_filtered() -> Result<()> {
    let app = TestApp::new()?;
    let (csrf, token) = app.admin_session().await?;

    for body in [
        json!({"title": "Second", "position": 2}),
        json!({"title": "Hidden", "position": 0, "active": false}),
        json!({"title": "First", "position": 1, "linkUrl": "https://example.com/sale"}),
        json!({"title": "Appended"}),
    ] {
        let response = app
            .send(write_request("POST", "/api/banners", Some(&csrf), &token, &body)?)
            .await?;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = app
        .send(Request::builder().uri("/api/banners").body(Body::empty())?)
        .await?;
    let titles: Vec<String> = body_json(response)
        .await?
        .as_array()
        .map(|banners| {
            banners
                .iter()
                .filter_map(|banner| banner["title"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default();
    assert_eq!(titles, vec!["First", "Second", "Appended"]);
    Ok(())
}

#[tokio::test]
async fn unsupported_methods_are_not_allowed() -> Result<()> {
    let app = TestApp::new()?;
    for (method, uri) in [
        ("PATCH", "/api/products"),
        ("PATCH", "/api/products/0190b3c4-0000-7000-8000-000000000000"),
        ("PATCH", "/api/banners"),
        ("POST", "/api/banners/0190b3c4-0000-7000-8000-000000000000"),
        ("DELETE", "/api/auth/me"),
        ("GET", "/api/auth/login"),
    ] {
        let response = app
            .send(Request::builder().method(method).uri(uri).body(Body::empty())?)
            .await?;
        assert_eq!(
            response.status(),
            StatusCode::METHOD_NOT_ALLOWED,
            "{method} {uri}"
        );
    }

    // Supported writes still hit the perimeter first.
    let response = app
        .send(
            Request::builder()
                .method("POST")
                .uri("/api/products")
                .body(Body::empty())?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    Ok(())
}
