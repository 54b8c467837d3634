//! Banner CRUD handlers.

use axum::{
    extract::{Extension, Path, Query},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json},
};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use super::{
    super::auth::{AuthState, ErrorBody, Identity},
    include_hidden, optional_link, optional_text, required_text,
    types::{Banner, CreateBannerRequest, ListQuery, UpdateBannerRequest},
    CatalogError, SharedCatalog, NAME_MAX, TEXT_MAX,
};

#[utoipa::path(
    get,
    path = "/api/banners",
    params(ListQuery),
    responses(
        (status = 200, description = "Active banners ordered by position.", body = [Banner]),
    ),
    tag = "catalog"
)]
pub async fn list_banners(
    headers: HeaderMap,
    auth_state: Extension<Arc<AuthState>>,
    catalog: Extension<SharedCatalog>,
    Query(query): Query<ListQuery>,
) -> impl IntoResponse {
    let all = include_hidden(&auth_state, &headers, query.all);
    match catalog.list_banners().await {
        Ok(banners) => {
            let banners: Vec<Banner> = banners
                .into_iter()
                .filter(|banner| all || banner.active)
                .collect();
            (StatusCode::OK, Json(banners)).into_response()
        }
        Err(err) => CatalogError::from(err).into_response(),
    }
}

#[utoipa::path(
    get,
    path = "/api/banners/{id}",
    params(("id" = Uuid, Path, description = "Banner id")),
    responses(
        (status = 200, description = "Banner detail.", body = Banner),
        (status = 404, description = "Banner not found.", body = ErrorBody),
    ),
    tag = "catalog"
)]
pub async fn get_banner(
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    auth_state: Extension<Arc<AuthState>>,
    catalog: Extension<SharedCatalog>,
) -> impl IntoResponse {
    match catalog.get_banner(id).await {
        Ok(Some(banner)) if banner.active || include_hidden(&auth_state, &headers, Some(true)) => {
            (StatusCode::OK, Json(banner)).into_response()
        }
        Ok(_) => CatalogError::NotFound.into_response(),
        Err(err) => CatalogError::from(err).into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/api/banners",
    request_body = CreateBannerRequest,
    responses(
        (status = 201, description = "Banner created.", body = Banner),
        (status = 400, description = "Invalid input.", body = ErrorBody),
        (status = 401, description = "Missing or invalid session.", body = ErrorBody),
        (status = 403, description = "CSRF validation failed.", body = ErrorBody),
    ),
    tag = "catalog"
)]
/// New banners without an explicit `position` go after the last one.
pub async fn create_banner(
    Extension(identity): Extension<Identity>,
    catalog: Extension<SharedCatalog>,
    payload: Option<Json<CreateBannerRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return CatalogError::BadRequest("Missing payload.").into_response();
    };
    match create(&catalog, request).await {
        Ok(banner) => {
            info!(user = %identity.username, banner = %banner.id, "banner created");
            (StatusCode::CREATED, Json(banner)).into_response()
        }
        Err(err) => err.into_response(),
    }
}

async fn create(catalog: &SharedCatalog, request: CreateBannerRequest) -> Result<Banner, CatalogError> {
    let title = required_text(&request.title, NAME_MAX)
        .ok_or(CatalogError::BadRequest("Banner title is required."))?;
    let subtitle = optional_text(request.subtitle.as_deref(), TEXT_MAX)
        .map_err(|()| CatalogError::BadRequest("Subtitle is too long."))?;
    let link_url = optional_link(request.link_url.as_deref())
        .map_err(|()| CatalogError::BadRequest("Invalid link URL."))?;
    let image_url = optional_link(request.image_url.as_deref())
        .map_err(|()| CatalogError::BadRequest("Invalid image URL."))?;

    let position = match request.position {
        Some(position) => position,
        None => catalog
            .list_banners()
            .await?
            .iter()
            .map(|banner| banner.position)
            .max()
            .map_or(0, |last| last.saturating_add(1)),
    };

    let banner = Banner {
        id: Uuid::now_v7(),
        title,
        subtitle,
        link_url,
        image_url,
        position,
        active: request.active.unwrap_or(true),
    };
    catalog.save_banner(banner.clone()).await?;
    Ok(banner)
}

#[utoipa::path(
    put,
    path = "/api/banners/{id}",
    params(("id" = Uuid, Path, description = "Banner id")),
    request_body = UpdateBannerRequest,
    responses(
        (status = 200, description = "Banner updated.", body = Banner),
        (status = 400, description = "Invalid input.", body = ErrorBody),
        (status = 401, description = "Missing or invalid session.", body = ErrorBody),
        (status = 403, description = "CSRF validation failed.", body = ErrorBody),
        (status = 404, description = "Banner not found.", body = ErrorBody),
    ),
    tag = "catalog"
)]
pub async fn update_banner(
    Path(id): Path<Uuid>,
    Extension(identity): Extension<Identity>,
    catalog: Extension<SharedCatalog>,
    payload: Option<Json<UpdateBannerRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return CatalogError::BadRequest("Missing payload.").into_response();
    };
    match update(&catalog, id, request).await {
        Ok(banner) => {
            info!(user = %identity.username, banner = %banner.id, "banner updated");
            (StatusCode::OK, Json(banner)).into_response()
        }
        Err(err) => err.into_response(),
    }
}

async fn update(
    catalog: &SharedCatalog,
    id: Uuid,
    request: UpdateBannerRequest,
) -> Result<Banner, CatalogError> {
    let mut banner = catalog.get_banner(id).await?.ok_or(CatalogError::NotFound)?;

    if let Some(title) = request.title.as_deref() {
        banner.title = required_text(title, NAME_MAX)
            .ok_or(CatalogError::BadRequest("Banner title is required."))?;
    }
    if request.subtitle.is_some() {
        banner.subtitle = optional_text(request.subtitle.as_deref(), TEXT_MAX)
            .map_err(|()| CatalogError::BadRequest("Subtitle is too long."))?;
    }
    if request.link_url.is_some() {
        banner.link_url = optional_link(request.link_url.as_deref())
            .map_err(|()| CatalogError::BadRequest("Invalid link URL."))?;
    }
    if request.image_url.is_some() {
        banner.image_url = optional_link(request.image_url.as_deref())
            .map_err(|()| CatalogError::BadRequest("Invalid image URL."))?;
    }
    if let Some(position) = request.position {
        banner.position = position;
    }
    if let Some(active) = request.active {
        banner.active = active;
    }

    catalog.save_banner(banner.clone()).await?;
    Ok(banner)
}

#[utoipa::path(
    delete,
    path = "/api/banners/{id}",
    params(("id" = Uuid, Path, description = "Banner id")),
    responses(
        (status = 204, description = "Banner deleted."),
        (status = 401, description = "Missing or invalid session.", body = ErrorBody),
        (status = 403, description = "CSRF validation failed.", body = ErrorBody),
        (status = 404, description = "Banner not found.", body = ErrorBody),
    ),
    tag = "catalog"
)]
pub async fn delete_banner(
    Path(id): Path<Uuid>,
    Extension(identity): Extension<Identity>,
    catalog: Extension<SharedCatalog>,
) -> impl IntoResponse {
    match catalog.delete_banner(id).await {
        Ok(true) => {
            info!(user = %identity.username, banner = %id, "banner deleted");
            StatusCode::NO_CONTENT.into_response()
        }
        Ok(false) => CatalogError::NotFound.into_response(),
        Err(err) => CatalogError::from(err).into_response(),
    }
}
