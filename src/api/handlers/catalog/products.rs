//! Product CRUD handlers.

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
    slug::{slugify, unique_slug},
    types::{CreateProductRequest, ListQuery, Product, UpdateProductRequest},
    CatalogError, SharedCatalog, NAME_MAX, PRODUCT_SLUG_MAX, TEXT_MAX,
};

fn valid_price(price_cents: Option<i64>) -> Result<Option<i64>, CatalogError> {
    match price_cents {
        Some(price) if price < 0 => Err(CatalogError::BadRequest("Price must not be negative.")),
        price => Ok(price),
    }
}

/// Normalize the requested slug (or the name) and make it unique.
async fn resolve_slug(
    catalog: &SharedCatalog,
    requested: Option<&str>,
    name: &str,
    except: Option<Uuid>,
) -> Result<String, CatalogError> {
    let source = requested.filter(|slug| !slug.trim().is_empty()).unwrap_or(name);
    let base = slugify(source, PRODUCT_SLUG_MAX)
        .ok_or(CatalogError::BadRequest("Invalid product slug."))?;

    // Snapshot taken slugs once; the closure below must stay synchronous.
    let mut taken = Vec::new();
    for product in catalog.list_products().await? {
        if Some(product.id) != except {
            taken.push(product.slug);
        }
    }
    unique_slug(&base, PRODUCT_SLUG_MAX, |slug| {
        taken.iter().any(|existing| existing == slug)
    })
    .ok_or(CatalogError::Conflict("Product slug is already taken."))
}

#[utoipa::path(
    get,
    path = "/api/products",
    params(ListQuery),
    responses(
        (status = 200, description = "Published products.", body = [Product]),
    ),
    tag = "catalog"
)]
pub async fn list_products(
    headers: HeaderMap,
    auth_state: Extension<Arc<AuthState>>,
    catalog: Extension<SharedCatalog>,
    Query(query): Query<ListQuery>,
) -> impl IntoResponse {
    let all = include_hidden(&auth_state, &headers, query.all);
    match catalog.list_products().await {
        Ok(products) => {
            let products: Vec<Product> = products
                .into_iter()
                .filter(|product| all || product.published)
                .collect();
            (StatusCode::OK, Json(products)).into_response()
        }
        Err(err) => CatalogError::from(err).into_response(),
    }
}

/// Unpublished products read as 404 unless the caller is signed in.
#[utoipa::path(
    get,
    path = "/api/products/{id}",
    params(("id" = Uuid, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product detail.", body = Product),
        (status = 404, description = "Product not found.", body = ErrorBody),
    ),
    tag = "catalog"
)]
pub async fn get_product(
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    auth_state: Extension<Arc<AuthState>>,
    catalog: Extension<SharedCatalog>,
) -> impl IntoResponse {
    match catalog.get_product(id).await {
        Ok(Some(product))
            if product.published || include_hidden(&auth_state, &headers, Some(true)) =>
        {
            (StatusCode::OK, Json(product)).into_response()
        }
        Ok(_) => CatalogError::NotFound.into_response(),
        Err(err) => CatalogError::from(err).into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/api/products",
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Product created.", body = Product),
        (status = 400, description = "Invalid input.", body = ErrorBody),
        (status = 401, description = "Missing or invalid session.", body = ErrorBody),
        (status = 403, description = "CSRF validation failed.", body = ErrorBody),
    ),
    tag = "catalog"
)]
pub async fn create_product(
    Extension(identity): Extension<Identity>,
    catalog: Extension<SharedCatalog>,
    payload: Option<Json<CreateProductRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return CatalogError::BadRequest("Missing payload.").into_response();
    };
    match create(&catalog, request).await {
        Ok(product) => {
            info!(user = %identity.username, product = %product.id, "product created");
            (StatusCode::CREATED, Json(product)).into_response()
        }
        Err(err) => err.into_response(),
    }
}

async fn create(
    catalog: &SharedCatalog,
    request: CreateProductRequest,
) -> Result<Product, CatalogError> {
    let name = required_text(&request.name, NAME_MAX)
        .ok_or(CatalogError::BadRequest("Product name is required."))?;
    let description = optional_text(request.description.as_deref(), TEXT_MAX)
        .map_err(|()| CatalogError::BadRequest("Description is too long."))?
        .unwrap_or_default();
    let image_url = optional_link(request.image_url.as_deref())
        .map_err(|()| CatalogError::BadRequest("Invalid image URL."))?;
    let price_cents = valid_price(request.price_cents)?;
    let slug = resolve_slug(catalog, request.slug.as_deref(), &name, None).await?;

    let product = Product {
        id: Uuid::now_v7(),
        name,
        slug,
        description,
        price_cents,
        image_url,
        published: request.published.unwrap_or(false),
    };
    catalog.save_product(product.clone()).await?;
    Ok(product)
}

#[utoipa::path(
    put,
    path = "/api/products/{id}",
    params(("id" = Uuid, Path, description = "Product id")),
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "Product updated.", body = Product),
        (status = 400, description = "Invalid input.", body = ErrorBody),
        (status = 401, description = "Missing or invalid session.", body = ErrorBody),
        (status = 403, description = "CSRF validation failed.", body = ErrorBody),
        (status = 404, description = "Product not found.", body = ErrorBody),
    ),
    tag = "catalog"
)]
pub async fn update_product(
    Path(id): Path<Uuid>,
    Extension(identity): Extension<Identity>,
    catalog: Extension<SharedCatalog>,
    payload: Option<Json<UpdateProductRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return CatalogError::BadRequest("Missing payload.").into_response();
    };
    match update(&catalog, id, request).await {
        Ok(product) => {
            info!(user = %identity.username, product = %product.id, "product updated");
            (StatusCode::OK, Json(product)).into_response()
        }
        Err(err) => err.into_response(),
    }
}

async fn update(
    catalog: &SharedCatalog,
    id: Uuid,
    request: UpdateProductRequest,
) -> Result<Product, CatalogError> {
    let mut product = catalog
        .get_product(id)
        .await?
        .ok_or(CatalogError::NotFound)?;

    if let Some(name) = request.name.as_deref() {
        product.name = required_text(name, NAME_MAX)
            .ok_or(CatalogError::BadRequest("Product name is required."))?;
    }
    if request.description.is_some() {
        product.description = optional_text(request.description.as_deref(), TEXT_MAX)
            .map_err(|()| CatalogError::BadRequest("Description is too long."))?
            .unwrap_or_default();
    }
    if request.image_url.is_some() {
        product.image_url = optional_link(request.image_url.as_deref())
            .map_err(|()| CatalogError::BadRequest("Invalid image URL."))?;
    }
    if request.price_cents.is_some() {
        product.price_cents = valid_price(request.price_cents)?;
    }
    if let Some(published) = request.published {
        product.published = published;
    }
    if let Some(slug) = request.slug.as_deref() {
        product.slug = resolve_slug(catalog, Some(slug), &product.name, Some(id)).await?;
    }

    catalog.save_product(product.clone()).await?;
    Ok(product)
}

#[utoipa::path(
    delete,
    path = "/api/products/{id}",
    params(("id" = Uuid, Path, description = "Product id")),
    responses(
        (status = 204, description = "Product deleted."),
        (status = 401, description = "Missing or invalid session.", body = ErrorBody),
        (status = 403, description = "CSRF validation failed.", body = ErrorBody),
        (status = 404, description = "Product not found.", body = ErrorBody),
    ),
    tag = "catalog"
)]
pub async fn delete_product(
    Path(id): Path<Uuid>,
    Extension(identity): Extension<Identity>,
    catalog: Extension<SharedCatalog>,
) -> impl IntoResponse {
    match catalog.delete_product(id).await {
        Ok(true) => {
            info!(user = %identity.username, product = %id, "product deleted");
            StatusCode::NO_CONTENT.into_response()
        }
        Ok(false) => CatalogError::NotFound.into_response(),
        Err(err) => CatalogError::from(err).into_response(),
    }
}
