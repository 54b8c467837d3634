//! Product and banner endpoints.
//!
//! Reads are public and only expose published products and active banners.
//! A signed-in caller may pass `?all=true` to see everything. Every write goes
//! through `protected(...)`, so handlers here receive a verified `Identity`
//! and never inspect cookies themselves.
//!
//! Flow Overview:
//! 1) Parse and validate the payload (400 on bad input).
//! 2) Normalize the product slug and resolve collisions with a numeric suffix.
//! 3) Persist through `CatalogStore` (404 for unknown ids).

pub(crate) mod banners;
pub(crate) mod products;
mod slug;
mod storage;
pub(crate) mod types;

use axum::http::HeaderMap;
use std::sync::Arc;
use url::Url;

use super::auth::{principal::authenticate, AuthState};

pub use storage::{CatalogError, CatalogStore, MemoryCatalogStore};

const PRODUCT_SLUG_MAX: usize = 80;
const NAME_MAX: usize = 200;
const TEXT_MAX: usize = 5_000;

/// Shared handle injected as an `Extension`.
pub type SharedCatalog = Arc<dyn CatalogStore>;

/// Trimmed, non-empty text within `max` characters.
fn required_text(value: &str, max: usize) -> Option<String> {
    let value = value.trim();
    (!value.is_empty() && value.chars().count() <= max).then(|| value.to_string())
}

/// Optional text: blank input clears the field.
fn optional_text(value: Option<&str>, max: usize) -> Result<Option<String>, ()> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) if value.chars().count() <= max => Ok(Some(value.to_string())),
        Some(_) => Err(()),
    }
}

/// Site-relative paths (`/uploads/a.png`) or absolute http(s) URLs.
fn valid_link(value: &str) -> bool {
    if value.starts_with('/') && !value.starts_with("//") {
        return true;
    }
    Url::parse(value).is_ok_and(|url| matches!(url.scheme(), "http" | "https"))
}

fn optional_link(value: Option<&str>) -> Result<Option<String>, ()> {
    match optional_text(value, TEXT_MAX)? {
        Some(link) if !valid_link(&link) => Err(()),
        link => Ok(link),
    }
}

/// Whether hidden rows should be included in a public read.
fn include_hidden(auth_state: &AuthState, headers: &HeaderMap, requested: Option<bool>) -> bool {
    requested.unwrap_or(false) && authenticate(auth_state, headers).is_ok()
}

#[cfg(test)]
mod tests;
