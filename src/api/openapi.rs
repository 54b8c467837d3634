use super::handlers::{
    auth::{self, csrf, session, types as auth_types},
    catalog::{banners, products, types as catalog_types},
    health,
};
use utoipa::{
    openapi::{Contact, InfoBuilder, License},
    OpenApi,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        csrf::csrf_token,
        session::login,
        session::logout,
        session::me,
        products::list_products,
        products::get_product,
        products::create_product,
        products::update_product,
        products::delete_product,
        banners::list_banners,
        banners::get_banner,
        banners::create_banner,
        banners::update_banner,
        banners::delete_banner,
    ),
    components(schemas(
        health::Health,
        auth::ErrorBody,
        auth::Identity,
        auth::Role,
        csrf::CsrfTokenResponse,
        auth_types::LoginRequest,
        auth_types::LoginResponse,
        auth_types::MeResponse,
        catalog_types::Product,
        catalog_types::Banner,
        catalog_types::CreateProductRequest,
        catalog_types::UpdateProductRequest,
        catalog_types::CreateBannerRequest,
        catalog_types::UpdateBannerRequest,
    )),
    tags(
        (name = "vitrine", description = "Marketing site catalog API"),
        (name = "auth", description = "Admin sessions and CSRF bootstrap"),
        (name = "catalog", description = "Products and banners"),
        (name = "health", description = "Liveness and build info")
    )
)]
struct ApiDoc;

#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    let mut spec = ApiDoc::openapi();
    spec.info = cargo_info();
    spec
}

fn cargo_info() -> utoipa::openapi::Info {
    // Use Cargo.toml metadata instead of the derive defaults.
    let mut info = InfoBuilder::new()
        .title(env!("CARGO_PKG_NAME"))
        .version(env!("CARGO_PKG_VERSION"))
        .description(optional_str(env!("CARGO_PKG_DESCRIPTION")))
        .build();

    info.contact = cargo_contact();
    info.license = cargo_license();
    info
}

fn cargo_contact() -> Option<Contact> {
    // Cargo authors are `;` separated and may include "Name <email>".
    let primary = env!("CARGO_PKG_AUTHORS").split(';').next().map(str::trim)?;
    let (name, email) = parse_author(primary);
    if name.is_none() && email.is_none() {
        return None;
    }

    let mut contact = Contact::new();
    contact.name = name.map(str::to_string);
    contact.email = email.map(str::to_string);
    Some(contact)
}

fn cargo_license() -> Option<License> {
    let identifier = optional_str(env!("CARGO_PKG_LICENSE"))?;
    let mut license = License::new(identifier);
    license.identifier = Some(identifier.to_string());
    Some(license)
}

fn optional_str(value: &'static str) -> Option<&'static str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

fn parse_author(author: &str) -> (Option<&str>, Option<&str>) {
    fn non_empty(value: &str) -> Option<&str> {
        let value = value.trim();
        (!value.is_empty()).then_some(value)
    }

    match author.split_once('<') {
        Some((name, rest)) => (non_empty(name), non_empty(rest.trim().trim_end_matches('>'))),
        None => (non_empty(author), None),
    }
}
