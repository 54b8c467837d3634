//! HTTP handlers: the auth perimeter, the catalog API, admin pages and health.

pub mod auth;
pub mod catalog;
pub mod health;
pub mod pages;
