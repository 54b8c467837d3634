//! Admin page shells.
//!
//! The admin UI is rendered client-side; these routes only serve the HTML
//! entry points that `route_guard` sits in front of.

use axum::{extract::OriginalUri, response::Html};

const LOGIN_PAGE: &str = r#"<!doctype html>
<html lang="en">
<head><meta charset="utf-8"><title>Admin login</title></head>
<body><main id="admin-login" data-csrf-endpoint="/api/auth/csrf"></main></body>
</html>
"#;

pub async fn login_page() -> Html<&'static str> {
    Html(LOGIN_PAGE)
}

pub async fn admin_page(OriginalUri(uri): OriginalUri) -> Html<String> {
    Html(format!(
        r#"<!doctype html>
<html lang="en">
<head><meta charset="utf-8"><title>Admin</title></head>
<body><main id="admin" data-path="{}"></main></body>
</html>
"#,
        escape_attr(uri.path())
    ))
}

fn escape_attr(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_attr_neutralizes_markup() {
        assert_eq!(
            escape_attr(r#"/admin/"><script>"#),
            "/admin/&quot;&gt;&lt;script&gt;"
        );
    }
}
