//! OpenAPI document for the download endpoints and health checks.

use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::domain::{Error, ErrorCode};
use crate::inbound::http::downloads::{DownloadBody, RefreshBody};

struct SessionCookieScheme;

impl Modify for SessionCookieScheme {
    fn modify(&self, doc: &mut utoipa::openapi::OpenApi) {
        let cookie = ApiKeyValue::with_description(
            "session",
            "Encrypted session cookie set by the storefront at login.",
        );
        doc.components
            .get_or_insert_with(Default::default)
            .add_security_scheme("SessionCookie", SecurityScheme::ApiKey(ApiKey::Cookie(cookie)));
    }
}

/// OpenAPI document served by Swagger UI in debug builds.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SessionCookieScheme),
    info(
        title = "Downloads API",
        description = "Entitlement-gated, throttled and audited access to purchased downloads."
    ),
    security(("SessionCookie" = [])),
    paths(
        crate::inbound::http::downloads::get_download,
        crate::inbound::http::downloads::list_downloads,
        crate::inbound::http::downloads::list_order_downloads,
        crate::inbound::http::downloads::refresh_order_downloads,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(DownloadBody, RefreshBody, Error, ErrorCode)),
    tags(
        (name = "downloads", description = "Purchased download access and listings"),
        (name = "health", description = "Readiness and liveness checks")
    )
)]
pub struct ApiDoc;
