//! HTTP server assembly: sessions, tracing, routes and API docs.

mod config;
mod state_builders;

pub use config::{DownloadBackends, ServerConfig};

use state_builders::build_http_state;

use actix_session::{
    SessionMiddleware,
    config::{CookieContentSecurity, PersistentSession},
    storage::CookieSessionStore,
};
use actix_web::cookie::{Key, SameSite, time::Duration};
use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};

use backend::Trace;
#[cfg(debug_assertions)]
use backend::doc::ApiDoc;
use backend::inbound::http::downloads::{
    get_download, list_downloads, list_order_downloads, query_config, refresh_order_downloads,
};
use backend::inbound::http::health::{HealthState, live, ready};
use backend::inbound::http::state::HttpState;
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

const SESSION_TTL_HOURS: i64 = 2;

#[derive(Clone)]
struct AppDependencies {
    health_state: web::Data<HealthState>,
    http_state: web::Data<HttpState>,
    key: Key,
    cookie_secure: bool,
    same_site: SameSite,
}

impl AppDependencies {
    /// Encrypted cookie sessions shared with the storefront login service.
    fn sessions(&self) -> SessionMiddleware<CookieSessionStore> {
        let lifecycle = PersistentSession::default().session_ttl(Duration::hours(SESSION_TTL_HOURS));
        SessionMiddleware::builder(CookieSessionStore::default(), self.key.clone())
            .cookie_name("session".to_owned())
            .cookie_path("/".to_owned())
            .cookie_http_only(true)
            .cookie_secure(self.cookie_secure)
            .cookie_same_site(self.same_site)
            .cookie_content_security(CookieContentSecurity::Private)
            .session_lifecycle(lifecycle)
            .build()
    }
}

fn build_app(
    deps: AppDependencies,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let downloads = web::scope("/api/v1")
        .wrap(deps.sessions())
        .service(get_download)
        .service(list_downloads)
        .service(list_order_downloads)
        .service(refresh_order_downloads);

    let app = App::new()
        .app_data(deps.health_state)
        .app_data(deps.http_state)
        .app_data(query_config())
        .wrap(Trace)
        .service(downloads)
        .service(ready)
        .service(live);

    #[cfg(debug_assertions)]
    let app = app.service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));

    app
}

/// Bind the listener and build the server; it runs once awaited.
///
/// `health_state` reports ready as soon as the socket is bound.
///
/// # Errors
///
/// The bind error when `config.bind_addr` is unavailable.
pub fn create_server(
    health_state: web::Data<HealthState>,
    config: ServerConfig,
) -> std::io::Result<Server> {
    let deps = AppDependencies {
        health_state: health_state.clone(),
        http_state: build_http_state(&config),
        key: config.key,
        cookie_secure: config.cookie_secure,
        same_site: config.same_site,
    };

    let server = HttpServer::new(move || build_app(deps.clone()))
        .bind(config.bind_addr)?
        .run();

    health_state.mark_ready();
    Ok(server)
}
