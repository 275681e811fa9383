//! Backend entry-point: loads settings, wires adapters, and serves the download API.

mod server;

use std::sync::Arc;

use actix_web::cookie::{Key, SameSite};
use actix_web::web;
use color_eyre::eyre::{Context, Result, eyre};
use mockable::DefaultClock;
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use backend::inbound::http::health::HealthState;
use backend::outbound::catalogue::HttpDownloadCatalogue;
use backend::outbound::persistence::DbPool;
use backend::outbound::signing::Sha256UrlSigner;
use backend::settings::{DownloadServerSettings, SESSION_KEY_MIN_LEN, read_secret_file};
use server::{DownloadBackends, ServerConfig, create_server};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings =
        DownloadServerSettings::load().map_err(|err| eyre!("failed to load settings: {err}"))?;
    let key = session_key(&settings)?;

    let mut config = ServerConfig::new(
        key,
        settings.cookie_secure(),
        SameSite::Lax,
        settings.bind_addr(),
    )
    .with_throttle(settings.throttle())
    .with_request_timeout(settings.request_timeout())
    .with_trusted_forwarding(settings.trust_forwarded_for());

    match build_backends(&settings).await? {
        Some(backends) => config = config.with_backends(backends),
        None => warn!("DOWNLOADS_DATABASE_URL is not set; serving fixture ports"),
    }

    let health_state = web::Data::new(HealthState::new());
    let server =
        create_server(health_state.clone(), config).wrap_err("failed to start HTTP server")?;
    info!(bind_addr = %settings.bind_addr(), "downloads server listening");

    let handle = server.handle();
    actix_web::rt::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            health_state.begin_draining();
            info!("shutdown requested; draining connections");
            handle.stop(true).await;
        }
    });

    server.await.wrap_err("HTTP server terminated with an error")
}

fn session_key(settings: &DownloadServerSettings) -> Result<Key> {
    let path = settings.session_key_file();
    match read_secret_file(&path, SESSION_KEY_MIN_LEN) {
        Ok(bytes) => Ok(Key::derive_from(&bytes)),
        Err(err) if cfg!(debug_assertions) => {
            warn!(path = %path.display(), error = %err, "using temporary session key (dev only)");
            Ok(Key::generate())
        }
        Err(err) => Err(err).wrap_err("session key unavailable"),
    }
}

async fn build_backends(settings: &DownloadServerSettings) -> Result<Option<DownloadBackends>> {
    let Some(pool_config) = settings.pool_config() else {
        return Ok(None);
    };

    let pool = DbPool::new(pool_config)
        .await
        .wrap_err("failed to build database pool")?;
    let signer = Sha256UrlSigner::new(
        settings.signing_secret()?,
        settings.require_asset_base_url()?.clone(),
        Arc::new(DefaultClock),
    )
    .wrap_err("invalid URL signing configuration")?
    .with_ttl(settings.signed_url_ttl());
    let catalogue = HttpDownloadCatalogue::new(
        settings.require_catalogue_base_url()?.clone(),
        settings.catalogue_timeout(),
    )
    .wrap_err("failed to build catalogue client")?;

    Ok(Some(DownloadBackends {
        pool,
        signer: Arc::new(signer),
        catalogue: Arc::new(catalogue),
    }))
}
