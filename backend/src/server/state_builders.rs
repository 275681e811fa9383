//! Builders for HTTP state ports.

use std::sync::Arc;

use actix_web::web;
use mockable::{Clock, DefaultClock};

use backend::domain::ports::{
    DownloadAccessCommand, DownloadRefreshCommand, DownloadsQuery, FixtureDownloadAccessCommand,
    FixtureDownloadRefreshCommand, FixtureDownloadsQuery,
};
use backend::domain::{
    DownloadAccessDeps, DownloadAccessService, DownloadListingService, DownloadRefreshService,
};
use backend::inbound::http::state::HttpState;
use backend::outbound::persistence::{
    DieselDownloadAuditRepository, DieselDownloadRepository, DieselEventLedger,
    DieselOrderRepository,
};

use super::ServerConfig;
use super::config::DownloadBackends;

type DrivingPorts = (
    Arc<dyn DownloadAccessCommand>,
    Arc<dyn DownloadsQuery>,
    Arc<dyn DownloadRefreshCommand>,
);

fn fixture_ports() -> DrivingPorts {
    (
        Arc::new(FixtureDownloadAccessCommand),
        Arc::new(FixtureDownloadsQuery),
        Arc::new(FixtureDownloadRefreshCommand),
    )
}

fn diesel_ports(config: &ServerConfig, backends: &DownloadBackends) -> DrivingPorts {
    let pool = &backends.pool;
    let downloads = Arc::new(DieselDownloadRepository::new(pool.clone()));
    let orders = Arc::new(DieselOrderRepository::new(pool.clone()));
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);

    let access = DownloadAccessService::new(DownloadAccessDeps {
        downloads: downloads.clone(),
        orders: orders.clone(),
        ledger: Arc::new(DieselEventLedger::new(pool.clone())),
        audit: Arc::new(DieselDownloadAuditRepository::new(pool.clone())),
        signer: backends.signer.clone(),
        clock: clock.clone(),
    })
    .with_throttle(config.throttle)
    .with_timeout(config.request_timeout);
    let listing = DownloadListingService::new(downloads.clone(), orders.clone());
    let refresh =
        DownloadRefreshService::new(downloads, orders, backends.catalogue.clone(), clock);

    (Arc::new(access), Arc::new(listing), Arc::new(refresh))
}

/// Build the shared HTTP state, falling back to fixtures without a database.
pub(super) fn build_http_state(config: &ServerConfig) -> web::Data<HttpState> {
    let (access, listing, refresh) = match &config.backends {
        Some(backends) => diesel_ports(config, backends),
        None => fixture_ports(),
    };
    web::Data::new(
        HttpState::new(access, listing, refresh).with_trusted_forwarding(config.trust_forwarded),
    )
}
