//! Download HTTP handlers.
//!
//! ```text
//! GET  /api/v1/downloads/{download_id}
//! GET  /api/v1/downloads?offset=&limit=
//! GET  /api/v1/orders/{order_id}/downloads?offset=&limit=
//! POST /api/v1/orders/{order_id}/downloads/refresh
//! ```
//!
//! Listings carry `X-Total-Count` and an RFC 8288 `Link` header.

use std::net::{IpAddr, SocketAddr};

use actix_web::http::header;
use actix_web::{HttpRequest, HttpResponse, get, post, web};
use pagination::{DEFAULT_LIMIT, PageLinks, TOTAL_COUNT_HEADER};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::ports::{
    GetDownloadRequest, ListDownloadsRequest, ListDownloadsResponse, RefreshDownloadsRequest,
    RefreshDownloadsResponse,
};
use crate::domain::{Download, DownloadId, Error, OrderId, SourceAddress};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, parse_uuid};

/// Paging query parameters.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    /// Records to skip. Defaults to 0.
    pub offset: Option<i64>,
    /// Page size between 1 and 100. Defaults to 50.
    pub limit: Option<i64>,
}

/// A purchased download as returned to clients.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DownloadBody {
    #[schema(format = "uuid")]
    pub id: String,
    #[schema(format = "uuid")]
    pub order_id: String,
    pub title: String,
    pub format: Option<String>,
    pub download_count: u64,
    #[schema(format = "date-time")]
    pub created_at: String,
    /// Signed link, present only on single-download responses.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[schema(format = "date-time")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,
}

impl From<&Download> for DownloadBody {
    fn from(download: &Download) -> Self {
        let signed = download.signed_url();
        Self {
            id: download.id().to_string(),
            order_id: download.order_id().to_string(),
            title: download.title().to_owned(),
            format: download.format().map(str::to_owned),
            download_count: download.download_count(),
            created_at: download.created_at().to_rfc3339(),
            url: signed.map(|signed| signed.url.to_string()),
            expires_at: signed.map(|signed| signed.expires_at.to_rfc3339()),
        }
    }
}

/// Outcome of a catalogue refresh.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RefreshBody {
    pub added: usize,
    pub updated: usize,
}

impl From<RefreshDownloadsResponse> for RefreshBody {
    fn from(value: RefreshDownloadsResponse) -> Self {
        Self {
            added: value.added,
            updated: value.updated,
        }
    }
}

/// Query extractor configuration rendering malformed paging as domain errors.
pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req| {
        Error::invalid_request(format!("Bad Pagination Parameters: {err}")).into()
    })
}

fn parse_ip(raw: &str) -> Option<IpAddr> {
    raw.parse::<IpAddr>()
        .ok()
        .or_else(|| raw.parse::<SocketAddr>().ok().map(|addr| addr.ip()))
}

/// Resolve the caller's network address.
///
/// Forwarding headers are consulted only when the deployment sits behind a
/// trusted proxy.
pub(crate) fn source_address(req: &HttpRequest, trust_forwarded: bool) -> SourceAddress {
    if trust_forwarded {
        let info = req.connection_info();
        if let Some(raw) = info.realip_remote_addr() {
            return parse_ip(raw)
                .map(SourceAddress::from)
                .unwrap_or_else(|| SourceAddress::from_raw(raw));
        }
    }
    req.peer_addr()
        .map(|addr| SourceAddress::from(addr.ip()))
        .unwrap_or_else(SourceAddress::unknown)
}

fn page_response(req: &HttpRequest, response: &ListDownloadsResponse) -> HttpResponse {
    let links = PageLinks::new(&req.full_url(), response.page, response.total);
    let body: Vec<DownloadBody> = response.downloads.iter().map(DownloadBody::from).collect();
    HttpResponse::Ok()
        .insert_header((TOTAL_COUNT_HEADER, links.total().to_string()))
        .insert_header((header::LINK, links.link_header()))
        .json(body)
}

fn list_request(
    order_id: Option<OrderId>,
    session: &SessionContext,
    query: PageQuery,
) -> Result<ListDownloadsRequest, Error> {
    Ok(ListDownloadsRequest {
        order_id,
        caller: session.caller()?,
        offset: query.offset.unwrap_or(0),
        limit: query.limit.unwrap_or(i64::from(DEFAULT_LIMIT)),
    })
}

/// Issue a signed link for one download and record the access.
#[utoipa::path(
    get,
    path = "/api/v1/downloads/{download_id}",
    params(("download_id" = String, Path, format = "uuid", description = "Download identifier")),
    responses(
        (status = 200, description = "Signed download", body = DownloadBody),
        (status = 400, description = "Malformed identifier", body = Error),
        (status = 401, description = "Not entitled, unpaid, or throttled", body = Error),
        (status = 404, description = "Download not found", body = Error),
        (status = 500, description = "Internal error", body = Error)
    ),
    tags = ["downloads"],
    operation_id = "getDownload",
    security(("SessionCookie" = []))
)]
#[get("/downloads/{download_id}")]
pub async fn get_download(
    req: HttpRequest,
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<DownloadBody>> {
    let download_id = DownloadId::from_uuid(parse_uuid(&path, FieldName::new("downloadId"))?);
    let request = GetDownloadRequest {
        download_id,
        caller: session.caller()?,
        source_address: source_address(&req, state.trust_forwarded),
    };

    let response = state.access.get_download(request).await?;
    Ok(web::Json(DownloadBody::from(&response.download)))
}

/// List the caller's paid downloads across all orders.
#[utoipa::path(
    get,
    path = "/api/v1/downloads",
    params(PageQuery),
    responses(
        (status = 200, description = "Page of downloads", body = [DownloadBody],
            headers(
                ("X-Total-Count" = u64, description = "Total matching downloads"),
                ("Link" = String, description = "first, prev, next and last pages")
            )),
        (status = 400, description = "Bad pagination parameters", body = Error),
        (status = 401, description = "Not signed in", body = Error),
        (status = 500, description = "Internal error", body = Error)
    ),
    tags = ["downloads"],
    operation_id = "listDownloads",
    security(("SessionCookie" = []))
)]
#[get("/downloads")]
pub async fn list_downloads(
    req: HttpRequest,
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<PageQuery>,
) -> ApiResult<HttpResponse> {
    let request = list_request(None, &session, query.into_inner())?;
    let response = state.listing.list_downloads(request).await?;
    Ok(page_response(&req, &response))
}

/// List the paid downloads of one order.
#[utoipa::path(
    get,
    path = "/api/v1/orders/{order_id}/downloads",
    params(
        ("order_id" = String, Path, format = "uuid", description = "Order identifier"),
        PageQuery
    ),
    responses(
        (status = 200, description = "Page of downloads", body = [DownloadBody],
            headers(
                ("X-Total-Count" = u64, description = "Total matching downloads"),
                ("Link" = String, description = "first, prev, next and last pages")
            )),
        (status = 400, description = "Bad pagination parameters", body = Error),
        (status = 401, description = "Not entitled to the order", body = Error),
        (status = 404, description = "Order not found", body = Error),
        (status = 500, description = "Internal error", body = Error)
    ),
    tags = ["downloads"],
    operation_id = "listOrderDownloads",
    security(("SessionCookie" = []))
)]
#[get("/orders/{order_id}/downloads")]
pub async fn list_order_downloads(
    req: HttpRequest,
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> ApiResult<HttpResponse> {
    let order_id = OrderId::from_uuid(parse_uuid(&path, FieldName::new("orderId"))?);
    let request = list_request(Some(order_id), &session, query.into_inner())?;
    let response = state.listing.list_downloads(request).await?;
    Ok(page_response(&req, &response))
}

/// Reconcile an order's downloads with the product catalogue.
#[utoipa::path(
    post,
    path = "/api/v1/orders/{order_id}/downloads/refresh",
    params(("order_id" = String, Path, format = "uuid", description = "Order identifier")),
    responses(
        (status = 200, description = "Downloads reconciled", body = RefreshBody),
        (status = 400, description = "Malformed identifier", body = Error),
        (status = 401, description = "Not entitled to the order", body = Error),
        (status = 404, description = "Order not found", body = Error),
        (status = 500, description = "Internal error", body = Error)
    ),
    tags = ["downloads"],
    operation_id = "refreshOrderDownloads",
    security(("SessionCookie" = []))
)]
#[post("/orders/{order_id}/downloads/refresh")]
pub async fn refresh_order_downloads(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<RefreshBody>> {
    let order_id = OrderId::from_uuid(parse_uuid(&path, FieldName::new("orderId"))?);
    let response = state
        .refresh
        .refresh_downloads(RefreshDownloadsRequest {
            order_id,
            caller: session.caller()?,
        })
        .await?;
    Ok(web::Json(RefreshBody::from(response)))
}

#[cfg(test)]
#[path = "downloads_tests.rs"]
mod tests;
