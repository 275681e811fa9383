//! Tests for download HTTP handlers.

use std::net::SocketAddr;
use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::{App, test as actix_test, web};
use chrono::{TimeDelta, Utc};
use pagination::PageRequest;
use rstest::rstest;
use serde_json::Value;
use url::Url;

use super::*;
use crate::domain::ports::{
    FixtureDownloadAccessCommand, FixtureDownloadRefreshCommand, FixtureDownloadsQuery,
    GetDownloadResponse, MockDownloadAccessCommand, MockDownloadRefreshCommand,
    MockDownloadsQuery,
};
use crate::domain::{AssetReference, DownloadDraft, ErrorCode, SignedUrl, UserId};
use crate::inbound::http::test_utils::{session_cookie, test_session_middleware};

const PEER: &str = "198.51.100.23:40211";

fn test_app(
    state: HttpState,
) -> App<
    impl actix_web::dev::ServiceFactory<
        actix_web::dev::ServiceRequest,
        Config = (),
        Response = actix_web::dev::ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .app_data(web::Data::new(state))
        .app_data(query_config())
        .wrap(test_session_middleware())
        .service(
            web::scope("/api/v1")
                .service(get_download)
                .service(list_downloads)
                .service(list_order_downloads)
                .service(refresh_order_downloads),
        )
}

fn state_with(
    access: Option<MockDownloadAccessCommand>,
    listing: Option<MockDownloadsQuery>,
    refresh: Option<MockDownloadRefreshCommand>,
) -> HttpState {
    let access: Arc<dyn crate::domain::ports::DownloadAccessCommand> = match access {
        Some(mock) => Arc::new(mock),
        None => Arc::new(FixtureDownloadAccessCommand),
    };
    let listing: Arc<dyn crate::domain::ports::DownloadsQuery> = match listing {
        Some(mock) => Arc::new(mock),
        None => Arc::new(FixtureDownloadsQuery),
    };
    let refresh: Arc<dyn crate::domain::ports::DownloadRefreshCommand> = match refresh {
        Some(mock) => Arc::new(mock),
        None => Arc::new(FixtureDownloadRefreshCommand),
    };
    HttpState::new(access, listing, refresh)
}

fn download(order_id: OrderId) -> Download {
    Download::new(draft_for(order_id)).expect("download")
}

fn peer() -> SocketAddr {
    PEER.parse().expect("peer address")
}

#[rstest]
#[actix_web::test]
async fn get_download_returns_the_signed_link() {
    let owner = UserId::random();
    let expected_owner = owner.clone();
    let mut access = MockDownloadAccessCommand::new();
    access
        .expect_get_download()
        .withf(move |request| {
            request.caller.user_id() == Some(&expected_owner)
                && request.source_address.as_str() == "198.51.100.23"
        })
        .times(1)
        .returning(|request| {
            let signed = SignedUrl {
                url: Url::parse("https://assets.test/guides/field.pdf?signature=abc")
                    .expect("url"),
                expires_at: Utc::now() + TimeDelta::minutes(15),
            };
            let download = Download::new(DownloadDraft {
                id: request.download_id,
                ..draft_for(OrderId::random())
            })
            .expect("download")
            .with_download_count(1)
            .with_signed_url(signed);
            Ok(GetDownloadResponse { download })
        });
    let app = actix_test::init_service(test_app(state_with(Some(access), None, None))).await;
    let cookie = session_cookie(&owner, false).await;
    let download_id = DownloadId::random();

    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::get()
            .uri(&format!("/api/v1/downloads/{download_id}"))
            .peer_addr(peer())
            .cookie(cookie)
            .to_request(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(body["id"], download_id.to_string());
    assert_eq!(body["downloadCount"], 1);
    assert_eq!(
        body["url"],
        "https://assets.test/guides/field.pdf?signature=abc"
    );
    assert!(body.get("expiresAt").is_some());
}

fn draft_for(order_id: OrderId) -> DownloadDraft {
    DownloadDraft {
        id: DownloadId::random(),
        order_id,
        line_item_id: None,
        title: "Field Guide".to_owned(),
        format: Some("pdf".to_owned()),
        asset: AssetReference::new("guides/field.pdf").expect("asset"),
        download_count: 0,
        created_at: Utc::now(),
    }
}

#[rstest]
#[actix_web::test]
async fn malformed_download_id_is_rejected() {
    let app = actix_test::init_service(test_app(HttpState::fixtures())).await;

    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::get()
            .uri("/api/v1/downloads/not-a-uuid")
            .to_request(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(body["details"]["field"], "downloadId");
}

#[rstest]
#[actix_web::test]
async fn denials_surface_as_unauthorised() {
    let mut access = MockDownloadAccessCommand::new();
    access
        .expect_get_download()
        .withf(|request| request.caller.is_anonymous())
        .returning(|_| Err(Error::unauthorized("Not Authorized to access this download")));
    let app = actix_test::init_service(test_app(state_with(Some(access), None, None))).await;

    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::get()
            .uri(&format!("/api/v1/downloads/{}", DownloadId::random()))
            .to_request(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: Error = actix_test::read_body_json(response).await;
    assert_eq!(body.code(), ErrorCode::Unauthorized);
    assert_eq!(body.message(), "Not Authorized to access this download");
}

#[rstest]
#[actix_web::test]
async fn listing_sets_paging_headers() {
    let owner = UserId::random();
    let order_id = OrderId::random();
    let mut listing = MockDownloadsQuery::new();
    listing
        .expect_list_downloads()
        .withf(|request| request.order_id.is_none() && request.offset == 2 && request.limit == 2)
        .times(1)
        .returning(move |_| {
            Ok(ListDownloadsResponse {
                downloads: vec![download(order_id), download(order_id)],
                page: PageRequest::new(2, 2).expect("page"),
                total: 7,
            })
        });
    let app = actix_test::init_service(test_app(state_with(None, Some(listing), None))).await;
    let cookie = session_cookie(&owner, false).await;

    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::get()
            .uri("/api/v1/downloads?offset=2&limit=2")
            .cookie(cookie)
            .to_request(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers().clone();
    assert_eq!(
        headers
            .get(TOTAL_COUNT_HEADER)
            .and_then(|value| value.to_str().ok()),
        Some("7")
    );
    let link = headers
        .get(header::LINK)
        .and_then(|value| value.to_str().ok())
        .expect("link header")
        .to_owned();
    assert!(link.contains("offset=0&limit=2>; rel=\"prev\""));
    assert!(link.contains("offset=4&limit=2>; rel=\"next\""));
    assert!(link.contains("offset=6&limit=2>; rel=\"last\""));

    let body: Vec<Value> = actix_test::read_body_json(response).await;
    assert_eq!(body.len(), 2);
    assert!(body[0].get("url").is_none());
}

#[rstest]
#[actix_web::test]
async fn listing_defaults_to_the_first_page() {
    let mut listing = MockDownloadsQuery::new();
    listing
        .expect_list_downloads()
        .withf(|request| request.offset == 0 && request.limit == i64::from(DEFAULT_LIMIT))
        .times(1)
        .returning(|request| {
            Ok(ListDownloadsResponse {
                downloads: Vec::new(),
                page: PageRequest::new(request.offset, request.limit).expect("page"),
                total: 0,
            })
        });
    let app = actix_test::init_service(test_app(state_with(None, Some(listing), None))).await;

    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::get()
            .uri("/api/v1/downloads")
            .to_request(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
}

#[rstest]
#[case("/api/v1/downloads?limit=many")]
#[case("/api/v1/downloads?offset=-1")]
#[case("/api/v1/downloads?limit=-5")]
#[actix_web::test]
async fn bad_paging_is_a_bad_request(#[case] uri: &str) {
    let app = actix_test::init_service(test_app(HttpState::fixtures())).await;

    let response =
        actix_test::call_service(&app, actix_test::TestRequest::get().uri(uri).to_request())
            .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Error = actix_test::read_body_json(response).await;
    assert_eq!(body.code(), ErrorCode::InvalidRequest);
}

#[rstest]
#[actix_web::test]
async fn order_listing_passes_the_order() {
    let order_id = OrderId::random();
    let mut listing = MockDownloadsQuery::new();
    listing
        .expect_list_downloads()
        .withf(move |request| request.order_id == Some(order_id))
        .times(1)
        .returning(|_| Err(Error::not_found("Download order not found")));
    let app = actix_test::init_service(test_app(state_with(None, Some(listing), None))).await;

    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::get()
            .uri(&format!("/api/v1/orders/{order_id}/downloads"))
            .to_request(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[rstest]
#[actix_web::test]
async fn refresh_reports_changes() {
    let admin = UserId::random();
    let order_id = OrderId::random();
    let mut refresh = MockDownloadRefreshCommand::new();
    refresh
        .expect_refresh_downloads()
        .withf(move |request| request.order_id == order_id && request.caller.is_admin())
        .times(1)
        .returning(|_| {
            Ok(RefreshDownloadsResponse {
                added: 2,
                updated: 1,
            })
        });
    let app = actix_test::init_service(test_app(state_with(None, None, Some(refresh)))).await;
    let cookie = session_cookie(&admin, true).await;

    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri(&format!("/api/v1/orders/{order_id}/downloads/refresh"))
            .cookie(cookie)
            .to_request(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(body, serde_json::json!({ "added": 2, "updated": 1 }));
}

#[rstest]
#[case(false, "198.51.100.23")]
#[case(true, "203.0.113.77")]
fn source_address_honours_proxy_trust(#[case] trust: bool, #[case] expected: &str) {
    let req = actix_test::TestRequest::get()
        .peer_addr(peer())
        .insert_header(("x-forwarded-for", "203.0.113.77"))
        .to_http_request();

    assert_eq!(source_address(&req, trust).as_str(), expected);
}

#[rstest]
fn missing_peer_is_unknown() {
    let req = actix_test::TestRequest::get().to_http_request();
    assert_eq!(source_address(&req, false), SourceAddress::unknown());
}
