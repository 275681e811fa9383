//! Behaviour tests for issuing download links.
//!
//! Scenarios run the access service over the in-memory store with a real
//! SHA-256 signer, so entitlement, throttling and auditing are observed
//! through the same ports production wires to PostgreSQL.

use std::cell::RefCell;
use std::sync::Arc;

use backend::domain::ports::{
    DownloadAccessCommand, GetDownloadRequest, GetDownloadResponse, UrlSigner,
};
use backend::domain::{
    CallerContext, DOWNLOAD_CHANGE, DownloadAccessDeps, DownloadAccessService, DownloadId, Error,
    ErrorCode, OrderId, PaymentState, SourceAddress, THROTTLED_MESSAGE, UserId,
};
use backend::outbound::signing::Sha256UrlSigner;
use chrono::TimeDelta;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use tokio::runtime::Runtime;
use url::Url;
use zeroize::Zeroizing;

#[path = "support/memory_store.rs"]
mod memory_store;

use memory_store::{FixedClock, MemoryStore, now};

struct Purchase {
    owner: UserId,
    order_id: OrderId,
    download_id: DownloadId,
}

struct DownloadAccessWorld {
    runtime: Runtime,
    store: Arc<MemoryStore>,
    signer: Arc<Sha256UrlSigner>,
    purchase: RefCell<Option<Purchase>>,
    caller: RefCell<CallerContext>,
    outcome: RefCell<Option<Result<GetDownloadResponse, Error>>>,
}

impl DownloadAccessWorld {
    fn new() -> Self {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("test runtime");
        let signer = Sha256UrlSigner::new(
            Zeroizing::new(b"behaviour-signing-secret".to_vec()),
            Url::parse("https://assets.test/files/").expect("asset base"),
            Arc::new(FixedClock(now())),
        )
        .expect("signer");

        Self {
            runtime,
            store: Arc::new(MemoryStore::default()),
            signer: Arc::new(signer),
            purchase: RefCell::new(None),
            caller: RefCell::new(CallerContext::anonymous()),
            outcome: RefCell::new(None),
        }
    }

    fn add_purchase(&self, state: PaymentState) {
        let (owner, order_id) = self.store.add_order(state);
        let download_id = self.store.add_download(order_id, "guides/field.pdf", now());
        *self.purchase.borrow_mut() = Some(Purchase {
            owner,
            order_id,
            download_id,
        });
    }

    fn with_purchase<T>(&self, f: impl FnOnce(&Purchase) -> T) -> T {
        let purchase = self.purchase.borrow();
        f(purchase.as_ref().expect("a purchase was set up"))
    }

    fn service(&self) -> DownloadAccessService<MemoryStore, MemoryStore, MemoryStore, MemoryStore> {
        let signer: Arc<dyn UrlSigner> = self.signer.clone();
        DownloadAccessService::new(DownloadAccessDeps {
            downloads: self.store.clone(),
            orders: self.store.clone(),
            ledger: self.store.clone(),
            audit: self.store.clone(),
            signer,
            clock: Arc::new(FixedClock(now())),
        })
    }

    fn with_error(&self, f: impl FnOnce(&Error)) {
        let outcome = self.outcome.borrow();
        match outcome.as_ref().expect("a request was made") {
            Ok(_) => panic!("expected the request to be refused"),
            Err(error) => f(error),
        }
    }
}

#[fixture]
fn world() -> DownloadAccessWorld {
    DownloadAccessWorld::new()
}

#[given("a paid order with one download")]
fn a_paid_order_with_one_download(world: &DownloadAccessWorld) {
    world.add_purchase(PaymentState::Paid);
}

#[given("an unpaid order with one download")]
fn an_unpaid_order_with_one_download(world: &DownloadAccessWorld) {
    world.add_purchase(PaymentState::Pending);
}

#[given("the caller owns the order")]
fn the_caller_owns_the_order(world: &DownloadAccessWorld) {
    let owner = world.with_purchase(|purchase| purchase.owner.clone());
    *world.caller.borrow_mut() = CallerContext::user(owner);
}

#[given("the caller is an administrator")]
fn the_caller_is_an_administrator(world: &DownloadAccessWorld) {
    *world.caller.borrow_mut() = CallerContext::admin(UserId::random());
}

#[given("{count} distinct addresses downloaded from the order in the last day")]
fn distinct_addresses_downloaded(world: &DownloadAccessWorld, count: usize) {
    let order_id = world.with_purchase(|purchase| purchase.order_id);
    for host in 0..count {
        world.store.add_access_event(
            order_id,
            &format!("198.51.100.{host}"),
            now() - TimeDelta::hours(1),
        );
    }
}

#[given("another address downloaded from the order exactly one day ago")]
fn another_address_exactly_one_day_ago(world: &DownloadAccessWorld) {
    let order_id = world.with_purchase(|purchase| purchase.order_id);
    world
        .store
        .add_access_event(order_id, "198.51.100.250", now() - TimeDelta::hours(24));
}

#[when("the caller requests the download from {address}")]
fn the_caller_requests_the_download(world: &DownloadAccessWorld, address: String) {
    let request = GetDownloadRequest {
        download_id: world.with_purchase(|purchase| purchase.download_id),
        caller: world.caller.borrow().clone(),
        source_address: SourceAddress::from_raw(address),
    };
    let service = world.service();
    let outcome = world.runtime.block_on(service.get_download(request));
    *world.outcome.borrow_mut() = Some(outcome);
}

#[then("a signed link to the download is issued")]
fn a_signed_link_is_issued(world: &DownloadAccessWorld) {
    let outcome = world.outcome.borrow();
    let response = outcome
        .as_ref()
        .expect("a request was made")
        .as_ref()
        .expect("expected the download to be issued");
    let signed = response.download.signed_url().expect("signed url");
    assert!(signed.url.path().ends_with("/guides/field.pdf"));
    world
        .signer
        .verify(&signed.url, now())
        .expect("issued link verifies");
}

#[then("access is refused as unauthorised")]
fn access_is_refused_as_unauthorised(world: &DownloadAccessWorld) {
    world.with_error(|error| assert_eq!(error.code(), ErrorCode::Unauthorized));
}

#[then("access is refused because of too many addresses")]
fn access_is_refused_because_of_too_many_addresses(world: &DownloadAccessWorld) {
    world.with_error(|error| {
        assert_eq!(error.code(), ErrorCode::Unauthorized);
        assert_eq!(error.message(), THROTTLED_MESSAGE);
    });
}

#[then("the download count is {count}")]
fn the_download_count_is(world: &DownloadAccessWorld, count: u64) {
    let download_id = world.with_purchase(|purchase| purchase.download_id);
    assert_eq!(world.store.count_of(download_id), count);
}

#[then("the ledger holds {count} download entry from {address}")]
fn the_ledger_holds_entries_from(world: &DownloadAccessWorld, count: usize, address: String) {
    let order_id = world.with_purchase(|purchase| purchase.order_id);
    let events = world.store.events_for(order_id);
    assert_eq!(events.len(), count);
    assert!(events.iter().all(|event| {
        event.has_change(DOWNLOAD_CHANGE) && event.source_address.as_str() == address
    }));
}

#[then("the ledger holds no entries")]
fn the_ledger_holds_no_entries(world: &DownloadAccessWorld) {
    let order_id = world.with_purchase(|purchase| purchase.order_id);
    assert!(world.store.events_for(order_id).is_empty());
}

#[scenario(path = "tests/features/download_access.feature")]
fn download_access_scenarios(world: DownloadAccessWorld) {
    drop(world);
}
