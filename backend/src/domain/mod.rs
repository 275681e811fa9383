//! Domain primitives, policies and services.
//!
//! Purpose: hold the download entitlement rules independent of transport and
//! storage. Entities are immutable outside their documented mutators, and
//! services reach the outside world only through [`ports`].
//!
//! Public surface:
//! - Error (alias to `error::Error`): transport-agnostic failure payload.
//! - Order, Download, Event: the entities the gate reads and writes.
//! - `check_ownership`/`check_paid`: entitlement predicates.
//! - RateLimiter, AuditRecorder: throttle and atomic audit building blocks.
//! - `DownloadAccessService`, `DownloadListingService`,
//!   `DownloadRefreshService`: driving port implementations.

pub mod audit;
pub mod caller;
pub mod download;
mod download_access_service;
mod download_listing_service;
mod download_reconciliation;
mod download_refresh_service;
mod download_service_support;
pub mod entitlement;
pub mod error;
pub mod event;
pub mod order;
pub mod ports;
pub mod throttle;
pub mod trace_id;

pub use self::audit::AuditRecorder;
pub use self::caller::{CallerContext, UserId, UserIdValidationError};
pub use self::download::{
    AssetReference, Download, DownloadDraft, DownloadId, DownloadValidationError, SignedUrl,
};
pub use self::download_access_service::{
    DEFAULT_ACCESS_TIMEOUT, DownloadAccessDeps, DownloadAccessService,
};
pub use self::download_listing_service::DownloadListingService;
pub use self::download_reconciliation::{CatalogueMerge, merge_catalogue_downloads};
pub use self::download_refresh_service::DownloadRefreshService;
pub use self::entitlement::{EntitlementSubject, authorise_order, check_ownership, check_paid};
pub use self::error::{Error, ErrorCode, ErrorValidationError, TRACE_ID_HEADER};
pub use self::event::{
    DOWNLOAD_CHANGE, Event, EventKind, NewEvent, ParseEventKindError, SourceAddress,
};
pub use self::order::{Order, OrderId, OrderLineItem, ParsePaymentStateError, PaymentState};
pub use self::throttle::{
    DEFAULT_MAX_DISTINCT_ADDRESSES, DEFAULT_WINDOW_HOURS, DistinctAddressThrottle, RateLimiter,
    THROTTLED_MESSAGE,
};
pub use self::trace_id::TraceId;

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use backend::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<()> {
///     Err(Error::unauthorized("nope"))
/// }
/// assert!(handler().is_err());
/// ```
pub type ApiResult<T> = Result<T, Error>;
