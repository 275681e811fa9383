//! Offset/limit pagination primitives shared by backend endpoints.
//!
//! A [`PageRequest`] is validated from raw caller input before any store is
//! touched, so malformed paging never reaches a query. [`PageLinks`] renders
//! the RFC 8288 `Link` header and the total-count header describing where a
//! page sits within the full result set.

use serde::{Deserialize, Serialize};
use url::Url;

/// Page size applied when the caller does not request one.
pub const DEFAULT_LIMIT: u32 = 50;

/// Largest page size a caller may request.
pub const MAX_LIMIT: u32 = 100;

/// Response header carrying the total number of matching records.
pub const TOTAL_COUNT_HEADER: &str = "x-total-count";

/// Query parameter name for the zero-based record offset.
pub const OFFSET_PARAM: &str = "offset";

/// Query parameter name for the page size.
pub const LIMIT_PARAM: &str = "limit";

/// Reasons a raw offset/limit pair is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PageRequestError {
    /// The offset was below zero.
    #[error("offset must not be negative (got {offset})")]
    NegativeOffset {
        /// Offset supplied by the caller.
        offset: i64,
    },
    /// The limit was below zero.
    #[error("limit must not be negative (got {limit})")]
    NegativeLimit {
        /// Limit supplied by the caller.
        limit: i64,
    },
    /// The limit was zero.
    #[error("limit must be at least 1")]
    ZeroLimit,
    /// The limit exceeded [`MAX_LIMIT`].
    #[error("limit must be at most {max} (got {limit})")]
    LimitTooLarge {
        /// Limit supplied by the caller.
        limit: i64,
        /// Largest accepted limit.
        max: u32,
    },
}

/// Validated offset/limit window into an ordered result set.
///
/// ## Invariants
/// - `limit` lies in `1..=MAX_LIMIT`.
///
/// # Examples
/// ```
/// use pagination::PageRequest;
///
/// let page = PageRequest::new(20, 10).expect("valid page");
/// assert_eq!(page.offset(), 20);
/// assert_eq!(page.limit(), 10);
/// assert!(PageRequest::new(-1, 10).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    offset: u64,
    limit: u32,
}

impl PageRequest {
    /// Validate a raw offset/limit pair.
    ///
    /// # Errors
    ///
    /// Returns [`PageRequestError`] when either value is negative, the limit
    /// is zero, or the limit exceeds [`MAX_LIMIT`].
    pub fn new(offset: i64, limit: i64) -> Result<Self, PageRequestError> {
        let validated_offset =
            u64::try_from(offset).map_err(|_| PageRequestError::NegativeOffset { offset })?;
        if limit < 0 {
            return Err(PageRequestError::NegativeLimit { limit });
        }
        if limit == 0 {
            return Err(PageRequestError::ZeroLimit);
        }
        let validated_limit = u32::try_from(limit)
            .ok()
            .filter(|value| *value <= MAX_LIMIT)
            .ok_or(PageRequestError::LimitTooLarge {
                limit,
                max: MAX_LIMIT,
            })?;
        Ok(Self {
            offset: validated_offset,
            limit: validated_limit,
        })
    }

    /// Validate optional query parameters, defaulting to the first page of
    /// [`DEFAULT_LIMIT`] records.
    ///
    /// # Errors
    ///
    /// Same as [`PageRequest::new`].
    pub fn from_query(offset: Option<i64>, limit: Option<i64>) -> Result<Self, PageRequestError> {
        Self::new(
            offset.unwrap_or(0),
            limit.unwrap_or_else(|| i64::from(DEFAULT_LIMIT)),
        )
    }

    /// First page using the default page size.
    #[must_use]
    pub const fn first_page() -> Self {
        Self {
            offset: 0,
            limit: DEFAULT_LIMIT,
        }
    }

    /// Zero-based index of the first record in the page.
    #[must_use]
    pub const fn offset(self) -> u64 {
        self.offset
    }

    /// Maximum number of records in the page.
    #[must_use]
    pub const fn limit(self) -> u32 {
        self.limit
    }

    /// Offset as a signed SQL parameter, saturating at `i64::MAX`.
    #[must_use]
    pub fn offset_i64(self) -> i64 {
        i64::try_from(self.offset).unwrap_or(i64::MAX)
    }

    /// Limit as a signed SQL parameter.
    #[must_use]
    pub fn limit_i64(self) -> i64 {
        i64::from(self.limit)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::first_page()
    }
}

/// Navigation links for one page of a collection.
///
/// # Examples
/// ```
/// use pagination::{PageLinks, PageRequest};
/// use url::Url;
///
/// let base = Url::parse("https://shop.test/api/v1/downloads").expect("url");
/// let page = PageRequest::new(0, 2).expect("page");
/// let links = PageLinks::new(&base, page, 5);
/// assert!(links.link_header().contains("rel=\"next\""));
/// assert!(!links.link_header().contains("rel=\"prev\""));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLinks {
    first: Url,
    prev: Option<Url>,
    next: Option<Url>,
    last: Url,
    total: u64,
}

impl PageLinks {
    /// Build links for `page` within a collection of `total` records served
    /// from `base`. Existing query parameters other than offset/limit are kept.
    #[must_use]
    pub fn new(base: &Url, page: PageRequest, total: u64) -> Self {
        let limit = u64::from(page.limit());
        let last_offset = total
            .saturating_sub(1)
            .checked_div(limit)
            .unwrap_or(0)
            .saturating_mul(limit);
        let prev = (page.offset() > 0)
            .then(|| page_url(base, page.offset().saturating_sub(limit), page.limit()));
        let next_offset = page.offset().saturating_add(limit);
        let next = (next_offset < total).then(|| page_url(base, next_offset, page.limit()));

        Self {
            first: page_url(base, 0, page.limit()),
            prev,
            next,
            last: page_url(base, last_offset, page.limit()),
            total,
        }
    }

    /// Total number of records in the collection.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.total
    }

    /// Link to the following page, when one exists.
    #[must_use]
    pub const fn next(&self) -> Option<&Url> {
        self.next.as_ref()
    }

    /// Link to the preceding page, when one exists.
    #[must_use]
    pub const fn prev(&self) -> Option<&Url> {
        self.prev.as_ref()
    }

    /// Render the `Link` header value.
    #[must_use]
    pub fn link_header(&self) -> String {
        let mut parts = vec![format!("<{}>; rel=\"first\"", self.first)];
        if let Some(prev) = &self.prev {
            parts.push(format!("<{prev}>; rel=\"prev\""));
        }
        if let Some(next) = &self.next {
            parts.push(format!("<{next}>; rel=\"next\""));
        }
        parts.push(format!("<{}>; rel=\"last\"", self.last));
        parts.join(", ")
    }
}

fn page_url(base: &Url, offset: u64, limit: u32) -> Url {
    let retained: Vec<(String, String)> = base
        .query_pairs()
        .filter(|(key, _)| key != OFFSET_PARAM && key != LIMIT_PARAM)
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();
    let mut url = base.clone();
    url.set_query(None);
    url.query_pairs_mut()
        .extend_pairs(retained)
        .append_pair(OFFSET_PARAM, &offset.to_string())
        .append_pair(LIMIT_PARAM, &limit.to_string());
    url
}
