//! Driving port for paginated download listings.

use async_trait::async_trait;
use pagination::PageRequest;

use crate::domain::{CallerContext, Download, Error, OrderId};

/// Request to list downloads of paid orders.
///
/// `offset` and `limit` are raw caller input and are validated by the
/// service before any store access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListDownloadsRequest {
    /// Restrict to one order; `None` lists every order the caller owns.
    pub order_id: Option<OrderId>,
    pub caller: CallerContext,
    pub offset: i64,
    pub limit: i64,
}

/// One page of downloads plus the size of the full result set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListDownloadsResponse {
    pub downloads: Vec<Download>,
    pub page: PageRequest,
    pub total: u64,
}

/// Driving port for reading download listings.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DownloadsQuery: Send + Sync {
    /// List downloads attached to paid orders.
    async fn list_downloads(
        &self,
        request: ListDownloadsRequest,
    ) -> Result<ListDownloadsResponse, Error>;
}

/// Fixture query returning empty pages.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureDownloadsQuery;

#[async_trait]
impl DownloadsQuery for FixtureDownloadsQuery {
    async fn list_downloads(
        &self,
        request: ListDownloadsRequest,
    ) -> Result<ListDownloadsResponse, Error> {
        let page = PageRequest::new(request.offset, request.limit)
            .map_err(|err| Error::invalid_request(format!("bad pagination parameters: {err}")))?;
        Ok(ListDownloadsResponse {
            downloads: Vec::new(),
            page,
            total: 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::domain::ErrorCode;

    #[rstest]
    #[case(-1, 10)]
    #[case(0, -1)]
    #[tokio::test]
    async fn fixture_validates_paging(#[case] offset: i64, #[case] limit: i64) {
        let err = FixtureDownloadsQuery
            .list_downloads(ListDownloadsRequest {
                order_id: None,
                caller: CallerContext::anonymous(),
                offset,
                limit,
            })
            .await
            .expect_err("invalid paging");
        assert_eq!(err.code(), ErrorCode::InvalidRequest);
    }
}
