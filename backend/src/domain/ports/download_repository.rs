//! Port for reading and reconciling purchased downloads.

use async_trait::async_trait;
use pagination::PageRequest;

use crate::domain::{Download, DownloadId, OrderId, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by download repository adapters.
    pub enum DownloadRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "download repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "download repository query failed: {message}",
    }
}

/// Which paid orders a listing covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadScope {
    /// Downloads of a single order.
    Order(OrderId),
    /// Downloads of every order owned by the user.
    Owner(UserId),
}

/// Port for download persistence.
///
/// Listing methods only ever return downloads whose owning order is paid,
/// ordered by creation time then id.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DownloadRepository: Send + Sync {
    /// Find a download by id.
    async fn find_by_id(
        &self,
        download_id: &DownloadId,
    ) -> Result<Option<Download>, DownloadRepositoryError>;

    /// Read one page of downloads belonging to paid orders in `scope`.
    async fn list_paid(
        &self,
        scope: &DownloadScope,
        page: PageRequest,
    ) -> Result<Vec<Download>, DownloadRepositoryError>;

    /// Count downloads belonging to paid orders in `scope`.
    async fn count_paid(&self, scope: &DownloadScope) -> Result<u64, DownloadRepositoryError>;

    /// Read every download attached to an order regardless of payment state.
    async fn list_for_order(
        &self,
        order_id: &OrderId,
    ) -> Result<Vec<Download>, DownloadRepositoryError>;

    /// Insert or update an order's downloads in one unit of work.
    ///
    /// Existing rows keep their `download_count`; only catalogue metadata is
    /// written.
    async fn save_all(
        &self,
        order_id: &OrderId,
        downloads: &[Download],
    ) -> Result<(), DownloadRepositoryError>;
}

/// Fixture implementation for tests and database-less boots.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureDownloadRepository;

#[async_trait]
impl DownloadRepository for FixtureDownloadRepository {
    async fn find_by_id(
        &self,
        _download_id: &DownloadId,
    ) -> Result<Option<Download>, DownloadRepositoryError> {
        Ok(None)
    }

    async fn list_paid(
        &self,
        _scope: &DownloadScope,
        _page: PageRequest,
    ) -> Result<Vec<Download>, DownloadRepositoryError> {
        Ok(Vec::new())
    }

    async fn count_paid(&self, _scope: &DownloadScope) -> Result<u64, DownloadRepositoryError> {
        Ok(0)
    }

    async fn list_for_order(
        &self,
        _order_id: &OrderId,
    ) -> Result<Vec<Download>, DownloadRepositoryError> {
        Ok(Vec::new())
    }

    async fn save_all(
        &self,
        _order_id: &OrderId,
        _downloads: &[Download],
    ) -> Result<(), DownloadRepositoryError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[tokio::test]
    async fn fixture_find_returns_none() {
        let found = FixtureDownloadRepository
            .find_by_id(&DownloadId::random())
            .await
            .expect("fixture lookup succeeds");
        assert!(found.is_none());
    }

    #[rstest]
    #[tokio::test]
    async fn fixture_listing_is_empty() {
        let scope = DownloadScope::Owner(UserId::random());
        let repo = FixtureDownloadRepository;
        let page = repo
            .list_paid(&scope, PageRequest::first_page())
            .await
            .expect("fixture list succeeds");
        let total = repo.count_paid(&scope).await.expect("fixture count succeeds");
        assert!(page.is_empty());
        assert_eq!(total, 0);
    }

    #[rstest]
    fn query_error_formats_message() {
        let err = DownloadRepositoryError::query("relation missing");
        assert_eq!(
            err.to_string(),
            "download repository query failed: relation missing"
        );
    }
}
