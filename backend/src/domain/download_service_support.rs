//! Error mapping shared by the download services.
//!
//! Store failures become `InternalError` with the operation and entity named
//! in the message. The HTTP adapter never returns that message verbatim.

use std::fmt::Display;

use crate::domain::Error;
use crate::domain::ports::{DownloadRepositoryError, OrderRepositoryError};

pub(crate) fn map_download_repository_error(
    operation: &'static str,
    entity: impl Display,
    error: DownloadRepositoryError,
) -> Error {
    tracing::error!(operation, entity = %entity, error = %error, "download store failure");
    Error::internal(format!("{operation} for {entity} failed: {error}"))
}

pub(crate) fn map_order_repository_error(
    operation: &'static str,
    entity: impl Display,
    error: OrderRepositoryError,
) -> Error {
    tracing::error!(operation, entity = %entity, error = %error, "order store failure");
    Error::internal(format!("{operation} for {entity} failed: {error}"))
}

/// Message returned when an order cannot be found.
pub(crate) const ORDER_NOT_FOUND: &str = "Download order not found";

/// Message returned when a download cannot be found.
pub(crate) const DOWNLOAD_NOT_FOUND: &str = "Download not found";
