//! HTTP inbound adapter exposing the download endpoints.

pub mod downloads;
pub mod error;
pub mod health;
pub mod session;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod validation;

pub use error::ApiResult;
