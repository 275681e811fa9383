//! Caller identity carried by the storefront's session cookie.
//!
//! Login happens elsewhere; handlers here only read the `user_id` and
//! `is_admin` entries. Anything missing or malformed means anonymous.

use std::future::{Ready, ready};

use actix_session::{Session, SessionExt};
use actix_web::{FromRequest, HttpRequest, dev::Payload};
use tracing::warn;

use crate::domain::{CallerContext, Error, UserId};

pub(crate) const USER_ID_KEY: &str = "user_id";
pub(crate) const IS_ADMIN_KEY: &str = "is_admin";

/// Extractor resolving the [`CallerContext`] of a request.
#[derive(Clone)]
pub struct SessionContext(Session);

impl SessionContext {
    /// The caller named by the session, or an anonymous one.
    ///
    /// `is_admin` counts only when a valid user id accompanies it.
    ///
    /// # Errors
    ///
    /// Internal error when the session state itself cannot be decoded.
    pub fn caller(&self) -> Result<CallerContext, Error> {
        let stored = self
            .0
            .get::<String>(USER_ID_KEY)
            .map_err(|err| Error::internal(format!("session state unreadable: {err}")))?;

        let Some(user_id) = stored.and_then(|raw| {
            UserId::new(&raw)
                .inspect_err(|err| warn!(error = %err, "ignoring malformed session user id"))
                .ok()
        }) else {
            return Ok(CallerContext::anonymous());
        };

        if self.is_admin() {
            Ok(CallerContext::admin(user_id))
        } else {
            Ok(CallerContext::user(user_id))
        }
    }

    fn is_admin(&self) -> bool {
        match self.0.get::<bool>(IS_ADMIN_KEY) {
            Ok(flag) => flag.unwrap_or(false),
            Err(err) => {
                warn!(error = %err, "ignoring malformed session admin flag");
                false
            }
        }
    }
}

impl FromRequest for SessionContext {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(Ok(Self(req.get_session())))
    }
}
