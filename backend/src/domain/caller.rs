//! Caller identity threaded explicitly through every operation.
//!
//! An absent user id means the caller is anonymous. Administrative capability
//! is only ever granted alongside a verified identity.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Validation errors for [`UserId`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserIdValidationError {
    /// The raw value was empty.
    #[error("user id must not be empty")]
    Empty,
    /// The raw value was not a canonical UUID.
    #[error("user id must be a valid UUID")]
    Invalid,
}

/// Stable user identifier stored as a UUID.
///
/// # Examples
/// ```
/// use backend::domain::UserId;
///
/// let id = UserId::new("3fa85f64-5717-4562-b3fc-2c963f66afa6").expect("valid id");
/// assert_eq!(id.to_string(), "3fa85f64-5717-4562-b3fc-2c963f66afa6");
/// assert!(UserId::new(" 3fa85f64-5717-4562-b3fc-2c963f66afa6").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(Uuid);

impl UserId {
    /// Validate and construct a [`UserId`].
    pub fn new(id: impl AsRef<str>) -> Result<Self, UserIdValidationError> {
        let raw = id.as_ref();
        if raw.is_empty() {
            return Err(UserIdValidationError::Empty);
        }
        if raw.trim() != raw {
            return Err(UserIdValidationError::Invalid);
        }
        Uuid::parse_str(raw)
            .map(Self)
            .map_err(|_| UserIdValidationError::Invalid)
    }

    /// Generate a random identifier.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<UserId> for String {
    fn from(value: UserId) -> Self {
        value.0.to_string()
    }
}

impl TryFrom<String> for UserId {
    type Error = UserIdValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Who is asking: an optional verified identity and an admin flag.
///
/// ## Invariants
/// - An anonymous caller is never an administrator.
///
/// # Examples
/// ```
/// use backend::domain::{CallerContext, UserId};
///
/// let anonymous = CallerContext::anonymous();
/// assert!(anonymous.user_id().is_none());
/// assert!(!anonymous.is_admin());
///
/// let admin = CallerContext::admin(UserId::random());
/// assert!(admin.is_admin());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallerContext {
    user_id: Option<UserId>,
    admin: bool,
}

impl CallerContext {
    /// Caller without a verified identity.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Authenticated caller without administrative capability.
    pub fn user(user_id: UserId) -> Self {
        Self {
            user_id: Some(user_id),
            admin: false,
        }
    }

    /// Authenticated caller holding administrative capability.
    pub fn admin(user_id: UserId) -> Self {
        Self {
            user_id: Some(user_id),
            admin: true,
        }
    }

    /// Verified identity, if any.
    pub fn user_id(&self) -> Option<&UserId> {
        self.user_id.as_ref()
    }

    /// Whether the caller holds administrative capability.
    pub fn is_admin(&self) -> bool {
        self.admin
    }

    /// Whether the caller has no verified identity.
    pub fn is_anonymous(&self) -> bool {
        self.user_id.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("", UserIdValidationError::Empty)]
    #[case("not-a-uuid", UserIdValidationError::Invalid)]
    #[case(" 3fa85f64-5717-4562-b3fc-2c963f66afa6", UserIdValidationError::Invalid)]
    fn rejects_invalid_user_ids(#[case] raw: &str, #[case] expected: UserIdValidationError) {
        assert_eq!(UserId::new(raw), Err(expected));
    }

    #[rstest]
    fn serde_round_trips_as_string() {
        let id = UserId::random();
        let json = serde_json::to_string(&id).expect("serialise");
        assert_eq!(json, format!("\"{id}\""));
        let decoded: UserId = serde_json::from_str(&json).expect("deserialise");
        assert_eq!(decoded, id);
    }

    #[rstest]
    fn user_caller_is_not_admin() {
        let caller = CallerContext::user(UserId::random());
        assert!(!caller.is_admin());
        assert!(!caller.is_anonymous());
    }
}
