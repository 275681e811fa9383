//! Request validation helpers for inbound HTTP adapters.

use serde_json::json;
use uuid::Uuid;

use crate::domain::Error;

/// HTTP field name carried in validation error details.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldName(&'static str);

impl FieldName {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self(name)
    }

    fn as_str(self) -> &'static str {
        self.0
    }
}

pub(crate) fn invalid_uuid_error(field: FieldName, value: &str) -> Error {
    let field = field.as_str();
    Error::invalid_request(format!("{field} must be a valid UUID")).with_details(json!({
        "field": field,
        "value": value,
        "code": "invalid_uuid",
    }))
}

pub(crate) fn parse_uuid(value: &str, field: FieldName) -> Result<Uuid, Error> {
    Uuid::parse_str(value).map_err(|_| invalid_uuid_error(field, value))
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::domain::ErrorCode;

    #[rstest]
    fn malformed_ids_report_the_field() {
        let err = parse_uuid("not-a-uuid", FieldName::new("downloadId")).expect_err("invalid");

        assert_eq!(err.code(), ErrorCode::InvalidRequest);
        assert_eq!(err.message(), "downloadId must be a valid UUID");
        assert_eq!(
            err.details(),
            Some(&json!({ "field": "downloadId", "value": "not-a-uuid", "code": "invalid_uuid" }))
        );
    }

    #[rstest]
    fn well_formed_ids_parse() {
        let id = Uuid::new_v4();
        assert_eq!(
            parse_uuid(&id.to_string(), FieldName::new("orderId")).expect("valid"),
            id
        );
    }
}
