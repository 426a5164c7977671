//! Shared validation helpers for inbound HTTP adapters.

use std::str::FromStr;

use serde_json::json;
use uuid::Uuid;

use crate::domain::{CollectionStatus, Coordinate, Error, Role};

/// Validation error codes for HTTP request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorCode {
    MissingField,
    InvalidUuid,
    InvalidValue,
}

impl ErrorCode {
    fn as_str(self) -> &'static str {
        match self {
            ErrorCode::MissingField => "missing_field",
            ErrorCode::InvalidUuid => "invalid_uuid",
            ErrorCode::InvalidValue => "invalid_value",
        }
    }
}

/// Newtype wrapper for HTTP field names to provide type safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldName(&'static str);

impl FieldName {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self(name)
    }

    fn as_str(&self) -> &str {
        self.0
    }
}

/// Builder for validation errors with field context.
struct ValidationError {
    field: String,
    message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    fn with_code(self, code: ErrorCode) -> Error {
        Error::invalid_request(self.message).with_details(json!({
            "field": self.field,
            "code": code.as_str(),
        }))
    }

    fn with_value(self, code: ErrorCode, value: impl Into<String>) -> Error {
        Error::invalid_request(self.message).with_details(json!({
            "field": self.field,
            "value": value.into(),
            "code": code.as_str(),
        }))
    }
}

pub(crate) fn missing_field_error(field: FieldName) -> Error {
    let field = field.as_str();
    ValidationError::new(field, format!("missing required field: {field}"))
        .with_code(ErrorCode::MissingField)
}

pub(crate) fn invalid_uuid_error(field: FieldName, value: &str) -> Error {
    let field = field.as_str();
    ValidationError::new(field, format!("{field} must be a valid UUID"))
        .with_value(ErrorCode::InvalidUuid, value)
}

pub(crate) fn invalid_value_error(
    field: FieldName,
    value: &str,
    message: impl std::fmt::Display,
) -> Error {
    ValidationError::new(field.as_str(), message.to_string())
        .with_value(ErrorCode::InvalidValue, value)
}

pub(crate) fn parse_uuid(value: &str, field: FieldName) -> Result<Uuid, Error> {
    Uuid::parse_str(value).map_err(|_| invalid_uuid_error(field, value))
}

/// Reject absent or blank text.
pub(crate) fn required_text(value: Option<String>, field: FieldName) -> Result<String, Error> {
    value
        .filter(|raw| !raw.trim().is_empty())
        .ok_or_else(|| missing_field_error(field))
}

pub(crate) fn parse_role(value: &str, field: FieldName) -> Result<Role, Error> {
    parse_with(value, field)
}

pub(crate) fn parse_status(value: &str, field: FieldName) -> Result<CollectionStatus, Error> {
    parse_with(value, field)
}

fn parse_with<T>(value: &str, field: FieldName) -> Result<T, Error>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|err| invalid_value_error(field, value, err))
}

/// Build a coordinate from optional body fields.
pub(crate) fn coordinate(
    latitude: Option<f64>,
    longitude: Option<f64>,
) -> Result<Coordinate, Error> {
    let lat = latitude.ok_or_else(|| missing_field_error(FieldName::new("latitude")))?;
    let lon = longitude.ok_or_else(|| missing_field_error(FieldName::new("longitude")))?;
    Coordinate::new(lat, lon).map_err(|err| {
        invalid_value_error(FieldName::new("location"), &format!("{lat},{lon}"), err)
    })
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::domain::ErrorCode as DomainCode;

    fn detail_code(error: &Error) -> Option<&str> {
        error
            .details()
            .and_then(|details| details.get("code"))
            .and_then(serde_json::Value::as_str)
    }

    #[rstest]
    fn unknown_status_names_the_value() {
        let error = parse_status("SOLICITADA", FieldName::new("status")).expect_err("unknown");

        assert_eq!(error.code(), DomainCode::InvalidRequest);
        assert_eq!(detail_code(&error), Some("invalid_value"));
        assert_eq!(
            error.details().and_then(|details| details.get("value")),
            Some(&json!("SOLICITADA"))
        );
    }

    #[rstest]
    #[case("collector", Role::Collector)]
    #[case(" recycler ", Role::Recycler)]
    fn roles_parse_from_their_wire_names(#[case] raw: &str, #[case] expected: Role) {
        assert_eq!(parse_role(raw, FieldName::new("role")), Ok(expected));
    }

    #[rstest]
    #[case(None)]
    #[case(Some("   ".to_owned()))]
    fn blank_text_is_missing(#[case] raw: Option<String>) {
        let error = required_text(raw, FieldName::new("username")).expect_err("missing");

        assert_eq!(detail_code(&error), Some("missing_field"));
    }

    #[rstest]
    fn malformed_uuid_is_rejected() {
        let error = parse_uuid("abc", FieldName::new("id")).expect_err("invalid");

        assert_eq!(detail_code(&error), Some("invalid_uuid"));
    }

    #[rstest]
    #[case(None, Some(-42.8), "missing_field")]
    #[case(Some(91.0), Some(-42.8), "invalid_value")]
    fn bad_coordinates_are_rejected(
        #[case] latitude: Option<f64>,
        #[case] longitude: Option<f64>,
        #[case] code: &str,
    ) {
        let error = coordinate(latitude, longitude).expect_err("invalid");

        assert_eq!(detail_code(&error), Some(code));
    }

    #[rstest]
    fn valid_coordinate_is_kept() {
        let point = coordinate(Some(-5.1136), Some(-42.8487)).expect("valid");

        assert_eq!(point.latitude(), -5.1136);
    }
}
