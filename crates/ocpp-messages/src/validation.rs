//! Field constraint helpers shared by the `OcppAction::validate` impls
//!
//! OCPP 1.6 bounds most strings (`CiString20Type`, `CiString50Type`, ...) and
//! numbers connectors from 1, with 0 addressing the whole charge point.

use ocpp_types::{OcppError, OcppResult};

/// Maximum length of an idTag (`IdToken` is a CiString20Type)
pub const ID_TAG_MAX_LEN: usize = 20;

/// Validate a string field with length constraints
pub fn validate_string_field(
    field_name: &str,
    value: &str,
    min_length: Option<usize>,
    max_length: Option<usize>,
) -> OcppResult<()> {
    let len = value.chars().count();
    if let Some(min) = min_length {
        if len < min {
            return Err(violation(format!(
                "{} must be at least {} characters long",
                field_name, min
            )));
        }
    }

    if let Some(max) = max_length {
        if len > max {
            return Err(violation(format!(
                "{} cannot be longer than {} characters",
                field_name, max
            )));
        }
    }

    Ok(())
}

/// Validate an optional string field, skipping it when absent
pub fn validate_optional_field(
    field_name: &str,
    value: Option<&str>,
    max_length: usize,
) -> OcppResult<()> {
    match value {
        Some(v) => validate_string_field(field_name, v, None, Some(max_length)),
        None => Ok(()),
    }
}

/// Validate an idTag
pub fn validate_id_tag(id_tag: &str) -> OcppResult<()> {
    validate_string_field("idTag", id_tag, Some(1), Some(ID_TAG_MAX_LEN))
}

/// Validate a connector id; `allow_zero` for actions addressing the whole
/// charge point
pub fn validate_connector_id(connector_id: i32, allow_zero: bool) -> OcppResult<()> {
    if connector_id < 0 || (connector_id == 0 && !allow_zero) {
        return Err(violation(format!(
            "connectorId {} is out of range",
            connector_id
        )));
    }
    Ok(())
}

/// Validate that an integer field is not negative
pub fn validate_non_negative(field_name: &str, value: i32) -> OcppResult<()> {
    if value < 0 {
        return Err(violation(format!("{} cannot be negative", field_name)));
    }
    Ok(())
}

// `parse_request` fills in the action name
fn violation(message: String) -> OcppError {
    OcppError::InvalidPayload {
        action: String::new(),
        message,
    }
}
