//! Value types shared by several OCPP 1.6 actions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Authorization data returned for an idTag
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdTagInfo {
    pub status: AuthorizationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id_tag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<DateTime<Utc>>,
}

impl IdTagInfo {
    /// IdTagInfo carrying only a status
    pub fn with_status(status: AuthorizationStatus) -> Self {
        Self {
            status,
            parent_id_tag: None,
            expiry_date: None,
        }
    }
}

/// Authorization decision for an idTag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthorizationStatus {
    Accepted,
    Blocked,
    Expired,
    Invalid,
    ConcurrentTx,
}

/// Configuration key as reported by GetConfiguration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyValue {
    pub key: String,
    pub readonly: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

/// Meter sample taken at one point in time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeterValue {
    pub timestamp: DateTime<Utc>,
    pub sampled_value: Vec<SampledValue>,
}

/// One sampled value.
///
/// The qualifiers are kept as the strings the charge point sent; the CSMS only
/// acknowledges meter data and charge points in the field disagree on the
/// exact spelling of several of them (`Celcius`, `Celsius`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampledValue {
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub measurand: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

/// Why a transaction was stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Reason {
    EmergencyStop,
    EVDisconnected,
    HardReset,
    Local,
    Other,
    PowerLoss,
    Reboot,
    Remote,
    SoftReset,
    UnlockCommand,
    DeAuthorized,
}

/// Target state for ChangeAvailability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AvailabilityType {
    Inoperative,
    Operative,
}

/// ChangeAvailability outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AvailabilityStatus {
    Accepted,
    Rejected,
    Scheduled,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_id_tag_info_skips_empty_fields() {
        let info = IdTagInfo::with_status(AuthorizationStatus::Accepted);
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json, json!({"status": "Accepted"}));
    }

    #[test]
    fn test_id_tag_info_with_expiry() {
        let info: IdTagInfo = serde_json::from_value(json!({
            "status": "Blocked",
            "parentIdTag": "PARENT",
            "expiryDate": "2024-01-01T00:00:00Z"
        }))
        .unwrap();
        assert_eq!(info.status, AuthorizationStatus::Blocked);
        assert_eq!(info.parent_id_tag.as_deref(), Some("PARENT"));
        assert!(info.expiry_date.is_some());
    }

    #[test]
    fn test_meter_value_keeps_vendor_spelling() {
        let value: MeterValue = serde_json::from_value(json!({
            "timestamp": "2024-01-01T12:00:00Z",
            "sampledValue": [
                {"value": "21.5", "measurand": "Temperature", "unit": "Celcius"},
                {"value": "1234"}
            ]
        }))
        .unwrap();
        assert_eq!(value.sampled_value.len(), 2);
        assert_eq!(value.sampled_value[0].unit.as_deref(), Some("Celcius"));
        assert!(value.sampled_value[1].measurand.is_none());
    }

    #[test]
    fn test_reason_wire_names() {
        assert_eq!(
            serde_json::to_string(&Reason::EVDisconnected).unwrap(),
            "\"EVDisconnected\""
        );
        assert_eq!(
            serde_json::from_str::<Reason>("\"DeAuthorized\"").unwrap(),
            Reason::DeAuthorized
        );
    }
}
