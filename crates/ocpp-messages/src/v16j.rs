//! OCPP 1.6-J payload definitions
//!
//! Requests implement [`OcppAction`]; responses are plain serde types bound
//! through `OcppAction::Response`. Grouped by direction: actions initiated by
//! the charge point first, then the ones the CSMS sends.

use crate::validation::{
    validate_connector_id, validate_id_tag, validate_non_negative, validate_optional_field,
    validate_string_field,
};
use crate::OcppAction;
use chrono::{DateTime, Utc};
use ocpp_types::{common::*, v16j::*, IdToken, OcppResult};
use serde::{Deserialize, Serialize};

// =============================================================================
// Charge point initiated
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizeRequest {
    pub id_tag: IdToken,
}

impl OcppAction for AuthorizeRequest {
    const ACTION_NAME: &'static str = "Authorize";
    type Response = AuthorizeResponse;

    fn validate(&self) -> OcppResult<()> {
        validate_id_tag(&self.id_tag)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizeResponse {
    pub id_tag_info: IdTagInfo,
}

/// First message a charge point sends after connecting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BootNotificationRequest {
    pub charge_point_vendor: String,
    pub charge_point_model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub charge_point_serial_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub charge_box_serial_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub firmware_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iccid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imsi: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meter_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meter_serial_number: Option<String>,
}

impl OcppAction for BootNotificationRequest {
    const ACTION_NAME: &'static str = "BootNotification";
    type Response = BootNotificationResponse;

    fn validate(&self) -> OcppResult<()> {
        validate_string_field("chargePointVendor", &self.charge_point_vendor, Some(1), Some(20))?;
        validate_string_field("chargePointModel", &self.charge_point_model, Some(1), Some(20))?;
        validate_optional_field(
            "chargePointSerialNumber",
            self.charge_point_serial_number.as_deref(),
            25,
        )?;
        validate_optional_field(
            "chargeBoxSerialNumber",
            self.charge_box_serial_number.as_deref(),
            25,
        )?;
        validate_optional_field("firmwareVersion", self.firmware_version.as_deref(), 50)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BootNotificationResponse {
    pub current_time: DateTime<Utc>,
    /// Heartbeat interval in seconds
    pub interval: i32,
    pub status: RegistrationStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HeartbeatRequest {}

impl OcppAction for HeartbeatRequest {
    const ACTION_NAME: &'static str = "Heartbeat";
    type Response = HeartbeatResponse;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeartbeatResponse {
    pub current_time: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeterValuesRequest {
    pub connector_id: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<i32>,
    pub meter_value: Vec<MeterValue>,
}

impl OcppAction for MeterValuesRequest {
    const ACTION_NAME: &'static str = "MeterValues";
    type Response = MeterValuesResponse;

    fn validate(&self) -> OcppResult<()> {
        validate_connector_id(self.connector_id, true)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeterValuesResponse {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartTransactionRequest {
    pub connector_id: i32,
    pub id_tag: IdToken,
    pub meter_start: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reservation_id: Option<i32>,
    pub timestamp: DateTime<Utc>,
}

impl OcppAction for StartTransactionRequest {
    const ACTION_NAME: &'static str = "StartTransaction";
    type Response = StartTransactionResponse;

    fn validate(&self) -> OcppResult<()> {
        validate_connector_id(self.connector_id, false)?;
        validate_id_tag(&self.id_tag)?;
        validate_non_negative("meterStart", self.meter_start)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartTransactionResponse {
    pub id_tag_info: IdTagInfo,
    pub transaction_id: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusNotificationRequest {
    pub connector_id: i32,
    pub error_code: ChargePointErrorCode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub info: Option<String>,
    pub status: ChargePointStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vendor_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vendor_error_code: Option<String>,
}

impl OcppAction for StatusNotificationRequest {
    const ACTION_NAME: &'static str = "StatusNotification";
    type Response = StatusNotificationResponse;

    fn validate(&self) -> OcppResult<()> {
        validate_connector_id(self.connector_id, true)?;
        validate_optional_field("info", self.info.as_deref(), 50)?;
        validate_optional_field("vendorId", self.vendor_id.as_deref(), 255)?;
        validate_optional_field("vendorErrorCode", self.vendor_error_code.as_deref(), 50)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusNotificationResponse {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StopTransactionRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_tag: Option<IdToken>,
    pub meter_stop: i32,
    pub timestamp: DateTime<Utc>,
    pub transaction_id: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<Reason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_data: Option<Vec<MeterValue>>,
}

impl OcppAction for StopTransactionRequest {
    const ACTION_NAME: &'static str = "StopTransaction";
    type Response = StopTransactionResponse;

    fn validate(&self) -> OcppResult<()> {
        if let Some(id_tag) = &self.id_tag {
            validate_id_tag(id_tag)?;
        }
        validate_non_negative("meterStop", self.meter_stop)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StopTransactionResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_tag_info: Option<IdTagInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FirmwareStatusNotificationRequest {
    pub status: FirmwareStatus,
}

impl OcppAction for FirmwareStatusNotificationRequest {
    const ACTION_NAME: &'static str = "FirmwareStatusNotification";
    type Response = FirmwareStatusNotificationResponse;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FirmwareStatusNotificationResponse {}

// =============================================================================
// Either direction
// =============================================================================

/// Vendor specific exchange; `data` is an opaque string
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataTransferRequest {
    pub vendor_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

impl OcppAction for DataTransferRequest {
    const ACTION_NAME: &'static str = "DataTransfer";
    type Response = DataTransferResponse;

    fn validate(&self) -> OcppResult<()> {
        validate_string_field("vendorId", &self.vendor_id, Some(1), Some(255))?;
        validate_optional_field("messageId", self.message_id.as_deref(), 50)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataTransferResponse {
    pub status: DataTransferStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

// =============================================================================
// CSMS initiated
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteStartTransactionRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connector_id: Option<i32>,
    pub id_tag: IdToken,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub charging_profile: Option<ChargingProfile>,
}

impl OcppAction for RemoteStartTransactionRequest {
    const ACTION_NAME: &'static str = "RemoteStartTransaction";
    type Response = RemoteStartTransactionResponse;

    fn validate(&self) -> OcppResult<()> {
        if let Some(connector_id) = self.connector_id {
            validate_connector_id(connector_id, false)?;
        }
        validate_id_tag(&self.id_tag)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteStartTransactionResponse {
    pub status: RemoteStartStopStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteStopTransactionRequest {
    pub transaction_id: i32,
}

impl OcppAction for RemoteStopTransactionRequest {
    const ACTION_NAME: &'static str = "RemoteStopTransaction";
    type Response = RemoteStopTransactionResponse;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteStopTransactionResponse {
    pub status: RemoteStartStopStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeConfigurationRequest {
    pub key: String,
    pub value: String,
}

impl OcppAction for ChangeConfigurationRequest {
    const ACTION_NAME: &'static str = "ChangeConfiguration";
    type Response = ChangeConfigurationResponse;

    fn validate(&self) -> OcppResult<()> {
        validate_string_field("key", &self.key, Some(1), Some(50))?;
        validate_string_field("value", &self.value, None, Some(500))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeConfigurationResponse {
    pub status: ConfigurationStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GetConfigurationRequest {
    /// All keys are reported when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<Vec<String>>,
}

impl OcppAction for GetConfigurationRequest {
    const ACTION_NAME: &'static str = "GetConfiguration";
    type Response = GetConfigurationResponse;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetConfigurationResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub configuration_key: Option<Vec<KeyValue>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unknown_key: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeAvailabilityRequest {
    /// 0 addresses the whole charge point
    pub connector_id: i32,
    #[serde(rename = "type")]
    pub kind: AvailabilityType,
}

impl OcppAction for ChangeAvailabilityRequest {
    const ACTION_NAME: &'static str = "ChangeAvailability";
    type Response = ChangeAvailabilityResponse;

    fn validate(&self) -> OcppResult<()> {
        validate_connector_id(self.connector_id, true)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeAvailabilityResponse {
    pub status: AvailabilityStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerMessageRequest {
    pub requested_message: MessageTrigger,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connector_id: Option<i32>,
}

impl OcppAction for TriggerMessageRequest {
    const ACTION_NAME: &'static str = "TriggerMessage";
    type Response = TriggerMessageResponse;

    fn validate(&self) -> OcppResult<()> {
        match self.connector_id {
            Some(connector_id) => validate_connector_id(connector_id, false),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerMessageResponse {
    pub status: TriggerMessageStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnlockConnectorRequest {
    pub connector_id: i32,
}

impl OcppAction for UnlockConnectorRequest {
    const ACTION_NAME: &'static str = "UnlockConnector";
    type Response = UnlockConnectorResponse;

    fn validate(&self) -> OcppResult<()> {
        validate_connector_id(self.connector_id, false)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnlockConnectorResponse {
    pub status: UnlockStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResetRequest {
    #[serde(rename = "type")]
    pub kind: ResetType,
}

impl OcppAction for ResetRequest {
    const ACTION_NAME: &'static str = "Reset";
    type Response = ResetResponse;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResetResponse {
    pub status: ResetStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReserveNowRequest {
    pub connector_id: i32,
    pub expiry_date: DateTime<Utc>,
    pub id_tag: IdToken,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id_tag: Option<IdToken>,
    pub reservation_id: i32,
}

impl OcppAction for ReserveNowRequest {
    const ACTION_NAME: &'static str = "ReserveNow";
    type Response = ReserveNowResponse;

    fn validate(&self) -> OcppResult<()> {
        validate_connector_id(self.connector_id, true)?;
        validate_id_tag(&self.id_tag)?;
        if let Some(parent) = &self.parent_id_tag {
            validate_id_tag(parent)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReserveNowResponse {
    pub status: ReservationStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelReservationRequest {
    pub reservation_id: i32,
}

impl OcppAction for CancelReservationRequest {
    const ACTION_NAME: &'static str = "CancelReservation";
    type Response = CancelReservationResponse;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CancelReservationResponse {
    pub status: CancelReservationStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateFirmwareRequest {
    /// URI the firmware is downloaded from
    pub location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retries: Option<i32>,
    pub retrieve_date: DateTime<Utc>,
    /// Seconds between retries
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_interval: Option<i32>,
}

impl OcppAction for UpdateFirmwareRequest {
    const ACTION_NAME: &'static str = "UpdateFirmware";
    type Response = UpdateFirmwareResponse;

    fn validate(&self) -> OcppResult<()> {
        validate_string_field("location", &self.location, Some(1), None)?;
        if let Some(retries) = self.retries {
            validate_non_negative("retries", retries)?;
        }
        if let Some(interval) = self.retry_interval {
            validate_non_negative("retryInterval", interval)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateFirmwareResponse {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetCompositeScheduleRequest {
    pub connector_id: i32,
    /// Seconds
    pub duration: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub charging_rate_unit: Option<ChargingRateUnitType>,
}

impl OcppAction for GetCompositeScheduleRequest {
    const ACTION_NAME: &'static str = "GetCompositeSchedule";
    type Response = GetCompositeScheduleResponse;

    fn validate(&self) -> OcppResult<()> {
        validate_connector_id(self.connector_id, true)?;
        validate_non_negative("duration", self.duration)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetCompositeScheduleResponse {
    pub status: GetCompositeScheduleStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connector_id: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule_start: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub charging_schedule: Option<ChargingSchedule>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetChargingProfileRequest {
    pub connector_id: i32,
    pub cs_charging_profiles: ChargingProfile,
}

impl OcppAction for SetChargingProfileRequest {
    const ACTION_NAME: &'static str = "SetChargingProfile";
    type Response = SetChargingProfileResponse;

    fn validate(&self) -> OcppResult<()> {
        validate_connector_id(self.connector_id, true)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetChargingProfileResponse {
    pub status: ChargingProfileStatus,
}

/// Every present field narrows the set of profiles to clear
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearChargingProfileRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connector_id: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub charging_profile_purpose: Option<ChargingProfilePurposeType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack_level: Option<i32>,
}

impl OcppAction for ClearChargingProfileRequest {
    const ACTION_NAME: &'static str = "ClearChargingProfile";
    type Response = ClearChargingProfileResponse;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClearChargingProfileResponse {
    pub status: ClearChargingProfileStatus,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::parse_request;
    use serde_json::json;

    #[test]
    fn test_boot_notification_parse() {
        let request: BootNotificationRequest = parse_request(json!({
            "chargePointVendor": "ACME",
            "chargePointModel": "FastCharge 50",
            "firmwareVersion": "1.2.3"
        }))
        .unwrap();
        assert_eq!(request.charge_point_vendor, "ACME");
        assert_eq!(request.firmware_version.as_deref(), Some("1.2.3"));
        assert!(request.charge_box_serial_number.is_none());
    }

    #[test]
    fn test_boot_notification_vendor_too_long() {
        let result = parse_request::<BootNotificationRequest>(json!({
            "chargePointVendor": "A vendor name that is far too long",
            "chargePointModel": "M"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_start_transaction_requires_fields() {
        let result = parse_request::<StartTransactionRequest>(json!({
            "connectorId": 1,
            "idTag": "TAG42"
        }));
        assert!(result.is_err());

        let request: StartTransactionRequest = parse_request(json!({
            "connectorId": 1,
            "idTag": "TAG42",
            "meterStart": 0,
            "timestamp": "2024-01-01T10:00:00Z"
        }))
        .unwrap();
        assert_eq!(request.connector_id, 1);
    }

    #[test]
    fn test_stop_transaction_without_id_tag() {
        let request: StopTransactionRequest = parse_request(json!({
            "meterStop": 1500,
            "timestamp": "2024-01-01T11:00:00Z",
            "transactionId": 3,
            "reason": "EVDisconnected"
        }))
        .unwrap();
        assert!(request.id_tag.is_none());
        assert_eq!(request.reason, Some(Reason::EVDisconnected));
    }

    #[test]
    fn test_status_notification_parse() {
        let request: StatusNotificationRequest = parse_request(json!({
            "connectorId": 0,
            "errorCode": "NoError",
            "status": "Available"
        }))
        .unwrap();
        assert_eq!(request.status, ChargePointStatus::Available);

        let bad = parse_request::<StatusNotificationRequest>(json!({
            "connectorId": 1,
            "errorCode": "NoError",
            "status": "Sleeping"
        }));
        assert!(bad.is_err());
    }

    #[test]
    fn test_remote_start_wire_shape() {
        let request = RemoteStartTransactionRequest {
            connector_id: Some(1),
            id_tag: "TAG42".to_string(),
            charging_profile: None,
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"connectorId": 1, "idTag": "TAG42"})
        );
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_type_field_rename() {
        let reset = ResetRequest {
            kind: ResetType::Soft,
        };
        assert_eq!(serde_json::to_value(&reset).unwrap(), json!({"type": "Soft"}));

        let availability = ChangeAvailabilityRequest {
            connector_id: 0,
            kind: AvailabilityType::Inoperative,
        };
        assert_eq!(
            serde_json::to_value(&availability).unwrap(),
            json!({"connectorId": 0, "type": "Inoperative"})
        );
    }

    #[test]
    fn test_get_configuration_response_optional_lists() {
        let response: GetConfigurationResponse = serde_json::from_value(json!({
            "configurationKey": [
                {"key": "HeartbeatInterval", "readonly": false, "value": "10"}
            ]
        }))
        .unwrap();
        let keys = response.configuration_key.unwrap();
        assert_eq!(keys[0].key, "HeartbeatInterval");
        assert!(response.unknown_key.is_none());

        let empty: GetConfigurationResponse = serde_json::from_value(json!({})).unwrap();
        assert!(empty.configuration_key.is_none());
    }

    #[test]
    fn test_clear_charging_profile_empty_filter() {
        let request = ClearChargingProfileRequest::default();
        assert_eq!(serde_json::to_value(&request).unwrap(), json!({}));
    }

    #[test]
    fn test_empty_responses_serialize_to_object() {
        assert_eq!(serde_json::to_value(MeterValuesResponse {}).unwrap(), json!({}));
        assert_eq!(
            serde_json::to_value(StopTransactionResponse::default()).unwrap(),
            json!({})
        );
    }
}
