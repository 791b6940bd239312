//! Remote operations against connected charge points
//!
//! Every operation names its target charger. An unknown or disconnected
//! charger fails with `NotConnected` before anything is written; otherwise
//! the request is validated, sent, and the charge point's answer returned.

use crate::registry::SessionRegistry;
use crate::session::SessionHandle;
use chrono::{DateTime, Utc};
use ocpp_messages::v16j::*;
use ocpp_messages::OcppAction;
use ocpp_types::common::AvailabilityType;
use ocpp_types::v16j::{
    ChargingProfile, ChargingProfilePurposeType, ChargingRateUnitType, MessageTrigger, ResetType,
};
use ocpp_types::{IdToken, OcppResult};
use std::time::Duration;
use tracing::info;

/// Operator facing entry point for CSMS initiated actions
#[derive(Clone)]
pub struct CentralSystem {
    registry: SessionRegistry,
}

impl CentralSystem {
    pub fn new(registry: SessionRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// Send any outbound action to `charger_id`
    pub async fn call<A: OcppAction>(
        &self,
        charger_id: &str,
        request: A,
        timeout: Option<Duration>,
    ) -> OcppResult<A::Response> {
        let session: SessionHandle = self.registry.lookup(charger_id)?;
        info!("{} -> {}", A::ACTION_NAME, charger_id);
        session.engine().call(&request, timeout).await
    }

    pub async fn remote_start_transaction(
        &self,
        charger_id: &str,
        id_tag: IdToken,
        connector_id: Option<i32>,
        charging_profile: Option<ChargingProfile>,
        timeout: Option<Duration>,
    ) -> OcppResult<RemoteStartTransactionResponse> {
        let request = RemoteStartTransactionRequest {
            connector_id,
            id_tag,
            charging_profile,
        };
        self.call(charger_id, request, timeout).await
    }

    pub async fn remote_stop_transaction(
        &self,
        charger_id: &str,
        transaction_id: i32,
        timeout: Option<Duration>,
    ) -> OcppResult<RemoteStopTransactionResponse> {
        let request = RemoteStopTransactionRequest { transaction_id };
        self.call(charger_id, request, timeout).await
    }

    pub async fn change_configuration(
        &self,
        charger_id: &str,
        key: String,
        value: String,
        timeout: Option<Duration>,
    ) -> OcppResult<ChangeConfigurationResponse> {
        let request = ChangeConfigurationRequest { key, value };
        self.call(charger_id, request, timeout).await
    }

    /// All keys when `keys` is `None`
    pub async fn get_configuration(
        &self,
        charger_id: &str,
        keys: Option<Vec<String>>,
        timeout: Option<Duration>,
    ) -> OcppResult<GetConfigurationResponse> {
        let request = GetConfigurationRequest { key: keys };
        self.call(charger_id, request, timeout).await
    }

    pub async fn change_availability(
        &self,
        charger_id: &str,
        connector_id: i32,
        kind: AvailabilityType,
        timeout: Option<Duration>,
    ) -> OcppResult<ChangeAvailabilityResponse> {
        let request = ChangeAvailabilityRequest { connector_id, kind };
        self.call(charger_id, request, timeout).await
    }

    pub async fn trigger_message(
        &self,
        charger_id: &str,
        requested_message: MessageTrigger,
        connector_id: Option<i32>,
        timeout: Option<Duration>,
    ) -> OcppResult<TriggerMessageResponse> {
        let request = TriggerMessageRequest {
            requested_message,
            connector_id,
        };
        self.call(charger_id, request, timeout).await
    }

    pub async fn unlock_connector(
        &self,
        charger_id: &str,
        connector_id: i32,
        timeout: Option<Duration>,
    ) -> OcppResult<UnlockConnectorResponse> {
        let request = UnlockConnectorRequest { connector_id };
        self.call(charger_id, request, timeout).await
    }

    pub async fn reset(
        &self,
        charger_id: &str,
        kind: ResetType,
        timeout: Option<Duration>,
    ) -> OcppResult<ResetResponse> {
        self.call(charger_id, ResetRequest { kind }, timeout).await
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn reserve_now(
        &self,
        charger_id: &str,
        connector_id: i32,
        expiry_date: DateTime<Utc>,
        id_tag: IdToken,
        parent_id_tag: Option<IdToken>,
        reservation_id: i32,
        timeout: Option<Duration>,
    ) -> OcppResult<ReserveNowResponse> {
        let request = ReserveNowRequest {
            connector_id,
            expiry_date,
            id_tag,
            parent_id_tag,
            reservation_id,
        };
        self.call(charger_id, request, timeout).await
    }

    pub async fn cancel_reservation(
        &self,
        charger_id: &str,
        reservation_id: i32,
        timeout: Option<Duration>,
    ) -> OcppResult<CancelReservationResponse> {
        let request = CancelReservationRequest { reservation_id };
        self.call(charger_id, request, timeout).await
    }

    /// DataTransfer carrying `data`
    pub async fn set_data_transfer(
        &self,
        charger_id: &str,
        vendor_id: String,
        message_id: Option<String>,
        data: String,
        timeout: Option<Duration>,
    ) -> OcppResult<DataTransferResponse> {
        let request = DataTransferRequest {
            vendor_id,
            message_id,
            data: Some(data),
        };
        self.call(charger_id, request, timeout).await
    }

    /// DataTransfer without data; the answer's `data` is the value asked for
    pub async fn get_data_transfer(
        &self,
        charger_id: &str,
        vendor_id: String,
        message_id: Option<String>,
        timeout: Option<Duration>,
    ) -> OcppResult<DataTransferResponse> {
        let request = DataTransferRequest {
            vendor_id,
            message_id,
            data: None,
        };
        self.call(charger_id, request, timeout).await
    }

    pub async fn update_firmware(
        &self,
        charger_id: &str,
        location: String,
        retrieve_date: DateTime<Utc>,
        retries: Option<i32>,
        retry_interval: Option<i32>,
        timeout: Option<Duration>,
    ) -> OcppResult<UpdateFirmwareResponse> {
        let request = UpdateFirmwareRequest {
            location,
            retries,
            retrieve_date,
            retry_interval,
        };
        self.call(charger_id, request, timeout).await
    }

    pub async fn get_composite_schedule(
        &self,
        charger_id: &str,
        connector_id: i32,
        duration: i32,
        charging_rate_unit: Option<ChargingRateUnitType>,
        timeout: Option<Duration>,
    ) -> OcppResult<GetCompositeScheduleResponse> {
        let request = GetCompositeScheduleRequest {
            connector_id,
            duration,
            charging_rate_unit,
        };
        self.call(charger_id, request, timeout).await
    }

    pub async fn set_charging_profile(
        &self,
        charger_id: &str,
        connector_id: i32,
        profile: ChargingProfile,
        timeout: Option<Duration>,
    ) -> OcppResult<SetChargingProfileResponse> {
        let request = SetChargingProfileRequest {
            connector_id,
            cs_charging_profiles: profile,
        };
        self.call(charger_id, request, timeout).await
    }

    /// Every filter left `None` widens the set of profiles cleared
    pub async fn clear_charging_profile(
        &self,
        charger_id: &str,
        id: Option<i32>,
        connector_id: Option<i32>,
        purpose: Option<ChargingProfilePurposeType>,
        stack_level: Option<i32>,
        timeout: Option<Duration>,
    ) -> OcppResult<ClearChargingProfileResponse> {
        let request = ClearChargingProfileRequest {
            id,
            connector_id,
            charging_profile_purpose: purpose,
            stack_level,
        };
        self.call(charger_id, request, timeout).await
    }

    /// Force a charge point off
    pub async fn disconnect(&self, charger_id: &str) -> OcppResult<()> {
        self.registry.disconnect(charger_id).await
    }
}
