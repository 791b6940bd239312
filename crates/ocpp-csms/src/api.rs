//! HTTP control plane
//!
//! JSON `POST` routes, one per remote operation, each naming its target with
//! `chargerId`. Successful calls answer `{"status": ..}` together with any
//! other fields of the charge point's response; failures answer
//! `{"status": "failed", "reason": ..}`.

use crate::facade::CentralSystem;
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use ocpp_types::common::AvailabilityType;
use ocpp_types::v16j::{
    ChargingProfile, ChargingProfilePurposeType, ChargingRateUnitType, MessageTrigger, ResetType,
};
use ocpp_types::OcppError;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

/// Control plane state
#[derive(Clone)]
pub struct ApiState {
    pub csms: CentralSystem,
    pub api_key: Option<Arc<str>>,
    pub started_at: DateTime<Utc>,
}

impl ApiState {
    pub fn new(csms: CentralSystem, api_key: Option<String>) -> Self {
        Self {
            csms,
            api_key: api_key.map(Arc::from),
            started_at: Utc::now(),
        }
    }

    fn authorize(&self, headers: &HeaderMap, target: &Target) -> Result<(), ApiError> {
        let Some(expected) = self.api_key.as_deref() else {
            return Ok(());
        };
        let offered = target.apikey.as_deref().or_else(|| {
            headers
                .get("x-api-key")
                .and_then(|value| value.to_str().ok())
        });
        match offered {
            Some(key) if key == expected => Ok(()),
            _ => {
                warn!("Rejected request for {}: API key is not valid", target.charger_id);
                Err(ApiError::Unauthorized)
            }
        }
    }
}

/// Build the control plane router
pub fn create_app(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/chargers", get(list_chargers))
        .route("/remotestart", post(remote_start))
        .route("/remotestop", post(remote_stop))
        .route("/changeconfig", post(change_config))
        .route("/getconfig", post(get_config))
        .route("/changeavailability", post(change_availability))
        .route("/triggermsg", post(trigger_message))
        .route("/tiggermsg", post(trigger_message))
        .route("/unlockconnector", post(unlock_connector))
        .route("/reset", post(reset))
        .route("/reservenow", post(reserve_now))
        .route("/cancelreservation", post(cancel_reservation))
        .route("/setdatatransfer", post(set_data_transfer))
        .route("/getdatatransfer", post(get_data_transfer))
        .route("/updatefirmware", post(update_firmware))
        .route("/getcompositeschedule", post(get_composite_schedule))
        .route("/setchargingprofile", post(set_charging_profile))
        .route("/clearchargingprofile", post(clear_charging_profile))
        .route("/disconnect", post(disconnect))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Fields every operation body carries
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Target {
    pub charger_id: String,
    #[serde(default)]
    pub apikey: Option<String>,
    /// Call timeout in seconds
    #[serde(default)]
    pub timeout: Option<u64>,
}

impl Target {
    fn timeout(&self) -> Option<Duration> {
        self.timeout.map(Duration::from_secs)
    }
}

#[derive(Debug)]
pub enum ApiError {
    Unauthorized,
    Ocpp(OcppError),
}

impl From<OcppError> for ApiError {
    fn from(err: OcppError) -> Self {
        ApiError::Ocpp(err)
    }
}

/// HTTP status for a failed operation
pub fn status_for(err: &OcppError) -> StatusCode {
    match err {
        OcppError::NotConnected { .. } => StatusCode::NOT_FOUND,
        OcppError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        OcppError::ConnectionClosed { .. } | OcppError::RemoteError { .. } => {
            StatusCode::BAD_GATEWAY
        }
        OcppError::InvalidPayload { .. } => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, reason) = match self {
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "API key is not valid".to_string()),
            ApiError::Ocpp(err) => {
                let status = status_for(&err);
                if status == StatusCode::INTERNAL_SERVER_ERROR {
                    error!("Operation failed: {}", err);
                } else {
                    warn!("Operation failed: {}", err);
                }
                (status, err.to_string())
            }
        };
        (status, Json(json!({"status": "failed", "reason": reason}))).into_response()
    }
}

type ApiResult = Result<Json<Value>, ApiError>;

/// Charge point response as a reply body; responses without a status of
/// their own are reported as accepted
fn reply<T: Serialize>(response: T) -> ApiResult {
    let mut body = serde_json::to_value(response).map_err(OcppError::from)?;
    if let Value::Object(fields) = &mut body {
        fields
            .entry("status")
            .or_insert_with(|| Value::String("Accepted".to_string()));
    }
    Ok(Json(body))
}

async fn health(State(state): State<ApiState>) -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "connections": state.csms.registry().len(),
        "startedAt": state.started_at.to_rfc3339(),
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

async fn list_chargers(State(state): State<ApiState>) -> impl IntoResponse {
    let chargers = state.csms.registry().snapshot();
    Json(json!({
        "total": chargers.len(),
        "chargers": chargers,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteStartBody {
    #[serde(flatten)]
    pub target: Target,
    #[serde(alias = "tag_id")]
    pub id_tag: String,
    #[serde(default)]
    pub connector_id: Option<i32>,
    #[serde(default)]
    pub charging_profile: Option<ChargingProfile>,
}

async fn remote_start(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Json(body): Json<RemoteStartBody>,
) -> ApiResult {
    state.authorize(&headers, &body.target)?;
    let response = state
        .csms
        .remote_start_transaction(
            &body.target.charger_id,
            body.id_tag,
            body.connector_id,
            body.charging_profile,
            body.target.timeout(),
        )
        .await?;
    reply(response)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteStopBody {
    #[serde(flatten)]
    pub target: Target,
    #[serde(alias = "transaction_id")]
    pub transaction_id: i32,
}

async fn remote_stop(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Json(body): Json<RemoteStopBody>,
) -> ApiResult {
    state.authorize(&headers, &body.target)?;
    let response = state
        .csms
        .remote_stop_transaction(&body.target.charger_id, body.transaction_id, body.target.timeout())
        .await?;
    reply(response)
}

#[derive(Debug, Deserialize)]
pub struct ChangeConfigBody {
    #[serde(flatten)]
    pub target: Target,
    pub key: String,
    pub value: String,
}

async fn change_config(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Json(body): Json<ChangeConfigBody>,
) -> ApiResult {
    state.authorize(&headers, &body.target)?;
    let response = state
        .csms
        .change_configuration(&body.target.charger_id, body.key, body.value, body.target.timeout())
        .await?;
    reply(response)
}

#[derive(Debug, Deserialize)]
pub struct GetConfigBody {
    #[serde(flatten)]
    pub target: Target,
    #[serde(default)]
    pub key: Option<Vec<String>>,
}

async fn get_config(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Json(body): Json<GetConfigBody>,
) -> ApiResult {
    state.authorize(&headers, &body.target)?;
    let response = state
        .csms
        .get_configuration(&body.target.charger_id, body.key, body.target.timeout())
        .await?;
    reply(response)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeAvailabilityBody {
    #[serde(flatten)]
    pub target: Target,
    pub connector_id: i32,
    #[serde(rename = "type", alias = "change_type")]
    pub kind: AvailabilityType,
}

async fn change_availability(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Json(body): Json<ChangeAvailabilityBody>,
) -> ApiResult {
    state.authorize(&headers, &body.target)?;
    let response = state
        .csms
        .change_availability(
            &body.target.charger_id,
            body.connector_id,
            body.kind,
            body.target.timeout(),
        )
        .await?;
    reply(response)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerMessageBody {
    #[serde(flatten)]
    pub target: Target,
    #[serde(alias = "requested_message")]
    pub requested_message: MessageTrigger,
    #[serde(default)]
    pub connector_id: Option<i32>,
}

async fn trigger_message(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Json(body): Json<TriggerMessageBody>,
) -> ApiResult {
    state.authorize(&headers, &body.target)?;
    let response = state
        .csms
        .trigger_message(
            &body.target.charger_id,
            body.requested_message,
            body.connector_id,
            body.target.timeout(),
        )
        .await?;
    reply(response)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnlockConnectorBody {
    #[serde(flatten)]
    pub target: Target,
    pub connector_id: i32,
}

async fn unlock_connector(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Json(body): Json<UnlockConnectorBody>,
) -> ApiResult {
    state.authorize(&headers, &body.target)?;
    let response = state
        .csms
        .unlock_connector(&body.target.charger_id, body.connector_id, body.target.timeout())
        .await?;
    reply(response)
}

#[derive(Debug, Deserialize)]
pub struct ResetBody {
    #[serde(flatten)]
    pub target: Target,
    #[serde(rename = "type", alias = "reset_type")]
    pub kind: ResetType,
}

async fn reset(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Json(body): Json<ResetBody>,
) -> ApiResult {
    state.authorize(&headers, &body.target)?;
    let response = state
        .csms
        .reset(&body.target.charger_id, body.kind, body.target.timeout())
        .await?;
    reply(response)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReserveNowBody {
    #[serde(flatten)]
    pub target: Target,
    pub connector_id: i32,
    pub expiry_date: DateTime<Utc>,
    pub id_tag: String,
    #[serde(default)]
    pub parent_id_tag: Option<String>,
    pub reservation_id: i32,
}

async fn reserve_now(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Json(body): Json<ReserveNowBody>,
) -> ApiResult {
    state.authorize(&headers, &body.target)?;
    let response = state
        .csms
        .reserve_now(
            &body.target.charger_id,
            body.connector_id,
            body.expiry_date,
            body.id_tag,
            body.parent_id_tag,
            body.reservation_id,
            body.target.timeout(),
        )
        .await?;
    reply(response)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelReservationBody {
    #[serde(flatten)]
    pub target: Target,
    pub reservation_id: i32,
}

async fn cancel_reservation(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Json(body): Json<CancelReservationBody>,
) -> ApiResult {
    state.authorize(&headers, &body.target)?;
    let response = state
        .csms
        .cancel_reservation(&body.target.charger_id, body.reservation_id, body.target.timeout())
        .await?;
    reply(response)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataTransferBody {
    #[serde(flatten)]
    pub target: Target,
    pub vendor_id: String,
    #[serde(default)]
    pub message_id: Option<String>,
    #[serde(default)]
    pub data: Option<String>,
}

async fn set_data_transfer(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Json(body): Json<DataTransferBody>,
) -> ApiResult {
    state.authorize(&headers, &body.target)?;
    let data = body.data.ok_or_else(|| OcppError::InvalidPayload {
        action: "DataTransfer".to_string(),
        message: "data is required".to_string(),
    })?;
    let response = state
        .csms
        .set_data_transfer(
            &body.target.charger_id,
            body.vendor_id,
            body.message_id,
            data,
            body.target.timeout(),
        )
        .await?;
    reply(response)
}

async fn get_data_transfer(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Json(body): Json<DataTransferBody>,
) -> ApiResult {
    state.authorize(&headers, &body.target)?;
    let response = state
        .csms
        .get_data_transfer(
            &body.target.charger_id,
            body.vendor_id,
            body.message_id,
            body.target.timeout(),
        )
        .await?;
    reply(response)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateFirmwareBody {
    #[serde(flatten)]
    pub target: Target,
    pub location: String,
    pub retrieve_date: DateTime<Utc>,
    #[serde(default)]
    pub retries: Option<i32>,
    #[serde(default)]
    pub retry_interval: Option<i32>,
}

async fn update_firmware(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Json(body): Json<UpdateFirmwareBody>,
) -> ApiResult {
    state.authorize(&headers, &body.target)?;
    let response = state
        .csms
        .update_firmware(
            &body.target.charger_id,
            body.location,
            body.retrieve_date,
            body.retries,
            body.retry_interval,
            body.target.timeout(),
        )
        .await?;
    reply(response)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetCompositeScheduleBody {
    #[serde(flatten)]
    pub target: Target,
    pub connector_id: i32,
    pub duration: i32,
    #[serde(default)]
    pub charging_rate_unit: Option<ChargingRateUnitType>,
}

async fn get_composite_schedule(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Json(body): Json<GetCompositeScheduleBody>,
) -> ApiResult {
    state.authorize(&headers, &body.target)?;
    let response = state
        .csms
        .get_composite_schedule(
            &body.target.charger_id,
            body.connector_id,
            body.duration,
            body.charging_rate_unit,
            body.target.timeout(),
        )
        .await?;
    reply(response)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetChargingProfileBody {
    #[serde(flatten)]
    pub target: Target,
    pub connector_id: i32,
    pub cs_charging_profiles: ChargingProfile,
}

async fn set_charging_profile(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Json(body): Json<SetChargingProfileBody>,
) -> ApiResult {
    state.authorize(&headers, &body.target)?;
    let response = state
        .csms
        .set_charging_profile(
            &body.target.charger_id,
            body.connector_id,
            body.cs_charging_profiles,
            body.target.timeout(),
        )
        .await?;
    reply(response)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearChargingProfileBody {
    #[serde(flatten)]
    pub target: Target,
    #[serde(default)]
    pub id: Option<i32>,
    #[serde(default)]
    pub connector_id: Option<i32>,
    #[serde(default)]
    pub charging_profile_purpose: Option<ChargingProfilePurposeType>,
    #[serde(default)]
    pub stack_level: Option<i32>,
}

async fn clear_charging_profile(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Json(body): Json<ClearChargingProfileBody>,
) -> ApiResult {
    state.authorize(&headers, &body.target)?;
    let response = state
        .csms
        .clear_charging_profile(
            &body.target.charger_id,
            body.id,
            body.connector_id,
            body.charging_profile_purpose,
            body.stack_level,
            body.target.timeout(),
        )
        .await?;
    reply(response)
}

async fn disconnect(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Json(target): Json<Target>,
) -> ApiResult {
    state.authorize(&headers, &target)?;
    state.csms.disconnect(&target.charger_id).await?;
    Ok(Json(json!({"status": "Disconnected"})))
}
