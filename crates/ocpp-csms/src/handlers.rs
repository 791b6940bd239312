//! Handlers for charge point initiated actions

use crate::config::Config;
use crate::router::{ActionRouter, CallContext};
use chrono::Utc;
use ocpp_messages::v16j::*;
use ocpp_types::common::{AuthorizationStatus, IdTagInfo};
use ocpp_types::v16j::{DataTransferStatus, RegistrationStatus};
use ocpp_types::{OcppError, OcppResult};
use std::collections::HashSet;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Id tag authorization decision
#[derive(Debug, Clone, Default)]
pub struct Authorizer {
    blocked_id_tags: HashSet<String>,
}

impl Authorizer {
    pub fn new(blocked_id_tags: impl IntoIterator<Item = String>) -> Self {
        Self {
            blocked_id_tags: blocked_id_tags.into_iter().collect(),
        }
    }

    /// `Accepted` unless the tag is blocked
    pub fn authorize(&self, id_tag: &str) -> IdTagInfo {
        if self.blocked_id_tags.contains(id_tag) {
            warn!("Id tag {} is blocked", id_tag);
            IdTagInfo::with_status(AuthorizationStatus::Blocked)
        } else {
            IdTagInfo::with_status(AuthorizationStatus::Accepted)
        }
    }
}

/// Core profile handlers shared by every session
pub struct CoreHandlers {
    authorizer: Authorizer,
    heartbeat_interval: i32,
    next_transaction_id: AtomicI32,
}

impl CoreHandlers {
    pub fn new(authorizer: Authorizer, heartbeat_interval: i32) -> Self {
        Self {
            authorizer,
            heartbeat_interval,
            next_transaction_id: AtomicI32::new(1),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            Authorizer::new(config.auth.blocked_id_tags.iter().cloned()),
            config.ocpp.heartbeat_interval,
        )
    }

    /// Router with every built-in action registered
    pub fn into_router(self: Arc<Self>) -> ActionRouter {
        let mut router = ActionRouter::new();

        let h = self.clone();
        router.on::<AuthorizeRequest, _>(move |ctx, req| h.authorize(ctx, req));
        let h = self.clone();
        router.on::<BootNotificationRequest, _>(move |ctx, req| h.boot_notification(ctx, req));
        let h = self.clone();
        router.on::<HeartbeatRequest, _>(move |ctx, req| h.heartbeat(ctx, req));
        let h = self.clone();
        router.on::<MeterValuesRequest, _>(move |ctx, req| h.meter_values(ctx, req));
        let h = self.clone();
        router.on::<StartTransactionRequest, _>(move |ctx, req| h.start_transaction(ctx, req));
        let h = self.clone();
        router.on::<StatusNotificationRequest, _>(move |ctx, req| h.status_notification(ctx, req));
        let h = self.clone();
        router.on::<StopTransactionRequest, _>(move |ctx, req| h.stop_transaction(ctx, req));
        let h = self.clone();
        router.on::<FirmwareStatusNotificationRequest, _>(move |ctx, req| {
            h.firmware_status_notification(ctx, req)
        });
        let h = self;
        router.on::<DataTransferRequest, _>(move |ctx, req| h.data_transfer(ctx, req));

        router
    }

    /// Handle Authorize request
    pub fn authorize(&self, ctx: &CallContext, req: AuthorizeRequest) -> OcppResult<AuthorizeResponse> {
        info!("{}: authorizing id tag {}", ctx.charger_id(), req.id_tag);
        Ok(AuthorizeResponse {
            id_tag_info: self.authorizer.authorize(&req.id_tag),
        })
    }

    /// Handle BootNotification request
    pub fn boot_notification(
        &self,
        ctx: &CallContext,
        req: BootNotificationRequest,
    ) -> OcppResult<BootNotificationResponse> {
        info!(
            "{}: boot notification from {}/{} (firmware {:?})",
            ctx.charger_id(),
            req.charge_point_vendor,
            req.charge_point_model,
            req.firmware_version
        );

        let now = Utc::now();
        ctx.update_info(|info| {
            info.vendor = Some(req.charge_point_vendor);
            info.model = Some(req.charge_point_model);
            info.serial_number = req.charge_point_serial_number;
            info.firmware_version = req.firmware_version;
            info.booted_at = Some(now);
        });

        Ok(BootNotificationResponse {
            current_time: now,
            interval: self.heartbeat_interval,
            status: RegistrationStatus::Accepted,
        })
    }

    /// Handle Heartbeat request
    pub fn heartbeat(&self, ctx: &CallContext, _req: HeartbeatRequest) -> OcppResult<HeartbeatResponse> {
        debug!("{}: heartbeat", ctx.charger_id());
        ctx.update_info(|info| info.update_heartbeat());
        Ok(HeartbeatResponse {
            current_time: Utc::now(),
        })
    }

    /// Handle MeterValues request
    pub fn meter_values(&self, ctx: &CallContext, req: MeterValuesRequest) -> OcppResult<MeterValuesResponse> {
        debug!(
            "{}: {} meter values for connector {} (tx: {:?})",
            ctx.charger_id(),
            req.meter_value.len(),
            req.connector_id,
            req.transaction_id
        );
        Ok(MeterValuesResponse {})
    }

    /// Handle StartTransaction request
    pub fn start_transaction(
        &self,
        ctx: &CallContext,
        req: StartTransactionRequest,
    ) -> OcppResult<StartTransactionResponse> {
        // Fails once the id space is used up instead of wrapping
        let transaction_id = self
            .next_transaction_id
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |id| id.checked_add(1))
            .map_err(|_| OcppError::Internal {
                message: "transaction ids exhausted".to_string(),
            })?;
        info!(
            "{}: transaction {} started on connector {} with id tag {} (meter {})",
            ctx.charger_id(),
            transaction_id,
            req.connector_id,
            req.id_tag,
            req.meter_start
        );

        Ok(StartTransactionResponse {
            id_tag_info: self.authorizer.authorize(&req.id_tag),
            transaction_id,
        })
    }

    /// Handle StatusNotification request
    pub fn status_notification(
        &self,
        ctx: &CallContext,
        req: StatusNotificationRequest,
    ) -> OcppResult<StatusNotificationResponse> {
        info!(
            "{}: connector {} is {:?} ({:?})",
            ctx.charger_id(),
            req.connector_id,
            req.status,
            req.error_code
        );
        Ok(StatusNotificationResponse {})
    }

    /// Handle StopTransaction request
    pub fn stop_transaction(
        &self,
        ctx: &CallContext,
        req: StopTransactionRequest,
    ) -> OcppResult<StopTransactionResponse> {
        info!(
            "{}: transaction {} stopped (meter {}, reason {:?})",
            ctx.charger_id(),
            req.transaction_id,
            req.meter_stop,
            req.reason
        );
        Ok(StopTransactionResponse {
            id_tag_info: req.id_tag.as_deref().map(|tag| self.authorizer.authorize(tag)),
        })
    }

    /// Handle FirmwareStatusNotification request
    pub fn firmware_status_notification(
        &self,
        ctx: &CallContext,
        req: FirmwareStatusNotificationRequest,
    ) -> OcppResult<FirmwareStatusNotificationResponse> {
        info!("{}: firmware status {:?}", ctx.charger_id(), req.status);
        Ok(FirmwareStatusNotificationResponse {})
    }

    /// Handle DataTransfer request
    pub fn data_transfer(&self, ctx: &CallContext, req: DataTransferRequest) -> OcppResult<DataTransferResponse> {
        info!(
            "{}: data transfer from vendor {} (message {:?})",
            ctx.charger_id(),
            req.vendor_id,
            req.message_id
        );
        Ok(DataTransferResponse {
            status: DataTransferStatus::Accepted,
            data: None,
        })
    }
}
