//! Inbound action routing
//!
//! An explicit table from action name to handler, built once at startup and
//! shared by every session. Whatever a handler does, dispatch always produces
//! a reply frame: unknown actions become `NotImplemented`, handler errors and
//! panics become a CallError with the mapped code.

use crate::session::ChargerInfo;
use futures_util::FutureExt;
use ocpp_messages::{utils, OcppAction};
use ocpp_types::{CallErrorMessage, CallMessage, CallResultMessage, Message, OcppError, OcppResult};
use serde_json::Value;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, error, warn};

/// What a handler knows about the charge point that sent the request
#[derive(Debug, Clone)]
pub struct CallContext {
    charger_id: String,
    info: Arc<RwLock<ChargerInfo>>,
}

impl CallContext {
    pub fn new(charger_id: impl Into<String>) -> Self {
        Self {
            charger_id: charger_id.into(),
            info: Arc::new(RwLock::new(ChargerInfo::default())),
        }
    }

    pub fn charger_id(&self) -> &str {
        &self.charger_id
    }

    /// Snapshot of what the charge point reported about itself
    pub fn info(&self) -> ChargerInfo {
        self.info
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn update_info(&self, f: impl FnOnce(&mut ChargerInfo)) {
        f(&mut self.info.write().unwrap_or_else(PoisonError::into_inner));
    }
}

/// Handles one inbound action
#[async_trait::async_trait]
pub trait ActionHandler: Send + Sync {
    async fn handle(&self, ctx: &CallContext, payload: Value) -> OcppResult<Value>;
}

/// Adapts a typed function to [`ActionHandler`]: the payload is parsed and
/// validated as `A` and the typed response serialized back
pub struct TypedHandler<A, F> {
    f: F,
    _action: PhantomData<fn() -> A>,
}

impl<A, F> TypedHandler<A, F> {
    pub fn new(f: F) -> Self {
        Self {
            f,
            _action: PhantomData,
        }
    }
}

#[async_trait::async_trait]
impl<A, F> ActionHandler for TypedHandler<A, F>
where
    A: OcppAction,
    F: Fn(&CallContext, A) -> OcppResult<A::Response> + Send + Sync,
{
    async fn handle(&self, ctx: &CallContext, payload: Value) -> OcppResult<Value> {
        let request = utils::parse_request::<A>(payload)?;
        let response = (self.f)(ctx, request)?;
        Ok(serde_json::to_value(response)?)
    }
}

/// Action name to handler table
#[derive(Default, Clone)]
pub struct ActionRouter {
    handlers: HashMap<String, Arc<dyn ActionHandler>>,
}

impl ActionRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler, replacing any previous one for the action
    pub fn register(&mut self, action: impl Into<String>, handler: Arc<dyn ActionHandler>) {
        let action = action.into();
        if self.handlers.insert(action.clone(), handler).is_some() {
            warn!("Handler for {} replaced", action);
        }
    }

    /// Register a typed function for `A::ACTION_NAME`
    pub fn on<A, F>(&mut self, f: F)
    where
        A: OcppAction,
        F: Fn(&CallContext, A) -> OcppResult<A::Response> + Send + Sync + 'static,
    {
        self.register(A::ACTION_NAME, Arc::new(TypedHandler::<A, F>::new(f)));
    }

    pub fn handles(&self, action: &str) -> bool {
        self.handlers.contains_key(action)
    }

    pub fn actions(&self) -> Vec<String> {
        let mut actions: Vec<String> = self.handlers.keys().cloned().collect();
        actions.sort();
        actions
    }

    /// Run the handler for an inbound Call and build the reply frame
    pub async fn dispatch(&self, call: CallMessage, ctx: &CallContext) -> Message {
        let CallMessage {
            unique_id,
            action,
            payload,
        } = call;

        let result = match self.handlers.get(&action) {
            Some(handler) => {
                debug!("{} -> {} ({})", ctx.charger_id(), action, unique_id);
                match AssertUnwindSafe(handler.handle(ctx, payload))
                    .catch_unwind()
                    .await
                {
                    Ok(result) => result,
                    Err(_) => {
                        error!("Handler for {} panicked on {}", action, ctx.charger_id());
                        Err(OcppError::Internal {
                            message: format!("{} handler failed", action),
                        })
                    }
                }
            }
            None => Err(OcppError::NotImplemented {
                action: action.clone(),
            }),
        };

        match result.and_then(|payload| CallResultMessage::new(unique_id.clone(), payload)) {
            Ok(reply) => Message::CallResult(reply),
            Err(err) => {
                warn!("{} from {} failed: {}", action, ctx.charger_id(), err);
                let (code, description) = err.to_call_error();
                Message::CallError(CallErrorMessage::new(unique_id, code, description, None))
            }
        }
    }
}
