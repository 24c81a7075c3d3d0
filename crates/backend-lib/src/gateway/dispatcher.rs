// ============================
// backend-lib/src/gateway/dispatcher.rs
// ============================
//! Route match, decode, identity injection, internal call, encode.
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::http::Method;
use metrics::counter;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use authgate_common::{
    CreateRoomRequest, DeleteRoomRequest, GetClientParamsRequest, GetRoomRequest, GetUserRequest,
    SearchRoomsRequest, SetClientParamsRequest,
};

use crate::error::{bounded, AppError};
use crate::gateway::route_table::{Operation, RouteTable};
use crate::metrics::{GATEWAY_DISPATCHED, GATEWAY_UNMATCHED};
use crate::middleware::auth::Identity;
use crate::rpc::{RoomRpc, RpcError, UserRpc};

/// Everything the dispatcher needs to know about the inbound request
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub identity: Identity,
    pub method: Method,
    pub path: String,
}

/// Internal request types carrying the caller's id.
///
/// The dispatcher always overwrites these fields with the verified identity,
/// whatever the body said.
pub trait CallerScoped {
    fn bind_caller(&mut self, _caller: Uuid) {}
}

impl CallerScoped for GetUserRequest {
    fn bind_caller(&mut self, caller: Uuid) {
        self.user_id = caller;
    }
}

impl CallerScoped for GetClientParamsRequest {
    fn bind_caller(&mut self, caller: Uuid) {
        self.user_uuid = caller;
    }
}

impl CallerScoped for SetClientParamsRequest {
    fn bind_caller(&mut self, caller: Uuid) {
        self.user_uuid = caller;
    }
}

impl CallerScoped for CreateRoomRequest {
    fn bind_caller(&mut self, caller: Uuid) {
        self.user_uuid = caller;
    }
}

impl CallerScoped for DeleteRoomRequest {
    fn bind_caller(&mut self, caller: Uuid) {
        self.user_uuid = caller;
    }
}

impl CallerScoped for GetRoomRequest {}

impl CallerScoped for SearchRoomsRequest {}

/// Translates external requests into internal service calls
pub struct Dispatcher {
    table: RouteTable,
    users: Arc<dyn UserRpc>,
    rooms: Arc<dyn RoomRpc>,
    rpc_timeout: Duration,
}

impl Dispatcher {
    pub fn new(table: RouteTable, users: Arc<dyn UserRpc>, rooms: Arc<dyn RoomRpc>, rpc_timeout: Duration) -> Self {
        Self {
            table,
            users,
            rooms,
            rpc_timeout,
        }
    }

    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    /// Run the request described by `ctx` with raw JSON `body`
    pub async fn dispatch(&self, ctx: &RequestContext, body: &[u8]) -> Result<Value, AppError> {
        let matched = self.table.resolve(&ctx.path, &ctx.method).inspect_err(|err| {
            counter!(GATEWAY_UNMATCHED).increment(1);
            tracing::debug!(method = %ctx.method, path = %ctx.path, error = %err, "no route");
        })?;
        let input = decode_input(body, matched.params)?;

        tracing::debug!(operation = ?matched.operation, caller = %ctx.identity.subject, "dispatching");
        counter!(GATEWAY_DISPATCHED, "operation" => format!("{:?}", matched.operation)).increment(1);

        let caller = ctx.identity.subject;
        match matched.operation {
            Operation::GetUser => self.call(caller, input, |req| self.users.get_user(req)).await,
            Operation::GetClientParams => {
                self.call(caller, input, |req| self.users.get_client_params(req)).await
            },
            Operation::SetClientParams => {
                self.call(caller, input, |req| self.users.set_client_params(req)).await
            },
            Operation::CreateRoom => self.call(caller, input, |req| self.rooms.create_room(req)).await,
            Operation::SearchRooms => self.call(caller, input, |req| self.rooms.search_rooms(req)).await,
            Operation::GetRoom => self.call(caller, input, |req| self.rooms.get_room(req)).await,
            Operation::DeleteRoom => self.call(caller, input, |req| self.rooms.delete_room(req)).await,
        }
    }

    async fn call<Req, Resp, F, Fut>(&self, caller: Uuid, input: Value, rpc: F) -> Result<Value, AppError>
    where
        Req: DeserializeOwned + CallerScoped,
        Resp: Serialize,
        F: FnOnce(Req) -> Fut,
        Fut: Future<Output = Result<Resp, RpcError>>,
    {
        let mut request: Req = serde_json::from_value(input).map_err(|e| AppError::Decode(e.to_string()))?;
        request.bind_caller(caller);

        let response = bounded(self.rpc_timeout, "internal service", rpc(request)).await?;
        Ok(serde_json::to_value(response)?)
    }
}

/// Parse the body as a JSON object (empty means `{}`) and merge path parameters into it
fn decode_input(body: &[u8], params: Map<String, Value>) -> Result<Value, AppError> {
    let mut object = if body.iter().all(u8::is_ascii_whitespace) {
        Map::new()
    } else {
        match serde_json::from_slice::<Value>(body) {
            Ok(Value::Object(object)) => object,
            Ok(_) => return Err(AppError::Decode("request body must be a JSON object".to_string())),
            Err(err) => return Err(AppError::Decode(err.to_string())),
        }
    };

    object.extend(params);
    Ok(Value::Object(object))
}
