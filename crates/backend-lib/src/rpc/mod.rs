// ============================
// backend-lib/src/rpc/mod.rs
// ============================
//! Typed interfaces of the internal services reached through the gateway.
use async_trait::async_trait;
use thiserror::Error;

use authgate_common::{
    ClientParams, CreateRoomRequest, DeleteRoomRequest, GetClientParamsRequest, GetRoomRequest,
    GetUserRequest, RoomDeleted, RoomResponse, SearchRoomsRequest, SearchRoomsResponse,
    SetClientParamsRequest, UserResponse,
};

/// Status reported by an internal service
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RpcError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("service unavailable: {0}")]
    Unavailable(String),

    #[error("internal service error: {0}")]
    Internal(String),
}

/// User service
#[async_trait]
pub trait UserRpc: Send + Sync {
    async fn get_user(&self, req: GetUserRequest) -> Result<UserResponse, RpcError>;

    async fn get_client_params(&self, req: GetClientParamsRequest) -> Result<ClientParams, RpcError>;

    /// Partial update; absent fields keep their value
    async fn set_client_params(&self, req: SetClientParamsRequest) -> Result<ClientParams, RpcError>;
}

/// Room service
#[async_trait]
pub trait RoomRpc: Send + Sync {
    async fn create_room(&self, req: CreateRoomRequest) -> Result<RoomResponse, RpcError>;

    async fn get_room(&self, req: GetRoomRequest) -> Result<RoomResponse, RpcError>;

    async fn search_rooms(&self, req: SearchRoomsRequest) -> Result<SearchRoomsResponse, RpcError>;

    /// Only the owner may delete
    async fn delete_room(&self, req: DeleteRoomRequest) -> Result<RoomDeleted, RpcError>;
}
