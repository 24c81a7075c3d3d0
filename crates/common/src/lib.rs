// ================
// common/src/lib.rs
// ================
//! Common types shared between the gateway, its internal services and clients.
//!
//! Three families of messages live here:
//! - the external JSON bodies of the `/auth/api/v1/*` endpoints,
//! - the event payloads published on the message broker,
//! - the typed request/response messages of the internal user and room services.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Name of the cookie carrying the refresh token
pub const REFRESH_COOKIE_NAME: &str = "refresh_token";

/// Default queue for "user registered" announcements
pub const USER_REGISTERED_QUEUE: &str = "user_registered";

// ---------------------------------------------------------------------------
// External auth bodies
// ---------------------------------------------------------------------------

/// Body of `POST /auth/api/v1/register`
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct RegisterRequest {
    /// Login identifier (email or username)
    #[serde(default)]
    pub email: String,
    /// Plain password
    #[serde(default)]
    pub password: String,
    /// Optional display name, forwarded on the event bus
    #[serde(default)]
    pub username: Option<String>,
}

/// Response of a successful registration
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct RegisterResponse {
    #[serde(rename = "userId")]
    pub user_id: Uuid,
}

/// Body of `POST /auth/api/v1/login`
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Body of `POST /auth/api/v1/validate-token`
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ValidateTokenRequest {
    #[serde(rename = "accessToken", default)]
    pub access_token: String,
}

/// Response of `POST /auth/api/v1/validate-token`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ValidateTokenResponse {
    #[serde(rename = "userId")]
    pub user_id: Uuid,
}

/// Body of `POST /auth/api/v1/update-password`
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct UpdatePasswordRequest {
    #[serde(default)]
    pub old_password: String,
    #[serde(default)]
    pub new_password: String,
}

/// Error envelope returned by every failing endpoint
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Machine readable code plus a human readable message
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Announcement published after a credential record has been committed
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct UserRegistered {
    #[serde(rename = "userId")]
    pub user_id: Uuid,
    #[serde(rename = "userName", default, skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
}

// ---------------------------------------------------------------------------
// Internal user service
// ---------------------------------------------------------------------------

/// Fetch the profile of a user
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct GetUserRequest {
    #[serde(default)]
    pub user_id: Uuid,
}

/// Public profile of a user
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
}

/// Fetch the client parameters of a user
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct GetClientParamsRequest {
    #[serde(default)]
    pub user_uuid: Uuid,
}

/// Partial update of the client parameters; absent fields stay untouched
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct SetClientParamsRequest {
    #[serde(default)]
    pub user_uuid: Uuid,
    #[serde(default)]
    pub lang_code: Option<String>,
    #[serde(default)]
    pub sound_volume: Option<i32>,
    #[serde(default)]
    pub is_game_sound_enabled: Option<bool>,
}

/// Per-user client preferences
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ClientParams {
    pub user_uuid: Uuid,
    pub lang_code: String,
    pub sound_volume: i16,
    pub is_game_sound_enabled: bool,
}

// ---------------------------------------------------------------------------
// Internal room service
// ---------------------------------------------------------------------------

/// Create a room owned by `user_uuid`
#[derive(Serialize, Deserialize, Clone, Default)]
pub struct CreateRoomRequest {
    #[serde(default)]
    pub user_uuid: Uuid,
    #[serde(default)]
    pub name: String,
    /// Optional join password, hashed before storage
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub max_players: i32,
    #[serde(default)]
    pub is_public: Option<bool>,
}

impl std::fmt::Debug for CreateRoomRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CreateRoomRequest")
            .field("user_uuid", &self.user_uuid)
            .field("name", &self.name)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("max_players", &self.max_players)
            .field("is_public", &self.is_public)
            .finish()
    }
}

/// Fetch a single room
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct GetRoomRequest {
    pub id: Uuid,
}

/// Paged search over public rooms
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct SearchRoomsRequest {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub page: i32,
    #[serde(default)]
    pub size: i32,
}

/// Delete a room; only the owner may do so
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct DeleteRoomRequest {
    #[serde(default)]
    pub user_uuid: Uuid,
    pub id: Uuid,
}

/// Room as seen by clients; the password hash never leaves the room service
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct RoomResponse {
    pub id: Uuid,
    pub name: String,
    pub owner_id: Uuid,
    pub owner_name: String,
    pub max_players: i32,
    pub is_public: bool,
    pub has_password: bool,
    pub created_at: DateTime<Utc>,
}

/// One page of search results
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SearchRoomsResponse {
    pub rooms: Vec<RoomResponse>,
    pub total: i64,
}

/// Acknowledgement of a deletion
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct RoomDeleted {
    pub id: Uuid,
}
