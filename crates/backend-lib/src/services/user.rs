// ============================
// backend-lib/src/services/user.rs
// ============================
//! User profiles and per-user client parameters.
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::{mapref::entry::Entry, DashMap};
use uuid::Uuid;

use authgate_common::{
    ClientParams, GetClientParamsRequest, GetUserRequest, SetClientParamsRequest, UserRegistered,
    UserResponse,
};

use crate::events::{Delivery, DeliveryHandler};
use crate::rpc::{RpcError, UserRpc};
use crate::validation::{validate_lang_code, validate_sound_volume};

pub const DEFAULT_LANG_CODE: &str = "en";
pub const DEFAULT_SOUND_VOLUME: i16 = 50;

/// Fallback display name derived from the user id
pub fn default_username(id: Uuid) -> String {
    let simple = id.simple().to_string();
    format!("player-{}", &simple[..8])
}

fn default_params(user_uuid: Uuid) -> ClientParams {
    ClientParams {
        user_uuid,
        lang_code: DEFAULT_LANG_CODE.to_string(),
        sound_volume: DEFAULT_SOUND_VOLUME,
        is_game_sound_enabled: true,
    }
}

/// In-memory user directory
#[derive(Clone, Default)]
pub struct UserDirectory {
    profiles: Arc<DashMap<Uuid, UserResponse>>,
    params: Arc<DashMap<Uuid, ClientParams>>,
}

impl UserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a profile; returns `false` if it already existed
    pub fn create_profile(&self, id: Uuid, username: String) -> bool {
        match self.profiles.entry(id) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(UserResponse { id, username });
                true
            },
        }
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.profiles.contains_key(&id)
    }

    fn ensure_known(&self, id: Uuid) -> Result<(), RpcError> {
        if self.contains(id) {
            Ok(())
        } else {
            Err(RpcError::NotFound("user".to_string()))
        }
    }
}

#[async_trait]
impl UserRpc for UserDirectory {
    async fn get_user(&self, req: GetUserRequest) -> Result<UserResponse, RpcError> {
        self.profiles
            .get(&req.user_id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| RpcError::NotFound("user".to_string()))
    }

    async fn get_client_params(&self, req: GetClientParamsRequest) -> Result<ClientParams, RpcError> {
        self.ensure_known(req.user_uuid)?;
        Ok(self
            .params
            .get(&req.user_uuid)
            .map(|entry| entry.value().clone())
            .unwrap_or_else(|| default_params(req.user_uuid)))
    }

    async fn set_client_params(&self, req: SetClientParamsRequest) -> Result<ClientParams, RpcError> {
        self.ensure_known(req.user_uuid)?;

        // Validate everything before touching the stored value
        let lang_code = req
            .lang_code
            .as_deref()
            .map(|code| validate_lang_code(code).map(str::to_string))
            .transpose()
            .map_err(|e| RpcError::InvalidArgument(e.to_string()))?;
        let sound_volume = req
            .sound_volume
            .map(validate_sound_volume)
            .transpose()
            .map_err(|e| RpcError::InvalidArgument(e.to_string()))?;

        let mut params = self
            .params
            .entry(req.user_uuid)
            .or_insert_with(|| default_params(req.user_uuid));
        if let Some(code) = lang_code {
            params.lang_code = code;
        }
        if let Some(volume) = sound_volume {
            params.sound_volume = volume;
        }
        if let Some(enabled) = req.is_game_sound_enabled {
            params.is_game_sound_enabled = enabled;
        }
        Ok(params.clone())
    }
}

/// Creates a profile for every "user registered" event.
///
/// Redelivery of an already handled event is acked without changes.
pub struct UserRegisteredHandler {
    directory: UserDirectory,
}

impl UserRegisteredHandler {
    pub fn new(directory: UserDirectory) -> Self {
        Self { directory }
    }
}

#[async_trait]
impl DeliveryHandler for UserRegisteredHandler {
    async fn handle(&self, delivery: &Delivery) -> anyhow::Result<()> {
        let event: UserRegistered = delivery.decode()?;
        let username = event
            .user_name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| default_username(event.user_id));

        if self.directory.create_profile(event.user_id, username) {
            tracing::info!(user_id = %event.user_id, "user profile created");
        } else {
            tracing::debug!(user_id = %event.user_id, "user profile already exists");
        }
        Ok(())
    }
}
