// ============================
// backend-lib/src/services/room.rs
// ============================
//! Game rooms: create, look up, search and delete.
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use uuid::Uuid;

use authgate_common::{
    CreateRoomRequest, DeleteRoomRequest, GetRoomRequest, GetUserRequest, RoomDeleted, RoomResponse,
    SearchRoomsRequest, SearchRoomsResponse,
};

use crate::auth::password::{generate_salt, HashAlgorithm, PasswordError, PasswordHasher};
use crate::rpc::{RoomRpc, RpcError, UserRpc};
use crate::validation::{validate_max_players, validate_room_name};

pub const DEFAULT_PAGE_SIZE: i32 = 10;
pub const MAX_PAGE_SIZE: i32 = 100;

struct StoredRoom {
    id: Uuid,
    owner_id: Uuid,
    name: String,
    /// Hash, salt and algorithm of the join password
    password: Option<(String, String, HashAlgorithm)>,
    max_players: i32,
    is_public: bool,
    created_at: DateTime<Utc>,
    /// Creation order
    seq: u64,
}

/// In-memory room directory
#[derive(Clone)]
pub struct RoomDirectory {
    rooms: Arc<DashMap<Uuid, StoredRoom>>,
    next_seq: Arc<AtomicU64>,
    users: Arc<dyn UserRpc>,
    hasher: PasswordHasher,
    salt_len: usize,
}

impl RoomDirectory {
    pub fn new(users: Arc<dyn UserRpc>, hasher: PasswordHasher, salt_len: usize) -> Self {
        Self {
            rooms: Arc::new(DashMap::new()),
            next_seq: Arc::new(AtomicU64::new(0)),
            users,
            hasher,
            salt_len,
        }
    }

    /// Check a join password against the stored hash; rooms without one accept anything
    #[cfg(test)]
    async fn check_password(&self, id: Uuid, candidate: &str) -> Result<bool, RpcError> {
        let password = self
            .rooms
            .get(&id)
            .map(|room| room.password.clone())
            .ok_or_else(|| RpcError::NotFound("room".to_string()))?;

        match password {
            None => Ok(true),
            Some((hash, salt, algorithm)) => Ok(self
                .hasher
                .verify_blocking(hash, algorithm, salt, candidate.to_string())
                .await),
        }
    }

    async fn owner_name(&self, owner_id: Uuid) -> String {
        match self.users.get_user(GetUserRequest { user_id: owner_id }).await {
            Ok(user) => user.username,
            Err(err) => {
                tracing::debug!(%owner_id, error = %err, "owner name unavailable");
                String::new()
            },
        }
    }

    async fn to_response(&self, room: RoomSnapshot) -> RoomResponse {
        RoomResponse {
            id: room.id,
            name: room.name,
            owner_name: self.owner_name(room.owner_id).await,
            owner_id: room.owner_id,
            max_players: room.max_players,
            is_public: room.is_public,
            has_password: room.has_password,
            created_at: room.created_at,
        }
    }
}

/// Copy of a stored room without password material
struct RoomSnapshot {
    id: Uuid,
    owner_id: Uuid,
    name: String,
    max_players: i32,
    is_public: bool,
    has_password: bool,
    created_at: DateTime<Utc>,
    seq: u64,
}

impl From<&StoredRoom> for RoomSnapshot {
    fn from(room: &StoredRoom) -> Self {
        Self {
            id: room.id,
            owner_id: room.owner_id,
            name: room.name.clone(),
            max_players: room.max_players,
            is_public: room.is_public,
            has_password: room.password.is_some(),
            created_at: room.created_at,
            seq: room.seq,
        }
    }
}

fn invalid(err: impl ToString) -> RpcError {
    RpcError::InvalidArgument(err.to_string())
}

#[async_trait]
impl RoomRpc for RoomDirectory {
    async fn create_room(&self, req: CreateRoomRequest) -> Result<RoomResponse, RpcError> {
        let name = validate_room_name(req.name.trim()).map_err(invalid)?.to_string();
        let max_players = validate_max_players(req.max_players).map_err(invalid)?;
        let is_public = req
            .is_public
            .ok_or_else(|| invalid("is_public must be true or false"))?;

        let password = match req.password {
            Some(plain) => {
                let salt = generate_salt(self.salt_len).map_err(|e| RpcError::Internal(e.to_string()))?;
                let digest = self
                    .hasher
                    .hash_blocking(plain, salt.clone())
                    .await
                    .map_err(|e| match e {
                        PasswordError::TooLong { .. } => invalid(e),
                        other => RpcError::Internal(other.to_string()),
                    })?;
                Some((digest.hash, salt, digest.algorithm))
            },
            None => None,
        };

        let room = StoredRoom {
            id: Uuid::new_v4(),
            owner_id: req.user_uuid,
            name,
            password,
            max_players,
            is_public,
            created_at: Utc::now(),
            seq: self.next_seq.fetch_add(1, Ordering::Relaxed),
        };
        let snapshot = RoomSnapshot::from(&room);
        self.rooms.insert(room.id, room);

        tracing::info!(room_id = %snapshot.id, owner_id = %snapshot.owner_id, "room created");
        Ok(self.to_response(snapshot).await)
    }

    async fn get_room(&self, req: GetRoomRequest) -> Result<RoomResponse, RpcError> {
        let snapshot = self
            .rooms
            .get(&req.id)
            .map(|room| RoomSnapshot::from(room.value()))
            .ok_or_else(|| RpcError::NotFound("room".to_string()))?;
        Ok(self.to_response(snapshot).await)
    }

    async fn search_rooms(&self, req: SearchRoomsRequest) -> Result<SearchRoomsResponse, RpcError> {
        let size = if req.size <= 0 {
            DEFAULT_PAGE_SIZE
        } else {
            req.size.min(MAX_PAGE_SIZE)
        };
        let size = size as usize;
        let page = req.page.max(1) as usize;
        let needle = req
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);

        let mut matches: Vec<RoomSnapshot> = self
            .rooms
            .iter()
            .filter(|room| room.is_public)
            .filter(|room| {
                needle
                    .as_ref()
                    .map_or(true, |needle| room.name.to_lowercase().contains(needle.as_str()))
            })
            .map(|room| RoomSnapshot::from(room.value()))
            .collect();

        // Newest first
        matches.sort_by(|a, b| b.seq.cmp(&a.seq));
        let total = matches.len() as i64;

        let mut rooms = Vec::new();
        for snapshot in matches.into_iter().skip((page - 1).saturating_mul(size)).take(size) {
            rooms.push(self.to_response(snapshot).await);
        }

        Ok(SearchRoomsResponse { rooms, total })
    }

    async fn delete_room(&self, req: DeleteRoomRequest) -> Result<RoomDeleted, RpcError> {
        let owner_id = self
            .rooms
            .get(&req.id)
            .map(|room| room.owner_id)
            .ok_or_else(|| RpcError::NotFound("room".to_string()))?;

        if owner_id != req.user_uuid {
            tracing::warn!(room_id = %req.id, caller = %req.user_uuid, "delete refused for non-owner");
            return Err(RpcError::PermissionDenied("only the owner may delete a room".to_string()));
        }

        self.rooms.remove(&req.id);
        tracing::info!(room_id = %req.id, "room deleted");
        Ok(RoomDeleted { id: req.id })
    }
}
