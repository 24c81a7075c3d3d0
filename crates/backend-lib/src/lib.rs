// ============================
// backend-lib/src/lib.rs
// ============================
//! Identity service and authenticated edge gateway.
//!
//! Credentials are hashed with a per-record salt, sessions are a short-lived
//! access token plus a single cache-tracked refresh token, and authenticated
//! requests under the proxied prefixes are translated into typed calls on the
//! internal user and room services.

pub mod auth;
pub mod config;
pub mod error;
pub mod events;
pub mod gateway;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod router;
pub mod rpc;
pub mod services;
pub mod storage;
pub mod validation;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::auth::{AuthService, DefaultAuth, MemorySessionCache, PasswordHasher, SessionCache};
use crate::config::Settings;
use crate::error::AppError;
use crate::events::{Consumer, EventPublisher, MemoryBroker};
use crate::gateway::{default_table, Dispatcher};
use crate::rpc::{RoomRpc, UserRpc};
use crate::services::{RoomDirectory, UserDirectory, UserRegisteredHandler};
use crate::storage::{CredentialStore, MemoryCredentialStore};

pub use crate::router::create_router;

/// How often expired refresh tokens are purged from the in-memory cache
const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Authentication core
    pub auth: Arc<dyn AuthService>,
    /// Route table plus internal service handles
    pub dispatcher: Arc<Dispatcher>,
    pub settings: Arc<Settings>,
}

/// External collaborators the application is built on
#[derive(Clone)]
pub struct Backends {
    pub store: Arc<dyn CredentialStore>,
    pub sessions: Arc<dyn SessionCache>,
    pub events: Arc<dyn EventPublisher>,
    pub users: Arc<dyn UserRpc>,
    pub rooms: Arc<dyn RoomRpc>,
}

impl AppState {
    /// Create a new application state
    pub fn new(settings: Settings, backends: Backends) -> Result<Self, AppError> {
        let auth = DefaultAuth::new(&settings, backends.store, backends.sessions, backends.events)?;
        let dispatcher = Dispatcher::new(
            default_table(&settings.gateway),
            backends.users,
            backends.rooms,
            settings.timeouts.rpc(),
        );

        Ok(Self {
            auth: Arc::new(auth),
            dispatcher: Arc::new(dispatcher),
            settings: Arc::new(settings),
        })
    }
}

/// In-process implementations of every collaborator
#[derive(Clone)]
pub struct LocalServices {
    pub store: MemoryCredentialStore,
    pub sessions: MemorySessionCache,
    pub broker: MemoryBroker,
    pub users: UserDirectory,
    pub rooms: Arc<RoomDirectory>,
}

impl LocalServices {
    pub fn new(settings: &Settings) -> Result<Self, AppError> {
        let broker = MemoryBroker::new();
        broker.declare_queue(&settings.events.user_registered_queue);

        let auth = &settings.auth;
        let hasher = PasswordHasher::new(auth.hash_algorithm, auth.bcrypt_cost, auth.scrypt_log_n)?;
        let users = UserDirectory::new();
        let rooms = RoomDirectory::new(Arc::new(users.clone()), hasher, auth.salt_len);

        Ok(Self {
            store: MemoryCredentialStore::new(),
            sessions: MemorySessionCache::new(),
            broker,
            users,
            rooms: Arc::new(rooms),
        })
    }

    pub fn backends(&self) -> Backends {
        Backends {
            store: Arc::new(self.store.clone()),
            sessions: Arc::new(self.sessions.clone()),
            events: Arc::new(self.broker.clone()),
            users: Arc::new(self.users.clone()),
            rooms: self.rooms.clone(),
        }
    }

    /// Start the registration consumer and the session sweeper.
    ///
    /// The consumer stops when `shutdown` flips; the sweeper is aborted by the caller.
    pub fn start_background(
        &self,
        settings: &Settings,
        shutdown: watch::Receiver<bool>,
    ) -> Result<Vec<JoinHandle<()>>, AppError> {
        let handler = Arc::new(UserRegisteredHandler::new(self.users.clone()));
        let consumer = Consumer::new(
            self.broker.clone(),
            settings.events.user_registered_queue.clone(),
            handler,
            settings.events.max_redeliveries,
        );

        Ok(vec![
            consumer.spawn(shutdown)?,
            self.sessions.spawn_cleanup(SESSION_SWEEP_INTERVAL),
        ])
    }
}
