// ============================
// backend-lib/src/auth/mod.rs
// ============================
//! Authentication module.

pub mod password;
pub mod session;
pub mod token;
mod service;
mod service_impl;

pub use password::{generate_salt, HashAlgorithm, PasswordDigest, PasswordHasher};
pub use service::{AuthService, Registration, TokenPair};
pub use service_impl::DefaultAuth;
pub use session::{CacheError, MemorySessionCache, SessionCache};
pub use token::{TokenError, TokenService};
