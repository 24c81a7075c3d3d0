// ==============
// crates/backend-lib/src/metrics.rs

//! Central place for metric keys
pub const USER_REGISTERED: &str = "auth.user_registered";
pub const LOGIN_SUCCESS: &str = "auth.login.success";
pub const LOGIN_FAILURE: &str = "auth.login.failure";
pub const REFRESH_SUCCESS: &str = "auth.refresh.success";
pub const REFRESH_REJECTED: &str = "auth.refresh.rejected";
pub const PASSWORD_UPDATED: &str = "auth.password_updated";
pub const SESSION_ACTIVE: &str = "session.active";
pub const SESSION_EXPIRED: &str = "session.expired";
pub const GATEWAY_DISPATCHED: &str = "gateway.dispatched";
pub const GATEWAY_UNMATCHED: &str = "gateway.unmatched";
pub const EVENT_PUBLISHED: &str = "events.published";
pub const EVENT_ACKED: &str = "events.acked";
pub const EVENT_NACKED: &str = "events.nacked";
pub const EVENT_DEAD_LETTERED: &str = "events.dead_lettered";
