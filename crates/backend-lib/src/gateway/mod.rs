// ============================
// backend-lib/src/gateway/mod.rs
// ============================
//! Authenticated protocol translation from external HTTP requests to internal calls.

pub mod dispatcher;
pub mod route_table;
pub mod routes;

pub use dispatcher::{CallerScoped, Dispatcher, RequestContext};
pub use route_table::{Operation, RouteEntry, RouteMatch, RouteTable};
pub use routes::default_table;
