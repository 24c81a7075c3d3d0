// ============================
// backend-lib/src/gateway/routes.rs
// ============================
//! The route table served by the gateway.
use axum::http::Method;

use crate::config::GatewaySettings;
use crate::gateway::route_table::{Operation, RouteEntry, RouteTable};

/// Build the route table for the configured prefixes
pub fn default_table(gateway: &GatewaySettings) -> RouteTable {
    let user = gateway.user_prefix.as_str();
    let room = gateway.room_prefix.as_str();

    RouteTable::new(vec![
        // user service
        RouteEntry::new(user, "me", Method::GET, Operation::GetUser),
        RouteEntry::new(user, "params", Method::GET, Operation::GetClientParams),
        RouteEntry::new(user, "params", Method::PATCH, Operation::SetClientParams),
        // room service
        RouteEntry::new(room, "rooms", Method::POST, Operation::CreateRoom),
        RouteEntry::new(room, "rooms/search", Method::POST, Operation::SearchRooms),
        RouteEntry::new(room, "rooms/{id}", Method::GET, Operation::GetRoom),
        RouteEntry::new(room, "rooms/{id}", Method::DELETE, Operation::DeleteRoom),
    ])
}
