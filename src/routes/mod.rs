//! Route table construction and the axum router that mounts the dispatcher.

pub mod rest;
pub mod table;

pub use rest::rest_routes;
pub use table::{RouteEntry, RouteKind, RouteMatch, RouteTable};
