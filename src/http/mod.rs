//! HTTP surface: routes, auth middleware, and the action dispatcher

pub mod dispatch;
pub mod middleware;
pub mod protocol;
pub mod routes;

pub use routes::build_router;
