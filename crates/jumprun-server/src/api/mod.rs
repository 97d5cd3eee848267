//! API routes for the tracker server.

mod routes;
pub mod slack;

use axum::Router;

pub fn routes() -> Router<std::sync::Arc<crate::state::AppState>> {
    routes::create_router()
}

#[cfg(test)]
mod tests;
