use crate::state::AppState;
use axum::Router;

mod dto;
pub mod handlers;
pub mod password;
pub mod repo;
pub mod session;
pub mod tokens;
pub(crate) mod extractors;
mod validate;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::session_routes())
        .merge(handlers::account_routes())
        .merge(handlers::reset_routes())
}
