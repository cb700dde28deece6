//! REST API definitions.

pub mod user;

use axum::{
    routing::{get, post},
    Router,
};
use common::pagination::DecodePolicy;

use crate::Service;

/// Builds the [`Router`] of the REST API.
pub fn router(service: Service, policy: DecodePolicy) -> Router {
    Router::new()
        .route("/api/v1/users", get(user::list))
        .route("/api/v1/users/populate", post(user::populate))
        .with_state(State { service, policy })
}

/// Shared state of the REST API handlers.
#[derive(Clone, Debug)]
pub struct State {
    /// [`Service`] executing the requests.
    pub service: Service,

    /// Policy of treating listed rows failed to decode.
    pub policy: DecodePolicy,
}
