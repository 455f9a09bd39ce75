//! System handlers: health.

use crate::server::types::{json_response, HealthResponse};
use crate::server::AppState;
use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};

/// GET /admin/health - Health check with store sizes
pub fn handle_health(state: &AppState) -> Response<Full<Bytes>> {
    let health = HealthResponse {
        status: "UP",
        rules: state.rules.count(),
        recorded_requests: state.requests.count(),
    };
    json_response(StatusCode::OK, &health)
}
