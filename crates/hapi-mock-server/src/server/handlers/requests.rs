//! Recorded request handlers.

use crate::server::types::{empty_ok, error_response, json_response};
use crate::server::AppState;
use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};

/// GET /admin/requests
pub fn handle_list(state: &AppState) -> Response<Full<Bytes>> {
    json_response(StatusCode::OK, &state.requests.list())
}

/// GET /admin/requests/:id
pub fn handle_get(state: &AppState, id: &str) -> Response<Full<Bytes>> {
    match state.requests.get(id) {
        Some(request) => json_response(StatusCode::OK, &request),
        None => error_response(
            StatusCode::NOT_FOUND,
            &format!("Recorded request {id} not found"),
        ),
    }
}

/// DELETE /admin/requests
pub fn handle_clear(state: &AppState) -> Response<Full<Bytes>> {
    state.requests.clear();
    empty_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::test_support::temp_state;
    use std::collections::HashMap;

    #[test]
    fn test_get_known_and_unknown() {
        let (_tmp, state) = temp_state();
        let recorded = state.requests.record(
            "GET",
            "/mock/a",
            HashMap::new(),
            HashMap::new(),
            None,
            None,
            None,
            None,
        );

        assert_eq!(handle_get(&state, &recorded.id).status(), StatusCode::OK);
        assert_eq!(
            handle_get(&state, "req_404").status(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_clear() {
        let (_tmp, state) = temp_state();
        state.requests.record(
            "GET",
            "/mock/a",
            HashMap::new(),
            HashMap::new(),
            None,
            None,
            None,
            None,
        );
        assert_eq!(handle_clear(&state).status(), StatusCode::OK);
        assert_eq!(state.requests.count(), 0);
        assert_eq!(handle_list(&state).status(), StatusCode::OK);
    }
}
