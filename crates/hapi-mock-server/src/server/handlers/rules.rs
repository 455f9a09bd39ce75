//! Rule management handlers.

use crate::rules::Rule;
use crate::server::types::{empty_ok, error_response, json_response};
use crate::server::AppState;
use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};

/// GET /admin/rules
pub fn handle_list(state: &AppState) -> Response<Full<Bytes>> {
    json_response(StatusCode::OK, &state.rules.list())
}

/// POST /admin/rules
pub fn handle_add(state: &AppState, body: &[u8]) -> Response<Full<Bytes>> {
    let rule: Rule = match serde_json::from_slice(body) {
        Ok(r) => r,
        Err(e) => {
            return error_response(StatusCode::BAD_REQUEST, &format!("Invalid rule JSON: {e}"))
        }
    };
    let added = state.rules.add(rule);
    json_response(StatusCode::OK, &added)
}

/// DELETE /admin/rules/:id
pub fn handle_remove(state: &AppState, id: &str) -> Response<Full<Bytes>> {
    json_response(StatusCode::OK, &state.rules.remove(id))
}

/// DELETE /admin/rules
pub fn handle_clear(state: &AppState) -> Response<Full<Bytes>> {
    state.rules.clear();
    empty_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::test_support::temp_state;
    use http_body_util::BodyExt;

    async fn body_json(resp: Response<Full<Bytes>>) -> serde_json::Value {
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_add_assigns_id() {
        let (_tmp, state) = temp_state();
        let resp = handle_add(&state, br#"{"method": "GET", "path": "/ping"}"#);
        assert_eq!(resp.status(), StatusCode::OK);

        let body = body_json(resp).await;
        assert_eq!(body["id"], "rule_1");
        assert_eq!(body["statusCode"], 200);
        assert_eq!(state.rules.count(), 1);
    }

    #[tokio::test]
    async fn test_add_invalid_json() {
        let (_tmp, state) = temp_state();
        let resp = handle_add(&state, b"{not json");
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(state.rules.count(), 0);
    }

    #[tokio::test]
    async fn test_remove_returns_bool() {
        let (_tmp, state) = temp_state();
        let added = state.rules.add(Rule::new("GET", "/a"));

        assert_eq!(body_json(handle_remove(&state, &added.id)).await, true);
        assert_eq!(body_json(handle_remove(&state, &added.id)).await, false);
    }

    #[tokio::test]
    async fn test_list_and_clear() {
        let (_tmp, state) = temp_state();
        state.rules.add(Rule::new("GET", "/a").with_priority(2));
        state.rules.add(Rule::new("GET", "/b").with_priority(1));

        let listed = body_json(handle_list(&state)).await;
        assert_eq!(listed[0]["path"], "/b");
        assert_eq!(listed[1]["path"], "/a");

        assert_eq!(handle_clear(&state).status(), StatusCode::OK);
        assert_eq!(body_json(handle_list(&state)).await, serde_json::json!([]));
    }
}
