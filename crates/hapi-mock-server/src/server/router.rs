//! Route dispatch: mock endpoint vs. admin API.

use crate::server::handlers::{mock, requests, rules, system};
use crate::server::types::{collect_body, error_response, method_not_allowed, not_found};
use crate::server::{AppState, ADMIN_PREFIX};
use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Body;
use hyper::{Method, Request, Response, StatusCode};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::debug;

/// Parsed admin route, from path segments after `/admin/`
#[derive(Debug, PartialEq)]
enum AdminRoute {
    /// GET /admin/health
    Health,
    /// GET/POST/DELETE /admin/rules
    Rules,
    /// DELETE /admin/rules/:id
    RuleById(String),
    /// GET/DELETE /admin/requests
    Requests,
    /// GET /admin/requests/:id
    RequestById(String),
}

impl AdminRoute {
    fn parse(segments: &[&str]) -> Option<Self> {
        match segments {
            ["health"] => Some(AdminRoute::Health),
            ["rules"] => Some(AdminRoute::Rules),
            ["rules", id] if !id.is_empty() => Some(AdminRoute::RuleById(decode_segment(id))),
            ["requests"] => Some(AdminRoute::Requests),
            ["requests", id] if !id.is_empty() => {
                Some(AdminRoute::RequestById(decode_segment(id)))
            }
            _ => None,
        }
    }
}

fn decode_segment(segment: &str) -> String {
    urlencoding::decode(segment)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| segment.to_string())
}

/// Whether `path` falls under the mock mount point.
pub fn is_mock_path(path: &str, prefix: &str) -> bool {
    if prefix == "/" {
        return true;
    }
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

/// Main request router
pub async fn route_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    client_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible>
where
    B: Body,
    B::Error: std::fmt::Display,
{
    let path = req.uri().path().to_string();

    if let Some(rest) = admin_subpath(&path) {
        debug!("Admin API: {} {}", req.method(), path);
        let segments: Vec<&str> = rest.trim_end_matches('/').split('/').collect();
        return Ok(match AdminRoute::parse(&segments) {
            Some(route) => route_admin(route, req, &state).await,
            None => not_found(),
        });
    }

    if is_mock_path(&path, state.matcher.mount_prefix()) {
        return Ok(mock::handle_mock_request(req, state, client_addr).await);
    }

    Ok(not_found())
}

fn admin_subpath(path: &str) -> Option<&str> {
    path.strip_prefix(ADMIN_PREFIX)?.strip_prefix('/')
}

async fn route_admin<B>(route: AdminRoute, req: Request<B>, state: &AppState) -> Response<Full<Bytes>>
where
    B: Body,
    B::Error: std::fmt::Display,
{
    let method = req.method().clone();
    match (method, route) {
        (Method::GET, AdminRoute::Health) => system::handle_health(state),

        (Method::GET, AdminRoute::Rules) => rules::handle_list(state),
        (Method::POST, AdminRoute::Rules) => match collect_body(req.into_body()).await {
            Ok(body) => rules::handle_add(state, &body),
            Err(e) => error_response(StatusCode::BAD_REQUEST, &e),
        },
        (Method::DELETE, AdminRoute::Rules) => rules::handle_clear(state),
        (Method::DELETE, AdminRoute::RuleById(id)) => rules::handle_remove(state, &id),

        (Method::GET, AdminRoute::Requests) => requests::handle_list(state),
        (Method::DELETE, AdminRoute::Requests) => requests::handle_clear(state),
        (Method::GET, AdminRoute::RequestById(id)) => requests::handle_get(state, &id),

        _ => method_not_allowed(),
    }
}
