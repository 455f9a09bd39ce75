//! The mock endpoint: record the request, then answer from the best rule.

use crate::recording::MultiValueMap;
use crate::rules::Rule;
use crate::server::types::{build_response, build_response_with_headers, collect_body};
use crate::server::AppState;
use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Body;
use hyper::header::{HeaderName, HeaderValue, CONTENT_TYPE, USER_AGENT};
use hyper::{HeaderMap, Request, Response, StatusCode};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Header set on responses when no rule matched.
pub const NO_MATCH_HEADER: &str = "X-Mock-Server";

/// Handle a request to the mock endpoint
pub async fn handle_mock_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    client_addr: SocketAddr,
) -> Response<Full<Bytes>>
where
    B: Body,
    B::Error: std::fmt::Display,
{
    let (parts, body) = req.into_parts();
    let method = parts.method.to_string();
    let path = parts.uri.path().to_string();
    info!("Received request: {} {}", method, path);

    let body = match collect_body(body).await {
        Ok(bytes) if bytes.is_empty() => None,
        Ok(bytes) => Some(String::from_utf8_lossy(&bytes).into_owned()),
        Err(e) => {
            warn!("{}", e);
            None
        }
    };
    let query_params = parse_query_params(parts.uri.query());
    let content_type = header_str(&parts.headers, CONTENT_TYPE);
    let user_agent = header_str(&parts.headers, USER_AGENT);
    let headers = collect_headers(&parts.headers);

    // Recording touches the filesystem; keep it off the async workers
    let record_state = Arc::clone(&state);
    let (record_method, record_path) = (method.clone(), path.clone());
    let recorded = tokio::task::spawn_blocking(move || {
        record_state.requests.record(
            &record_method,
            &record_path,
            query_params,
            headers,
            body,
            content_type,
            Some(client_addr.ip().to_string()),
            user_agent,
        )
    })
    .await;
    if let Err(e) = recorded {
        error!("Recording task failed for {} {}: {}", method, path, e);
    }

    match state.matcher.find_match(&method, &path) {
        Some(rule) => {
            info!("Found matching rule: {}", rule.name);
            if rule.delay > 0 {
                tokio::time::sleep(Duration::from_millis(rule.delay)).await;
            }
            rule_response(&rule, &method, &path)
        }
        None => {
            info!("No matching rule found, returning default response");
            build_response_with_headers(
                StatusCode::OK,
                [(NO_MATCH_HEADER, "No matching rule found")],
                format!("Default mock response for {method} {path}"),
            )
        }
    }
}

/// Render a matched rule into a response.
pub fn rule_response(rule: &Rule, method: &str, path: &str) -> Response<Full<Bytes>> {
    let status = StatusCode::from_u16(rule.status_code).unwrap_or_else(|_| {
        warn!(
            "Rule {} has invalid status code {}, responding 500",
            rule.id, rule.status_code
        );
        StatusCode::INTERNAL_SERVER_ERROR
    });
    let body = rule
        .response_body
        .clone()
        .unwrap_or_else(|| format!("Mock response for {method} {path}"));

    let mut response = build_response(status, body);
    for (name, value) in &rule.response_headers {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                response.headers_mut().append(name, value);
            }
            _ => warn!("Rule {} has invalid response header '{}', skipping", rule.id, name),
        }
    }
    response
}

/// Parse a query string into URL-decoded, multi-valued parameters.
///
/// `+` decodes to a space; a key without `=` gets an empty value.
pub fn parse_query_params(query: Option<&str>) -> MultiValueMap {
    let mut params = MultiValueMap::new();
    let Some(query) = query else {
        return params;
    };
    for pair in query.split('&').filter(|s| !s.is_empty()) {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        params
            .entry(decode_component(key))
            .or_default()
            .push(decode_component(value));
    }
    params
}

fn decode_component(raw: &str) -> String {
    let raw = raw.replace('+', " ");
    match urlencoding::decode(&raw) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => raw,
    }
}

/// All header values, grouped by (lowercase) header name.
pub fn collect_headers(headers: &HeaderMap) -> MultiValueMap {
    let mut collected = MultiValueMap::new();
    for (name, value) in headers {
        collected
            .entry(name.as_str().to_string())
            .or_default()
            .push(String::from_utf8_lossy(value.as_bytes()).into_owned());
    }
    collected
}

fn header_str(headers: &HeaderMap, name: HeaderName) -> Option<String> {
    headers
        .get(name)
        .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_parse_query_params_multi_valued() {
        let params = parse_query_params(Some("tag=a&tag=b&q=hello+world&name=J%C3%BCrgen&flag"));
        assert_eq!(params["tag"], vec!["a", "b"]);
        assert_eq!(params["q"], vec!["hello world"]);
        assert_eq!(params["name"], vec!["Jürgen"]);
        assert_eq!(params["flag"], vec![""]);
        assert!(parse_query_params(None).is_empty());
        assert!(parse_query_params(Some("")).is_empty());
    }

    #[test]
    fn test_collect_headers_multi_valued() {
        let mut headers = HeaderMap::new();
        headers.append("accept", HeaderValue::from_static("text/plain"));
        headers.append("accept", HeaderValue::from_static("application/json"));
        headers.insert("x-trace", HeaderValue::from_static("abc"));

        let collected = collect_headers(&headers);
        assert_eq!(collected["accept"], vec!["text/plain", "application/json"]);
        assert_eq!(collected["x-trace"], vec!["abc"]);
    }

    #[test]
    fn test_rule_response_uses_rule_fields() {
        let mut rule = Rule::new("GET", "/users/\\d+").with_status(404);
        rule.response_body = Some("{\"error\":\"missing\"}".into());
        rule.response_headers = HashMap::from([
            ("Content-Type".to_string(), "application/json".to_string()),
            ("bad header".to_string(), "skipped".to_string()),
        ]);

        let resp = rule_response(&rule, "GET", "/mock/users/42");
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            resp.headers().get("content-type").unwrap(),
            "application/json"
        );
        assert_eq!(resp.headers().len(), 1);
    }

    #[test]
    fn test_rule_response_invalid_status() {
        let rule = Rule::new("*", "*").with_status(42);
        let resp = rule_response(&rule, "GET", "/");
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
