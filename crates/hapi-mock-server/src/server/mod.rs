//! HTTP transport for the mock endpoint and the admin API.
//!
//! One listener serves both surfaces:
//! - `<mock_prefix>/**` (default `/mock`): every request is recorded, then
//!   answered from the best matching rule
//! - `/admin/rules`, `/admin/requests`, `/admin/health`: store management

mod handlers;
mod router;
mod types;

pub use handlers::mock::{collect_headers, parse_query_params, rule_response, NO_MATCH_HEADER};
pub use router::{is_mock_path, route_request};
pub use types::{ErrorDetail, ErrorResponse, HealthResponse};

use crate::config::Config;
use crate::recording::RequestStore;
use crate::rules::{RuleMatcher, RuleStore};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, error, info};

/// Mount point of the admin API.
pub const ADMIN_PREFIX: &str = "/admin";

/// Shared state handed to every connection task.
pub struct AppState {
    pub rules: Arc<RuleStore>,
    pub requests: Arc<RequestStore>,
    pub matcher: RuleMatcher,
}

impl AppState {
    pub fn new(rules: Arc<RuleStore>, requests: Arc<RequestStore>, mount_prefix: &str) -> Self {
        let matcher = RuleMatcher::new(Arc::clone(&rules), mount_prefix);
        Self {
            rules,
            requests,
            matcher,
        }
    }

    /// Open both stores in the directories named by `config`.
    pub fn from_config(config: &Config) -> Self {
        let rules = Arc::new(RuleStore::open(&config.rules.directory));
        let requests = Arc::new(RequestStore::open(&config.recording.directory));
        Self::new(rules, requests, &config.mock_prefix)
    }
}

/// Mock server bound to a TCP listener.
pub struct MockServer {
    listener: TcpListener,
    state: Arc<AppState>,
}

impl MockServer {
    /// Bind the listener. Port 0 picks an ephemeral port.
    pub async fn bind(addr: SocketAddr, state: Arc<AppState>) -> Result<Self, anyhow::Error> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self { listener, state })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, anyhow::Error> {
        Ok(self.listener.local_addr()?)
    }

    /// Serve until Ctrl-C.
    pub async fn run(self) -> Result<(), anyhow::Error> {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for shutdown signal: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    /// Serve connections until `shutdown` resolves.
    ///
    /// Each connection runs on its own task, so a rule delay only holds up the
    /// request it applies to.
    pub async fn run_until<F>(self, shutdown: F) -> Result<(), anyhow::Error>
    where
        F: Future<Output = ()>,
    {
        let addr = self.local_addr()?;
        info!(
            "Mock server listening on http://{} (admin API under {})",
            addr, ADMIN_PREFIX
        );
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                result = self.listener.accept() => {
                    match result {
                        Ok((stream, client_addr)) => {
                            let state = Arc::clone(&self.state);
                            tokio::spawn(async move {
                                let io = TokioIo::new(stream);
                                let service = service_fn(move |req| {
                                    let state = Arc::clone(&state);
                                    async move { route_request(req, state, client_addr).await }
                                });
                                if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                                    debug!("Connection error from {}: {}", client_addr, e);
                                }
                            });
                        }
                        Err(e) => {
                            error!("Accept error on {}: {}", addr, e);
                        }
                    }
                }
                _ = &mut shutdown => {
                    info!("Mock server on {} shutting down", addr);
                    return Ok(());
                }
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// App state backed by stores in a fresh temp directory.
    pub fn temp_state() -> (tempfile::TempDir, Arc<AppState>) {
        let tmp = tempfile::tempdir().unwrap();
        let rules = Arc::new(RuleStore::open(tmp.path().join("rules")));
        let requests = Arc::new(RequestStore::open(tmp.path().join("requests")));
        let state = Arc::new(AppState::new(rules, requests, "/mock"));
        (tmp, state)
    }
}
