//! Request recording store.
//!
//! Every recorded request is written twice: to its own trace file and to the
//! aggregate `requests.json` snapshot. Both writes are best-effort.

use super::file_name::request_file_name;
use super::types::{MultiValueMap, RecordedRequest};
use crate::persistence::{write_json_file, PersistenceError, SnapshotFile};
use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, error, info};

pub const REQUESTS_FILE: &str = "requests.json";
const ID_PREFIX: &str = "req_";

/// Concurrent set of recorded requests keyed by ID.
pub struct RequestStore {
    requests: RwLock<HashMap<String, RecordedRequest>>,
    /// Next request number embedded in IDs
    id_counter: AtomicU64,
    snapshot: SnapshotFile,
    /// Serializes writes to the store directory
    write_lock: Mutex<()>,
}

impl RequestStore {
    /// Open the store in `dir`, reloading `requests.json` if present.
    pub fn open(dir: impl AsRef<Path>) -> Self {
        let store = Self {
            requests: RwLock::new(HashMap::new()),
            id_counter: AtomicU64::new(1),
            snapshot: SnapshotFile::new(dir.as_ref(), REQUESTS_FILE),
            write_lock: Mutex::new(()),
        };
        if let Err(e) = store.snapshot.ensure_dir() {
            error!("Failed to create recording directory: {}", e);
        }
        store.reload();
        store
    }

    fn reload(&self) {
        let loaded: Vec<RecordedRequest> = match self.snapshot.load() {
            Ok(Some(requests)) => requests,
            Ok(None) => {
                info!("No requests file found, starting with empty requests");
                return;
            }
            Err(e) => {
                error!("Failed to load requests from file: {}", e);
                return;
            }
        };

        let count = loaded.len();
        let mut requests = self.requests.write();
        for request in loaded {
            if let Some(n) = parse_request_number(&request.id) {
                self.id_counter
                    .fetch_max(n.saturating_add(1), Ordering::SeqCst);
            }
            requests.insert(request.id.clone(), request);
        }
        info!("Loaded {} recorded requests from file", count);
    }

    /// Record an inbound request. Always succeeds; persistence is best-effort.
    #[allow(clippy::too_many_arguments)]
    pub fn record(
        &self,
        method: &str,
        path: &str,
        query_params: MultiValueMap,
        headers: MultiValueMap,
        body: Option<String>,
        content_type: Option<String>,
        remote_address: Option<String>,
        user_agent: Option<String>,
    ) -> RecordedRequest {
        let timestamp = Utc::now();
        let number = self.id_counter.fetch_add(1, Ordering::SeqCst);
        let id = format!(
            "{ID_PREFIX}{}_{}",
            number,
            timestamp.format("%Y%m%d_%H%M%S_%3f")
        );
        debug!("Recording request: {} {}", method, path);

        let request = RecordedRequest {
            id: id.clone(),
            timestamp,
            method: method.to_string(),
            path: path.to_string(),
            query_params,
            headers,
            body,
            content_type,
            remote_address,
            user_agent,
        };
        {
            // Insert and file writes under the same lock as `clear`
            let _guard = self.write_lock.lock();
            self.requests.write().insert(id.clone(), request.clone());
            self.persist_new(&request);
        }
        info!("Recorded request with ID: {}", id);
        request
    }

    /// All requests, most recent first.
    pub fn list(&self) -> Vec<RecordedRequest> {
        let mut requests: Vec<RecordedRequest> = self.requests.read().values().cloned().collect();
        requests.sort_by(|a, b| {
            b.timestamp.cmp(&a.timestamp).then_with(|| {
                parse_request_number(&b.id).cmp(&parse_request_number(&a.id))
            })
        });
        requests
    }

    pub fn get(&self, id: &str) -> Option<RecordedRequest> {
        let request = self.requests.read().get(id).cloned();
        debug!("Retrieved recorded request: {} -> {}", id, request.is_some());
        request
    }

    pub fn count(&self) -> usize {
        self.requests.read().len()
    }

    /// Drop every record, rewrite an empty snapshot and delete trace files.
    pub fn clear(&self) {
        info!("Clearing all recorded requests");
        let _guard = self.write_lock.lock();
        self.requests.write().clear();
        self.save_snapshot();
        match self.remove_trace_files() {
            Ok(removed) => info!("Cleared {} request files from directory", removed),
            Err(e) => error!("Failed to clear request files: {}", e),
        }
    }

    /// Caller must hold `write_lock`.
    fn persist_new(&self, request: &RecordedRequest) {
        let path = self.snapshot.dir().join(request_file_name(request));
        match write_json_file(&path, request) {
            Ok(()) => debug!("Saved request to file: {}", path.display()),
            Err(e) => error!("Failed to save request to file: {}", e),
        }
        self.save_snapshot();
    }

    /// Caller must hold `write_lock`.
    fn save_snapshot(&self) {
        let requests = self.list();
        match self.snapshot.save(&requests) {
            Ok(()) => debug!("Saved {} requests to file", requests.len()),
            Err(e) => error!("Failed to save requests to file: {}", e),
        }
    }

    fn remove_trace_files(&self) -> Result<usize, PersistenceError> {
        let dir = self.snapshot.dir();
        let io_err = |source: std::io::Error| PersistenceError::Io {
            path: dir.to_path_buf(),
            source,
        };
        let mut removed = 0;
        for entry in fs::read_dir(dir).map_err(io_err)? {
            let entry = entry.map_err(io_err)?;
            if entry.file_name() == self.snapshot.file_name() {
                continue;
            }
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            match fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(e) => error!("Failed to delete {}: {}", path.display(), e),
            }
        }
        Ok(removed)
    }
}

/// Counter component of a request ID (`req_12_20240101_...` -> 12).
fn parse_request_number(id: &str) -> Option<u64> {
    id.strip_prefix(ID_PREFIX)?.split('_').next()?.parse().ok()
}
