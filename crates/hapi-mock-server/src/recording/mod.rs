//! Recording of every request that reaches the mock endpoint.
//!
//! # Module Structure
//!
//! - `types` - `RecordedRequest` and the multi-valued map alias
//! - `store` - `RequestStore`, persisted to `requests.json` plus one trace
//!   file per request
//! - `file_name` - trace file naming

mod file_name;
mod store;
mod types;

pub use file_name::{request_file_name, sanitize_path};
pub use store::{RequestStore, REQUESTS_FILE};
pub use types::{MultiValueMap, RecordedRequest};
