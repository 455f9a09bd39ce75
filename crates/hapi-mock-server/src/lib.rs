//! Programmable HTTP mock server.
//!
//! Every request to the mock endpoint is recorded by a [`RequestStore`] and
//! answered from the best [`Rule`] in a [`RuleStore`]. Both stores keep their
//! state in memory and mirror it to JSON files so it survives restarts.

pub mod config;
pub mod persistence;
pub mod recording;
pub mod rules;
pub mod server;

pub use config::Config;
pub use recording::{RecordedRequest, RequestStore};
pub use rules::{Rule, RuleMatcher, RuleStore};
pub use server::{AppState, MockServer};
