//! Mock rules: storage and selection.
//!
//! - `types`: the `Rule` definition
//! - `store`: `RuleStore`, the concurrent rule set persisted to `rules.json`
//! - `matcher`: compiled path predicates and `RuleMatcher`, which picks the
//!   single best rule for a request

mod matcher;
mod store;
mod types;

pub use matcher::{find_best_match, strip_mount_prefix, CompiledRule, PathMatcher, RuleMatcher};
pub use store::{RuleStore, RULES_FILE};
pub use types::{Rule, WILDCARD};
