//! Rule store with `rules.json` snapshot persistence.

use super::matcher::{find_best_match, CompiledRule};
use super::types::Rule;
use crate::persistence::SnapshotFile;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{error, info, warn};

pub const RULES_FILE: &str = "rules.json";
const ID_PREFIX: &str = "rule_";

/// Concurrent set of rules keyed by ID.
///
/// Every mutation rewrites the snapshot before returning. Write failures are
/// logged and do not roll back the in-memory change.
pub struct RuleStore {
    rules: RwLock<HashMap<String, CompiledRule>>,
    /// Next auto-assigned rule number
    id_counter: AtomicU64,
    /// Insertion order, used for list ordering and match tie-breaks
    seq_counter: AtomicU64,
    snapshot: SnapshotFile,
    /// Serializes snapshot rewrites so the file is never interleaved
    write_lock: Mutex<()>,
}

impl RuleStore {
    /// Open the store in `dir`, reloading `rules.json` if present.
    pub fn open(dir: impl AsRef<Path>) -> Self {
        let store = Self {
            rules: RwLock::new(HashMap::new()),
            id_counter: AtomicU64::new(1),
            seq_counter: AtomicU64::new(0),
            snapshot: SnapshotFile::new(dir.as_ref(), RULES_FILE),
            write_lock: Mutex::new(()),
        };
        if let Err(e) = store.snapshot.ensure_dir() {
            error!("Failed to create rules directory: {}", e);
        }
        store.reload();
        store
    }

    fn reload(&self) {
        let loaded: Vec<Rule> = match self.snapshot.load() {
            Ok(Some(rules)) => rules,
            Ok(None) => {
                info!("No rules file found, starting with empty rules");
                return;
            }
            Err(e) => {
                error!("Failed to load rules from file: {}", e);
                return;
            }
        };

        let count = loaded.len();
        let mut rules = self.rules.write();
        for rule in loaded {
            self.reserve_id(&rule.id);
            let seq = self.next_seq();
            rules.insert(rule.id.clone(), CompiledRule::compile(rule, seq));
        }
        info!("Loaded {} rules from file", count);
    }

    fn next_seq(&self) -> u64 {
        self.seq_counter.fetch_add(1, Ordering::SeqCst)
    }

    /// Keep future auto-assigned IDs past a numbered ID already in use.
    fn reserve_id(&self, id: &str) {
        if let Some(n) = parse_rule_number(id) {
            self.id_counter
                .fetch_max(n.saturating_add(1), Ordering::SeqCst);
        }
    }

    /// Next counter ID not held by a stored rule. Caller holds the write lock.
    fn next_free_id(&self, rules: &HashMap<String, CompiledRule>) -> String {
        loop {
            let id = format!("{ID_PREFIX}{}", self.id_counter.fetch_add(1, Ordering::SeqCst));
            if !rules.contains_key(&id) {
                return id;
            }
        }
    }

    /// Store a rule, assigning an ID when the caller left it blank.
    ///
    /// A caller-supplied ID replaces any rule already stored under it.
    pub fn add(&self, mut rule: Rule) -> Rule {
        let assign_id = rule.id.trim().is_empty();
        if !assign_id {
            self.reserve_id(&rule.id);
        }
        let (stored, replaced) = {
            let mut rules = self.rules.write();
            if assign_id {
                rule.id = self.next_free_id(&rules);
            }
            let stored = rule.clone();
            let seq = self.next_seq();
            let replaced = rules
                .insert(rule.id.clone(), CompiledRule::compile(rule, seq))
                .is_some();
            (stored, replaced)
        };
        if replaced {
            warn!("Rule {} replaced an existing rule with the same ID", stored.id);
        }
        self.persist();
        info!(
            "Added rule: {} ({} {})",
            stored.name, stored.method, stored.path
        );
        stored
    }

    /// Remove a rule by ID. Returns false (and touches nothing) if absent.
    pub fn remove(&self, id: &str) -> bool {
        let removed = self.rules.write().remove(id).is_some();
        if removed {
            self.persist();
        }
        info!("Removed rule: {} -> {}", id, removed);
        removed
    }

    pub fn get(&self, id: &str) -> Option<Rule> {
        self.rules.read().get(id).map(|r| Rule::clone(&r.rule))
    }

    /// All rules by ascending priority, insertion order within a priority.
    pub fn list(&self) -> Vec<Rule> {
        let mut entries: Vec<(i32, u64, Rule)> = self
            .rules
            .read()
            .values()
            .map(|r| (r.rule.priority, r.seq, Rule::clone(&r.rule)))
            .collect();
        entries.sort_by_key(|(priority, seq, _)| (*priority, *seq));
        entries.into_iter().map(|(_, _, rule)| rule).collect()
    }

    pub fn clear(&self) {
        info!("Clearing all rules");
        self.rules.write().clear();
        self.persist();
    }

    pub fn count(&self) -> usize {
        self.rules.read().len()
    }

    /// Best rule for an already-normalized path, evaluated under the read lock.
    pub(crate) fn best_match(&self, method: &str, path: &str) -> Option<Rule> {
        let rules = self.rules.read();
        find_best_match(rules.values(), method, path).map(|r| Rule::clone(&r.rule))
    }

    fn persist(&self) {
        let _guard = self.write_lock.lock();
        let rules = self.list();
        match self.snapshot.save(&rules) {
            Ok(()) => info!("Saved {} rules to file", rules.len()),
            Err(e) => error!("Failed to save rules to file: {}", e),
        }
    }
}

/// Numeric part of an auto-assigned ID (`rule_7` -> 7).
fn parse_rule_number(id: &str) -> Option<u64> {
    id.strip_prefix(ID_PREFIX)?.parse().ok()
}
