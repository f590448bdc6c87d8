//! Hot-reloadable tag engine
//!
//! Wraps the current [`RuleTable`] snapshot in an `ArcSwap` so lookups from
//! connection-attempt threads are lock-free while an administrative reload
//! swaps in a freshly built table atomically. In-flight decisions keep
//! referencing whichever snapshot was current when they read it; readers
//! never observe a partially built table.
//!
//! ```text
//! Handshake ──▶ TagEngine::lookup() ──▶ ArcSwap::load() ──▶ RuleTable
//!                                            │
//!                                      (lock-free read)
//!
//! Reload ──▶ TagEngine::reload() ──▶ ArcSwap::store() ──▶ old table dropped
//!                                          │                when readers finish
//!                                    (atomic swap)
//! ```

use std::sync::Arc;

use arc_swap::{ArcSwap, Guard};

use super::table::{Rule, RuleTable};

/// Hot-reloadable wrapper around the current rule table.
///
/// Safe to share across threads. Reads never block writes and reloads are
/// wait-free.
///
/// # Example
///
/// ```
/// use domain_tags::rules::{RuleTableBuilder, TagEngine};
///
/// let engine = TagEngine::new(
///     RuleTableBuilder::new()
///         .add("vip.example.com", Some("vip"), None)
///         .version(1)
///         .build(),
/// );
///
/// let rule = engine.lookup("vip.example.com");
/// assert_eq!(rule.tag.as_deref(), Some("vip"));
///
/// engine.reload(RuleTableBuilder::new().version(2).build());
/// assert!(engine.lookup("vip.example.com").is_unmapped());
/// assert_eq!(engine.version(), 2);
/// ```
pub struct TagEngine {
    table: ArcSwap<RuleTable>,
}

impl TagEngine {
    /// Create an engine with an initial table snapshot.
    #[must_use]
    pub fn new(table: RuleTable) -> Self {
        Self {
            table: ArcSwap::from_pointee(table),
        }
    }

    /// Get the current snapshot (lock-free read).
    ///
    /// The returned guard keeps the snapshot alive; useful when several
    /// lookups must see one consistent table version.
    pub fn load(&self) -> Guard<Arc<RuleTable>> {
        self.table.load()
    }

    /// Look up the rule for a canonical hostname.
    ///
    /// Clones the rule out of the snapshot so the caller owns a value that
    /// stays valid across a concurrent reload. Misses return the unmapped
    /// sentinel.
    #[must_use]
    pub fn lookup(&self, normalized_host: &str) -> Rule {
        self.table.load().lookup(normalized_host).clone()
    }

    /// Atomically swap in a new table. The old snapshot is dropped once the
    /// last in-flight reader releases it.
    pub fn reload(&self, table: RuleTable) {
        self.table.store(Arc::new(table));
    }

    /// Version of the current snapshot.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.table.load().version()
    }
}

impl std::fmt::Debug for TagEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let table = self.table.load();
        f.debug_struct("TagEngine")
            .field("version", &table.version())
            .field("rules", &table.len())
            .field("known_tags", &table.known_tags().len())
            .finish()
    }
}
