//! Pending-decision correlation store
//!
//! A rule is decided at early-connection time, before the session's
//! definitive identity is known, and must be reunited with the right session
//! once it resolves. This store holds those in-flight decisions:
//!
//! - **strong-keyed**: by session id, when the handshake already carries one.
//!   One pending decision per session; claimed exactly once at resolution.
//! - **weak-keyed**: by origin address, when it does not. Simultaneous
//!   attempts from one address queue up in FIFO order and expire after a TTL
//!   so a stale decision never attaches to an unrelated later session.
//!
//! Per-connection state machine: Decided → Claimed, or (weak path only)
//! Decided → Expired. Pruning is lazy, on the next record or resolve that
//! touches the same address queue.
//!
//! Both maps are `DashMap`s: operations on different keys never block one
//! another, and a queue is only ever mutated under its own entry guard, so a
//! record followed by a resolve for the same key is linearizable.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::rules::Rule;

/// Strong identity of a connecting session, available once authentication
/// completes.
pub type SessionId = Uuid;

/// A weak-keyed pending decision awaiting its session.
#[derive(Debug, Clone)]
struct PendingEntry {
    created: Instant,
    rule: Rule,
}

impl PendingEntry {
    fn is_expired(&self, ttl: Duration) -> bool {
        self.created.elapsed() > ttl
    }
}

/// Concurrent store of rule decisions awaiting session resolution.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use domain_tags::pending::PendingStore;
/// use domain_tags::rules::Rule;
/// use uuid::Uuid;
///
/// let store = PendingStore::new(Duration::from_secs(30));
/// let session = Uuid::new_v4();
///
/// store.record(Some(session), None, Rule::new(Some("vip"), None));
///
/// // claimed exactly once
/// assert_eq!(store.resolve(session, None).tag.as_deref(), Some("vip"));
/// assert!(store.resolve(session, None).is_unmapped());
/// ```
#[derive(Debug)]
pub struct PendingStore {
    /// session id → rule decided at handshake (when the id was available)
    by_session: DashMap<SessionId, Rule>,

    /// origin address → FIFO queue of timestamped decisions (fallback when
    /// the handshake carried no session id)
    by_addr: DashMap<String, VecDeque<PendingEntry>>,

    /// maximum age a weak-keyed decision may reach before it is discarded
    ttl: Duration,
}

impl PendingStore {
    /// Create a store with the given weak-key TTL.
    ///
    /// The TTL is taken as-is; configuration applies the safety floor before
    /// it gets here (see [`crate::config::TagOptions::pending_ttl`]).
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            by_session: DashMap::new(),
            by_addr: DashMap::new(),
            ttl,
        }
    }

    /// Record a decision at early-connection time.
    ///
    /// Preference order: a strong id stores (or overwrites) the one pending
    /// decision for that session; otherwise the decision is appended to the
    /// weak queue for `origin_addr`, pruning expired head entries first. With
    /// neither key the decision is unrecoverable (no session could ever
    /// claim it) and is dropped with a warning.
    pub fn record(&self, strong: Option<SessionId>, weak: Option<&str>, rule: Rule) {
        if let Some(id) = strong {
            self.by_session.insert(id, rule);
            return;
        }

        let Some(addr) = weak.filter(|a| !a.trim().is_empty()) else {
            warn!("pending decision has neither session id nor origin address, dropping");
            return;
        };

        let mut queue = self.by_addr.entry(addr.to_string()).or_default();
        Self::prune(&mut queue, self.ttl);
        queue.push_back(PendingEntry {
            created: Instant::now(),
            rule,
        });
        debug!(addr, queued = queue.len(), "recorded pending decision by origin address");
    }

    /// Claim the decision for a resolving session.
    ///
    /// The strong map is authoritative: its entry, if any, is removed and
    /// returned and the weak queue is left untouched. Otherwise the oldest
    /// surviving entry of the address queue is popped (expired heads pruned
    /// first, the queue removed once empty). If both miss, the unmapped
    /// sentinel is returned, so the result is always a usable rule.
    ///
    /// Weak-key caveat: when two unrelated clients share an origin address
    /// (NAT) within the TTL, FIFO order can attribute the first decision to
    /// the second session. Inherited from the source design.
    #[must_use]
    pub fn resolve(&self, strong: SessionId, weak: Option<&str>) -> Rule {
        if let Some((_, rule)) = self.by_session.remove(&strong) {
            return rule;
        }

        let Some(addr) = weak.filter(|a| !a.trim().is_empty()) else {
            return Rule::UNMAPPED;
        };

        let popped = {
            let Some(mut queue) = self.by_addr.get_mut(addr) else {
                return Rule::UNMAPPED;
            };
            Self::prune(&mut queue, self.ttl);
            queue.pop_front()
        };

        // no empty-queue litter; re-checked under the entry lock
        self.by_addr.remove_if(addr, |_, q| q.is_empty());

        match popped {
            Some(entry) => {
                debug!(addr, "claimed pending decision by origin address");
                entry.rule
            }
            None => Rule::UNMAPPED,
        }
    }

    /// Drop a never-claimed strong-keyed decision, e.g. when the owning
    /// connection attempt dies before its session resolves.
    pub fn clear_session(&self, id: SessionId) {
        self.by_session.remove(&id);
    }

    /// Number of strong-keyed decisions currently awaiting resolution.
    #[must_use]
    pub fn strong_len(&self) -> usize {
        self.by_session.len()
    }

    /// Number of origin addresses with a non-empty pending queue.
    #[must_use]
    pub fn weak_len(&self) -> usize {
        self.by_addr.len()
    }

    /// Drop expired entries from the head of a queue.
    fn prune(queue: &mut VecDeque<PendingEntry>, ttl: Duration) {
        while queue.front().is_some_and(|e| e.is_expired(ttl)) {
            queue.pop_front();
        }
    }
}
