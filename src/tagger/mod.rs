//! The `DomainTagger` facade
//!
//! Owns the hot-reloadable rule engine and the pending-decision store, and
//! exposes the two entry points the host wires its event source into:
//!
//! - [`DomainTagger::on_handshake`] at early-connection time: decide the rule
//!   for the requested hostname and record it, keyed by whatever identity is
//!   available.
//! - [`DomainTagger::on_session_established`] once the definitive identity is
//!   known: reunite the session with its decision.
//!
//! Application of the decision is deliberately deferred (the host's outbound
//! channel needs a moment after session establishment), so resolution returns
//! a [`ResolvedDecision`] carrying the configured delay. Hosts with their own
//! scheduler call [`DomainTagger::apply`] after that delay; tokio hosts can
//! use [`DomainTagger::spawn_apply`].

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::{Config, RuleRecord};
use crate::host;
use crate::pending::{PendingStore, SessionId};
use crate::rules::{Rule, RuleTable, RuleTableBuilder, TagEngine};
use crate::session::{self, CommandSink, SessionLabels, TagOutcome, TagPolicy};

/// Hostname-resolution event data, delivered once per connection attempt
/// before identity is finalized.
#[derive(Debug, Clone, Default)]
pub struct Handshake {
    /// Definitive session identity, when the handshake already carries one.
    pub strong_id: Option<SessionId>,

    /// Origin socket address, the weak correlation fallback.
    pub origin_addr: Option<String>,

    /// Already-parsed requested hostname, if the event source provides one.
    pub server_hostname: Option<String>,

    /// Raw original handshake string; its first NUL-delimited field often
    /// carries the requested host when `server_hostname` is absent.
    pub original_handshake: Option<String>,
}

/// A decision reunited with its session, plus the delay the host should
/// schedule [`DomainTagger::apply`] with.
#[derive(Debug, Clone)]
pub struct ResolvedDecision {
    /// The rule to apply; the unmapped sentinel when nothing was recorded.
    pub rule: Rule,

    /// Configured post-resolution apply delay.
    pub delay: Duration,
}

/// Result of an administrative reload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReloadSummary {
    /// Rules in the new table.
    pub rules: usize,
    /// Distinct known tags in the new table.
    pub known_tags: usize,
    /// Records skipped for an unusable host.
    pub skipped: usize,
    /// Version of the new table.
    pub version: u64,
}

/// The core context object: rule engine + pending store + options.
///
/// Constructor-injected and explicitly threaded; no ambient globals. Safe to
/// share across threads behind an `Arc`.
///
/// # Example
///
/// ```
/// use domain_tags::config::{Config, RuleRecord};
/// use domain_tags::tagger::{DomainTagger, Handshake};
/// use uuid::Uuid;
///
/// let mut config = Config::default_config();
/// config.rules.push(RuleRecord {
///     host: "vip.example.com".into(),
///     tag: Some("vip".into()),
///     message: None,
/// });
/// let tagger = DomainTagger::from_config(&config);
///
/// let session = Uuid::new_v4();
/// tagger.on_handshake(&Handshake {
///     strong_id: Some(session),
///     server_hostname: Some("vip.example.com".into()),
///     ..Handshake::default()
/// });
///
/// let decision = tagger.on_session_established(session, None);
/// assert_eq!(decision.rule.tag.as_deref(), Some("vip"));
/// ```
pub struct DomainTagger {
    engine: TagEngine,
    pending: PendingStore,
    policy: TagPolicy,
    apply_delay: Duration,
}

impl DomainTagger {
    /// Create a tagger from explicit parts.
    #[must_use]
    pub fn new(
        table: RuleTable,
        policy: TagPolicy,
        apply_delay: Duration,
        pending_ttl: Duration,
    ) -> Self {
        Self {
            engine: TagEngine::new(table),
            pending: PendingStore::new(pending_ttl),
            policy,
            apply_delay,
        }
    }

    /// Create a tagger from configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        let (table, _) = build_table(&config.rules, 1);
        info!(
            rules = table.len(),
            known_tags = table.known_tags().len(),
            "rule table built"
        );
        Self::new(
            table,
            config.options.policy(),
            config.options.apply_delay(),
            config.options.pending_ttl(),
        )
    }

    /// The hot-reloadable rule engine (for diagnostics and tests).
    #[must_use]
    pub fn engine(&self) -> &TagEngine {
        &self.engine
    }

    /// The pending-decision store (for diagnostics and tests).
    #[must_use]
    pub fn pending(&self) -> &PendingStore {
        &self.pending
    }

    /// Early-connection entry point: decide the rule for the requested
    /// hostname and record it for the eventual session.
    ///
    /// An unusable hostname decides the unmapped sentinel rather than
    /// failing, so the resolving session still consumes exactly one
    /// decision. Returns the decided rule for observability.
    pub fn on_handshake(&self, hs: &Handshake) -> Rule {
        let rule = match host::requested_host(
            hs.server_hostname.as_deref(),
            hs.original_handshake.as_deref(),
        ) {
            Some(requested) => {
                let rule = self.engine.lookup(&requested);
                if rule.is_unmapped() {
                    debug!(host = %requested, "no rule for requested host");
                } else {
                    debug!(host = %requested, tag = ?rule.tag, "matched rule for requested host");
                }
                rule
            }
            None => {
                warn!("could not determine requested host from handshake, treating as unmapped");
                Rule::UNMAPPED
            }
        };

        let weak = hs.origin_addr.as_deref().map(weak_key);
        self.pending.record(hs.strong_id, weak.as_deref(), rule.clone());
        rule
    }

    /// Session-established entry point: claim the pending decision for this
    /// session. Synchronous, never blocks; always yields a rule (possibly
    /// the unmapped sentinel).
    #[must_use]
    pub fn on_session_established(
        &self,
        id: SessionId,
        origin_addr: Option<&str>,
    ) -> ResolvedDecision {
        let weak = origin_addr.map(weak_key);
        let rule = self.pending.resolve(id, weak.as_deref());
        ResolvedDecision {
            rule,
            delay: self.apply_delay,
        }
    }

    /// Apply a resolved decision to a session: minimal label mutations under
    /// the configured policy, then best-effort message dispatch.
    ///
    /// Known tags come from the table version current at apply time.
    pub fn apply(
        &self,
        decision: &ResolvedDecision,
        labels: &mut dyn SessionLabels,
        display_name: &str,
        sink: &dyn CommandSink,
    ) -> TagOutcome {
        let table = self.engine.load();
        session::apply(
            &decision.rule,
            labels,
            table.known_tags(),
            &self.policy,
            display_name,
            sink,
        )
    }

    /// Deferred apply for tokio hosts: sleeps the decision's delay, then
    /// applies. Cooperative scheduling, not a blocking wait.
    pub fn spawn_apply(
        self: &Arc<Self>,
        decision: ResolvedDecision,
        mut labels: Box<dyn SessionLabels + Send>,
        display_name: String,
        sink: Arc<dyn CommandSink + Send + Sync>,
    ) -> tokio::task::JoinHandle<TagOutcome> {
        let tagger = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep(decision.delay).await;
            tagger.apply(&decision, labels.as_mut(), &display_name, sink.as_ref())
        })
    }

    /// Administrative reload: atomically swap in a freshly built rule table.
    ///
    /// Safe to call while connection attempts are in flight; their decisions
    /// keep referencing whichever table version was current when they read
    /// it. Permission gating is the host's concern.
    pub fn reload(&self, records: &[RuleRecord]) -> ReloadSummary {
        let version = self.engine.version() + 1;
        let (table, skipped) = build_table(records, version);
        let summary = ReloadSummary {
            rules: table.len(),
            known_tags: table.known_tags().len(),
            skipped,
            version,
        };
        info!(
            rules = summary.rules,
            known_tags = summary.known_tags,
            skipped = summary.skipped,
            version = summary.version,
            "rule table reloaded"
        );
        self.engine.reload(table);
        summary
    }

    /// Reload from a full configuration's rules list.
    pub fn reload_from_config(&self, config: &Config) -> ReloadSummary {
        self.reload(&config.rules)
    }
}

impl std::fmt::Debug for DomainTagger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DomainTagger")
            .field("engine", &self.engine)
            .field("pending_strong", &self.pending.strong_len())
            .field("pending_weak", &self.pending.weak_len())
            .field("apply_delay", &self.apply_delay)
            .finish()
    }
}

/// Weak correlation keys are compared case-insensitively and without
/// surrounding whitespace, on both the record and resolve sides.
fn weak_key(addr: &str) -> String {
    addr.trim().to_ascii_lowercase()
}

fn build_table(records: &[RuleRecord], version: u64) -> (RuleTable, usize) {
    let mut builder = RuleTableBuilder::new().version(version);
    for record in records {
        builder = builder.add(&record.host, record.tag.as_deref(), record.message.as_deref());
    }
    let skipped = builder.skipped();
    (builder.build(), skipped)
}
