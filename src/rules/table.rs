//! Rule values and the immutable rule table snapshot
//!
//! # Rule semantics
//!
//! - `tag` absent: no explicit directive, treated as unmapped for tagging
//! - `tag` blank: clear every known tag from the session
//! - `tag` non-blank: ensure exactly this tag is present
//!
//! The [`Rule::UNMAPPED`] sentinel stands in for "no rule" everywhere, so
//! lookup paths are total functions and call sites never branch on `None`.

use std::collections::{BTreeSet, HashMap};

use tracing::{debug, warn};

use crate::host;

/// A single hostname rule: an optional tag directive and an optional
/// templated side-effect command.
///
/// # Example
///
/// ```
/// use domain_tags::rules::{Rule, TagDirective};
///
/// let rule = Rule::new(Some("vip"), Some("broadcast %player% joined VIP"));
/// assert!(matches!(rule.directive(), TagDirective::Ensure("vip")));
/// assert!(!rule.is_unmapped());
/// assert!(Rule::UNMAPPED.is_unmapped());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    /// Tag directive. See [`TagDirective`] for the three-way semantics.
    pub tag: Option<String>,

    /// Command template with a `%player%` placeholder, dispatched after the
    /// session resolves. Opaque to this crate.
    pub message: Option<String>,
}

/// Sentinel table value returned when no entry matches. Lives in a `static`
/// so [`RuleTable::lookup`] can hand out a reference on the miss path.
static UNMAPPED: Rule = Rule::UNMAPPED;

impl Rule {
    /// The distinguished "no rule" value: no tag directive, no message.
    pub const UNMAPPED: Rule = Rule {
        tag: None,
        message: None,
    };

    /// Create a rule from optional tag and message strings.
    #[must_use]
    pub fn new(tag: Option<&str>, message: Option<&str>) -> Self {
        Self {
            tag: tag.map(str::to_string),
            message: message.map(str::to_string),
        }
    }

    /// Whether this rule carries neither a tag directive nor a message.
    #[must_use]
    pub fn is_unmapped(&self) -> bool {
        self.tag.is_none() && self.message.is_none()
    }

    /// The tag directive this rule expresses.
    #[must_use]
    pub fn directive(&self) -> TagDirective<'_> {
        match self.tag.as_deref() {
            None => TagDirective::Unmapped,
            Some(t) if t.trim().is_empty() => TagDirective::ClearAll,
            Some(t) => TagDirective::Ensure(t),
        }
    }
}

/// Three-way view of a rule's tag field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagDirective<'a> {
    /// No explicit directive (absent tag).
    Unmapped,
    /// Blank tag: remove every known tag from the session.
    ClearAll,
    /// Non-blank tag: ensure exactly this tag is present.
    Ensure(&'a str),
}

/// Immutable snapshot of the hostname → rule mapping.
///
/// Built atomically by [`RuleTableBuilder`]; readers holding an old snapshot
/// keep seeing a consistent view after a reload. Keys are canonical
/// hostnames (lowercase, no port, no trailing dot).
#[derive(Debug, Default)]
pub struct RuleTable {
    rules: HashMap<String, Rule>,
    known_tags: BTreeSet<String>,
    version: u64,
}

impl RuleTable {
    /// Create an empty table (every lookup returns the unmapped sentinel).
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Exact-match lookup by canonical hostname.
    ///
    /// Returns the [`Rule::UNMAPPED`] sentinel when no entry matches, so the
    /// result is always a usable rule value.
    ///
    /// # Example
    ///
    /// ```
    /// use domain_tags::rules::RuleTableBuilder;
    ///
    /// let table = RuleTableBuilder::new()
    ///     .add("vip.example.com", Some("vip"), None)
    ///     .build();
    ///
    /// assert_eq!(table.lookup("vip.example.com").tag.as_deref(), Some("vip"));
    /// assert!(table.lookup("other.example.com").is_unmapped());
    /// ```
    #[must_use]
    pub fn lookup(&self, normalized_host: &str) -> &Rule {
        self.rules.get(normalized_host).unwrap_or(&UNMAPPED)
    }

    /// The set of all distinct non-blank tags referenced by any rule.
    ///
    /// Used to implement "exclusive" and "clear all" label semantics without
    /// enumerating arbitrary external labels.
    #[must_use]
    pub fn known_tags(&self) -> &BTreeSet<String> {
        &self.known_tags
    }

    /// Number of rules in this snapshot.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether this snapshot has no rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Snapshot version, for logging and reload reporting.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }
}

/// Builder for [`RuleTable`].
///
/// Entries are applied in order; a later entry for the same canonical host
/// overwrites an earlier one. Entries with a blank or unusable host are
/// skipped with a warning, never fatal.
#[derive(Debug, Default)]
pub struct RuleTableBuilder {
    rules: HashMap<String, Rule>,
    known_tags: BTreeSet<String>,
    version: u64,
    skipped: usize,
}

impl RuleTableBuilder {
    /// Create a new empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the snapshot version.
    #[must_use]
    pub fn version(mut self, version: u64) -> Self {
        self.version = version;
        self
    }

    /// Add a rule record. The host is normalized before insertion; records
    /// with an unusable host are skipped (counted, reported, not fatal).
    #[must_use]
    pub fn add(mut self, raw_host: &str, tag: Option<&str>, message: Option<&str>) -> Self {
        let Some(key) = host::normalize(raw_host) else {
            warn!(host = raw_host, "skipping rule with missing/blank host");
            self.skipped += 1;
            return self;
        };

        if let Some(t) = tag {
            if !t.trim().is_empty() {
                self.known_tags.insert(t.to_string());
            }
        }

        if self.rules.insert(key.clone(), Rule::new(tag, message)).is_some() {
            debug!(host = %key, "duplicate rule host, last entry wins");
        }
        self
    }

    /// Number of records skipped so far because their host was unusable.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Build the immutable table snapshot.
    #[must_use]
    pub fn build(self) -> RuleTable {
        RuleTable {
            rules: self.rules,
            known_tags: self.known_tags,
            version: self.version,
        }
    }
}
