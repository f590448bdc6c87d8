//! Session collaborators and the action applicator
//!
//! The core never talks to a host framework directly. Label mutations go
//! through [`SessionLabels`] and side-effect commands through [`CommandSink`];
//! hosts implement both over whatever session object they have.
//!
//! [`apply_rule`] turns a resolved rule plus the session's current label set
//! into the minimal set of additions/removals, under one of two policies:
//!
//! - [`TagPolicy::Single`]: one configured label toggled on/off by whether
//!   the host mapped to a rule at all.
//! - [`TagPolicy::MultiTag`]: per-rule labels over the known-tags set, with
//!   optional exclusive and clear-all-on-unmapped behavior.

use std::collections::BTreeSet;

use tracing::{debug, info, warn};

use crate::rules::{Rule, TagDirective};

/// Label mutation surface of a session. Implementations must be idempotent
/// and observable via `has_label`.
pub trait SessionLabels {
    /// Whether the session currently carries `name`.
    fn has_label(&self, name: &str) -> bool;

    /// Add `name`; a no-op if already present.
    fn add_label(&mut self, name: &str);

    /// Remove `name`; a no-op if absent.
    fn remove_label(&mut self, name: &str);
}

/// Opaque command dispatch. Returns whether the host accepted the command;
/// failure is reported by the caller, never propagated.
pub trait CommandSink {
    fn dispatch(&self, command: &str) -> bool;
}

/// How resolved rules translate into label mutations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagPolicy {
    /// One configured label for the whole table: any mapped non-blank tag
    /// directive adds it, a blank directive removes it, and unmapped
    /// optionally removes it.
    Single {
        /// The label to toggle.
        tag_name: String,
        /// Remove the label when the session resolved to no rule.
        remove_on_unmapped: bool,
    },

    /// Per-rule labels over the known-tags set.
    MultiTag {
        /// When ensuring a tag, first remove every other known tag.
        exclusive: bool,
        /// When the rule is unmapped, remove every known tag instead of
        /// doing nothing.
        clear_all_known_on_unmapped: bool,
    },
}

/// Label mutations performed by [`apply_rule`], for logging and tests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagOutcome {
    /// Label added, if any.
    pub added: Option<String>,
    /// Labels removed, in deterministic (sorted) order.
    pub removed: Vec<String>,
}

impl TagOutcome {
    /// Whether no label changed.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.added.is_none() && self.removed.is_empty()
    }
}

/// Apply a resolved rule to a session's label set.
///
/// Computes and performs the minimal mutations: labels are only added when
/// absent and removed when present, so applying the same rule twice leaves
/// the label set unchanged.
///
/// # Example
///
/// ```
/// use std::collections::BTreeSet;
/// use domain_tags::rules::Rule;
/// use domain_tags::session::{apply_rule, SessionLabels, TagPolicy};
///
/// struct Labels(BTreeSet<String>);
/// impl SessionLabels for Labels {
///     fn has_label(&self, name: &str) -> bool { self.0.contains(name) }
///     fn add_label(&mut self, name: &str) { self.0.insert(name.to_string()); }
///     fn remove_label(&mut self, name: &str) { self.0.remove(name); }
/// }
///
/// let mut labels = Labels(BTreeSet::new());
/// let known = ["vip".to_string()].into_iter().collect();
/// let policy = TagPolicy::MultiTag { exclusive: true, clear_all_known_on_unmapped: false };
///
/// let outcome = apply_rule(&Rule::new(Some("vip"), None), &mut labels, &known, &policy);
/// assert_eq!(outcome.added.as_deref(), Some("vip"));
/// assert!(labels.has_label("vip"));
/// ```
pub fn apply_rule(
    rule: &Rule,
    labels: &mut dyn SessionLabels,
    known_tags: &BTreeSet<String>,
    policy: &TagPolicy,
) -> TagOutcome {
    match policy {
        TagPolicy::Single {
            tag_name,
            remove_on_unmapped,
        } => apply_single(rule, labels, tag_name, *remove_on_unmapped),
        TagPolicy::MultiTag {
            exclusive,
            clear_all_known_on_unmapped,
        } => apply_multi(rule, labels, known_tags, *exclusive, *clear_all_known_on_unmapped),
    }
}

fn apply_single(
    rule: &Rule,
    labels: &mut dyn SessionLabels,
    tag_name: &str,
    remove_on_unmapped: bool,
) -> TagOutcome {
    let mut outcome = TagOutcome::default();

    match rule.directive() {
        TagDirective::Unmapped => {
            if remove_on_unmapped && labels.has_label(tag_name) {
                labels.remove_label(tag_name);
                outcome.removed.push(tag_name.to_string());
            }
        }
        TagDirective::ClearAll => {
            if labels.has_label(tag_name) {
                labels.remove_label(tag_name);
                outcome.removed.push(tag_name.to_string());
            }
        }
        // the rule's own tag text is irrelevant here: mapped means "on"
        TagDirective::Ensure(_) => {
            if !labels.has_label(tag_name) {
                labels.add_label(tag_name);
                outcome.added = Some(tag_name.to_string());
            }
        }
    }

    outcome
}

fn apply_multi(
    rule: &Rule,
    labels: &mut dyn SessionLabels,
    known_tags: &BTreeSet<String>,
    exclusive: bool,
    clear_all_known_on_unmapped: bool,
) -> TagOutcome {
    let mut outcome = TagOutcome::default();

    match rule.directive() {
        TagDirective::Unmapped => {
            if clear_all_known_on_unmapped {
                remove_known(labels, known_tags, None, &mut outcome.removed);
            }
        }
        TagDirective::ClearAll => {
            remove_known(labels, known_tags, None, &mut outcome.removed);
        }
        TagDirective::Ensure(target) => {
            if exclusive {
                remove_known(labels, known_tags, Some(target), &mut outcome.removed);
            }
            if !labels.has_label(target) {
                labels.add_label(target);
                outcome.added = Some(target.to_string());
            }
        }
    }

    outcome
}

/// Remove every known tag present on the session, except `keep`.
fn remove_known(
    labels: &mut dyn SessionLabels,
    known_tags: &BTreeSet<String>,
    keep: Option<&str>,
    removed: &mut Vec<String>,
) {
    for tag in known_tags {
        if keep == Some(tag.as_str()) {
            continue;
        }
        if labels.has_label(tag) {
            labels.remove_label(tag);
            removed.push(tag.clone());
        }
    }
}

/// Render a message template by substituting the `%player%` placeholder with
/// the session's display name.
#[must_use]
pub fn render_message(template: &str, display_name: &str) -> String {
    template.replace("%player%", display_name)
}

/// Dispatch a rule's message, if any, through the command sink.
///
/// Best-effort: the dispatch result is observed and logged but never raised
/// to the caller. Returns whether a command was dispatched successfully.
pub fn dispatch_message(rule: &Rule, display_name: &str, sink: &dyn CommandSink) -> bool {
    let Some(template) = rule.message.as_deref().filter(|m| !m.trim().is_empty()) else {
        return false;
    };

    let command = render_message(template, display_name);
    let ok = sink.dispatch(&command);
    if ok {
        debug!(player = display_name, %command, "dispatched rule message");
    } else {
        warn!(player = display_name, %command, "rule message dispatch failed");
    }
    ok
}

/// Apply a rule end to end: label mutations, then the optional message.
pub fn apply(
    rule: &Rule,
    labels: &mut dyn SessionLabels,
    known_tags: &BTreeSet<String>,
    policy: &TagPolicy,
    display_name: &str,
    sink: &dyn CommandSink,
) -> TagOutcome {
    let outcome = apply_rule(rule, labels, known_tags, policy);
    if !outcome.is_noop() {
        info!(
            player = display_name,
            added = ?outcome.added,
            removed = ?outcome.removed,
            "applied tag rule"
        );
    }
    dispatch_message(rule, display_name, sink);
    outcome
}
