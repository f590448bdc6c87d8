//! domain-tags: hostname-to-tag rule engine with pending-decision correlation
//!
//! This crate maps the hostname a client used to reach a multi-domain game
//! server (SNI / virtual-host style routing) onto a small set of declarative
//! actions: ensure a label is present on the session, clear labels, and
//! optionally dispatch a templated side-effect command.
//!
//! The interesting part is the correlation engine: rules are decided at
//! early-connection time, before the session's definitive identity is known,
//! and must be reunited with the correct session once it resolves, under
//! concurrent connection attempts, partial identity information, and bounded
//! time windows.
//!
//! # Architecture
//!
//! ```text
//! Handshake ─▶ host::requested_host() ─▶ TagEngine::lookup() ─▶ PendingStore::record()
//!                                                                      │
//! Session established ─▶ PendingStore::resolve() ─▶ apply_rule() ◀─────┘
//!                                                        │
//!                                            label mutations + command dispatch
//! ```
//!
//! # Quick Start
//!
//! ```
//! use domain_tags::config::{Config, RuleRecord};
//! use domain_tags::tagger::{DomainTagger, Handshake};
//! use uuid::Uuid;
//!
//! let mut config = Config::default_config();
//! config.rules.push(RuleRecord {
//!     host: "vip.example.com".into(),
//!     tag: Some("vip".into()),
//!     message: Some("broadcast %player% joined VIP".into()),
//! });
//!
//! let tagger = DomainTagger::from_config(&config);
//! let session = Uuid::new_v4();
//!
//! // Early-connection event: decide and record the rule.
//! tagger.on_handshake(&Handshake {
//!     strong_id: Some(session),
//!     origin_addr: Some("203.0.113.7".into()),
//!     server_hostname: Some("VIP.Example.COM:25565".into()),
//!     original_handshake: None,
//! });
//!
//! // Session-established event: reunite the decision with the session.
//! let decision = tagger.on_session_established(session, None);
//! assert_eq!(decision.rule.tag.as_deref(), Some("vip"));
//! ```
//!
//! # Modules
//!
//! - [`host`]: hostname normalization (pure, total)
//! - [`rules`]: rule table snapshots and the hot-reloadable [`rules::TagEngine`]
//! - [`pending`]: the pending-decision correlation store
//! - [`session`]: label/command collaborator traits and the action applicator
//! - [`tagger`]: the [`tagger::DomainTagger`] facade tying it all together
//! - [`config`]: serde configuration types and loading

pub mod config;
pub mod error;
pub mod host;
pub mod pending;
pub mod rules;
pub mod session;
pub mod tagger;

pub use error::ConfigError;
pub use pending::{PendingStore, SessionId};
pub use rules::{Rule, RuleTable, TagEngine};
pub use session::{CommandSink, SessionLabels, TagOutcome, TagPolicy};
pub use tagger::{DomainTagger, Handshake, ResolvedDecision};

/// Crate version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
