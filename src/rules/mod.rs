//! Rule table and hot-reloadable tag engine
//!
//! A [`RuleTable`] is an immutable snapshot mapping canonical hostnames to
//! [`Rule`]s, built wholesale from an ordered list of records. The
//! [`TagEngine`] wraps the current snapshot in an `ArcSwap` so lookups are
//! lock-free and reloads are a single atomic pointer swap.

pub mod engine;
pub mod table;

pub use engine::TagEngine;
pub use table::{Rule, RuleTable, RuleTableBuilder, TagDirective};
