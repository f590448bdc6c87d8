//! Shared fixtures: an in-memory session and a recording command sink.

use std::collections::BTreeSet;
use std::sync::Mutex;

use domain_tags::config::{Config, RuleRecord};
use domain_tags::{CommandSink, SessionLabels};

/// In-memory label set standing in for a host session.
#[derive(Debug, Default)]
pub struct FakeSession {
    labels: BTreeSet<String>,
}

impl FakeSession {
    pub fn with_labels(labels: &[&str]) -> Self {
        Self {
            labels: labels.iter().map(|l| (*l).to_string()).collect(),
        }
    }

    pub fn labels(&self) -> Vec<String> {
        self.labels.iter().cloned().collect()
    }
}

impl SessionLabels for FakeSession {
    fn has_label(&self, name: &str) -> bool {
        self.labels.contains(name)
    }

    fn add_label(&mut self, name: &str) {
        self.labels.insert(name.to_string());
    }

    fn remove_label(&mut self, name: &str) {
        self.labels.remove(name);
    }
}

/// Command sink that records every dispatched command.
#[derive(Debug, Default)]
pub struct ConsoleSink {
    commands: Mutex<Vec<String>>,
    pub fail: bool,
}

impl ConsoleSink {
    pub fn failing() -> Self {
        Self {
            commands: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }
}

impl CommandSink for ConsoleSink {
    fn dispatch(&self, command: &str) -> bool {
        self.commands.lock().unwrap().push(command.to_string());
        !self.fail
    }
}

/// A config with one tagging rule, one clear rule, and one message-only rule.
pub fn sample_config() -> Config {
    let mut config = Config::default_config();
    config.rules = vec![
        RuleRecord {
            host: "vip.example.com".into(),
            tag: Some("vip".into()),
            message: Some("broadcast %player% joined VIP".into()),
        },
        RuleRecord {
            host: "staff.example.com".into(),
            tag: Some("staff".into()),
            message: None,
        },
        RuleRecord {
            host: "plain.example.com".into(),
            tag: Some("".into()),
            message: None,
        },
        RuleRecord {
            host: "greet.example.com".into(),
            tag: None,
            message: Some("tellraw %player% welcome".into()),
        },
    ];
    config
}
