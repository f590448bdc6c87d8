//! Configuration types for domain-tags
//!
//! Configuration is loaded from JSON and validated at startup. A missing or
//! empty rules list is a severe diagnostic but never fatal: the engine runs
//! fail-open with an empty table rather than destabilizing the host.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::error;

use crate::error::ConfigError;
use crate::session::TagPolicy;

/// Floor for the weak-key pending TTL. A misconfigured tiny TTL would expire
/// every weak-keyed decision before any session could claim it.
pub const MIN_PENDING_TTL: Duration = Duration::from_secs(5);

/// Floor for the post-resolution apply delay.
pub const MIN_APPLY_DELAY: Duration = Duration::from_millis(50);

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Ordered hostname rules; later entries overwrite earlier ones with the
    /// same canonical host.
    #[serde(default)]
    pub rules: Vec<RuleRecord>,

    /// Tagging behavior options
    #[serde(default)]
    pub options: TagOptions,
}

impl Config {
    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rules.is_empty() {
            // fail-open: reported loudly, the engine runs with no mappings
            error!("no 'rules' entries found in configuration; running with an empty rule table");
        }

        self.options.validate()
    }

    /// Create a minimal default configuration (no rules, multi-tag policy).
    #[must_use]
    pub fn default_config() -> Self {
        Self {
            rules: Vec::new(),
            options: TagOptions::default(),
        }
    }
}

/// One hostname rule record as it appears in the config file.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RuleRecord {
    /// Hostname to match; normalized before insertion.
    pub host: String,

    /// Tag directive: absent = unmapped, blank = clear all known tags,
    /// non-blank = ensure this tag.
    #[serde(default)]
    pub tag: Option<String>,

    /// Optional command template with a `%player%` placeholder.
    #[serde(default)]
    pub message: Option<String>,
}

/// Which applicator policy is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyMode {
    /// One configured label toggled by mapped/unmapped.
    Single,
    /// Per-rule labels over the known-tags set.
    #[default]
    Multi,
}

/// Scalar tagging options
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TagOptions {
    /// Applicator policy selector.
    #[serde(default)]
    pub mode: PolicyMode,

    /// Single mode: the label to toggle.
    #[serde(default = "default_tag_name")]
    pub tag_name: String,

    /// Single mode: remove the label when the session resolved unmapped.
    #[serde(default)]
    pub remove_on_unmapped: bool,

    /// Multi mode: only one known tag at a time.
    #[serde(default = "default_true")]
    pub exclusive: bool,

    /// Multi mode: unmapped sessions lose every known tag.
    #[serde(default)]
    pub clear_all_known_on_unmapped: bool,

    /// Delay between session establishment and rule application, in
    /// milliseconds. The host's outbound channel needs a moment before
    /// dispatched commands can reach the player.
    #[serde(default = "default_message_delay_ms")]
    pub message_delay_ms: u64,

    /// Maximum age of an unclaimed weak-keyed pending decision, in
    /// milliseconds. Clamped to [`MIN_PENDING_TTL`].
    #[serde(default = "default_pending_ttl_ms")]
    pub pending_ttl_ms: u64,
}

impl Default for TagOptions {
    fn default() -> Self {
        Self {
            mode: PolicyMode::Multi,
            tag_name: default_tag_name(),
            remove_on_unmapped: false,
            exclusive: true,
            clear_all_known_on_unmapped: false,
            message_delay_ms: default_message_delay_ms(),
            pending_ttl_ms: default_pending_ttl_ms(),
        }
    }
}

impl TagOptions {
    /// Validate option values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if single mode is selected with
    /// a blank `tag_name`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.mode == PolicyMode::Single && self.tag_name.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "tag_name must not be blank in single mode".into(),
            ));
        }
        Ok(())
    }

    /// The applicator policy these options select.
    #[must_use]
    pub fn policy(&self) -> TagPolicy {
        match self.mode {
            PolicyMode::Single => TagPolicy::Single {
                tag_name: self.tag_name.clone(),
                remove_on_unmapped: self.remove_on_unmapped,
            },
            PolicyMode::Multi => TagPolicy::MultiTag {
                exclusive: self.exclusive,
                clear_all_known_on_unmapped: self.clear_all_known_on_unmapped,
            },
        }
    }

    /// Post-resolution apply delay, clamped to [`MIN_APPLY_DELAY`].
    #[must_use]
    pub fn apply_delay(&self) -> Duration {
        Duration::from_millis(self.message_delay_ms).max(MIN_APPLY_DELAY)
    }

    /// Weak-key pending TTL, clamped to [`MIN_PENDING_TTL`].
    #[must_use]
    pub fn pending_ttl(&self) -> Duration {
        Duration::from_millis(self.pending_ttl_ms).max(MIN_PENDING_TTL)
    }
}

fn default_true() -> bool {
    true
}

fn default_tag_name() -> String {
    "irl".to_string()
}

fn default_message_delay_ms() -> u64 {
    1_000
}

fn default_pending_ttl_ms() -> u64 {
    30_000
}
