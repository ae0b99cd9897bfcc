//! Configuration management for segskip

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use toml_edit::{DocumentMut, Item, Table};

use crate::scheduler::SchedulerTiming;
use crate::segments::SkipMargins;
use crate::sponsorblock::{new_user_id, DEFAULT_SERVER};

/// Environment variable overriding the config file location.
pub const CONFIG_PATH_ENV: &str = "SEGSKIP_CONFIG";

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub skip: SkipConfig,
    pub prompt: PromptConfig,
    pub tracking: TrackingConfig,
    pub api: ApiConfig,
    pub timing: TimingConfig,
}

/// Skip margins, in milliseconds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkipConfig {
    /// Segments starting this close after another one's end are skipped together
    pub chain_margin_ms: u64,
    /// Skips shorter than this are not worth a seek
    pub min_skip_ms: u64,
    /// Land this much before a segment's end
    pub reduce_skips_ms: u64,
    /// A skip landing this close to the end moves on to the next item
    pub video_end_margin_ms: u64,
}

impl Default for SkipConfig {
    fn default() -> Self {
        Self {
            chain_margin_ms: 1000,
            min_skip_ms: 1000,
            reduce_skips_ms: 0,
            video_end_margin_ms: 1000,
        }
    }
}

/// Post-skip prompt configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptConfig {
    /// Offer unskip/report after each skip
    pub show_skipped_dialog: bool,
    /// Upvote a segment when its prompt expires untouched
    pub auto_upvote: bool,
    pub idle_timeout_secs: u64,
    /// Timeout once the user has interacted with the prompt
    pub interacted_timeout_secs: u64,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            show_skipped_dialog: true,
            auto_upvote: false,
            idle_timeout_secs: 10,
            interacted_timeout_secs: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    /// Report each skipped segment as viewed
    pub skip_count_tracking: bool,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            skip_count_tracking: true,
        }
    }
}

/// Segment database configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub server: String,
    /// Anonymous voting identity, generated when empty
    pub user_id: String,
    pub categories: Vec<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            server: DEFAULT_SERVER.to_string(),
            user_id: String::new(),
            categories: vec!["sponsor".to_string()],
        }
    }
}

/// Clock tolerances, in milliseconds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub undershoot_ms: u64,
    pub overshoot_ms: u64,
    pub seek_hint_ttl_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            undershoot_ms: 250,
            overshoot_ms: 1500,
            seek_hint_ttl_ms: 3000,
        }
    }
}

fn ms_to_secs(ms: u64) -> f64 {
    ms as f64 / 1000.0
}

impl Config {
    /// Get the config file path.
    ///
    /// `$SEGSKIP_CONFIG` wins over `~/.config/segskip/config.toml`.
    pub fn config_path() -> Result<PathBuf> {
        if let Some(path) = std::env::var_os(CONFIG_PATH_ENV) {
            return Ok(PathBuf::from(path));
        }
        let config_dir = dirs::config_dir().context("Could not determine config directory")?;
        Ok(config_dir.join("segskip").join("config.toml"))
    }

    /// Load config from the default path, or defaults if it doesn't exist
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Save config to the default path
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write config file {}", path.display()))?;
        Ok(())
    }

    /// Generate a user id if none is set. Returns true when one was generated.
    pub fn ensure_user_id(&mut self) -> bool {
        if !self.api.user_id.trim().is_empty() {
            return false;
        }
        self.api.user_id = new_user_id();
        true
    }

    pub fn skip_margins(&self) -> SkipMargins {
        SkipMargins {
            chain_margin: ms_to_secs(self.skip.chain_margin_ms),
            min_skip: ms_to_secs(self.skip.min_skip_ms),
            reduce_skips: ms_to_secs(self.skip.reduce_skips_ms),
            video_end_margin: ms_to_secs(self.skip.video_end_margin_ms),
        }
    }

    pub fn scheduler_timing(&self) -> SchedulerTiming {
        SchedulerTiming {
            undershoot: ms_to_secs(self.timing.undershoot_ms),
            overshoot: ms_to_secs(self.timing.overshoot_ms),
            seek_hint_ttl: Duration::from_millis(self.timing.seek_hint_ttl_ms),
        }
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.prompt.idle_timeout_secs)
    }

    pub fn interacted_timeout(&self) -> Duration {
        Duration::from_secs(self.prompt.interacted_timeout_secs)
    }
}

/// Outcome of [`migrate_config`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrateResult {
    /// Updated file content, existing formatting and comments preserved
    pub content: String,
    /// Added fields as `section.key`
    pub added_fields: Vec<String>,
    /// Sections that did not exist at all
    pub sections_added: Vec<String>,
}

impl MigrateResult {
    pub fn has_changes(&self) -> bool {
        !self.added_fields.is_empty() || !self.sections_added.is_empty()
    }
}

/// Add fields missing from `content` with their default values.
///
/// Existing values are never touched.
pub fn migrate_config(content: &str) -> Result<MigrateResult> {
    let mut doc: DocumentMut = content.parse().context("Failed to parse config file")?;
    let defaults =
        toml::to_string_pretty(&Config::default()).context("Failed to serialize defaults")?;
    let default_doc: DocumentMut = defaults.parse().context("Failed to parse default config")?;

    let mut added_fields = Vec::new();
    let mut sections_added = Vec::new();

    for (section, default_item) in default_doc.iter() {
        let Some(default_table) = default_item.as_table() else {
            continue;
        };

        if !doc.contains_key(section) {
            doc.insert(section, Item::Table(Table::new()));
            sections_added.push(section.to_string());
        }

        let Some(table) = doc.get_mut(section).and_then(Item::as_table_mut) else {
            bail!("Config entry '{}' must be a table", section);
        };

        for (key, value) in default_table.iter() {
            if !table.contains_key(key) {
                table.insert(key, value.clone());
                added_fields.push(format!("{}.{}", section, key));
            }
        }
    }

    Ok(MigrateResult {
        content: doc.to_string(),
        added_fields,
        sections_added,
    })
}
