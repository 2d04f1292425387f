use std::path::{Path, PathBuf};

use chrono::{FixedOffset, Local};
use serde::{Deserialize, Serialize};
use spendbook_domain::{MonthRange, DEFAULT_CATEGORIES};

use crate::ConfigError;

/// Environment variable that overrides the base directory for config and data.
pub const HOME_ENV: &str = "SPENDBOOK_HOME";

const LEDGER_FILE: &str = "expenses.json";

/// Stores user-configurable preferences for the tracker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub locale: String,
    pub currency: String,
    #[serde(default = "Config::default_categories")]
    pub categories: Vec<String>,
    #[serde(default = "Config::default_category_value")]
    pub default_category: String,
    /// Months offered by the month selector.
    #[serde(default)]
    pub month_range: MonthRange,
    /// Offset used to group expenses into months. Local offset when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utc_offset_minutes: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Optional custom ledger file. Defaults to `<base>/expenses.json`.
    pub ledger_path: Option<PathBuf>,

    #[serde(default = "Config::default_backup_retention")]
    pub backup_retention: usize,
    #[serde(default = "Config::default_ui_color_enabled")]
    pub ui_color_enabled: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            locale: "en-US".into(),
            currency: "USD".into(),
            categories: Self::default_categories(),
            default_category: Self::default_category_value(),
            month_range: MonthRange::default(),
            utc_offset_minutes: None,
            ledger_path: None,
            backup_retention: Self::default_backup_retention(),
            ui_color_enabled: Self::default_ui_color_enabled(),
        }
    }
}

impl Config {
    pub fn default_categories() -> Vec<String> {
        DEFAULT_CATEGORIES.iter().map(|name| name.to_string()).collect()
    }

    pub fn default_category_value() -> String {
        "Food".into()
    }

    pub fn default_backup_retention() -> usize {
        5
    }

    pub fn default_ui_color_enabled() -> bool {
        true
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.month_range.is_valid() {
            return Err(ConfigError::Invalid(format!(
                "month_range end {} is before start {}",
                self.month_range.end, self.month_range.start
            )));
        }
        if self.categories.iter().all(|name| name.trim().is_empty()) {
            return Err(ConfigError::Invalid("categories must not be empty".into()));
        }
        if self.currency.trim().is_empty() {
            return Err(ConfigError::Invalid("currency must not be empty".into()));
        }
        self.utc_offset()?;
        Ok(())
    }

    /// Offset for month grouping: the configured one, else the machine's current offset.
    pub fn utc_offset(&self) -> Result<FixedOffset, ConfigError> {
        match self.utc_offset_minutes {
            Some(minutes) => minutes
                .checked_mul(60)
                .and_then(FixedOffset::east_opt)
                .ok_or_else(|| {
                    ConfigError::Invalid(format!("utc_offset_minutes {minutes} is out of range"))
                }),
            None => Ok(*Local::now().offset()),
        }
    }

    /// Category used when an add omits one.
    pub fn fallback_category(&self) -> &str {
        let preferred = self.default_category.trim();
        if !preferred.is_empty() {
            return preferred;
        }
        self.categories
            .iter()
            .map(|name| name.trim())
            .find(|name| !name.is_empty())
            .unwrap_or("Other")
    }

    pub fn resolve_ledger_path(&self, base: &Path) -> PathBuf {
        match &self.ledger_path {
            Some(path) if path.is_absolute() => path.clone(),
            Some(path) => base.join(path),
            None => base.join(LEDGER_FILE),
        }
    }

    pub fn resolve_backup_dir(&self, base: &Path) -> PathBuf {
        base.join("backups")
    }

    /// `$SPENDBOOK_HOME`, else `<data dir>/spendbook`, else `./.spendbook`.
    pub fn resolve_base_dir() -> PathBuf {
        if let Some(home) = std::env::var_os(HOME_ENV).filter(|value| !value.is_empty()) {
            return PathBuf::from(home);
        }
        dirs::data_dir()
            .or_else(dirs::home_dir)
            .map(|base| base.join("spendbook"))
            .unwrap_or_else(|| PathBuf::from(".spendbook"))
    }
}
