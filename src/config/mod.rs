use crate::errors::{AppError, AppResult};
use crate::models::command_kind::CommandKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;

pub mod migrate; // use submodule at src/config/migrate.rs

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: String,
    #[serde(default = "default_schedule_hours")]
    pub default_schedule_hours: u32,
    /// Per-user contracted hours, overriding `default_schedule_hours`.
    #[serde(default)]
    pub user_schedules: BTreeMap<String, u32>,
    /// Fixed dates (`YYYY-MM-DD`) or yearly recurring dates (`MM-DD`).
    #[serde(default)]
    pub holidays: Vec<String>,
    #[serde(default)]
    pub lunch: LunchPolicy,
    #[serde(default)]
    pub dedup: DedupSettings,
    #[serde(default)]
    pub auto_end: AutoEndSettings,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Lunch-deduction banding. Labor-law constants, kept configurable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LunchPolicy {
    /// Schedule length (hours) of the canonical full day.
    pub full_day_hours: u32,
    pub deduction_minutes: i64,
    /// Raw minutes must be strictly above this bound…
    pub band_lower_minutes: i64,
    /// …and at most this one.
    pub band_upper_minutes: i64,
    pub min_raw_minutes: i64,
}

impl Default for LunchPolicy {
    fn default() -> Self {
        Self {
            full_day_hours: 8,
            deduction_minutes: 30,
            band_lower_minutes: 4 * 60,
            band_upper_minutes: 11 * 60,
            min_raw_minutes: 4 * 60 + 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DedupSettings {
    pub start_cooldown_ms: u64,
    pub end_cooldown_ms: u64,
    pub temporary_stop_cooldown_ms: u64,
    pub resume_cooldown_ms: u64,
    pub default_cooldown_ms: u64,
    /// Registry size above which stale keys are swept.
    pub sweep_threshold: usize,
    /// Keys older than `retention_factor × default_cooldown` are swept.
    pub retention_factor: u32,
}

impl Default for DedupSettings {
    fn default() -> Self {
        Self {
            start_cooldown_ms: 3000,
            end_cooldown_ms: 2000,
            temporary_stop_cooldown_ms: 1500,
            resume_cooldown_ms: 1500,
            default_cooldown_ms: 1000,
            sweep_threshold: 100,
            retention_factor: 5,
        }
    }
}

impl DedupSettings {
    pub fn cooldown_for(&self, kind: CommandKind) -> Duration {
        let ms = match kind {
            CommandKind::StartDay => self.start_cooldown_ms,
            CommandKind::EndDay => self.end_cooldown_ms,
            CommandKind::StartTemporaryStop => self.temporary_stop_cooldown_ms,
            CommandKind::Resume => self.resume_cooldown_ms,
            CommandKind::AutoEnd | CommandKind::Resolve => self.default_cooldown_ms,
        };
        Duration::from_millis(ms)
    }

    pub fn retention(&self) -> Duration {
        Duration::from_millis(self.default_cooldown_ms) * self.retention_factor
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoEndSettings {
    pub max_attempts: u32,
    /// Base delay; attempt `n` waits `n × retry_delay_ms` before retrying.
    pub retry_delay_ms: u64,
}

impl Default for AutoEndSettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_delay_ms: 1000,
        }
    }
}

fn default_schedule_hours() -> u32 {
    8
}
fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for Config {
    fn default() -> Self {
        let db_path = Self::database_file();
        Self {
            database: db_path.to_string_lossy().to_string(),
            default_schedule_hours: default_schedule_hours(),
            user_schedules: BTreeMap::new(),
            holidays: Vec::new(),
            lunch: LunchPolicy::default(),
            dedup: DedupSettings::default(),
            auto_end: AutoEndSettings::default(),
            log_level: default_log_level(),
        }
    }
}

impl Config {
    /// Return the standard configuration directory depending on the platform
    pub fn config_dir() -> PathBuf {
        if cfg!(target_os = "windows") {
            let appdata = std::env::var("APPDATA").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(appdata).join("rworktime")
        } else {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".rworktime")
        }
    }

    /// Return the full path of the config file
    pub fn config_file() -> PathBuf {
        Self::config_dir().join("rworktime.conf")
    }

    /// Return the full path of the SQLite database
    pub fn database_file() -> PathBuf {
        Self::config_dir().join("rworktime.sqlite")
    }

    /// Load configuration from file, or return defaults if not found
    pub fn load() -> AppResult<Self> {
        let path = Self::config_file();

        if path.exists() {
            let content = fs::read_to_string(&path).map_err(|_| AppError::ConfigLoad)?;
            Self::from_yaml(&content)
        } else {
            Ok(Config::default())
        }
    }

    pub fn from_yaml(content: &str) -> AppResult<Self> {
        serde_yaml::from_str(content)
            .map_err(|e| AppError::Config(format!("invalid configuration file: {}", e)))
    }

    /// Initialize configuration and database files
    pub fn init_all(custom_name: Option<String>, is_test: bool) -> AppResult<PathBuf> {
        let dir = Self::config_dir();
        if !is_test {
            fs::create_dir_all(&dir)?;
        }

        // DB name: user provided or default
        let db_path = if let Some(name) = custom_name {
            let p = std::path::Path::new(&name);
            if p.is_absolute() {
                p.to_path_buf()
            } else {
                dir.join(p)
            }
        } else {
            dir.join("rworktime.sqlite")
        };

        let config = Config {
            database: db_path.to_string_lossy().to_string(),
            ..Config::default()
        };

        // Write config file
        if !is_test {
            let yaml = serde_yaml::to_string(&config)?;
            let mut file = fs::File::create(Self::config_file()).map_err(|_| AppError::ConfigSave)?;
            file.write_all(yaml.as_bytes())?;
            println!("✅ Config file: {:?}", Self::config_file());
        }

        if let Some(parent) = db_path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        // Create empty DB file if not exists
        if !db_path.exists() {
            fs::File::create(&db_path).map_err(|e| {
                AppError::Io(io::Error::new(
                    e.kind(),
                    format!("cannot create database {:?}: {}", db_path, e),
                ))
            })?;
        }

        println!("✅ Database:    {:?}", db_path);

        Ok(db_path)
    }
}
