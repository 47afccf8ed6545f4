use crate::config::Config;
use crate::config::migrate::{missing_keys, run_config_migration};
use crate::errors::{AppError, AppResult};
use crate::ui::messages::{info, success, warning};
use std::fs;
use std::path::Path;
use std::process::Command;

pub struct ConfigLogic;

impl ConfigLogic {
    pub fn print(path: &Path, cfg: &Config) -> AppResult<()> {
        let content = if path.exists() {
            fs::read_to_string(path).map_err(|_| AppError::ConfigLoad)?
        } else {
            warning(format!("{:?} not found, showing defaults", path));
            serde_yaml::to_string(cfg)?
        };
        println!("📄 Current configuration:\n");
        println!("{}", content);
        Ok(())
    }

    /// Open the file in `editor`, `$EDITOR`/`$VISUAL`, or the platform
    /// default, falling back to the default once.
    pub fn edit(path: &Path, editor: &Option<String>) -> AppResult<()> {
        let default_editor = std::env::var("EDITOR")
            .or_else(|_| std::env::var("VISUAL"))
            .unwrap_or_else(|_| {
                if cfg!(target_os = "windows") {
                    "notepad".to_string()
                } else {
                    "nano".to_string()
                }
            });
        let requested = editor.clone().unwrap_or_else(|| default_editor.clone());

        for ed in [&requested, &default_editor] {
            match Command::new(ed).arg(path).status() {
                Ok(s) if s.success() => {
                    success(format!("Configuration file edited with '{}'", ed));
                    return Ok(());
                }
                _ => warning(format!("Editor '{}' not available", ed)),
            }
        }

        Err(AppError::Config(format!(
            "no editor could open {:?}",
            path
        )))
    }

    pub fn check(path: &Path) -> AppResult<()> {
        if !path.exists() {
            warning(format!("{:?} not found, run `rworktime init` first", path));
            return Ok(());
        }

        let raw = fs::read_to_string(path).map_err(|_| AppError::ConfigLoad)?;
        let parsed = Config::from_yaml(&raw)?;
        crate::core::providers::ConfigHolidays::parse(&parsed.holidays)?;

        let missing = missing_keys(path)?;
        if missing.is_empty() {
            success("Configuration file is complete.");
        } else {
            warning(format!("Missing keys: {}", missing.join(", ")));
            info("Run `rworktime config --migrate` to add them with defaults.");
        }
        Ok(())
    }

    pub fn migrate(path: &Path) -> AppResult<()> {
        if !path.exists() {
            warning(format!("{:?} not found, nothing to migrate", path));
            return Ok(());
        }

        if run_config_migration(path)? {
            success(format!("Configuration file {:?} updated", path));
        } else {
            info("Configuration file already up to date.");
        }
        Ok(())
    }
}
