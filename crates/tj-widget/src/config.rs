use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use tj_core::Configuration;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    pub store: StoreConfig,
    pub timeline: TimelineConfig,
    #[serde(default)]
    pub widget: WidgetConfig,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoreConfig {
    /// `~` is expanded; relative paths resolve against the journal root.
    pub path: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TimelineConfig {
    pub window_minutes: u64,
    pub tick_minutes: u64,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct WidgetConfig {
    /// Handed to timeline requests that bring no configuration of their own.
    #[serde(default)]
    pub params: Configuration,
}

impl Config {
    pub fn default_for_root() -> Self {
        Self {
            store: StoreConfig {
                path: ".tj/journal.db".to_string(),
            },
            timeline: TimelineConfig {
                window_minutes: 60,
                tick_minutes: 2,
            },
            widget: WidgetConfig {
                params: Configuration::new().with("favorite_emoji", "😀"),
            },
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let s = std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        let cfg: Config = toml::from_str(&s).with_context(|| "parse tj.toml")?;
        Ok(cfg)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let s = toml::to_string_pretty(self).with_context(|| "serialize toml")?;
        std::fs::write(path, s).with_context(|| format!("write {}", path.display()))?;
        Ok(())
    }

    pub fn window(&self) -> Result<Duration> {
        minutes(self.timeline.window_minutes).context("timeline.window_minutes")
    }

    pub fn tick(&self) -> Result<Duration> {
        minutes(self.timeline.tick_minutes).context("timeline.tick_minutes")
    }

    pub fn db_path(&self, root: &Path) -> PathBuf {
        let expanded = PathBuf::from(shellexpand::tilde(&self.store.path).to_string());
        if expanded.is_absolute() {
            expanded
        } else {
            root.join(expanded)
        }
    }

    pub fn config_path(root: &Path) -> PathBuf {
        root.join(".tj").join("tj.toml")
    }
}

pub fn minutes(m: u64) -> Result<Duration> {
    let secs = m.checked_mul(60).ok_or_else(|| anyhow!("{m} minutes overflows"))?;
    Ok(Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn defaults_match_hourly_window() {
        let cfg = Config::default_for_root();
        assert_eq!(cfg.window().unwrap(), Duration::from_secs(3600));
        assert_eq!(cfg.tick().unwrap(), Duration::from_secs(120));
        assert_eq!(cfg.widget.params.get("favorite_emoji"), Some("😀"));
    }

    #[test]
    fn oversized_minutes_are_an_error() {
        let mut cfg = Config::default_for_root();
        cfg.timeline.window_minutes = u64::MAX;
        let err = cfg.window().unwrap_err();
        assert!(format!("{err:#}").contains("overflows"));
        assert!(minutes(u64::MAX / 60).is_ok());
        assert!(minutes(u64::MAX / 60 + 1).is_err());
    }

    #[test]
    fn save_then_load() {
        let dir = tempdir().unwrap();
        let path = Config::config_path(dir.path());
        let mut cfg = Config::default_for_root();
        cfg.timeline.tick_minutes = 5;
        cfg.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.timeline.tick_minutes, 5);
        assert_eq!(loaded.widget.params, cfg.widget.params);
    }

    #[test]
    fn widget_section_is_optional() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tj.toml");
        std::fs::write(
            &path,
            "[store]\npath = \"/var/lib/tj/journal.db\"\n\n[timeline]\nwindow_minutes = 30\ntick_minutes = 10\n",
        )
        .unwrap();
        let cfg = Config::load_from(&path).unwrap();
        assert!(cfg.widget.params.is_empty());
        assert_eq!(cfg.db_path(dir.path()), PathBuf::from("/var/lib/tj/journal.db"));
    }

    #[test]
    fn relative_store_path_resolves_against_root() {
        let cfg = Config::default_for_root();
        let root = Path::new("/home/traveller/journal");
        assert_eq!(cfg.db_path(root), root.join(".tj/journal.db"));
    }
}
