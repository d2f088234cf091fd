use crate::config::types::{Config, UserSettings};
use anyhow::{Context, Result};
use log::warn;
use std::fs;
use std::path::Path;

/// 設定檔位於目前工作資料夾
pub const SETTINGS_FILE: &str = "settings.json";

impl Config {
    /// 讀取設定，設定檔不存在或無法解析時使用預設值
    #[must_use]
    pub fn new() -> Self {
        let settings = Self::load_settings(Path::new(SETTINGS_FILE)).unwrap_or_else(|e| {
            warn!("{e:#}，使用預設設定");
            UserSettings::default()
        });
        Self { settings }
    }

    pub fn load_settings(path: &Path) -> Result<UserSettings> {
        if !path.exists() {
            return Ok(UserSettings::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {}", path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse settings from {}", path.display()))
    }
}
