use crate::component::oled_animation::{
    DEFAULT_INTERVAL, DecoderPaths, MAX_INTERVAL, MIN_INTERVAL,
};
use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum Language {
    #[default]
    #[serde(rename = "en-US")]
    English,
    #[serde(rename = "zh-TW")]
    TraditionalChinese,
}

impl Language {
    pub const ALL: [Self; 2] = [Self::English, Self::TraditionalChinese];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::English => "en-US",
            Self::TraditionalChinese => "zh-TW",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::English => write!(f, "English"),
            Self::TraditionalChinese => write!(f, "繁體中文"),
        }
    }
}

/// `settings.json` 的內容，所有欄位都可省略
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserSettings {
    pub language: Language,
    /// 預設取樣間隔（秒）
    pub default_interval: f64,
    /// 預設輸出路徑
    pub default_output_path: PathBuf,
    pub ffmpeg_path: String,
    pub ffprobe_path: String,
}

impl Default for UserSettings {
    fn default() -> Self {
        let decoder = DecoderPaths::default();
        Self {
            language: Language::default(),
            default_interval: DEFAULT_INTERVAL,
            default_output_path: PathBuf::from("frames.h"),
            ffmpeg_path: decoder.ffmpeg,
            ffprobe_path: decoder.ffprobe,
        }
    }
}

impl UserSettings {
    /// 取樣間隔限制在可選範圍內
    #[must_use]
    pub fn interval(&self) -> f64 {
        if self.default_interval.is_finite() {
            self.default_interval.clamp(MIN_INTERVAL, MAX_INTERVAL)
        } else {
            DEFAULT_INTERVAL
        }
    }

    #[must_use]
    pub fn decoder_paths(&self) -> DecoderPaths {
        DecoderPaths {
            ffmpeg: self.ffmpeg_path.clone(),
            ffprobe: self.ffprobe_path.clone(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub settings: UserSettings,
}
