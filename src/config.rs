use crate::library::DEFAULT_PAGE_SIZE;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::OnceLock;
use std::time::Duration;

pub const DATA_FILE_NAME: &str = "BookJournalData.json";
pub const DATA_FILE_ENV: &str = "BOOK_JOURNAL_DATA_FILE";

const DEFAULT_QUIET_INTERVAL_MS: u64 = 900;
const DEFAULT_SAVED_DISPLAY_MS: u64 = 1200;

static AUTOSAVE_DEBUG_ENABLED: OnceLock<bool> = OnceLock::new();

/// Placement and sizing rules for stickers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StickerConfig {
    pub min_size: f64,
    pub default_width: f64,
    /// Height over width for freshly added stickers.
    pub default_aspect: f64,
    pub spawn_origin: f64,
    pub spawn_step: f64,
    /// Lowest z handed out; loaded stickers above it raise the floor.
    pub base_z: u64,
}

impl Default for StickerConfig {
    fn default() -> Self {
        Self {
            min_size: 40.0,
            default_width: 160.0,
            default_aspect: 1.33,
            spawn_origin: 40.0,
            spawn_step: 30.0,
            base_z: 1000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EditorConfig {
    pub quiet_interval_ms: u64,
    pub saved_display_ms: u64,
    pub stickers: StickerConfig,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            quiet_interval_ms: DEFAULT_QUIET_INTERVAL_MS,
            saved_display_ms: DEFAULT_SAVED_DISPLAY_MS,
            stickers: StickerConfig::default(),
        }
    }
}

impl EditorConfig {
    pub fn quiet_interval(&self) -> Duration {
        Duration::from_millis(self.quiet_interval_ms)
    }

    pub fn saved_display(&self) -> Duration {
        Duration::from_millis(self.saved_display_ms)
    }
}

/// Downscale target for an encoded image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageTarget {
    pub max_dimension: u32,
    /// 0.0..=1.0, only meaningful for lossy output.
    pub quality: f32,
}

impl ImageTarget {
    pub const COVER: ImageTarget = ImageTarget {
        max_dimension: 800,
        quality: 0.7,
    };
    pub const STICKER: ImageTarget = ImageTarget {
        max_dimension: 400,
        quality: 0.8,
    };
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JournalConfig {
    pub data_file: PathBuf,
    pub page_size: usize,
    pub editor: EditorConfig,
    pub cover: ImageTarget,
    pub sticker_image: ImageTarget,
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            data_file: default_data_file(),
            page_size: DEFAULT_PAGE_SIZE,
            editor: EditorConfig::default(),
            cover: ImageTarget::COVER,
            sticker_image: ImageTarget::STICKER,
        }
    }
}

impl JournalConfig {
    /// Defaults with the data file taken from `BOOK_JOURNAL_DATA_FILE` when set.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(path) = std::env::var_os(DATA_FILE_ENV).filter(|value| !value.is_empty()) {
            config.data_file = PathBuf::from(path);
        }
        config
    }
}

/// `<documents>/BookJournalData.json`, falling back to the working directory
/// when the platform has no documents folder.
pub fn default_data_file() -> PathBuf {
    dirs::document_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DATA_FILE_NAME)
}

pub(crate) fn autosave_debug_enabled() -> bool {
    *AUTOSAVE_DEBUG_ENABLED.get_or_init(|| {
        std::env::var("BOOK_JOURNAL_AUTOSAVE_DEBUG")
            .map(|value| {
                let lowered = value.trim().to_ascii_lowercase();
                lowered == "1" || lowered == "true" || lowered == "yes" || lowered == "on"
            })
            .unwrap_or(false)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_journal_timings() {
        let config = EditorConfig::default();
        assert_eq!(config.quiet_interval(), Duration::from_millis(900));
        assert_eq!(config.saved_display(), Duration::from_millis(1200));
        assert_eq!(config.stickers.min_size, 40.0);
    }

    #[test]
    fn partial_config_fills_in_defaults() {
        let config: JournalConfig = serde_json::from_str(
            r#"{ "dataFile": "/tmp/books.json", "editor": { "quietIntervalMs": 250 } }"#,
        )
        .expect("parse config");

        assert_eq!(config.data_file, PathBuf::from("/tmp/books.json"));
        assert_eq!(config.editor.quiet_interval_ms, 250);
        assert_eq!(config.editor.saved_display_ms, 1200);
        assert_eq!(config.page_size, 12);
        assert_eq!(config.cover, ImageTarget::COVER);
    }

    #[test]
    fn default_data_file_uses_journal_file_name() {
        assert!(default_data_file().ends_with(DATA_FILE_NAME));
    }
}
