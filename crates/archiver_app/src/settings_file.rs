use std::fs;
use std::path::{Path, PathBuf};

use archiver_engine::{ArchiverSettings, SettingsStore};
use archiver_logging::archiver_warn;
use serde::{Deserialize, Serialize};

const SETTINGS_FILENAME: &str = ".archiver_settings.ron";

/// On-disk run settings. Absent keys fall back to their defaults, so a
/// hand-edited file only needs the values it overrides.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PersistedSettings {
    max_items: Option<usize>,
    scroll_delay_ms: Option<u64>,
    stability_timeout_ms: Option<u64>,
}

/// Settings store backed by a RON file next to the output directory.
/// A missing or unparseable file degrades to the defaults with a warning.
pub struct FileSettings {
    path: PathBuf,
}

impl FileSettings {
    pub fn new(dir: &Path) -> Self {
        Self {
            path: dir.join(SETTINGS_FILENAME),
        }
    }

    fn read(&self) -> PersistedSettings {
        let content = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return PersistedSettings::default();
            }
            Err(err) => {
                archiver_warn!("Failed to read settings from {:?}: {}", self.path, err);
                return PersistedSettings::default();
            }
        };

        match ron::from_str(&content) {
            Ok(settings) => settings,
            Err(err) => {
                archiver_warn!("Failed to parse settings from {:?}: {}", self.path, err);
                PersistedSettings::default()
            }
        }
    }
}

impl SettingsStore for FileSettings {
    fn load(&self) -> ArchiverSettings {
        let persisted = self.read();
        ArchiverSettings {
            max_items: persisted.max_items,
            scroll_delay_ms: persisted.scroll_delay_ms,
            stability_timeout_ms: persisted.stability_timeout_ms,
        }
    }
}
