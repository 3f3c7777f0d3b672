use archiver_core::RunConfig;

/// Values the persisted-settings collaborator may hold. Every field is
/// optional; absent keys fall back to their defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArchiverSettings {
    pub max_items: Option<usize>,
    pub scroll_delay_ms: Option<u64>,
    pub stability_timeout_ms: Option<u64>,
}

impl ArchiverSettings {
    pub fn into_config(self) -> RunConfig {
        let defaults = RunConfig::default();
        RunConfig {
            max_items: self.max_items.unwrap_or(defaults.max_items),
            scroll_delay_ms: self.scroll_delay_ms.unwrap_or(defaults.scroll_delay_ms),
            stability_timeout_ms: self
                .stability_timeout_ms
                .unwrap_or(defaults.stability_timeout_ms),
        }
    }
}

/// The external persisted-settings store.
pub trait SettingsStore: Send + Sync {
    fn load(&self) -> ArchiverSettings;
}

/// Store with no persisted values; every run uses the defaults.
#[derive(Debug, Default)]
pub struct DefaultSettings;

impl SettingsStore for DefaultSettings {
    fn load(&self) -> ArchiverSettings {
        ArchiverSettings::default()
    }
}
