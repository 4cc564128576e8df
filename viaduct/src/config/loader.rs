use crate::config::types::Settings;
use anyhow::Result;
use log::{debug, trace, warn};
use std::path::Path;

impl Settings {
    /// Load settings from a JSON file. A missing file yields the defaults and
    /// writes them out so the user has something to edit.
    pub async fn try_load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading settings from: {}", path.display());
        let settings = if path.exists() {
            let content = tokio::fs::read_to_string(path).await?;
            let mut settings = serde_json::from_str::<Settings>(&content)?;
            settings.path = path.to_owned();
            settings
        } else {
            warn!("Settings file not found, using defaults");
            let settings = Self::new(path);
            settings.save().await?;
            settings
        };
        trace!("Loaded settings: {:#?}", settings);
        Ok(settings)
    }

    /// Save the current settings to their file.
    pub async fn save(&self) -> Result<()> {
        debug!("Saving settings to: {}", self.path.display());
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let content = serde_json::to_string_pretty(self)?;
        tokio::fs::write(&self.path, content).await?;
        Ok(())
    }
}
