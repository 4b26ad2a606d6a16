//! Settings file and data directory resolution.

use shared::settings::StudioSettings;
use std::fs;
use std::path::{Path, PathBuf};

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("com.local", "Mockup Studio", "MockupStudio")
}

pub fn config_path() -> Option<PathBuf> {
    let proj = project_dirs()?;
    let _ = fs::create_dir_all(proj.config_dir());
    Some(proj.config_dir().join("settings.json"))
}

/// Returns the settings and whether this is a fresh install
pub fn load_settings_or_default() -> (StudioSettings, bool) {
    match config_path() {
        Some(path) => load_from(&path),
        None => (StudioSettings::default(), true),
    }
}

fn load_from(path: &Path) -> (StudioSettings, bool) {
    if path.exists() {
        if let Ok(bytes) = fs::read(path) {
            if let Ok(settings) = serde_json::from_slice::<StudioSettings>(&bytes) {
                return (settings, false);
            }
        }
    }
    (StudioSettings::default(), true)
}

/// Save settings to disk
pub fn save_settings(settings: &StudioSettings) {
    if let Some(path) = config_path() {
        save_to(&path, settings);
    }
}

fn save_to(path: &Path, settings: &StudioSettings) {
    if let Ok(bytes) = serde_json::to_vec_pretty(settings) {
        if let Err(e) = fs::write(path, bytes) {
            tracing::warn!(path = %path.display(), error = %e, "Could not write settings");
        }
    }
}

/// Directory holding mockups.db
pub fn data_dir(settings: &StudioSettings) -> PathBuf {
    if let Some(dir) = &settings.data_dir {
        return dir.clone();
    }
    project_dirs()
        .map(|p| p.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("./data"))
}
