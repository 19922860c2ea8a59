use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, Context};
use url::Url;

pub const DEFAULT_AUTH_BASE_URL: &str = "http://localhost:5501/api/auth";
pub const DEFAULT_RECOGNITION_BASE_URL: &str = "http://localhost:5500";
pub const DEFAULT_SESSION_LABEL: &str = "Default Lecture";
pub const SETTINGS_FILE: &str = "attendance.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub auth_base_url: String,
    pub recognition_base_url: String,
    pub default_session_label: String,
    pub export_dir: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            auth_base_url: DEFAULT_AUTH_BASE_URL.into(),
            recognition_base_url: DEFAULT_RECOGNITION_BASE_URL.into(),
            default_session_label: DEFAULT_SESSION_LABEL.into(),
            export_dir: None,
        }
    }
}

impl Settings {
    /// Directory CSV exports are written to: configured, else the user's
    /// download folder, else the working directory.
    pub fn resolved_export_dir(&self) -> PathBuf {
        self.export_dir
            .clone()
            .or_else(dirs::download_dir)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Checks both base URLs and strips trailing slashes so endpoint paths can
    /// be appended with `format!`.
    pub fn validated(mut self) -> anyhow::Result<Self> {
        self.auth_base_url = normalize_base_url(&self.auth_base_url)
            .context("invalid auth backend URL")?;
        self.recognition_base_url = normalize_base_url(&self.recognition_base_url)
            .context("invalid recognition backend URL")?;
        if self.default_session_label.trim().is_empty() {
            self.default_session_label = DEFAULT_SESSION_LABEL.into();
        }
        Ok(self)
    }
}

pub fn load_settings() -> anyhow::Result<Settings> {
    load_settings_from(Path::new(SETTINGS_FILE))
}

pub fn load_settings_from(path: &Path) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        apply_file_overrides(&mut settings, &raw)
            .with_context(|| format!("failed to parse settings file '{}'", path.display()))?;
    }

    apply_env_overrides(&mut settings, |name| std::env::var(name).ok());
    settings.validated()
}

fn apply_file_overrides(settings: &mut Settings, raw: &str) -> anyhow::Result<()> {
    let file_cfg = toml::from_str::<HashMap<String, String>>(raw)?;
    if let Some(v) = file_cfg.get("auth_base_url") {
        settings.auth_base_url = v.clone();
    }
    if let Some(v) = file_cfg.get("recognition_base_url") {
        settings.recognition_base_url = v.clone();
    }
    if let Some(v) = file_cfg.get("default_session_label") {
        settings.default_session_label = v.clone();
    }
    if let Some(v) = file_cfg.get("export_dir") {
        settings.export_dir = Some(PathBuf::from(v));
    }
    Ok(())
}

fn apply_env_overrides(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("AUTH_BASE_URL") {
        settings.auth_base_url = v;
    }
    if let Some(v) = lookup("APP__AUTH_BASE_URL") {
        settings.auth_base_url = v;
    }

    if let Some(v) = lookup("RECOGNITION_BASE_URL") {
        settings.recognition_base_url = v;
    }
    if let Some(v) = lookup("APP__RECOGNITION_BASE_URL") {
        settings.recognition_base_url = v;
    }

    if let Some(v) = lookup("APP__DEFAULT_SESSION_LABEL") {
        settings.default_session_label = v;
    }

    if let Some(v) = lookup("APP__EXPORT_DIR") {
        settings.export_dir = Some(PathBuf::from(v));
    }
}

pub fn normalize_base_url(raw: &str) -> anyhow::Result<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(anyhow!("base URL must not be empty"));
    }
    let parsed = Url::parse(trimmed).with_context(|| format!("'{trimmed}' is not a URL"))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(anyhow!("unsupported scheme '{}' in '{trimmed}'", parsed.scheme()));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
