use std::{collections::HashMap, fs, path::Path};

use anyhow::{bail, Context};
use url::Url;

pub const DEFAULT_SETTINGS_FILE: &str = "garage.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GarageSettings {
    pub backend_url: String,
    pub anon_key: String,
    pub access_token: Option<String>,
}

impl Default for GarageSettings {
    fn default() -> Self {
        Self {
            backend_url: "http://127.0.0.1:54321".into(),
            anon_key: String::new(),
            access_token: None,
        }
    }
}

pub fn load_settings(path: &Path) -> GarageSettings {
    load_settings_from(path, |key| std::env::var(key).ok())
}

/// Defaults, then the flat `garage.toml` table, then environment overrides.
/// The `APP__` variables win over the plain ones.
pub fn load_settings_from(path: &Path, env: impl Fn(&str) -> Option<String>) -> GarageSettings {
    let mut settings = GarageSettings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        match toml::from_str::<HashMap<String, String>>(&raw) {
            Ok(file_cfg) => {
                if let Some(v) = file_cfg.get("backend_url") {
                    settings.backend_url = v.clone();
                }
                if let Some(v) = file_cfg.get("anon_key") {
                    settings.anon_key = v.clone();
                }
                if let Some(v) = file_cfg.get("access_token") {
                    settings.access_token = Some(v.clone());
                }
            }
            Err(err) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %err,
                    "config: ignoring unreadable settings file"
                );
            }
        }
    }

    for key in ["SUPABASE_URL", "APP__BACKEND_URL"] {
        if let Some(v) = env(key) {
            settings.backend_url = v;
        }
    }
    for key in ["SUPABASE_ANON_KEY", "APP__ANON_KEY"] {
        if let Some(v) = env(key) {
            settings.anon_key = v;
        }
    }
    for key in ["SUPABASE_ACCESS_TOKEN", "APP__ACCESS_TOKEN"] {
        if let Some(v) = env(key) {
            settings.access_token = Some(v);
        }
    }

    settings.access_token = settings
        .access_token
        .filter(|token| !token.trim().is_empty());
    settings
}

pub fn prepare_backend_url(raw_backend_url: &str) -> anyhow::Result<Url> {
    let normalized = normalize_backend_url(raw_backend_url);
    let url = Url::parse(&normalized)
        .with_context(|| format!("invalid backend url '{raw_backend_url}'"))?;

    if !matches!(url.scheme(), "http" | "https") {
        bail!(
            "backend url '{raw_backend_url}' must use http or https, got '{}'",
            url.scheme()
        );
    }
    if url.host_str().is_none() {
        bail!("backend url '{raw_backend_url}' has no host");
    }

    Ok(url)
}

fn normalize_backend_url(raw_backend_url: &str) -> String {
    let raw_backend_url = raw_backend_url.trim();

    if raw_backend_url.is_empty() {
        return GarageSettings::default().backend_url;
    }

    if raw_backend_url.contains("://") {
        return raw_backend_url.to_string();
    }

    format!("https://{raw_backend_url}")
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
