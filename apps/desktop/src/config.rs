use std::{fs, io::ErrorKind, path::Path};

use anyhow::Context;
use client_core::DEFAULT_API_BASE;
use serde::Deserialize;

pub const DEFAULT_SETTINGS_FILE: &str = "inventory.toml";

/// Environment variables consulted for the API base, lowest precedence first.
const API_BASE_ENV_VARS: [&str; 2] = ["INVENTORY_API_BASE", "APP__API_BASE"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_base: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.into(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    api_base: Option<String>,
}

/// Default, then the settings file (if present), then the environment, then
/// the command line flag.
pub fn load_settings(path: &Path, cli_api_base: Option<String>) -> anyhow::Result<Settings> {
    let mut settings = load_settings_from(path, |key| std::env::var(key).ok())?;
    if let Some(v) = cli_api_base {
        settings.api_base = v;
    }
    Ok(settings)
}

fn load_settings_from(
    path: &Path,
    env: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    match fs::read_to_string(path) {
        Ok(raw) => {
            let file_cfg: FileSettings = toml::from_str(&raw)
                .with_context(|| format!("failed to parse settings file '{}'", path.display()))?;
            if let Some(v) = file_cfg.api_base {
                settings.api_base = v;
            }
        }
        Err(err) if err.kind() == ErrorKind::NotFound => {}
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed to read settings file '{}'", path.display()));
        }
    }

    for key in API_BASE_ENV_VARS {
        if let Some(v) = env(key).filter(|v| !v.trim().is_empty()) {
            settings.api_base = v;
        }
    }

    Ok(settings)
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
