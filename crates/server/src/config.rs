use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub server_bind: String,
    pub database_url: String,
    pub graphiql: bool,
    pub max_body_bytes: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_bind: "127.0.0.1:8443".into(),
            database_url: "sqlite://./data/registration.db".into(),
            graphiql: true,
            max_body_bytes: 64 * 1024,
        }
    }
}

/// Optional `server.toml`; every key may be omitted.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileSettings {
    bind_addr: Option<String>,
    database_url: Option<String>,
    graphiql: Option<bool>,
    max_body_bytes: Option<usize>,
}

pub fn load_settings() -> Settings {
    let file_cfg = fs::read_to_string("server.toml")
        .ok()
        .and_then(|raw| match toml::from_str::<FileSettings>(&raw) {
            Ok(cfg) => Some(cfg),
            Err(error) => {
                tracing::warn!(%error, "ignoring malformed server.toml");
                None
            }
        });
    resolve_settings(file_cfg, |key| std::env::var(key).ok())
}

fn resolve_settings(
    file_cfg: Option<FileSettings>,
    env: impl Fn(&str) -> Option<String>,
) -> Settings {
    let mut settings = Settings::default();

    if let Some(file_cfg) = file_cfg {
        if let Some(v) = file_cfg.bind_addr {
            settings.server_bind = v;
        }
        if let Some(v) = file_cfg.database_url {
            settings.database_url = v;
        }
        if let Some(v) = file_cfg.graphiql {
            settings.graphiql = v;
        }
        if let Some(v) = file_cfg.max_body_bytes {
            settings.max_body_bytes = v;
        }
    }

    if let Some(v) = env("SERVER_BIND") {
        settings.server_bind = v;
    }
    if let Some(v) = env("APP__BIND_ADDR") {
        settings.server_bind = v;
    }

    if let Some(v) = env("DATABASE_URL") {
        settings.database_url = v;
    }
    if let Some(v) = env("APP__DATABASE_URL") {
        settings.database_url = v;
    }

    if let Some(v) = env("APP__GRAPHIQL") {
        settings.graphiql = matches!(v.trim(), "1" | "true" | "yes" | "on");
    }

    if let Some(v) = env("APP__MAX_BODY_BYTES") {
        if let Ok(parsed) = v.trim().parse::<usize>() {
            settings.max_body_bytes = parsed;
        }
    }

    settings
}

pub fn prepare_database_url(raw_database_url: &str) -> anyhow::Result<String> {
    let database_url = normalize_database_url(raw_database_url);
    ensure_parent_dir_exists(&database_url)?;
    Ok(database_url)
}

fn normalize_database_url(raw_database_url: &str) -> String {
    let raw_database_url = raw_database_url.trim();

    if raw_database_url.is_empty() {
        return Settings::default().database_url;
    }

    if raw_database_url.starts_with("sqlite::memory:")
        || raw_database_url.starts_with("sqlite://")
        || raw_database_url.contains("://")
    {
        return raw_database_url.to_string();
    }

    if let Some(path) = raw_database_url.strip_prefix("sqlite:") {
        let path = path.replace('\\', "/");
        return format!("sqlite://{path}");
    }

    format!("sqlite://{}", raw_database_url.replace('\\', "/"))
}

fn ensure_parent_dir_exists(database_url: &str) -> anyhow::Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url == "sqlite::memory:" || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
