// mistclone - clone WLAN configurations through the Mist cloud API
// Copyright (C) 2024 Mathias Uhl <mathiasuhl@gmx.de>
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

use anyhow::{Context, Result};
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use std::{
    env, fs,
    path::{Path, PathBuf},
};
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "https://api.eu.mist.com/api/v1";

pub const ENV_API_TOKEN: &str = "MIST_API_TOKEN";
pub const ENV_ORG_ID: &str = "MIST_ORG_ID";
pub const ENV_BASE_URL: &str = "MIST_BASE_URL";
const ENV_CONFIG_DIR: &str = "MISTCLONE_CONFIG_DIR";

#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Local,
    User,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not locate a writable config directory for the current user")]
    MissingConfigDir,
    #[error(
        "API token and organization ID must be set (MIST_API_TOKEN / MIST_ORG_ID in the environment or .env, or `mistclone configure --token <token> --org <id>`)"
    )]
    MissingCredentials,
}

#[derive(Debug)]
pub struct EffectiveConfig {
    pub api_token: String,
    pub org_id: String,
    pub base_url: String,
}

pub fn config_path(scope: Scope, cwd: &Path) -> Result<PathBuf> {
    match scope {
        Scope::Local => Ok(cwd.join(".mistclone.yaml")),
        Scope::User => {
            if let Ok(custom) = env::var(ENV_CONFIG_DIR) {
                return Ok(PathBuf::from(custom).join("config.yaml"));
            }
            let base = config_dir().ok_or(ConfigError::MissingConfigDir)?;
            Ok(base.join("mistclone").join("config.yaml"))
        }
    }
}

/// User file overlaid with the project file.
pub fn load(cwd: &Path) -> Result<Config> {
    let user = read_if_exists(&config_path(Scope::User, cwd)?)?.unwrap_or_default();
    let local = read_if_exists(&config_path(Scope::Local, cwd)?)?.unwrap_or_default();
    Ok(merge(user, local))
}

pub fn load_scope(scope: Scope, cwd: &Path) -> Result<Config> {
    Ok(read_if_exists(&config_path(scope, cwd)?)?.unwrap_or_default())
}

pub fn save(scope: Scope, config: &Config, cwd: &Path) -> Result<PathBuf> {
    let path = config_path(scope, cwd)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("creating {:?}", parent))?;
    }
    let serialized = serde_yaml::to_string(config).context("serializing config")?;
    fs::write(&path, serialized).with_context(|| format!("writing {:?}", path))?;
    Ok(path)
}

/// Config files overlaid with the `MIST_*` environment variables.
pub fn load_with_env(cwd: &Path) -> Result<Config> {
    Ok(merge(load(cwd)?, from_env()))
}

/// Files, then `MIST_*` environment variables, then `overrides` (usually the
/// command-line flags). Empty values are treated as unset.
pub fn resolve(cwd: &Path, overrides: Config) -> Result<EffectiveConfig> {
    let merged = merge(load_with_env(cwd)?, overrides);

    let (Some(api_token), Some(org_id)) = (
        non_empty(merged.api_token),
        non_empty(merged.org_id),
    ) else {
        return Err(ConfigError::MissingCredentials.into());
    };

    let base_url =
        non_empty(merged.base_url).unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
    debug!(%org_id, %base_url, "resolved configuration");

    Ok(EffectiveConfig {
        api_token,
        org_id,
        base_url,
    })
}

/// Copy of `config` that is safe to print.
pub fn masked(config: &Config) -> Config {
    let mut masked = config.clone();
    if masked.api_token.is_some() {
        masked.api_token = Some("*****".into());
    }
    masked
}

fn from_env() -> Config {
    Config {
        api_token: env::var(ENV_API_TOKEN).ok(),
        org_id: env::var(ENV_ORG_ID).ok(),
        base_url: env::var(ENV_BASE_URL).ok(),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn read_if_exists(path: &Path) -> Result<Option<Config>> {
    if !path.exists() {
        return Ok(None);
    }

    let contents = fs::read_to_string(path).with_context(|| format!("reading {:?}", path))?;
    let config = serde_yaml::from_str(&contents).with_context(|| format!("parsing {:?}", path))?;
    Ok(Some(config))
}

/// Fields of `top` win over `base`.
pub fn merge(base: Config, top: Config) -> Config {
    Config {
        api_token: top.api_token.or(base.api_token),
        org_id: top.org_id.or(base.org_id),
        base_url: top.base_url.or(base.base_url),
    }
}
