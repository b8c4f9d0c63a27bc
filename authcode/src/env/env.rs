use std::{io, path::PathBuf};

use once_cell::sync::OnceCell;
use serde::de::DeserializeOwned;
use thiserror::Error;

const DEFAULT_ENV_FILE: &str = ".env";

static ENV_LOADED: OnceCell<()> = OnceCell::new();

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("error parsing environment variables: {0}")]
    Env(#[from] envy::Error),

    #[error("cannot read env file {path:?}: {source}")]
    EnvFile { path: PathBuf, source: io::Error },
}

/// Deserialize `T` from the process environment, loading the env file first.
///
/// The first call may write process environment variables, so make it
/// before starting other threads (including an async runtime).
pub fn parse<T>() -> Result<T, ConfigError>
where
    T: DeserializeOwned,
{
    ENV_LOADED.get_or_try_init(prepare_env)?;
    Ok(envy::from_env::<T>()?)
}

/// Like [`parse`], reading only variables that start with `prefix`.
pub fn parse_prefixed<T>(prefix: &str) -> Result<T, ConfigError>
where
    T: DeserializeOwned,
{
    ENV_LOADED.get_or_try_init(prepare_env)?;
    Ok(envy::prefixed(prefix).from_env::<T>()?)
}

fn prepare_env() -> Result<(), ConfigError> {
    let (path, explicit) = match std::env::var("ENV_FILE") {
        Ok(path) => (PathBuf::from(path), true),
        Err(_) => (PathBuf::from(DEFAULT_ENV_FILE), false),
    };

    let content = match std::fs::read_to_string(&path) {
        Ok(content) => content,
        Err(err) if !explicit && err.kind() == io::ErrorKind::NotFound => {
            tracing::debug!("no {:?} file found", path);
            return Ok(());
        }
        Err(source) => return Err(ConfigError::EnvFile { path, source }),
    };

    for (key, value) in content.lines().filter_map(parse_line) {
        if std::env::var_os(key).is_some() {
            continue;
        }
        // SAFETY: the environment must not be touched by other threads here;
        // callers make their first parse before spawning any.
        unsafe {
            std::env::set_var(key, value);
        }
    }
    tracing::debug!("loaded environment from {:?}", path);
    Ok(())
}

fn parse_line(line: &str) -> Option<(&str, &str)> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    let (key, value) = line.split_once('=')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    Some((key, value.trim()))
}
