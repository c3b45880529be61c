use std::collections::HashSet;
use std::path::PathBuf;

use thiserror::Error;

use crate::quiz::UserId;

const TOKEN_VARS: [&str; 2] = ["TELEGRAM_BOT_TOKEN", "TELOXIDE_TOKEN"];
const DEFAULT_QUESTIONS_PATH: &str = "questions.json";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("TELEGRAM_BOT_TOKEN is not set")]
    MissingToken,
    #[error("ADMIN_IDS contains an invalid user id: '{0}'")]
    InvalidAdminId(String),
    #[error("PROGRESS_ANIMATION must be on or off, got '{0}'")]
    InvalidToggle(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub token: String,
    pub admins: HashSet<UserId>,
    pub questions_path: PathBuf,
    pub progress_animation: bool,
}

impl Config {
    /// Reads the process environment. Call `dotenv()` before this so a
    /// local `.env` file is picked up.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let token = TOKEN_VARS
            .iter()
            .filter_map(|key| lookup(key))
            .map(|token| token.trim().to_string())
            .find(|token| !token.is_empty())
            .ok_or(ConfigError::MissingToken)?;

        let admins = match lookup("ADMIN_IDS") {
            Some(raw) => parse_admins(&raw)?,
            None => HashSet::new(),
        };

        let questions_path = lookup("QUESTIONS_PATH")
            .filter(|path| !path.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_QUESTIONS_PATH.to_string())
            .into();

        let progress_animation = match lookup("PROGRESS_ANIMATION") {
            Some(raw) => parse_toggle(&raw)?,
            None => true,
        };

        Ok(Self {
            token,
            admins,
            questions_path,
            progress_animation,
        })
    }
}

fn parse_admins(raw: &str) -> Result<HashSet<UserId>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(|id| {
            id.parse::<UserId>()
                .map_err(|_| ConfigError::InvalidAdminId(id.to_string()))
        })
        .collect()
}

fn parse_toggle(raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_lowercase().as_str() {
        "on" | "true" | "1" | "yes" => Ok(true),
        "off" | "false" | "0" | "no" => Ok(false),
        _ => Err(ConfigError::InvalidToggle(raw.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn token_is_required() {
        assert_eq!(config(&[]).unwrap_err(), ConfigError::MissingToken);
        assert_eq!(
            config(&[("TELEGRAM_BOT_TOKEN", "  ")]).unwrap_err(),
            ConfigError::MissingToken
        );
    }

    #[test]
    fn falls_back_to_teloxide_token() {
        let config = config(&[("TELOXIDE_TOKEN", "abc")]).unwrap();
        assert_eq!(config.token, "abc");
    }

    #[test]
    fn defaults() {
        let config = config(&[("TELEGRAM_BOT_TOKEN", "abc")]).unwrap();
        assert!(config.admins.is_empty());
        assert_eq!(config.questions_path, PathBuf::from("questions.json"));
        assert!(config.progress_animation);
    }

    #[test]
    fn parses_admin_ids() {
        let config = config(&[
            ("TELEGRAM_BOT_TOKEN", "abc"),
            ("ADMIN_IDS", "123456789, 42,,"),
        ])
        .unwrap();
        assert_eq!(config.admins, HashSet::from([123456789, 42]));
    }

    #[test]
    fn rejects_bad_admin_ids() {
        let err = config(&[("TELEGRAM_BOT_TOKEN", "abc"), ("ADMIN_IDS", "12,bob")]).unwrap_err();
        assert_eq!(err, ConfigError::InvalidAdminId("bob".to_string()));
    }

    #[test]
    fn animation_toggle() {
        let off = config(&[("TELEGRAM_BOT_TOKEN", "abc"), ("PROGRESS_ANIMATION", "OFF")]).unwrap();
        assert!(!off.progress_animation);
        let err = config(&[("TELEGRAM_BOT_TOKEN", "abc"), ("PROGRESS_ANIMATION", "maybe")])
            .unwrap_err();
        assert_eq!(err, ConfigError::InvalidToggle("maybe".to_string()));
    }
}
