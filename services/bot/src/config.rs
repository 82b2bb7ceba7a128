//! services/bot/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use tracing::{warn, Level};

pub const DEFAULT_RELAY_PORT: u16 = 3105;
pub const DEFAULT_CONSULTATION_URL: &str = "https://avalik-avatar.ru";

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bot_token: String,
    /// Shared secret for the notify relay. Unset means every relay call fails.
    pub internal_api_token: Option<String>,
    pub admin_chat_ids: Vec<i64>,
    pub relay_address: SocketAddr,
    pub log_level: Level,
    pub avatar_images_dir: PathBuf,
    pub font_path: PathBuf,
    pub font_bold_path: PathBuf,
    pub consultation_url: String,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        // --- Telegram ---
        let bot_token = std::env::var("BOT_TOKEN")
            .ok()
            .filter(|token| !token.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingVar("BOT_TOKEN".to_string()))?;

        // --- Notify Relay ---
        let internal_api_token = std::env::var("INTERNAL_API_TOKEN")
            .ok()
            .filter(|token| !token.is_empty());

        let admin_chat_ids = std::env::var("BOT_ADMIN_CHAT_IDS")
            .map(|raw| parse_admin_chat_ids(&raw))
            .unwrap_or_default();

        let (port_var, port_str) = match std::env::var("INTERNAL_API_PORT") {
            Ok(port) => ("INTERNAL_API_PORT", Some(port)),
            Err(_) => ("PORT", std::env::var("PORT").ok()),
        };
        let port = match port_str {
            Some(port) => port.trim().parse::<u16>().map_err(|e| {
                ConfigError::InvalidValue(port_var.to_string(), e.to_string())
            })?,
            None => DEFAULT_RELAY_PORT,
        };
        let relay_address = SocketAddr::from((Ipv4Addr::UNSPECIFIED, port));

        // --- Logging ---
        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Report Assets ---
        let avatar_images_dir = std::env::var("AVATAR_IMAGES_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./public/avatar"));
        let font_path = std::env::var("FONT_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./public/Manrope.ttf"));
        let font_bold_path = std::env::var("FONT_BOLD_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./public/Manrope-Bold.ttf"));

        let consultation_url = std::env::var("CONSULTATION_URL")
            .unwrap_or_else(|_| DEFAULT_CONSULTATION_URL.to_string());

        Ok(Self {
            bot_token,
            internal_api_token,
            admin_chat_ids,
            relay_address,
            log_level,
            avatar_images_dir,
            font_path,
            font_bold_path,
            consultation_url,
        })
    }
}

/// Parses a comma-separated list of chat ids, skipping blanks and non-numeric entries.
pub fn parse_admin_chat_ids(raw: &str) -> Vec<i64> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .filter_map(|entry| match entry.parse::<i64>() {
            Ok(id) => Some(id),
            Err(_) => {
                warn!("Skipping non-numeric admin chat id '{}'", entry);
                None
            }
        })
        .collect()
}
