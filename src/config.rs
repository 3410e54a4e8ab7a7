use std::path::PathBuf;
use std::time::Duration;

use crate::error::{config::ConfigError, AppError};
use crate::model::messages::ManagedMessages;
use crate::processor::event::MessageReference;
use crate::processor::ProcessorConfig;

/// Refresh every member's roles and nickname at the top of every hour.
const DEFAULT_ROLE_REFRESH_CRON: &str = "0 0 * * * *";

const DEFAULT_REACTION_EMOJI: &str = "\u{2705}";

pub struct Config {
    pub discord_bot_token: String,
    /// The only guild the bot manages.
    pub guild_id: u64,

    /// Channels whose message reactions grant or revoke roles.
    pub auto_roles_channels: Vec<u64>,
    /// JSON file describing the roles granted by each auto roles message.
    pub auto_roles_file: Option<PathBuf>,
    /// Users skipped by the scheduled refresh (other bots, service accounts).
    pub system_users: Vec<u64>,
    /// The only emoji that counts as a reaction on bot-managed messages, so a
    /// member has at most one reaction per message.
    pub reaction_emoji: String,
    /// Regulations parts and the self-service refresh message.
    pub messages: ManagedMessages,
    /// Channel receiving role change reports. Reports are only logged if unset.
    pub report_channel: Option<u64>,

    pub role_refresh_cron: String,
    pub processor: ProcessorConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        Ok(Self::from_lookup(|name| std::env::var(name).ok())?)
    }

    /// Builds the configuration from an arbitrary variable lookup.
    ///
    /// # Arguments
    /// - `lookup` - Returns the value of the named variable, if set
    ///
    /// # Returns
    /// - `Ok(Config)` - All required variables present and valid
    /// - `Err(ConfigError)` - A required variable is missing or a value is malformed
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &str| {
            lookup(name)
                .filter(|value| !value.trim().is_empty())
                .ok_or_else(|| ConfigError::MissingEnvVar(name.to_string()))
        };

        let defaults = ProcessorConfig::default();

        Ok(Self {
            discord_bot_token: required("DISCORD_BOT_TOKEN")?,
            guild_id: parse_id("GUILD_ID", &required("GUILD_ID")?)?,
            auto_roles_channels: parse_id_list(
                "AUTO_ROLES_CHANNELS",
                &lookup("AUTO_ROLES_CHANNELS").unwrap_or_default(),
            )?,
            auto_roles_file: lookup("AUTO_ROLES_FILE")
                .filter(|path| !path.trim().is_empty())
                .map(PathBuf::from),
            system_users: parse_id_list(
                "SYSTEM_USERS",
                &lookup("SYSTEM_USERS").unwrap_or_default(),
            )?,
            reaction_emoji: lookup("REACTION_EMOJI")
                .map(|emoji| emoji.trim().to_string())
                .filter(|emoji| !emoji.is_empty())
                .unwrap_or_else(|| DEFAULT_REACTION_EMOJI.to_string()),
            messages: ManagedMessages {
                regulations: parse_message_list(
                    "REGULATIONS_MESSAGES",
                    &lookup("REGULATIONS_MESSAGES").unwrap_or_default(),
                )?,
                roles_refresh: parse_message_list(
                    "ROLES_REFRESH_MESSAGE",
                    &lookup("ROLES_REFRESH_MESSAGE").unwrap_or_default(),
                )?
                .into_iter()
                .next(),
            },
            report_channel: lookup("REPORT_CHANNEL")
                .filter(|id| !id.trim().is_empty())
                .map(|id| parse_id("REPORT_CHANNEL", &id))
                .transpose()?,
            role_refresh_cron: lookup("ROLE_REFRESH_CRON")
                .unwrap_or_else(|| DEFAULT_ROLE_REFRESH_CRON.to_string()),
            processor: ProcessorConfig {
                quiescence_threshold: match lookup("QUIESCENCE_THRESHOLD_MS") {
                    Some(value) => parse_millis("QUIESCENCE_THRESHOLD_MS", &value)?,
                    None => defaults.quiescence_threshold,
                },
                rewake_delay: match lookup("REWAKE_DELAY_MS") {
                    Some(value) => parse_millis("REWAKE_DELAY_MS", &value)?,
                    None => defaults.rewake_delay,
                },
            },
        })
    }
}

fn invalid(name: &str, value: &str, reason: impl ToString) -> ConfigError {
    ConfigError::InvalidEnvVar {
        name: name.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_id(name: &str, value: &str) -> Result<u64, ConfigError> {
    value.trim().parse().map_err(|e| invalid(name, value, e))
}

/// Parses a comma separated list of Discord ids, ignoring blank entries.
fn parse_id_list(name: &str, value: &str) -> Result<Vec<u64>, ConfigError> {
    value
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(|id| parse_id(name, id))
        .collect()
}

/// Parses a comma separated list of `channel_id:message_id` pairs.
fn parse_message_list(name: &str, value: &str) -> Result<Vec<MessageReference>, ConfigError> {
    value
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (channel_id, message_id) = entry
                .split_once(':')
                .ok_or_else(|| invalid(name, entry, "expected channel_id:message_id"))?;

            Ok(MessageReference::new(
                parse_id(name, channel_id)?,
                parse_id(name, message_id)?,
            ))
        })
        .collect()
}

fn parse_millis(name: &str, value: &str) -> Result<Duration, ConfigError> {
    let millis: u64 = value.trim().parse().map_err(|e| invalid(name, value, e))?;

    if millis == 0 {
        return Err(invalid(name, value, "must be greater than zero"));
    }

    Ok(Duration::from_millis(millis))
}
