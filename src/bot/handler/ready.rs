//! Ready event handler for bot initialization.
//!
//! Fired once per gateway connection after the initial handshake. The bot
//! manages exactly one guild, so the handler also checks that the configured
//! guild is part of the session.

use serenity::all::{Context, Ready};

/// Handles the ready event when the bot connects to Discord.
///
/// # Arguments
/// - `ready` - Ready event data containing bot user information and guilds
/// - `guild_id` - The guild the bot is configured to manage
pub async fn handle_ready(_ctx: Context, ready: Ready, guild_id: u64) {
    tracing::info!("{} is connected to Discord", ready.user.name);

    if !ready.guilds.iter().any(|guild| guild.id.get() == guild_id) {
        tracing::warn!(
            "Configured guild {} is not among the {} guilds of this session",
            guild_id,
            ready.guilds.len()
        );
    }
}
