//! Discord bot integration.
//!
//! The bot listens to the gateway and turns the events it cares about into
//! calls on the services and the reaction event processor:
//!
//! - reactions in the auto roles channels and on the regulations and roles
//!   refresh messages are queued on the processor, which debounces them before
//!   any role is touched
//! - members joining the guild get their roles from the roles source
//!
//! # Gateway Intents
//!
//! - `GUILDS` - Guild availability and the ready payload
//! - `GUILD_MEMBERS` - Member join events (privileged intent)
//! - `GUILD_MESSAGE_REACTIONS` - Reaction add and remove events
//!
//! Note: `GUILD_MEMBERS` is a privileged intent and must be explicitly enabled
//! in the Discord Developer Portal for the bot application.

pub mod handler;
pub mod start;
