use serenity::all::{Context, Reaction, ReactionType};

use crate::config::Config;
use crate::model::messages::ManagedMessages;
use crate::processor::event::{EventKind, MessageReference, Subject};
use crate::processor::EventProcessor;

/// The parts of a gateway reaction event that decide whether it is queued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawReaction {
    pub guild_id: Option<u64>,
    pub channel_id: u64,
    pub message_id: u64,
    pub user_id: Option<u64>,
    /// Unicode emoji of the reaction, `None` for custom guild emojis.
    pub emoji: Option<String>,
    /// Known to come from a bot, through the attached member or the cache.
    pub from_bot: bool,
}

impl RawReaction {
    /// Reads the reaction, looking the user up in the cache when the event
    /// carries no member (always the case for removals).
    pub fn from_gateway(ctx: &Context, reaction: &Reaction) -> Self {
        let from_bot = match &reaction.member {
            Some(member) => member.user.bot,
            None => reaction
                .user_id
                .and_then(|user_id| ctx.cache.user(user_id).map(|user| user.bot))
                .unwrap_or(false),
        };

        let emoji = match &reaction.emoji {
            ReactionType::Unicode(emoji) => Some(emoji.clone()),
            _ => None,
        };

        Self {
            guild_id: reaction.guild_id.map(|id| id.get()),
            channel_id: reaction.channel_id.get(),
            message_id: reaction.message_id.get(),
            user_id: reaction.user_id.map(|id| id.get()),
            emoji,
            from_bot,
        }
    }
}

/// Which reactions reach the event processor.
pub struct ReactionScope<'a> {
    pub guild_id: u64,
    /// Reactions the bot places itself never count.
    pub bot_user_id: u64,
    pub channels: &'a [u64],
    pub messages: &'a ManagedMessages,
    pub emoji: &'a str,
}

impl<'a> ReactionScope<'a> {
    pub fn new(config: &'a Config, bot_user_id: u64) -> Self {
        Self {
            guild_id: config.guild_id,
            bot_user_id,
            channels: &config.auto_roles_channels,
            messages: &config.messages,
            emoji: &config.reaction_emoji,
        }
    }

    /// Selects the reactions the auto roles logic cares about.
    ///
    /// Only the configured emoji counts, so every member toggles at most one
    /// reaction per message and add and remove events strictly alternate.
    ///
    /// # Returns
    /// - `Some((user_id, subject))` - Human reaction with the configured emoji,
    ///   in an auto roles channel or on a regulations or refresh message of the
    ///   managed guild
    /// - `None` - Any other reaction
    pub fn route(&self, reaction: &RawReaction) -> Option<(u64, Subject)> {
        if reaction.guild_id != Some(self.guild_id) {
            return None;
        }

        let user_id = reaction.user_id.filter(|&id| id != 0)?;
        if reaction.from_bot || user_id == self.bot_user_id {
            return None;
        }

        if reaction.emoji.as_deref() != Some(self.emoji) {
            return None;
        }

        let message = MessageReference::new(reaction.channel_id, reaction.message_id);
        if !self.channels.contains(&reaction.channel_id) && !self.messages.contains(&message) {
            return None;
        }

        Some((user_id, Subject::Message(message)))
    }
}

/// Handles reaction_add and reaction_remove by queueing auto roles reactions
/// on the event processor
pub fn handle_reaction(
    ctx: &Context,
    processor: &EventProcessor,
    config: &Config,
    kind: EventKind,
    reaction: &Reaction,
) {
    let raw = RawReaction::from_gateway(ctx, reaction);
    let scope = ReactionScope::new(config, ctx.cache.current_user().id.get());

    if let Some((user_id, subject)) = scope.route(&raw) {
        tracing::debug!("Reaction event {:?} from user {} on {}", kind, user_id, subject);
        processor.submit(kind, user_id, subject);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOT: u64 = 999;
    const CHECK: &str = "\u{2705}";

    fn messages() -> ManagedMessages {
        ManagedMessages {
            regulations: vec![MessageReference::new(5, 501)],
            roles_refresh: Some(MessageReference::new(6, 601)),
        }
    }

    fn scope<'a>(channels: &'a [u64], messages: &'a ManagedMessages) -> ReactionScope<'a> {
        ReactionScope {
            guild_id: 1,
            bot_user_id: BOT,
            channels,
            messages,
            emoji: CHECK,
        }
    }

    fn reaction() -> RawReaction {
        RawReaction {
            guild_id: Some(1),
            channel_id: 10,
            message_id: 256,
            user_id: Some(123),
            emoji: Some(CHECK.to_string()),
            from_bot: false,
        }
    }

    /// Tests routing a member's reaction in an auto roles channel.
    ///
    /// Expected: Some with the user and the message reference
    #[test]
    fn routes_reaction_in_auto_roles_channel() {
        let messages = messages();

        let routed = scope(&[10, 11], &messages).route(&reaction());

        assert_eq!(
            routed,
            Some((123, Subject::Message(MessageReference::new(10, 256))))
        );
    }

    /// Tests that reactions outside the auto roles channels are ignored.
    ///
    /// Expected: None
    #[test]
    fn ignores_other_channels() {
        let messages = messages();

        assert_eq!(scope(&[11], &messages).route(&reaction()), None);
    }

    /// Tests that regulations and refresh messages are routed from any channel.
    ///
    /// Expected: Some for both managed messages outside the auto roles channels
    #[test]
    fn routes_managed_messages_outside_auto_roles_channels() {
        let messages = messages();
        let scope = scope(&[], &messages);

        let regulations = RawReaction {
            channel_id: 5,
            message_id: 501,
            ..reaction()
        };
        let refresh = RawReaction {
            channel_id: 6,
            message_id: 601,
            ..reaction()
        };

        assert_eq!(
            scope.route(&regulations),
            Some((123, Subject::Message(MessageReference::new(5, 501))))
        );
        assert_eq!(
            scope.route(&refresh),
            Some((123, Subject::Message(MessageReference::new(6, 601))))
        );
    }

    /// Tests that a second emoji on the same message does not reach the
    /// processor, so it cannot double-count the member's reaction.
    ///
    /// Expected: None for another unicode emoji and for custom emojis
    #[test]
    fn ignores_other_emojis() {
        let messages = messages();
        let scope = scope(&[10], &messages);

        let thumbs_up = RawReaction {
            emoji: Some("\u{1F44D}".to_string()),
            ..reaction()
        };
        let custom = RawReaction {
            emoji: None,
            ..reaction()
        };

        assert!(scope.route(&reaction()).is_some());
        assert_eq!(scope.route(&thumbs_up), None);
        assert_eq!(scope.route(&custom), None);
    }

    /// Tests that reactions in other guilds or direct messages are ignored.
    ///
    /// Expected: None
    #[test]
    fn ignores_other_guilds() {
        let messages = messages();
        let scope = scope(&[10], &messages);

        let other_guild = RawReaction {
            guild_id: Some(2),
            ..reaction()
        };
        let direct_message = RawReaction {
            guild_id: None,
            ..reaction()
        };

        assert_eq!(scope.route(&other_guild), None);
        assert_eq!(scope.route(&direct_message), None);
    }

    /// Tests that bot reactions and reactions without a user are ignored.
    ///
    /// Expected: None
    #[test]
    fn ignores_bots_and_unknown_users() {
        let messages = messages();
        let scope = scope(&[10], &messages);

        let from_bot = RawReaction {
            from_bot: true,
            ..reaction()
        };
        let no_user = RawReaction {
            user_id: None,
            ..reaction()
        };
        let zero_user = RawReaction {
            user_id: Some(0),
            ..reaction()
        };

        assert_eq!(scope.route(&from_bot), None);
        assert_eq!(scope.route(&no_user), None);
        assert_eq!(scope.route(&zero_user), None);
    }

    /// Tests removing the bot's own reaction, delivered without a member.
    ///
    /// Expected: None even though nothing marks the event as coming from a bot
    #[test]
    fn ignores_own_reaction_removal_without_member() {
        let messages = messages();
        let own_removal = RawReaction {
            user_id: Some(BOT),
            from_bot: false,
            ..reaction()
        };

        assert_eq!(scope(&[10], &messages).route(&own_removal), None);
    }
}
