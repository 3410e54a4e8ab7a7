use std::sync::Arc;

use serenity::all::{Context, EventHandler, Member, Reaction, Ready};
use serenity::async_trait;

use crate::config::Config;
use crate::processor::event::EventKind;
use crate::processor::EventProcessor;
use crate::service::report::Reporter;
use crate::service::roles_source::{NicknamesSource, RolesSource};

pub mod member;
pub mod reaction;
pub mod ready;

/// Discord bot event handler
pub struct Handler {
    pub config: Arc<Config>,
    pub processor: Arc<EventProcessor>,
    pub roles: Arc<dyn RolesSource>,
    pub nicknames: Arc<dyn NicknamesSource>,
    pub reporter: Reporter,
}

impl Handler {
    pub fn new(
        config: Arc<Config>,
        processor: Arc<EventProcessor>,
        roles: Arc<dyn RolesSource>,
        nicknames: Arc<dyn NicknamesSource>,
        reporter: Reporter,
    ) -> Self {
        Self {
            config,
            processor,
            roles,
            nicknames,
            reporter,
        }
    }
}

#[async_trait]
impl EventHandler for Handler {
    /// Called when the bot is ready and connected to Discord
    async fn ready(&self, ctx: Context, ready: Ready) {
        ready::handle_ready(ctx, ready, self.config.guild_id).await;
    }

    /// Called when a member adds a reaction to a message
    async fn reaction_add(&self, ctx: Context, add_reaction: Reaction) {
        reaction::handle_reaction(
            &ctx,
            &self.processor,
            &self.config,
            EventKind::ReactionAdded,
            &add_reaction,
        );
    }

    /// Called when a member removes their reaction from a message
    async fn reaction_remove(&self, ctx: Context, removed_reaction: Reaction) {
        reaction::handle_reaction(
            &ctx,
            &self.processor,
            &self.config,
            EventKind::ReactionRemoved,
            &removed_reaction,
        );
    }

    /// Called when a member joins a guild
    async fn guild_member_addition(&self, ctx: Context, new_member: Member) {
        member::handle_guild_member_addition(
            &self.config,
            self.roles.as_ref(),
            self.nicknames.as_ref(),
            &self.reporter,
            ctx,
            new_member,
        )
        .await;
    }
}
