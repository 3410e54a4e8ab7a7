//! Auto roles: role grants driven by reactions on dedicated messages.
//!
//! Members react on messages in the auto roles channels, on the parts of the
//! server regulations and on the self-service refresh message. The processor
//! debounces the raw reactions and calls [`AutoRolesActions`] once per net
//! change, which works out what the reaction means and applies it.

use std::num::NonZeroU64;
use std::sync::Arc;

use serenity::all::{GuildId, Member, UserId};
use serenity::async_trait;
use serenity::http::Http;

use crate::config::Config;
use crate::error::AppError;
use crate::model::messages::MessagePurpose;
use crate::model::roles::RoleChanges;
use crate::processor::event::{MessageReference, Subject};
use crate::processor::EventActions;
use crate::service::member::MemberRoleService;
use crate::service::report::{member_report, Reporter};
use crate::service::roles_source::{NicknamesSource, RolesSource};
use crate::service::status::MemberStatusService;

pub struct AutoRolesActions {
    http: Arc<Http>,
    config: Arc<Config>,
    roles: Arc<dyn RolesSource>,
    nicknames: Arc<dyn NicknamesSource>,
    reporter: Reporter,
}

impl AutoRolesActions {
    pub fn new(
        http: Arc<Http>,
        config: Arc<Config>,
        roles: Arc<dyn RolesSource>,
        nicknames: Arc<dyn NicknamesSource>,
        reporter: Reporter,
    ) -> Self {
        Self {
            http,
            config,
            roles,
            nicknames,
            reporter,
        }
    }

    fn guild_id(&self) -> GuildId {
        GuildId::new(self.config.guild_id)
    }

    /// Fetches the member, `None` for bots.
    ///
    /// Removal events carry no member, so bots other than this one can only be
    /// recognized once the member is fetched.
    async fn fetch_member(&self, user_id: u64) -> Result<Option<Member>, AppError> {
        let member = self
            .http
            .get_member(self.guild_id(), member_id(user_id)?)
            .await?;

        if member.user.bot {
            tracing::debug!("Ignoring reaction change of bot {}", member.user.name);
            return Ok(None);
        }

        Ok(Some(member))
    }

    /// Applies the roles the source assigns to a message reaction change.
    async fn update_auto_roles(
        &self,
        user_id: u64,
        message: &MessageReference,
        changes: RoleChanges,
    ) -> Result<(), AppError> {
        if changes.is_empty() {
            tracing::warn!(
                "No roles to be added nor removed were returned for member {} reacting on message {}",
                user_id,
                message.message_id
            );
            return Ok(());
        }

        let Some(member) = self.fetch_member(user_id).await? else {
            return Ok(());
        };

        let applied = MemberRoleService::new(&self.http, self.guild_id())
            .apply(&member, &changes)
            .await?;

        tracing::info!(
            "Auto roles for {} after reaction change on message {}: added {:?}, removed {:?}",
            member.user.name,
            message.message_id,
            applied.to_add,
            applied.to_remove
        );
        self.reporter
            .send(&member_report("Reaction change by", &member.user.name, &applied))
            .await;

        Ok(())
    }

    /// Recomputes a member's membership roles from their current status.
    async fn refresh_member(&self, user_id: u64, cause: &str) -> Result<(), AppError> {
        let Some(member) = self.fetch_member(user_id).await? else {
            return Ok(());
        };

        let status = MemberStatusService::new(
            &self.http,
            &self.config.messages.regulations,
            &self.config.reaction_emoji,
            self.nicknames.as_ref(),
        )
        .status_of(user_id)
        .await?;

        let requested = self.roles.user_roles(user_id, status).await?;
        let applied = MemberRoleService::new(&self.http, self.guild_id())
            .apply(&member, &requested)
            .await?;

        tracing::info!(
            "Roles of {} refreshed ({:?}): added {:?}, removed {:?}",
            member.user.name,
            status,
            applied.to_add,
            applied.to_remove
        );
        self.reporter
            .send(&member_report(cause, &member.user.name, &applied))
            .await;

        Ok(())
    }
}

#[async_trait]
impl EventActions for AutoRolesActions {
    async fn on_reaction_added(&self, user_id: u64, subject: Subject) -> Result<(), AppError> {
        let Subject::Message(message) = subject;

        match self.config.messages.purpose_of(&message) {
            MessagePurpose::RegulationsPart => {
                self.refresh_member(user_id, "Regulations reaction by").await
            }
            MessagePurpose::RolesRefresh => {
                self.refresh_member(user_id, "Roles refresh requested by")
                    .await
            }
            MessagePurpose::AutoRoles => {
                let changes = self.roles.reaction_roles(user_id, &message).await?;
                self.update_auto_roles(user_id, &message, changes).await
            }
        }
    }

    async fn on_reaction_removed(&self, user_id: u64, subject: Subject) -> Result<(), AppError> {
        let Subject::Message(message) = subject;

        match self.config.messages.purpose_of(&message) {
            MessagePurpose::RegulationsPart => {
                self.refresh_member(user_id, "Regulations reaction withdrawn by")
                    .await
            }
            MessagePurpose::RolesRefresh => {
                tracing::debug!("User {} withdrew their roles refresh reaction", user_id);
                Ok(())
            }
            MessagePurpose::AutoRoles => {
                let changes = self.roles.unreaction_roles(user_id, &message).await?;
                self.update_auto_roles(user_id, &message, changes).await
            }
        }
    }
}

/// Processor user ids come from gateway snowflakes, which are never zero.
/// `UserId::new` panics on zero, and a panic would take the drain loop down.
fn member_id(user_id: u64) -> Result<UserId, AppError> {
    NonZeroU64::new(user_id)
        .map(|id| UserId::new(id.get()))
        .ok_or_else(|| AppError::NotFound(format!("Member with id {}", user_id)))
}
