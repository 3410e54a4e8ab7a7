use serenity::all::{GuildId, Member};
use serenity::http::Http;

use crate::config::Config;
use crate::error::AppError;
use crate::model::roles::RoleChanges;
use crate::service::member::MemberRoleService;
use crate::service::roles_source::{NicknamesSource, RolesSource};
use crate::service::status::MemberStatusService;

/// Maximum page size of Discord's list guild members endpoint.
const MEMBERS_PAGE_SIZE: u64 = 1000;

/// Outcome of a full guild refresh.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct RefreshSummary {
    /// Members considered (bots and system users excluded).
    pub members: usize,
    /// Roles actually granted and revoked, by member name.
    pub role_updates: Vec<(String, RoleChanges)>,
    /// New nicknames, by member name.
    pub renames: Vec<(String, String)>,
    pub failures: usize,
}

pub struct RefreshService<'a> {
    http: &'a Http,
    config: &'a Config,
    roles: &'a dyn RolesSource,
    nicknames: &'a dyn NicknamesSource,
}

impl<'a> RefreshService<'a> {
    pub fn new(
        http: &'a Http,
        config: &'a Config,
        roles: &'a dyn RolesSource,
        nicknames: &'a dyn NicknamesSource,
    ) -> Self {
        Self {
            http,
            config,
            roles,
            nicknames,
        }
    }

    /// Brings every member's roles and nickname in line with the sources
    ///
    /// Catches up on anything the event handlers missed (reactions while the
    /// bot was offline, membership changes in the external authority). A
    /// failure for one member is logged and counted, the refresh moves on.
    ///
    /// # Returns
    /// - `Ok(RefreshSummary)`: Refresh completed, possibly with per-member failures
    /// - `Err(AppError)`: Listing members, reading regulations reactions or
    ///   querying nicknames failed
    pub async fn refresh_all(&self) -> Result<RefreshSummary, AppError> {
        let members: Vec<Member> = self
            .fetch_members()
            .await?
            .into_iter()
            .filter(|member| {
                is_refreshable(
                    member.user.id.get(),
                    member.user.bot,
                    &self.config.system_users,
                )
            })
            .collect();

        let mut summary = RefreshSummary {
            members: members.len(),
            ..Default::default()
        };

        let ids: Vec<u64> = members.iter().map(|member| member.user.id.get()).collect();
        let statuses = MemberStatusService::new(
            self.http,
            &self.config.messages.regulations,
            &self.config.reaction_emoji,
            self.nicknames,
        )
        .statuses_of(&ids)
        .await?;

        let role_service = MemberRoleService::new(self.http, self.guild_id());

        for member in &members {
            let status = statuses
                .get(&member.user.id.get())
                .copied()
                .unwrap_or_default();

            let result = match self.roles.user_roles(member.user.id.get(), status).await {
                Ok(requested) => role_service.apply(member, &requested).await,
                Err(e) => Err(e),
            };

            match result {
                Ok(applied) if !applied.is_empty() => {
                    summary.role_updates.push((member.user.name.clone(), applied))
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::error!("Failed to refresh roles of {}: {}", member.user.name, e);
                    summary.failures += 1;
                }
            }
        }

        let nicknames = self.nicknames.nicknames_for(&ids).await?;

        for member in &members {
            let desired = nicknames
                .get(&member.user.id.get())
                .and_then(|nickname| nickname.as_deref());

            match role_service.rename(member, desired).await {
                Ok(true) => summary.renames.push((
                    member.user.name.clone(),
                    desired.unwrap_or_default().to_string(),
                )),
                Ok(false) => {}
                Err(e) => {
                    tracing::error!("Failed to rename {}: {}", member.user.name, e);
                    summary.failures += 1;
                }
            }
        }

        Ok(summary)
    }

    async fn fetch_members(&self) -> Result<Vec<Member>, AppError> {
        let mut members = Vec::new();
        let mut after = None;

        loop {
            let page = self
                .http
                .get_guild_members(self.guild_id(), Some(MEMBERS_PAGE_SIZE), after)
                .await?;

            let page_len = page.len() as u64;
            after = page.last().map(|member| member.user.id.get());
            members.extend(page);

            if page_len < MEMBERS_PAGE_SIZE {
                break;
            }
        }

        tracing::debug!(
            "Fetched {} members of guild {}",
            members.len(),
            self.config.guild_id
        );

        Ok(members)
    }

    fn guild_id(&self) -> GuildId {
        GuildId::new(self.config.guild_id)
    }
}

/// Bots and configured system users are never touched by mass operations.
fn is_refreshable(user_id: u64, is_bot: bool, system_users: &[u64]) -> bool {
    !is_bot && !system_users.contains(&user_id)
}
