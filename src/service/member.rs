use std::collections::HashMap;

use serenity::all::{EditMember, GuildId, Member, RoleId};
use serenity::http::Http;

use crate::error::AppError;
use crate::model::roles::{nickname_update, resolve_role_names, RoleChanges};

pub struct MemberRoleService<'a> {
    http: &'a Http,
    guild_id: GuildId,
}

impl<'a> MemberRoleService<'a> {
    pub fn new(http: &'a Http, guild_id: GuildId) -> Self {
        Self { http, guild_id }
    }

    /// Applies requested role changes to a guild member
    ///
    /// Reduces the request to the roles the member actually lacks or holds, maps
    /// the remaining names onto the guild's roles and issues at most one add and
    /// one remove call. Names with no matching guild role are skipped with a
    /// warning.
    ///
    /// # Arguments
    /// - `member`: The member to update, with their current roles
    /// - `requested`: Role names to grant and revoke
    ///
    /// # Returns
    /// - `Ok(RoleChanges)`: Role names that were actually granted and revoked
    /// - `Err(AppError)`: Discord API error while fetching roles or updating the member
    pub async fn apply(
        &self,
        member: &Member,
        requested: &RoleChanges,
    ) -> Result<RoleChanges, AppError> {
        let guild_roles = self.guild_id.roles(self.http).await?;

        let by_name: HashMap<String, u64> = guild_roles
            .values()
            .map(|role| (role.name.clone(), role.id.get()))
            .collect();

        let current = member
            .roles
            .iter()
            .filter_map(|id| guild_roles.get(id))
            .map(|role| role.name.as_str());
        let diff = requested.diff_against(current);

        let mut applied = RoleChanges::default();

        let to_add = resolve_role_names(&diff.to_add, &by_name);
        if !to_add.ids.is_empty() {
            member.add_roles(self.http, &role_ids(&to_add.ids)).await?;
        }
        applied.to_add = known(diff.to_add, &to_add.unknown);

        let to_remove = resolve_role_names(&diff.to_remove, &by_name);
        if !to_remove.ids.is_empty() {
            member
                .remove_roles(self.http, &role_ids(&to_remove.ids))
                .await?;
        }
        applied.to_remove = known(diff.to_remove, &to_remove.unknown);

        for name in to_add.unknown.iter().chain(&to_remove.unknown) {
            tracing::warn!(
                "Role {} requested for member {} does not exist in guild {}",
                name,
                member.user.name,
                self.guild_id
            );
        }

        tracing::debug!(
            "Roles of {}: added {:?}, removed {:?}",
            member.user.name,
            applied.to_add,
            applied.to_remove
        );

        Ok(applied)
    }

    /// Sets the member's nickname when it differs from the desired one
    ///
    /// # Returns
    /// - `Ok(true)`: Nickname was changed
    /// - `Ok(false)`: Nickname already matches or the member is unknown to the source
    /// - `Err(AppError)`: Discord API error while editing the member
    pub async fn rename(&self, member: &Member, desired: Option<&str>) -> Result<bool, AppError> {
        let Some(nickname) = nickname_update(member.nick.as_deref(), desired) else {
            return Ok(false);
        };

        self.guild_id
            .edit_member(self.http, member.user.id, EditMember::new().nickname(nickname))
            .await?;

        tracing::info!(
            "Renamed {} from {:?} to {}",
            member.user.name,
            member.nick,
            nickname
        );

        Ok(true)
    }
}

fn role_ids(ids: &[u64]) -> Vec<RoleId> {
    ids.iter().copied().map(RoleId::new).collect()
}

fn known(names: Vec<String>, unknown: &[String]) -> Vec<String> {
    names
        .into_iter()
        .filter(|name| !unknown.contains(name))
        .collect()
}
