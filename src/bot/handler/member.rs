use serenity::all::{Context, Member};

use crate::config::Config;
use crate::error::AppError;
use crate::model::roles::RoleChanges;
use crate::service::member::MemberRoleService;
use crate::service::report::{member_report, Reporter};
use crate::service::roles_source::{NicknamesSource, RolesSource};
use crate::service::status::MemberStatusService;

/// Handles the guild_member_addition event by applying the member's roles
pub async fn handle_guild_member_addition(
    config: &Config,
    roles: &dyn RolesSource,
    nicknames: &dyn NicknamesSource,
    reporter: &Reporter,
    ctx: Context,
    new_member: Member,
) {
    if new_member.guild_id.get() != config.guild_id || new_member.user.bot {
        return;
    }

    tracing::info!("Applying roles for new member {}", new_member.user.name);

    match apply_member_roles(config, roles, nicknames, &ctx, &new_member).await {
        Ok(applied) => {
            tracing::info!(
                "Roles of new member {} updated: added {:?}, removed {:?}",
                new_member.user.name,
                applied.to_add,
                applied.to_remove
            );
            reporter
                .send(&member_report("New member", &new_member.user.name, &applied))
                .await;
        }
        Err(e) => tracing::error!(
            "Failed to apply roles for new member {}: {}",
            new_member.user.name,
            e
        ),
    }
}

async fn apply_member_roles(
    config: &Config,
    roles: &dyn RolesSource,
    nicknames: &dyn NicknamesSource,
    ctx: &Context,
    member: &Member,
) -> Result<RoleChanges, AppError> {
    let user_id = member.user.id.get();

    let status = MemberStatusService::new(
        &ctx.http,
        &config.messages.regulations,
        &config.reaction_emoji,
        nicknames,
    )
    .status_of(user_id)
    .await?;

    let requested = roles.user_roles(user_id, status).await?;

    MemberRoleService::new(&ctx.http, member.guild_id)
        .apply(member, &requested)
        .await
}
