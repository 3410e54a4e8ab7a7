//! Interfaces of the external membership authorities.
//!
//! The bot never decides on its own which roles or nickname a member should
//! have. It asks a [`RolesSource`] and a [`NicknamesSource`] and only applies
//! the difference between their answer and the member's current state.

use std::collections::HashMap;

use serenity::async_trait;

use crate::error::AppError;
use crate::model::roles::RoleChanges;
use crate::model::status::UserStatus;
use crate::processor::event::MessageReference;

/// Authority deciding which roles a member should hold.
#[async_trait]
pub trait RolesSource: Send + Sync {
    /// Roles to grant and revoke for a member based on their membership status.
    async fn user_roles(
        &self,
        user_id: u64,
        status: UserStatus,
    ) -> Result<RoleChanges, AppError>;

    /// Roles to change after the member's net reaction on an auto roles message.
    async fn reaction_roles(
        &self,
        user_id: u64,
        message: &MessageReference,
    ) -> Result<RoleChanges, AppError>;

    /// Roles to change after the member withdrew their reaction from an auto
    /// roles message.
    async fn unreaction_roles(
        &self,
        user_id: u64,
        message: &MessageReference,
    ) -> Result<RoleChanges, AppError>;
}

/// Authority deciding the nickname of each member.
#[async_trait]
pub trait NicknamesSource: Send + Sync {
    /// Desired nicknames for the given users. `None` (or a missing entry) means
    /// the user is unknown and their nickname must be left alone.
    async fn nicknames_for(
        &self,
        user_ids: &[u64],
    ) -> Result<HashMap<u64, Option<String>>, AppError>;
}
