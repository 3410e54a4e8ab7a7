//! File backed roles and nicknames source.
//!
//! Reads a JSON document mapping auto roles messages to the role names they
//! grant, plus a fixed nickname list:
//!
//! ```json
//! {
//!     "reaction_roles": { "1182736450012345678": ["Rules accepted"] },
//!     "member_roles": { "to_add": ["Member"], "to_remove": ["Newcomer"] },
//!     "known_roles": ["Verified"],
//!     "nicknames": { "208374650012345678": "Jan Kowalski" }
//! }
//! ```
//!
//! Reacting on a listed message grants its roles, withdrawing the reaction
//! revokes them. `member_roles` is applied as written to members who accepted
//! the regulations and reversed for everyone else. `known_roles` are held
//! exactly by the members with a nickname entry.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use serenity::async_trait;

use crate::error::AppError;
use crate::model::roles::RoleChanges;
use crate::model::status::UserStatus;
use crate::processor::event::MessageReference;
use crate::service::roles_source::{NicknamesSource, RolesSource};

#[derive(Debug, Default, Deserialize)]
pub struct StaticSource {
    #[serde(default)]
    reaction_roles: HashMap<u64, Vec<String>>,
    #[serde(default)]
    member_roles: RoleChanges,
    #[serde(default)]
    known_roles: Vec<String>,
    #[serde(default)]
    nicknames: HashMap<u64, String>,
}

impl StaticSource {
    pub fn from_json(json: &str) -> Result<Self, AppError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, AppError> {
        let json = std::fs::read_to_string(path).map_err(|source| AppError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let source = Self::from_json(&json)?;
        tracing::info!(
            "Loaded {} auto roles messages and {} nicknames from {}",
            source.reaction_roles.len(),
            source.nicknames.len(),
            path.display()
        );

        Ok(source)
    }

    fn message_roles(&self, message: &MessageReference) -> Vec<String> {
        self.reaction_roles
            .get(&message.message_id)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl RolesSource for StaticSource {
    async fn user_roles(
        &self,
        _user_id: u64,
        status: UserStatus,
    ) -> Result<RoleChanges, AppError> {
        let RoleChanges {
            mut to_add,
            mut to_remove,
        } = if status.accepted {
            self.member_roles.clone()
        } else {
            RoleChanges::new(
                self.member_roles.to_remove.clone(),
                self.member_roles.to_add.clone(),
            )
        };

        if status.known {
            to_add.extend(self.known_roles.iter().cloned());
        } else {
            to_remove.extend(self.known_roles.iter().cloned());
        }

        Ok(RoleChanges::new(to_add, to_remove))
    }

    async fn reaction_roles(
        &self,
        _user_id: u64,
        message: &MessageReference,
    ) -> Result<RoleChanges, AppError> {
        Ok(RoleChanges::new(self.message_roles(message), Vec::new()))
    }

    async fn unreaction_roles(
        &self,
        _user_id: u64,
        message: &MessageReference,
    ) -> Result<RoleChanges, AppError> {
        Ok(RoleChanges::new(Vec::new(), self.message_roles(message)))
    }
}

#[async_trait]
impl NicknamesSource for StaticSource {
    async fn nicknames_for(
        &self,
        user_ids: &[u64],
    ) -> Result<HashMap<u64, Option<String>>, AppError> {
        Ok(user_ids
            .iter()
            .map(|id| (*id, self.nicknames.get(id).cloned()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const JSON: &str = r#"{
        "reaction_roles": { "256": ["Rules accepted", "Member"] },
        "member_roles": { "to_add": ["Member"], "to_remove": ["Newcomer"] },
        "known_roles": ["Verified"],
        "nicknames": { "123": "Jan" }
    }"#;

    /// Tests that reacting on a listed message grants its roles.
    ///
    /// Expected: Ok with the message's roles to add
    #[tokio::test]
    async fn reaction_grants_message_roles() {
        let source = StaticSource::from_json(JSON).unwrap();

        let changes = source
            .reaction_roles(123, &MessageReference::new(1, 256))
            .await
            .unwrap();

        assert_eq!(changes.to_add, vec!["Rules accepted", "Member"]);
        assert!(changes.to_remove.is_empty());
    }

    /// Tests that withdrawing a reaction revokes the message's roles.
    ///
    /// Expected: Ok with the message's roles to remove
    #[tokio::test]
    async fn unreaction_revokes_message_roles() {
        let source = StaticSource::from_json(JSON).unwrap();

        let changes = source
            .unreaction_roles(123, &MessageReference::new(1, 256))
            .await
            .unwrap();

        assert!(changes.to_add.is_empty());
        assert_eq!(changes.to_remove, vec!["Rules accepted", "Member"]);
    }

    /// Tests reacting on a message that is not listed.
    ///
    /// Expected: Ok with no changes
    #[tokio::test]
    async fn unknown_message_changes_nothing() {
        let source = StaticSource::from_json(JSON).unwrap();

        let changes = source
            .reaction_roles(123, &MessageReference::new(1, 999))
            .await
            .unwrap();

        assert!(changes.is_empty());
    }

    /// Tests the membership roles of a known member who accepted the regulations.
    ///
    /// Expected: Ok with member and known roles granted, newcomer role revoked
    #[tokio::test]
    async fn accepted_known_member_roles() {
        let source = StaticSource::from_json(JSON).unwrap();
        let status = UserStatus {
            known: true,
            accepted: true,
        };

        let roles = source.user_roles(123, status).await.unwrap();

        assert_eq!(roles.to_add, vec!["Member", "Verified"]);
        assert_eq!(roles.to_remove, vec!["Newcomer"]);
    }

    /// Tests the membership roles of an unknown member who has not accepted
    /// the regulations.
    ///
    /// Expected: Ok with member roles reversed and the known role revoked
    #[tokio::test]
    async fn unaccepted_unknown_member_roles() {
        let source = StaticSource::from_json(JSON).unwrap();

        let roles = source.user_roles(5, UserStatus::default()).await.unwrap();

        assert_eq!(roles.to_add, vec!["Newcomer"]);
        assert_eq!(roles.to_remove, vec!["Member", "Verified"]);
    }

    /// Tests the nickname lookup.
    ///
    /// Expected: Ok with nicknames only for users listed in the file
    #[tokio::test]
    async fn nicknames_only_for_listed_users() {
        let source = StaticSource::from_json(JSON).unwrap();

        let nicknames = source.nicknames_for(&[123, 5]).await.unwrap();

        assert_eq!(nicknames.get(&123), Some(&Some("Jan".to_string())));
        assert_eq!(nicknames.get(&5), Some(&None));
    }

    /// Tests that malformed JSON is rejected.
    ///
    /// Expected: Err(JsonErr)
    #[test]
    fn malformed_json_is_rejected() {
        let result = StaticSource::from_json(r#"{ "reaction_roles": [] }"#);

        assert!(matches!(result, Err(AppError::JsonErr(_))));
    }
}
