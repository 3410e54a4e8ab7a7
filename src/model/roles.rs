use std::collections::{HashMap, HashSet};

use serde::Deserialize;

/// Role names to grant and revoke for a member.
///
/// Produced by a [`RolesSource`](crate::service::roles_source::RolesSource) and
/// reduced against the member's current roles before anything is sent to
/// Discord.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RoleChanges {
    #[serde(default)]
    pub to_add: Vec<String>,
    #[serde(default)]
    pub to_remove: Vec<String>,
}

impl RoleChanges {
    pub fn new(to_add: Vec<String>, to_remove: Vec<String>) -> Self {
        Self { to_add, to_remove }
    }

    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }

    /// Reduces the requested changes to the ones that actually change something.
    ///
    /// Names the member already has are dropped from `to_add`, names the member
    /// lacks are dropped from `to_remove`. Duplicates are removed while keeping
    /// the first occurrence's position. Both lists are computed against the
    /// member's roles as they are before any change is applied.
    ///
    /// # Arguments
    /// - `current` - Names of the roles the member currently has
    ///
    /// # Returns
    /// - `RoleChanges` - Only the effective additions and removals
    pub fn diff_against<'a, I>(&self, current: I) -> RoleChanges
    where
        I: IntoIterator<Item = &'a str>,
    {
        let current: HashSet<&str> = current.into_iter().collect();

        let to_add = unique(self.to_add.iter().filter(|name| !current.contains(name.as_str())));
        let to_remove = unique(
            self.to_remove
                .iter()
                .filter(|name| current.contains(name.as_str())),
        );

        RoleChanges { to_add, to_remove }
    }
}

fn unique<'a>(names: impl Iterator<Item = &'a String>) -> Vec<String> {
    let mut seen = HashSet::new();

    names
        .filter(|name| seen.insert(name.as_str()))
        .cloned()
        .collect()
}

/// Result of mapping role names onto guild role ids.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ResolvedRoles {
    pub ids: Vec<u64>,
    /// Names with no role of that name in the guild.
    pub unknown: Vec<String>,
}

/// Looks up each role name in the guild's name to id map.
pub fn resolve_role_names(names: &[String], by_name: &HashMap<String, u64>) -> ResolvedRoles {
    let mut resolved = ResolvedRoles::default();

    for name in names {
        match by_name.get(name) {
            Some(&id) => resolved.ids.push(id),
            None => resolved.unknown.push(name.clone()),
        }
    }

    resolved
}

/// Returns the nickname to set, if the member's current one differs from the
/// desired one. Members unknown to the nickname source keep their nickname.
pub fn nickname_update<'a>(current: Option<&str>, desired: Option<&'a str>) -> Option<&'a str> {
    match desired {
        Some(desired) if current != Some(desired) => Some(desired),
        _ => None,
    }
}
