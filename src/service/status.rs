//! Membership status lookups.
//!
//! A member has accepted the server regulations once they reacted with the
//! configured emoji on every regulations message. The reactions themselves are
//! the record, so acceptance survives restarts and is read back from Discord
//! on demand.

use std::collections::{HashMap, HashSet};

use serenity::all::{ChannelId, MessageId, ReactionType};
use serenity::http::Http;

use crate::error::AppError;
use crate::model::status::{RegulationsAcceptance, UserStatus};
use crate::processor::event::MessageReference;
use crate::service::roles_source::NicknamesSource;

/// Maximum page size of Discord's get reactions endpoint.
const REACTIONS_PAGE_SIZE: u8 = 100;

pub struct MemberStatusService<'a> {
    http: &'a Http,
    regulations: &'a [MessageReference],
    emoji: &'a str,
    nicknames: &'a dyn NicknamesSource,
}

impl<'a> MemberStatusService<'a> {
    pub fn new(
        http: &'a Http,
        regulations: &'a [MessageReference],
        emoji: &'a str,
        nicknames: &'a dyn NicknamesSource,
    ) -> Self {
        Self {
            http,
            regulations,
            emoji,
            nicknames,
        }
    }

    /// Status of a single member, checking one reaction per regulations part
    ///
    /// # Returns
    /// - `Ok(UserStatus)`: Whether the member is known and accepted the regulations
    /// - `Err(AppError)`: Reading reactions or querying the nicknames source failed
    pub async fn status_of(&self, user_id: u64) -> Result<UserStatus, AppError> {
        let mut accepted = true;
        for part in self.regulations {
            if !self.has_reacted(part, user_id).await? {
                accepted = false;
                break;
            }
        }

        let nicknames = self.nicknames.nicknames_for(&[user_id]).await?;

        Ok(UserStatus {
            known: is_known(&nicknames, user_id),
            accepted,
        })
    }

    /// Statuses of many members, reading every regulations part only once
    pub async fn statuses_of(
        &self,
        user_ids: &[u64],
    ) -> Result<HashMap<u64, UserStatus>, AppError> {
        let acceptance = self.acceptance().await?;
        let nicknames = self.nicknames.nicknames_for(user_ids).await?;

        Ok(user_ids
            .iter()
            .map(|&user_id| {
                let status = UserStatus {
                    known: is_known(&nicknames, user_id),
                    accepted: acceptance.has_accepted(user_id),
                };
                (user_id, status)
            })
            .collect())
    }

    async fn acceptance(&self) -> Result<RegulationsAcceptance, AppError> {
        let mut parts = Vec::with_capacity(self.regulations.len());
        for part in self.regulations {
            parts.push(self.reactors(part).await?);
        }

        Ok(RegulationsAcceptance::new(parts))
    }

    async fn reactors(&self, message: &MessageReference) -> Result<HashSet<u64>, AppError> {
        let reaction = self.reaction();
        let mut reactors = HashSet::new();
        let mut after = None;

        loop {
            let page = self
                .http
                .get_reaction_users(
                    ChannelId::new(message.channel_id),
                    MessageId::new(message.message_id),
                    &reaction,
                    REACTIONS_PAGE_SIZE,
                    after,
                )
                .await?;

            let page_len = page.len();
            after = page.last().map(|user| user.id.get());
            reactors.extend(page.iter().map(|user| user.id.get()));

            if page_len < usize::from(REACTIONS_PAGE_SIZE) {
                break;
            }
        }

        tracing::debug!(
            "{} users reacted on regulations message {}",
            reactors.len(),
            message.message_id
        );

        Ok(reactors)
    }

    /// Reaction users are listed in ascending id order, so the first user after
    /// `user_id - 1` is the member themself exactly when they reacted.
    async fn has_reacted(
        &self,
        message: &MessageReference,
        user_id: u64,
    ) -> Result<bool, AppError> {
        let page = self
            .http
            .get_reaction_users(
                ChannelId::new(message.channel_id),
                MessageId::new(message.message_id),
                &self.reaction(),
                1,
                Some(user_id.saturating_sub(1)),
            )
            .await?;

        Ok(page.first().is_some_and(|user| user.id.get() == user_id))
    }

    fn reaction(&self) -> ReactionType {
        ReactionType::Unicode(self.emoji.to_string())
    }
}

/// Users with a nickname entry are known to the external authority.
fn is_known(nicknames: &HashMap<u64, Option<String>>, user_id: u64) -> bool {
    matches!(nicknames.get(&user_id), Some(Some(_)))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Tests which nickname lookup results make a user known.
    ///
    /// Expected: only users with a nickname
    #[test]
    fn known_users_have_a_nickname() {
        let nicknames = HashMap::from([(1, Some("Jan".to_string())), (2, None)]);

        assert!(is_known(&nicknames, 1));
        assert!(!is_known(&nicknames, 2));
        assert!(!is_known(&nicknames, 3));
    }
}
