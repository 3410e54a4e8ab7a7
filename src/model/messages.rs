use crate::processor::event::MessageReference;

/// What a reaction on a bot-managed message means.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessagePurpose {
    /// One part of the server regulations. Reacting on every part accepts them.
    RegulationsPart,
    /// Reacting asks the bot to recompute the member's roles right away.
    RolesRefresh,
    /// Any other message in an auto roles channel, mapped by the roles source.
    AutoRoles,
}

/// Individually configured messages with a fixed meaning.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManagedMessages {
    pub regulations: Vec<MessageReference>,
    pub roles_refresh: Option<MessageReference>,
}

impl ManagedMessages {
    pub fn purpose_of(&self, message: &MessageReference) -> MessagePurpose {
        if self.regulations.contains(message) {
            MessagePurpose::RegulationsPart
        } else if self.roles_refresh.as_ref() == Some(message) {
            MessagePurpose::RolesRefresh
        } else {
            MessagePurpose::AutoRoles
        }
    }

    /// Whether reactions on `message` are handled regardless of its channel.
    pub fn contains(&self, message: &MessageReference) -> bool {
        self.purpose_of(message) != MessagePurpose::AutoRoles
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn messages() -> ManagedMessages {
        ManagedMessages {
            regulations: vec![MessageReference::new(5, 501), MessageReference::new(5, 502)],
            roles_refresh: Some(MessageReference::new(6, 601)),
        }
    }

    /// Tests classifying reactions by the message they were placed on.
    ///
    /// Expected: regulations parts, the refresh message and everything else told apart
    #[test]
    fn classifies_managed_messages() {
        let messages = messages();

        assert_eq!(
            messages.purpose_of(&MessageReference::new(5, 502)),
            MessagePurpose::RegulationsPart
        );
        assert_eq!(
            messages.purpose_of(&MessageReference::new(6, 601)),
            MessagePurpose::RolesRefresh
        );
        assert_eq!(
            messages.purpose_of(&MessageReference::new(10, 256)),
            MessagePurpose::AutoRoles
        );
        assert!(messages.contains(&MessageReference::new(5, 501)));
        assert!(!messages.contains(&MessageReference::new(10, 256)));
    }
}
