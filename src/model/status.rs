use std::collections::HashSet;

/// Membership facts about a user that roles sources base their answer on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UserStatus {
    /// The nicknames source knows who the user is.
    pub known: bool,
    /// The user reacted on every part of the server regulations.
    pub accepted: bool,
}

/// Users who reacted on each part of the server regulations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegulationsAcceptance {
    parts: Vec<HashSet<u64>>,
}

impl RegulationsAcceptance {
    pub fn new(parts: Vec<HashSet<u64>>) -> Self {
        Self { parts }
    }

    /// A user accepts the regulations by reacting on all of their parts. With
    /// no regulations configured everyone counts as having accepted them.
    pub fn has_accepted(&self, user_id: u64) -> bool {
        self.parts.iter().all(|reactors| reactors.contains(&user_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Tests acceptance of a regulations document split into two messages.
    ///
    /// Expected: only users who reacted on both parts have accepted
    #[test]
    fn acceptance_requires_every_part() {
        let acceptance = RegulationsAcceptance::new(vec![
            HashSet::from([1, 2, 3]),
            HashSet::from([2, 3, 4]),
        ]);

        assert!(!acceptance.has_accepted(1));
        assert!(acceptance.has_accepted(2));
        assert!(acceptance.has_accepted(3));
        assert!(!acceptance.has_accepted(4));
        assert!(!acceptance.has_accepted(5));
    }

    /// Tests acceptance when no regulations messages are configured.
    ///
    /// Expected: every user has accepted
    #[test]
    fn no_regulations_means_accepted() {
        assert!(RegulationsAcceptance::default().has_accepted(1));
    }
}
