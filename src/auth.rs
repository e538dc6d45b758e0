//! Allow-list check for inbound senders.

use crate::config::Config;
use crate::types::{Actor, AllowedActor};

/// Static set of users permitted to convert files.
#[derive(Debug, Clone, Default)]
pub struct AllowList {
    entries: Vec<AllowedActor>,
}

impl AllowList {
    pub fn new(entries: Vec<AllowedActor>) -> Self {
        Self { entries }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.restrict_to.clone().unwrap_or_default())
    }

    /// Both the username and the numeric id must match the same entry.
    pub fn is_allowed(&self, actor: &Actor) -> bool {
        self.entries
            .iter()
            .any(|e| e.username == actor.username && e.chat_id == actor.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list() -> AllowList {
        AllowList::new(vec![
            AllowedActor {
                username: "mario".into(),
                chat_id: 42,
            },
            AllowedActor {
                username: "luigi".into(),
                chat_id: 7,
            },
        ])
    }

    #[test]
    fn test_allowed() {
        assert!(list().is_allowed(&Actor::new("mario", 42)));
        assert!(list().is_allowed(&Actor::new("luigi", 7)));
    }

    #[test]
    fn test_pair_must_match() {
        assert!(!list().is_allowed(&Actor::new("mario", 7)));
        assert!(!list().is_allowed(&Actor::new("peach", 42)));
        assert!(!list().is_allowed(&Actor::new("Mario", 42)));
    }

    #[test]
    fn test_empty_list_denies() {
        assert!(!AllowList::default().is_allowed(&Actor::new("", 0)));

        let config = Config::from_json(r#"{"BotAPIKey": "t"}"#).unwrap();
        let list = AllowList::from_config(&config);
        assert!(!list.is_allowed(&Actor::new("mario", 42)));
    }
}
