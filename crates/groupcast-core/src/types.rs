//! Shared domain types.

use serde::{Deserialize, Serialize};

/// Kind of group chat. Only these two are ever broadcast targets —
/// private chats and broadcast channels are filtered out at the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupKind {
    Group,
    Supergroup,
}

impl GroupKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupKind::Group => "group",
            GroupKind::Supergroup => "supergroup",
        }
    }
}

/// A group chat the account belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupInfo {
    pub id: i64,
    /// Title as last observed. May be empty for operator-seeded entries
    /// until the first update mentioning the chat arrives.
    #[serde(default)]
    pub title: String,
    pub kind: GroupKind,
}

impl GroupInfo {
    pub fn new(id: i64, title: &str, kind: GroupKind) -> Self {
        Self {
            id,
            title: title.to_string(),
            kind,
        }
    }

    /// Short display form for logs: title when known, bare id otherwise.
    pub fn label(&self) -> String {
        if self.title.is_empty() {
            self.id.to_string()
        } else {
            format!("{} ({})", self.title, self.id)
        }
    }
}

/// Membership change derived from a platform update.
#[derive(Debug, Clone, PartialEq)]
pub enum RosterEvent {
    /// The account was added to (or re-admitted into) a group.
    Joined(GroupInfo),
    /// A group the account belongs to was observed in traffic — refreshes
    /// the title and the last-seen timestamp.
    Seen(GroupInfo),
    /// The account left or was removed from the group.
    Left(i64),
}

/// Acknowledgement returned by the platform for a delivered message.
#[derive(Debug, Clone, PartialEq)]
pub struct SendReceipt {
    pub message_id: i64,
    pub date: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_label() {
        let named = GroupInfo::new(-100123, "Rustaceans", GroupKind::Supergroup);
        assert_eq!(named.label(), "Rustaceans (-100123)");

        let seeded = GroupInfo::new(-42, "", GroupKind::Group);
        assert_eq!(seeded.label(), "-42");
    }

    #[test]
    fn test_kind_roundtrip() {
        let json = serde_json::to_string(&GroupKind::Supergroup).unwrap();
        assert_eq!(json, "\"supergroup\"");
        let back: GroupKind = serde_json::from_str(&json).unwrap();
        assert_eq!(back, GroupKind::Supergroup);
    }
}
