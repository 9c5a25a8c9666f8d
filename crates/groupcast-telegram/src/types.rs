//! Bot API wire types — only the fields this tool reads.

use groupcast_core::types::{GroupInfo, GroupKind, RosterEvent};
use serde::{Deserialize, Serialize};

/// Standard Bot API response envelope.
#[derive(Debug, Deserialize)]
pub struct ApiEnvelope<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
    pub error_code: Option<i64>,
    #[serde(default)]
    pub parameters: Option<ResponseParameters>,
}

/// Extra failure details the server attaches to some errors.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ResponseParameters {
    pub retry_after: Option<u64>,
    pub migrate_to_chat_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub my_chat_member: Option<ChatMemberUpdated>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    pub date: i64,
    #[serde(default)]
    pub from: Option<User>,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chat {
    pub id: i64,
    #[serde(rename = "type")]
    pub chat_type: String,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub is_bot: bool,
    pub first_name: String,
    #[serde(default)]
    pub username: Option<String>,
}

/// Our own membership change, delivered under `my_chat_member`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMemberUpdated {
    pub chat: Chat,
    pub date: i64,
    pub old_chat_member: ChatMember,
    pub new_chat_member: ChatMember,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMember {
    pub status: String,
    pub user: User,
}

impl Chat {
    /// Map to a broadcast target. Private chats and channels yield `None`.
    pub fn group_info(&self) -> Option<GroupInfo> {
        let kind = match self.chat_type.as_str() {
            "group" => GroupKind::Group,
            "supergroup" => GroupKind::Supergroup,
            _ => return None,
        };
        Some(GroupInfo {
            id: self.id,
            title: self.title.clone().unwrap_or_default(),
            kind,
        })
    }
}

impl User {
    pub fn label(&self) -> String {
        match &self.username {
            Some(name) => format!("@{name}"),
            None => self.first_name.clone(),
        }
    }
}

impl Update {
    /// Classify an update into a roster event.
    ///
    /// `my_chat_member` transitions are authoritative for membership; a
    /// plain group message just proves we are still there and carries the
    /// current title.
    pub fn roster_event(&self) -> Option<RosterEvent> {
        if let Some(change) = &self.my_chat_member {
            let info = change.chat.group_info()?;
            return match change.new_chat_member.status.as_str() {
                "member" | "administrator" => Some(RosterEvent::Joined(info)),
                "left" | "kicked" => Some(RosterEvent::Left(info.id)),
                _ => None,
            };
        }

        let message = self.message.as_ref()?;
        let info = message.chat.group_info()?;
        Some(RosterEvent::Seen(info))
    }
}
