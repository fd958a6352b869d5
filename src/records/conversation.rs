use super::{AssociatedMedia, BaseVertical};
use crate::vertical::Vertical;
use serde::Serialize;
use std::ops::Deref;

/// Metadata of a conversation in which messages are exchanged between two or more
/// people.
///
/// Conversations are only handed out as [`ConversationDirect`] or
/// [`ConversationGroup`], which pin `is_group_conversation` (and, for direct
/// conversations, `members_count`).
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Conversation {
    #[serde(flatten)]
    pub base: BaseVertical,
    is_group_conversation: bool,
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
    pub associated_media: Vec<AssociatedMedia>,
    /// `None` when the service does not say.
    pub is_private: Option<bool>,
    pub member_user_ids: Vec<String>,
    pub members_count: Option<u64>,
    pub messages_count: Option<u64>,
    pub title: Option<String>,
}

impl Conversation {
    pub fn new(base: BaseVertical) -> Self {
        Conversation {
            base,
            is_group_conversation: false,
            abstract_text: None,
            associated_media: Vec::new(),
            is_private: None,
            member_user_ids: Vec::new(),
            members_count: None,
            messages_count: None,
            title: None,
        }
    }

    pub fn is_group_conversation(&self) -> bool {
        self.is_group_conversation
    }
}

/// A conversation between exactly two people.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ConversationDirect(Conversation);

impl ConversationDirect {
    pub const MEMBERS_COUNT: u64 = 2;
}

impl From<Conversation> for ConversationDirect {
    fn from(mut conversation: Conversation) -> Self {
        conversation.base.vertical_name = Vertical::ConversationDirect;
        conversation.is_group_conversation = false;
        conversation.members_count = Some(Self::MEMBERS_COUNT);
        ConversationDirect(conversation)
    }
}

impl Deref for ConversationDirect {
    type Target = Conversation;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// A conversation held in a group.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ConversationGroup(Conversation);

impl From<Conversation> for ConversationGroup {
    fn from(mut conversation: Conversation) -> Self {
        conversation.base.vertical_name = Vertical::ConversationGroup;
        conversation.is_group_conversation = true;
        ConversationGroup(conversation)
    }
}

impl Deref for ConversationGroup {
    type Target = Conversation;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
