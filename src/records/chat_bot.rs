use super::BaseVertical;
use serde::Serialize;

/// A bot created by `creator_user_id`, attached to a group conversation.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChatBot {
    #[serde(flatten)]
    pub base: BaseVertical,
    pub name: Option<String>,
    pub conversation_group_id: Option<String>,
}
