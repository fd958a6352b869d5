use super::BaseVertical;
use serde::Serialize;

/// A user blocked by the data owner.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BlockedUser {
    #[serde(flatten)]
    pub base: BaseVertical,
    pub blocked_user_id: String,
}
