use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::convert::TryFrom;
use std::fmt;
use std::str::FromStr;

/// A category of data that can be transferred out of a service.
///
/// Not every vertical is supported by every service. A vertical can be parsed from
/// either its canonical name or its plural, both resolve to the same tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum Vertical {
    BlockedUser,
    ChatBot,
    ConversationDirect,
    ConversationGroup,
    PhysicalActivity,
    SocialPosting,
}

impl Vertical {
    pub const ALL: [Vertical; 6] = [
        Vertical::BlockedUser,
        Vertical::ChatBot,
        Vertical::ConversationDirect,
        Vertical::ConversationGroup,
        Vertical::PhysicalActivity,
        Vertical::SocialPosting,
    ];

    /// Canonical snake case name, used as `vertical_name` on records.
    pub fn name(self) -> &'static str {
        match self {
            Vertical::BlockedUser => "blocked_user",
            Vertical::ChatBot => "chat_bot",
            Vertical::ConversationDirect => "conversation_direct",
            Vertical::ConversationGroup => "conversation_group",
            Vertical::PhysicalActivity => "physical_activity",
            Vertical::SocialPosting => "social_posting",
        }
    }

    pub fn plural(self) -> &'static str {
        match self {
            Vertical::BlockedUser => "blocked_users",
            Vertical::ChatBot => "chat_bots",
            Vertical::ConversationDirect => "conversations_direct",
            Vertical::ConversationGroup => "conversations_group",
            Vertical::PhysicalActivity => "physical_activities",
            Vertical::SocialPosting => "social_postings",
        }
    }
}

impl fmt::Display for Vertical {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Vertical {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Vertical::ALL
            .iter()
            .copied()
            .find(|vertical| vertical.name() == s || vertical.plural() == s)
            .ok_or_else(|| Error::InvalidArgument(format!("unknown vertical '{}'", s)))
    }
}

impl TryFrom<String> for Vertical {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Vertical> for &'static str {
    fn from(vertical: Vertical) -> Self {
        vertical.name()
    }
}
