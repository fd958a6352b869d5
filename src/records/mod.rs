//! Records produced by parsing service responses.
//!
//! Every record carries a [`BaseVertical`] and the fields of its vertical. Records are
//! built once while parsing a single raw item and are not modified afterwards.

mod associated_media;
mod blocked_user;
mod chat_bot;
mod conversation;
mod physical_activity;
mod social_posting;

pub use associated_media::{AssociatedMedia, MediaType};
pub use blocked_user::BlockedUser;
pub use chat_bot::ChatBot;
pub use conversation::{Conversation, ConversationDirect, ConversationGroup};
pub use physical_activity::PhysicalActivity;
pub use social_posting::{PostStatus, SocialPosting};

use crate::vertical::Vertical;
use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;
use url::Url;

/// Fields shared by every record.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BaseVertical {
    /// Identifier assigned by the service, when the item has a stable one.
    pub service_object_id: Option<String>,
    pub creator_user_id: Option<String>,
    /// The account that authorized the transfer.
    pub data_owner_id: String,
    pub service: String,
    pub vertical_name: Vertical,
    pub created_at: Option<DateTime<Utc>>,
    pub url: Option<Url>,
}

impl BaseVertical {
    pub fn new(vertical: Vertical, service: &str, data_owner_id: &str) -> Self {
        BaseVertical {
            service_object_id: None,
            creator_user_id: None,
            data_owner_id: data_owner_id.to_string(),
            service: service.to_string(),
            vertical_name: vertical,
            created_at: None,
            url: None,
        }
    }
}

/// A parsed record of any vertical.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Record {
    BlockedUser(BlockedUser),
    ChatBot(ChatBot),
    ConversationDirect(ConversationDirect),
    ConversationGroup(ConversationGroup),
    PhysicalActivity(PhysicalActivity),
    SocialPosting(SocialPosting),
}

impl Record {
    pub fn base(&self) -> &BaseVertical {
        match self {
            Record::BlockedUser(record) => &record.base,
            Record::ChatBot(record) => &record.base,
            Record::ConversationDirect(record) => &record.base,
            Record::ConversationGroup(record) => &record.base,
            Record::PhysicalActivity(record) => &record.posting.base,
            Record::SocialPosting(record) => &record.base,
        }
    }

    pub fn vertical(&self) -> Vertical {
        self.base().vertical_name
    }
}

macro_rules! impl_from_record {
    ($($variant:ident),*) => {
        $(
            impl From<$variant> for Record {
                fn from(record: $variant) -> Self {
                    Record::$variant(record)
                }
            }
        )*
    };
}

impl_from_record!(
    BlockedUser,
    ChatBot,
    ConversationDirect,
    ConversationGroup,
    PhysicalActivity,
    SocialPosting
);

/// Parses an absolute http(s) URL. Anything else is treated as absent.
pub(crate) fn parse_http_url(raw: &str) -> Option<Url> {
    Url::parse(raw)
        .ok()
        .filter(|url| matches!(url.scheme(), "http" | "https"))
}

/// Parses a `2018-05-02T12:15:09Z` style timestamp as UTC.
pub(crate) fn parse_utc_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|datetime| datetime.with_timezone(&Utc))
}

pub(crate) fn from_unix_seconds(seconds: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_opt(seconds, 0).single()
}
