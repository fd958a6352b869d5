use super::{AssociatedMedia, BaseVertical};
use crate::vertical::Vertical;
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Public,
    Private,
    Draft,
    Restricted,
}

/// A post on a social service.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SocialPosting {
    #[serde(flatten)]
    pub base: BaseVertical,
    /// A short summary, description or bio.
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
    pub associated_media: Vec<AssociatedMedia>,
    pub interaction_count: Option<u64>,
    pub keywords: Vec<String>,
    /// Postings re-shared by this one.
    pub shared_content: Vec<SocialPosting>,
    pub status: Option<PostStatus>,
    pub text: Option<String>,
    pub title: Option<String>,
}

impl SocialPosting {
    pub fn new(mut base: BaseVertical) -> Self {
        base.vertical_name = Vertical::SocialPosting;
        SocialPosting {
            base,
            abstract_text: None,
            associated_media: Vec::new(),
            interaction_count: None,
            keywords: Vec::new(),
            shared_content: Vec::new(),
            status: None,
            text: None,
            title: None,
        }
    }
}
