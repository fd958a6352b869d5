use super::parse_http_url;
use serde::Serialize;
use url::Url;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Audio,
    Image,
    Video,
}

/// Media attached to a parent record. Not a vertical on its own.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AssociatedMedia {
    pub media_type: Option<MediaType>,
    pub url: Url,
}

impl AssociatedMedia {
    /// Returns `None` when `raw_url` is not an absolute http(s) URL.
    pub fn new(media_type: Option<MediaType>, raw_url: &str) -> Option<Self> {
        parse_http_url(raw_url).map(|url| AssociatedMedia { media_type, url })
    }

    pub fn image(raw_url: &str) -> Option<Self> {
        Self::new(Some(MediaType::Image), raw_url)
    }
}
