use super::{from_object, parse_items, RawId};
use crate::authorized_client::{
    AuthorizedClient, Endpoints, GrantFlow, QueryParams, TokenPlacement,
};
use crate::error::{Error, Result};
use crate::records::{
    from_unix_seconds, parse_http_url, AssociatedMedia, BaseVertical, MediaType, PostStatus,
    SocialPosting,
};
use crate::service::{
    check_count, merge_params, Fetched, FetcherTable, Parsed, ServiceCore, TransferService,
};
use crate::settings::Settings;
use crate::stateless::tumblr::{scope, AUTHORIZATION_URL, TOKEN_URL};
use crate::transport::{ReqwestTransport, Transport};
use crate::vertical::Vertical;
use log::debug;
use serde::Deserialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

const SERVICE_NAME: &str = "Tumblr";
const MAX_POSTS: usize = 20;

const ENDPOINTS: Endpoints = Endpoints {
    authorization_url: AUTHORIZATION_URL,
    token_url: Some(TOKEN_URL),
    base_url: "https://api.tumblr.com/v2",
    flow: GrantFlow::AuthorizationCode,
    token_placement: TokenPlacement::BearerHeader,
    scope_delimiter: " ",
};

/// Transfers the dashboard and blog posts of a Tumblr user.
///
/// See <https://www.tumblr.com/docs/en/api/v2>.
pub struct TumblrTransferService {
    core: ServiceCore,
    fetchers: FetcherTable<Self>,
    primary_blog_id: Option<String>,
}

impl TumblrTransferService {
    pub fn new(settings: Settings) -> Result<Self> {
        Self::with_transport(settings, Box::new(ReqwestTransport::new()?))
    }

    pub fn with_transport(settings: Settings, transport: Box<dyn Transport>) -> Result<Self> {
        settings.require_client_secret(SERVICE_NAME)?;

        let mut fetchers: FetcherTable<Self> = BTreeMap::new();
        fetchers.insert(Vertical::SocialPosting, |service, request| {
            service
                .fetch_social_posting_vertical(&request.params, request.count)
                .map(Fetched::from)
        });

        let client = AuthorizedClient::new(ENDPOINTS, &settings, transport)?;
        let core = ServiceCore::new(
            SERVICE_NAME,
            fetchers.keys().copied().collect(),
            settings.verticals.iter().copied(),
            client,
        )?;
        let mut service = TumblrTransferService {
            core,
            fetchers,
            primary_blog_id: None,
        };
        service.reset_scope()?;
        Ok(service)
    }

    /// UUID of the user's primary blog. Looked up once, then remembered.
    pub fn primary_blog_id(&mut self) -> Result<String> {
        if let Some(id) = &self.primary_blog_id {
            return Ok(id.clone());
        }

        let raw = self.get_resource_from_path("user/info", QueryParams::new())?;
        let id = raw
            .pointer("/response/user/blogs")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .find(|blog| blog.get("primary").and_then(Value::as_bool) == Some(true))
            .and_then(|blog| blog.get("uuid"))
            .and_then(Value::as_str)
            .ok_or_else(|| Error::malformed(SERVICE_NAME, "user has no primary blog"))?
            .to_string();
        debug!("Found primary {} blog {}", SERVICE_NAME, id);
        self.primary_blog_id = Some(id.clone());
        Ok(id)
    }

    /// Posts on the user's dashboard, at most 20 per request.
    pub fn fetch_social_posting_vertical(
        &mut self,
        params: &QueryParams,
        count: Option<usize>,
    ) -> Result<Parsed<SocialPosting>> {
        self.fetch_posts("user/dashboard", params, count)
    }

    /// Posts of the user's primary blog, at most 20 per request.
    pub fn fetch_blog_posts(
        &mut self,
        params: &QueryParams,
        count: Option<usize>,
    ) -> Result<Parsed<SocialPosting>> {
        check_count(SERVICE_NAME, count.unwrap_or(MAX_POSTS), MAX_POSTS, "posts")?;
        let path = format!("blog/{}/posts", self.primary_blog_id()?);
        self.fetch_posts(&path, params, count)
    }

    fn fetch_posts(
        &mut self,
        path: &str,
        params: &QueryParams,
        count: Option<usize>,
    ) -> Result<Parsed<SocialPosting>> {
        let count = count.unwrap_or(MAX_POSTS);
        check_count(SERVICE_NAME, count, MAX_POSTS, "posts")?;
        let data_owner_id = self.primary_blog_id()?;

        let raw = self.get_resource_from_path(
            path,
            merge_params(
                &[("limit", count.to_string()), ("npf", "true".to_string())],
                params,
            ),
        )?;
        let posts = raw
            .pointer("/response/posts")
            .and_then(Value::as_array)
            .ok_or_else(|| Error::malformed(SERVICE_NAME, "response has no posts"))?;
        let records = parse_items(posts, |post| parse_social_posting(post, &data_owner_id));
        Ok((records, raw))
    }
}

impl TransferService for TumblrTransferService {
    fn core(&self) -> &ServiceCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ServiceCore {
        &mut self.core
    }

    fn scope_for_verticals(&self, verticals: &BTreeSet<Vertical>) -> Result<BTreeSet<String>> {
        self.core.ensure_supported(verticals)?;
        Ok(scope())
    }

    fn fetchers(&self) -> &FetcherTable<Self> {
        &self.fetchers
    }

    fn includes_client_id(&self) -> bool {
        true
    }
}

// Posts in the Neue Post Format, https://www.tumblr.com/docs/npf
#[derive(Debug, Deserialize)]
struct TumblrPost {
    id: Option<RawId>,
    id_string: Option<String>,
    blog: Option<TumblrBlog>,
    post_url: Option<String>,
    timestamp: Option<i64>,
    #[serde(default)]
    tags: Vec<String>,
    summary: Option<String>,
    note_count: Option<u64>,
    state: Option<String>,
    #[serde(default)]
    content: Vec<ContentBlock>,
    #[serde(default)]
    trail: Vec<TrailItem>,
}

#[derive(Debug, Deserialize)]
struct TumblrBlog {
    uuid: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TrailItem {
    post: Option<TrailPost>,
    blog: Option<TumblrBlog>,
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct TrailPost {
    id: Option<RawId>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum ContentBlock {
    Text {
        text: Option<String>,
        subtype: Option<String>,
    },
    Image {
        #[serde(default)]
        media: Vec<MediaObject>,
    },
    Video {
        url: Option<String>,
        media: Option<MediaObject>,
    },
    Audio {
        url: Option<String>,
        media: Option<MediaObject>,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct MediaObject {
    url: Option<String>,
}

/// Title, text and media carried by a list of content blocks.
#[derive(Debug, Default)]
struct Content {
    title: Option<String>,
    text: Option<String>,
    media: Vec<AssociatedMedia>,
}

impl Content {
    fn from_blocks(blocks: &[ContentBlock]) -> Self {
        let mut content = Content::default();
        let mut paragraphs = Vec::new();
        for block in blocks {
            match block {
                ContentBlock::Text { text: Some(text), subtype }
                    if content.title.is_none() && subtype.as_deref() == Some("heading1") =>
                {
                    content.title = Some(text.clone());
                }
                ContentBlock::Text { text: Some(text), .. } => paragraphs.push(text.as_str()),
                ContentBlock::Image { media } => {
                    let url = media.first().and_then(|media| media.url.as_deref());
                    content.media.extend(url.and_then(AssociatedMedia::image));
                }
                ContentBlock::Video { url, media } => {
                    content.media.extend(media_url(url, media, MediaType::Video));
                }
                ContentBlock::Audio { url, media } => {
                    content.media.extend(media_url(url, media, MediaType::Audio));
                }
                ContentBlock::Text { text: None, .. } | ContentBlock::Other => {}
            }
        }
        if !paragraphs.is_empty() {
            content.text = Some(paragraphs.join("\n"));
        }
        content
    }

    fn apply(self, posting: &mut SocialPosting) {
        posting.title = self.title;
        posting.text = self.text;
        posting.associated_media = self.media;
    }
}

fn media_url(
    url: &Option<String>,
    media: &Option<MediaObject>,
    media_type: MediaType,
) -> Option<AssociatedMedia> {
    let url = url
        .as_deref()
        .or_else(|| media.as_ref().and_then(|media| media.url.as_deref()))?;
    AssociatedMedia::new(Some(media_type), url)
}

fn status(state: &str) -> PostStatus {
    match state {
        "private" => PostStatus::Private,
        "draft" => PostStatus::Draft,
        "queued" | "submission" => PostStatus::Restricted,
        _ => PostStatus::Public,
    }
}

fn parse_social_posting(raw: &Value, data_owner_id: &str) -> Option<SocialPosting> {
    let post: TumblrPost = from_object(raw)?;

    let mut base = BaseVertical::new(Vertical::SocialPosting, SERVICE_NAME, data_owner_id);
    base.service_object_id = post
        .id_string
        .or_else(|| post.id.as_ref().map(ToString::to_string));
    base.creator_user_id = post.blog.and_then(|blog| blog.uuid);
    base.created_at = post.timestamp.and_then(from_unix_seconds);
    base.url = post.post_url.as_deref().and_then(parse_http_url);

    let mut posting = SocialPosting::new(base);
    posting.abstract_text = post.summary;
    posting.interaction_count = post.note_count;
    posting.keywords = post.tags;
    posting.status = post.state.as_deref().map(status);
    posting.shared_content = post
        .trail
        .iter()
        .map(|item| shared_posting(item, data_owner_id))
        .collect();
    Content::from_blocks(&post.content).apply(&mut posting);
    Some(posting)
}

// A post this one reblogs or quotes.
fn shared_posting(item: &TrailItem, data_owner_id: &str) -> SocialPosting {
    let mut base = BaseVertical::new(Vertical::SocialPosting, SERVICE_NAME, data_owner_id);
    base.service_object_id = item
        .post
        .as_ref()
        .and_then(|post| post.id.as_ref())
        .map(ToString::to_string);
    base.creator_user_id = item.blog.as_ref().and_then(|blog| blog.uuid.clone());

    let mut posting = SocialPosting::new(base);
    Content::from_blocks(&item.content).apply(&mut posting);
    posting
}
