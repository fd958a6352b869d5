use super::{from_object, parse_items, RawId};
use crate::authorized_client::{AuthorizedClient, Endpoints, GrantFlow, QueryParams, TokenPlacement};
use crate::error::{Error, Result};
use crate::records::{
    from_unix_seconds, AssociatedMedia, BaseVertical, BlockedUser, ChatBot, Conversation,
    ConversationDirect, ConversationGroup,
};
use crate::service::{
    check_count, merge_params, Fetched, FetcherTable, Parsed, ServiceCore, TransferService,
};
use crate::settings::Settings;
use crate::transport::{ReqwestTransport, Transport};
use crate::vertical::Vertical;
use log::debug;
use serde::Deserialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

const SERVICE_NAME: &str = "GroupMe";
const MAX_CONVERSATIONS: usize = 10;

const ENDPOINTS: Endpoints = Endpoints {
    authorization_url: "https://oauth.groupme.com/oauth/authorize",
    token_url: None,
    base_url: "https://api.groupme.com/v3",
    flow: GrantFlow::Implicit,
    token_placement: TokenPlacement::Query("token"),
    scope_delimiter: " ",
};

/// Transfers the conversations, bots and blocks of a GroupMe user.
///
/// GroupMe only offers the implicit grant: the access token is read from the redirect
/// URL, so [`TransferService::fetch_token`] needs `authorization_response`. Every
/// request carries the token and the user id as query parameters.
///
/// See <https://dev.groupme.com/docs/v3>.
pub struct GroupMeTransferService {
    core: ServiceCore,
    fetchers: FetcherTable<Self>,
    user_id: Option<String>,
}

impl GroupMeTransferService {
    pub fn new(settings: Settings) -> Result<Self> {
        Self::with_transport(settings, Box::new(ReqwestTransport::new()?))
    }

    pub fn with_transport(settings: Settings, transport: Box<dyn Transport>) -> Result<Self> {
        let mut fetchers: FetcherTable<Self> = BTreeMap::new();
        fetchers.insert(Vertical::BlockedUser, |service, request| {
            service
                .fetch_blocked_user_vertical(&request.params)
                .map(Fetched::from)
        });
        fetchers.insert(Vertical::ChatBot, |service, request| {
            service
                .fetch_chat_bot_vertical(&request.params)
                .map(Fetched::from)
        });
        fetchers.insert(Vertical::ConversationDirect, |service, request| {
            service
                .fetch_conversation_direct_vertical(&request.params, request.count)
                .map(Fetched::from)
        });
        fetchers.insert(Vertical::ConversationGroup, |service, request| {
            service
                .fetch_conversation_group_vertical(&request.params, request.count)
                .map(Fetched::from)
        });

        let client = AuthorizedClient::new(ENDPOINTS, &settings, transport)?;
        let core = ServiceCore::new(
            SERVICE_NAME,
            fetchers.keys().copied().collect(),
            settings.verticals.iter().copied(),
            client,
        )?;
        let mut service = GroupMeTransferService {
            core,
            fetchers,
            user_id: None,
        };
        service.reset_scope()?;
        Ok(service)
    }

    fn require_token(&self) -> Result<()> {
        match self.core.client().access_token() {
            Some(_) => Ok(()),
            None => Err(Error::unsupported_request(
                SERVICE_NAME,
                "an access token is required, call fetch_token first",
            )),
        }
    }

    /// Profile of the authenticated user. Also remembers the user's id.
    pub fn fetch_user_data(&mut self) -> Result<Value> {
        self.require_token()?;
        let uri = self.build_resource_url("users/me", None);
        let user = unwrap_envelope(self.get_resource(&uri, &QueryParams::new())?)?;

        let user_id = user
            .get("id")
            .and_then(|id| RawId::deserialize(id).ok())
            .ok_or_else(|| Error::malformed(SERVICE_NAME, "user has no id"))?
            .to_string();
        debug!("Authenticated as {} user {}", SERVICE_NAME, user_id);
        self.user_id = Some(user_id);
        Ok(user)
    }

    /// Id of the authenticated user, fetched on first use.
    pub fn user_id(&mut self) -> Result<String> {
        if let Some(user_id) = &self.user_id {
            return Ok(user_id.clone());
        }
        self.fetch_user_data()?;
        self.user_id
            .clone()
            .ok_or_else(|| Error::malformed(SERVICE_NAME, "user has no id"))
    }

    /// Users the authenticated user has blocked.
    pub fn fetch_blocked_user_vertical(
        &mut self,
        params: &QueryParams,
    ) -> Result<Parsed<BlockedUser>> {
        let raw = self.get_resource_from_path("blocks", params.clone())?;
        let user_id = self.user_id()?;
        let blocks = raw
            .get("blocks")
            .and_then(Value::as_array)
            .ok_or_else(|| Error::malformed(SERVICE_NAME, "response has no blocks"))?;
        let records = parse_items(blocks, |block| parse_blocked_user(block, &user_id));
        Ok((records, raw))
    }

    /// Bots the authenticated user created.
    pub fn fetch_chat_bot_vertical(&mut self, params: &QueryParams) -> Result<Parsed<ChatBot>> {
        let raw = self.get_resource_from_path("bots", params.clone())?;
        let user_id = self.user_id()?;
        let records = parse_items(list(&raw, "bots")?, |bot| parse_chat_bot(bot, &user_id));
        Ok((records, raw))
    }

    /// Direct conversations, at most 10 per request.
    pub fn fetch_conversation_direct_vertical(
        &mut self,
        params: &QueryParams,
        count: Option<usize>,
    ) -> Result<Parsed<ConversationDirect>> {
        let raw = self.fetch_conversations("chats", params, count)?;
        let user_id = self.user_id()?;
        let records = parse_items(list(&raw, "chats")?, |chat| {
            parse_conversation_direct(chat, &user_id)
        });
        Ok((records, raw))
    }

    /// Groups the authenticated user is a member of, at most 10 per request.
    pub fn fetch_conversation_group_vertical(
        &mut self,
        params: &QueryParams,
        count: Option<usize>,
    ) -> Result<Parsed<ConversationGroup>> {
        let raw = self.fetch_conversations("groups", params, count)?;
        let user_id = self.user_id()?;
        let records = parse_items(list(&raw, "groups")?, |group| {
            parse_conversation_group(group, &user_id)
        });
        Ok((records, raw))
    }

    fn fetch_conversations(
        &mut self,
        path: &str,
        params: &QueryParams,
        count: Option<usize>,
    ) -> Result<Value> {
        let count = count.unwrap_or(MAX_CONVERSATIONS);
        check_count(SERVICE_NAME, count, MAX_CONVERSATIONS, "conversations")?;
        self.get_resource_from_path(path, merge_params(&[("per_page", count.to_string())], params))
    }
}

impl TransferService for GroupMeTransferService {
    fn core(&self) -> &ServiceCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ServiceCore {
        &mut self.core
    }

    fn scope_for_verticals(&self, verticals: &BTreeSet<Vertical>) -> Result<BTreeSet<String>> {
        self.core.ensure_supported(verticals)?;
        // GroupMe has no scopes
        Ok(BTreeSet::new())
    }

    fn fetchers(&self) -> &FetcherTable<Self> {
        &self.fetchers
    }

    /// GETs `path` as the authenticated user and returns the contents of the
    /// `response` envelope.
    fn get_resource_from_path(&mut self, path: &str, mut params: QueryParams) -> Result<Value> {
        self.require_token()?;
        let user_id = self.user_id()?;
        params.entry("user".to_string()).or_insert(user_id);

        let uri = self.build_resource_url(path, None);
        unwrap_envelope(self.get_resource(&uri, &params)?)
    }
}

fn unwrap_envelope(mut raw: Value) -> Result<Value> {
    raw.get_mut("response")
        .map(Value::take)
        .ok_or_else(|| Error::malformed(SERVICE_NAME, "response envelope is missing"))
}

fn list<'a>(raw: &'a Value, what: &str) -> Result<&'a [Value]> {
    raw.as_array()
        .map(Vec::as_slice)
        .ok_or_else(|| Error::malformed(SERVICE_NAME, format!("expected a list of {}", what)))
}

#[derive(Debug, Deserialize)]
struct GroupMeBlock {
    user_id: Option<RawId>,
    blocked_user_id: Option<RawId>,
    created_at: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct GroupMeBot {
    bot_id: Option<RawId>,
    group_id: Option<RawId>,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GroupMeChat {
    created_at: Option<i64>,
    messages_count: Option<u64>,
    other_user: Option<GroupMeUser>,
}

#[derive(Debug, Deserialize)]
struct GroupMeUser {
    id: Option<RawId>,
}

#[derive(Debug, Deserialize)]
struct GroupMeGroup {
    id: Option<RawId>,
    name: Option<String>,
    #[serde(rename = "type")]
    group_type: Option<String>,
    image_url: Option<String>,
    creator_user_id: Option<RawId>,
    created_at: Option<i64>,
    members: Option<Vec<GroupMeMember>>,
    members_count: Option<u64>,
    messages: Option<GroupMeMessages>,
}

#[derive(Debug, Deserialize)]
struct GroupMeMember {
    user_id: Option<RawId>,
}

#[derive(Debug, Deserialize)]
struct GroupMeMessages {
    count: Option<u64>,
}

fn parse_blocked_user(raw: &Value, user_id: &str) -> Option<BlockedUser> {
    let block: GroupMeBlock = from_object(raw)?;

    let mut base = BaseVertical::new(Vertical::BlockedUser, SERVICE_NAME, user_id);
    base.creator_user_id = block.user_id.map(|id| id.to_string());
    base.created_at = block.created_at.and_then(from_unix_seconds);
    Some(BlockedUser {
        base,
        blocked_user_id: block.blocked_user_id?.to_string(),
    })
}

fn parse_chat_bot(raw: &Value, user_id: &str) -> Option<ChatBot> {
    let bot: GroupMeBot = from_object(raw)?;

    let mut base = BaseVertical::new(Vertical::ChatBot, SERVICE_NAME, user_id);
    base.service_object_id = bot.bot_id.map(|id| id.to_string());
    base.creator_user_id = Some(user_id.to_string());
    Some(ChatBot {
        base,
        name: bot.name,
        conversation_group_id: bot.group_id.map(|id| id.to_string()),
    })
}

fn parse_conversation_direct(raw: &Value, user_id: &str) -> Option<ConversationDirect> {
    let chat: GroupMeChat = from_object(raw)?;
    let other_user_id = chat.other_user?.id?.to_string();

    let mut base = BaseVertical::new(Vertical::ConversationDirect, SERVICE_NAME, user_id);
    base.created_at = chat.created_at.and_then(from_unix_seconds);

    let mut conversation = Conversation::new(base);
    conversation.member_user_ids = vec![user_id.to_string(), other_user_id];
    conversation.messages_count = chat.messages_count;
    Some(conversation.into())
}

fn parse_conversation_group(raw: &Value, user_id: &str) -> Option<ConversationGroup> {
    let group: GroupMeGroup = from_object(raw)?;

    let mut base = BaseVertical::new(Vertical::ConversationGroup, SERVICE_NAME, user_id);
    base.service_object_id = group.id.map(|id| id.to_string());
    base.creator_user_id = group.creator_user_id.map(|id| id.to_string());
    base.created_at = group.created_at.and_then(from_unix_seconds);

    let members: Option<Vec<String>> = group.members.map(|members| {
        members
            .into_iter()
            .filter_map(|member| member.user_id)
            .map(|id| id.to_string())
            .collect()
    });

    let mut conversation = Conversation::new(base);
    conversation.associated_media = group
        .image_url
        .as_deref()
        .and_then(AssociatedMedia::image)
        .into_iter()
        .collect();
    conversation.is_private = group.group_type.map(|group_type| group_type == "private");
    // Counted from the member list only when the list is there
    conversation.members_count = group
        .members_count
        .or_else(|| members.as_ref().map(|members| members.len() as u64));
    conversation.member_user_ids = members.unwrap_or_default();
    conversation.messages_count = group.messages.and_then(|messages| messages.count);
    conversation.title = group.name;
    Some(conversation.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authorized_client::Token;
    use crate::service::FetchRequest;
    use crate::transport::testing::{json_response, query};
    use crate::transport::MockTransport;
    use oauth2::HttpRequest;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use test_case::test_case;

    const USER_ID: &str = "fake_user_id";
    const TOKEN: &str = "fake_token";

    fn settings() -> Settings {
        Settings::new("fake_client_id", "https://redirect_uri")
    }

    fn service(transport: MockTransport) -> GroupMeTransferService {
        GroupMeTransferService::with_transport(settings(), Box::new(transport)).unwrap()
    }

    // Authorized, with the user already known.
    fn authorized_service(transport: MockTransport) -> GroupMeTransferService {
        let mut service = service(transport);
        service.core_mut().client_mut().set_token(Token {
            access_token: TOKEN.to_string(),
            token_type: None,
            expires_in: None,
            refresh_token: None,
            scope: None,
        });
        service.user_id = Some(USER_ID.to_string());
        service
    }

    fn is_path(request: &HttpRequest, path: &str) -> bool {
        request.url.path() == format!("/v3/{}", path)
    }

    fn expect_get(transport: &mut MockTransport, path: &'static str, body: Value) {
        transport
            .expect_execute()
            .withf(move |request| {
                let params = query(request);
                is_path(request, path)
                    && params.get("token").map(String::as_str) == Some(TOKEN)
                    && params.get("user").map(String::as_str) == Some(USER_ID)
            })
            .times(1)
            .returning(move |_| Ok(json_response(200, body.clone())));
    }

    #[test]
    fn authorization_url_requests_token_without_scope() {
        let mut service = service(MockTransport::new());
        let (url, state) = service.authorization_url().unwrap();
        let params: BTreeMap<String, String> = url.query_pairs().into_owned().collect();
        assert!(url.as_str().starts_with("https://oauth.groupme.com/oauth/authorize"));
        assert_eq!(params["response_type"], "token");
        assert_eq!(params["client_id"], "fake_client_id");
        assert_eq!(params["state"], state);
        assert!(!params.contains_key("scope"));
    }

    #[test]
    fn fetch_token_requires_authorization_response() {
        let mut service = service(MockTransport::new());
        assert!(matches!(
            service.fetch_token(Some("code"), None),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn fetch_token_requires_access_token_in_response() {
        let mut service = service(MockTransport::new());
        assert!(service
            .fetch_token(None, Some("https://localhostfake?token=badtoken"))
            .is_err());
        assert_eq!(service.core().client().access_token(), None);
    }

    #[test_case("https://localhostfake?access_token=faketoken123" ; "query")]
    #[test_case("https://localhostfake#access_token=faketoken123" ; "fragment")]
    fn fetch_token_reads_redirect(authorization_response: &str) {
        let mut transport = MockTransport::new();
        transport.expect_execute().never();
        let mut service = service(transport);

        let token = service.fetch_token(None, Some(authorization_response)).unwrap();
        assert_eq!(token.access_token, "faketoken123");
        assert_eq!(service.core().client().access_token(), Some("faketoken123"));
    }

    #[test]
    fn fetch_user_data_requires_token() {
        let mut transport = MockTransport::new();
        transport.expect_execute().never();
        let mut service = service(transport);
        assert!(matches!(
            service.fetch_user_data(),
            Err(Error::UnsupportedRequest { .. })
        ));
        assert!(matches!(
            service.fetch(Vertical::ChatBot, &FetchRequest::new()),
            Err(Error::UnsupportedRequest { .. })
        ));
    }

    #[test]
    fn fetch_user_data() {
        let mut transport = MockTransport::new();
        transport
            .expect_execute()
            .withf(|request| {
                is_path(request, "users/me")
                    && query(request).get("token").map(String::as_str) == Some(TOKEN)
            })
            .times(1)
            .returning(|_| {
                Ok(json_response(200, json!({"response": {"id": USER_ID, "name": "Jane"}})))
            });
        let mut service = authorized_service(transport);
        service.user_id = None;

        assert_eq!(
            service.fetch_user_data().unwrap(),
            json!({"id": USER_ID, "name": "Jane"})
        );
        assert_eq!(service.user_id().unwrap(), USER_ID);
    }

    #[test]
    fn user_is_looked_up_before_first_request() {
        let mut transport = MockTransport::new();
        transport
            .expect_execute()
            .withf(|request| is_path(request, "users/me"))
            .times(1)
            .returning(|_| Ok(json_response(200, json!({"response": {"id": 101010}}))));
        transport
            .expect_execute()
            .withf(|request| {
                is_path(request, "fake")
                    && query(request).get("user").map(String::as_str) == Some("101010")
            })
            .times(2)
            .returning(|_| Ok(json_response(200, json!({"response": {"fake": true}}))));
        let mut service = authorized_service(transport);
        service.user_id = None;

        for _ in 0..2 {
            assert_eq!(
                service.get_resource_from_path("fake", QueryParams::new()).unwrap(),
                json!({"fake": true})
            );
        }
        assert_eq!(service.user_id().unwrap(), "101010");
    }

    #[test]
    fn missing_envelope_is_malformed() {
        let mut transport = MockTransport::new();
        expect_get(&mut transport, "bots", json!([]));
        let mut service = authorized_service(transport);
        assert!(matches!(
            service.fetch_chat_bot_vertical(&QueryParams::new()),
            Err(Error::MalformedResponse { .. })
        ));
    }

    #[test]
    fn missing_blocks_are_malformed() {
        let mut transport = MockTransport::new();
        expect_get(&mut transport, "blocks", json!({"response": {"no_blocks": []}}));
        let mut service = authorized_service(transport);
        assert!(matches!(
            service.fetch_blocked_user_vertical(&QueryParams::new()),
            Err(Error::MalformedResponse { .. })
        ));
    }

    #[test]
    fn fetch_blocked_user_vertical() {
        let mut transport = MockTransport::new();
        // Adapted from https://dev.groupme.com/docs/v3#blocks_index
        expect_get(
            &mut transport,
            "blocks",
            json!({
                "response": {
                    "blocks": [
                        {
                            "user_id": USER_ID,
                            "blocked_user_id": "1234567890",
                            "created_at": 1302623328
                        },
                        {"blocked_user_id": "12345678901", "created_at": 1302623348},
                        {"user_id": USER_ID}
                    ]
                }
            }),
        );
        let mut service = authorized_service(transport);

        let (records, _) = service.fetch_blocked_user_vertical(&QueryParams::new()).unwrap();
        let records: Vec<Value> = records
            .iter()
            .map(|record| serde_json::to_value(record).unwrap())
            .collect();
        assert_eq!(
            records,
            vec![
                json!({
                    "service_object_id": null,
                    "creator_user_id": USER_ID,
                    "data_owner_id": USER_ID,
                    "service": "GroupMe",
                    "vertical_name": "blocked_user",
                    "created_at": "2011-04-12T15:48:48Z",
                    "url": null,
                    "blocked_user_id": "1234567890"
                }),
                json!({
                    "service_object_id": null,
                    "creator_user_id": null,
                    "data_owner_id": USER_ID,
                    "service": "GroupMe",
                    "vertical_name": "blocked_user",
                    "created_at": "2011-04-12T15:49:08Z",
                    "url": null,
                    "blocked_user_id": "12345678901"
                }),
                Value::Null
            ]
        );
    }

    #[test]
    fn fetch_chat_bot_vertical() {
        let mut transport = MockTransport::new();
        // Adapted from https://dev.groupme.com/docs/v3#bots_index
        expect_get(
            &mut transport,
            "bots",
            json!({
                "response": [
                    {
                        "bot_id": "1234567890",
                        "group_id": "1234567890",
                        "name": "hal9000",
                        "avatar_url": "https://i.groupme.com/123456789",
                        "callback_url": "https://example.com/bots/callback",
                        "dm_notification": false,
                        "active": true
                    },
                    {
                        "bot_id": "123",
                        "name": "hal9001",
                        "avatar_url": "https://i.groupme.com/123456789",
                        "callback_url": "https://example.com/bots/callback"
                    }
                ]
            }),
        );
        let mut service = authorized_service(transport);

        let fetched = service.fetch(Vertical::ChatBot, &FetchRequest::new()).unwrap();
        let records: Vec<Value> = fetched
            .records
            .iter()
            .map(|record| serde_json::to_value(record).unwrap())
            .collect();
        assert_eq!(
            records,
            vec![
                json!({
                    "service_object_id": "1234567890",
                    "creator_user_id": USER_ID,
                    "data_owner_id": USER_ID,
                    "service": "GroupMe",
                    "vertical_name": "chat_bot",
                    "created_at": null,
                    "url": null,
                    "name": "hal9000",
                    "conversation_group_id": "1234567890"
                }),
                json!({
                    "service_object_id": "123",
                    "creator_user_id": USER_ID,
                    "data_owner_id": USER_ID,
                    "service": "GroupMe",
                    "vertical_name": "chat_bot",
                    "created_at": null,
                    "url": null,
                    "name": "hal9001",
                    "conversation_group_id": null
                }),
            ]
        );
    }

    #[test_case(Vertical::ConversationDirect ; "direct")]
    #[test_case(Vertical::ConversationGroup ; "group")]
    fn count_above_ten_is_rejected_before_any_request(vertical: Vertical) {
        let mut transport = MockTransport::new();
        transport.expect_execute().never();
        let mut service = authorized_service(transport);
        assert!(matches!(
            service.fetch(vertical, &FetchRequest::new().count(11)),
            Err(Error::UnsupportedRequest { .. })
        ));
    }

    #[test]
    fn fetch_conversation_direct_vertical() {
        let mut transport = MockTransport::new();
        // Adapted from https://dev.groupme.com/docs/v3#chats_index
        let body = json!({
            "response": [
                {
                    "created_at": 1352299338,
                    "updated_at": 1352299338,
                    "last_message": {
                        "attachments": [],
                        "conversation_id": "12345+67890",
                        "id": "1234567890",
                        "text": "Hello world",
                        "user_id": "12345"
                    },
                    "messages_count": 10,
                    "other_user": {"id": 12345, "name": "John Doe"}
                },
                {
                    "created_at": 1668785830,
                    "messages_count": 1,
                    "other_user": {"id": "101010", "name": "Gabriel"},
                    "message_deletion_mode": ["sender"],
                    "unread_count": null
                }
            ]
        });
        transport
            .expect_execute()
            .withf(|request| is_path(request, "chats") && query(request)["per_page"] == "10")
            .times(1)
            .returning(move |_| Ok(json_response(200, body.clone())));
        let mut service = authorized_service(transport);

        let (records, _) = service
            .fetch_conversation_direct_vertical(&QueryParams::new(), None)
            .unwrap();
        let expected = |created_at: &str, other_user: &str, messages_count: u64| {
            json!({
                "service_object_id": null,
                "creator_user_id": null,
                "data_owner_id": USER_ID,
                "service": "GroupMe",
                "vertical_name": "conversation_direct",
                "created_at": created_at,
                "url": null,
                "is_group_conversation": false,
                "abstract": null,
                "associated_media": [],
                "is_private": null,
                "member_user_ids": [USER_ID, other_user],
                "members_count": 2,
                "messages_count": messages_count,
                "title": null
            })
        };
        let records: Vec<Value> = records
            .iter()
            .map(|record| serde_json::to_value(record).unwrap())
            .collect();
        assert_eq!(
            records,
            vec![
                expected("2012-11-07T14:42:18Z", "12345", 10),
                expected("2022-11-18T15:37:10Z", "101010", 1),
            ]
        );
    }

    #[test]
    fn fetch_conversation_group_vertical() {
        let mut transport = MockTransport::new();
        // Adapted from https://dev.groupme.com/docs/v3#groups_index
        let body = json!({
            "response": [
                {
                    "id": "1234567890",
                    "name": "Family",
                    "type": "private",
                    "description": "Coolest Family Ever",
                    "image_url": "https://i.groupme.com/123456789",
                    "creator_user_id": USER_ID,
                    "created_at": 1302623328,
                    "updated_at": 1302623328,
                    "members": [
                        {"user_id": USER_ID, "nickname": "Jane", "muted": false}
                    ],
                    "share_url": "https://groupme.com/join_group/1234567890/SHARE_TOKEN",
                    "messages": {
                        "count": 100,
                        "last_message_id": "1234567890",
                        "preview": {"nickname": "Jane", "text": "Hello world", "attachments": []}
                    }
                },
                {
                    "id": "111111",
                    "group_id": "111111",
                    "name": "Second Group",
                    "type": "closed",
                    "image_url": null,
                    "creator_user_id": "u222222",
                    "created_at": 1554220666,
                    "messages": {"count": 380},
                    "members": [
                        {"user_id": USER_ID, "roles": ["admin", "owner"]},
                        {"user_id": "u222222", "roles": ["user"]}
                    ],
                    "members_count": 2,
                    "directories": null
                },
                {
                    "id": 3,
                    "name": "Unknown"
                }
            ]
        });
        transport
            .expect_execute()
            .withf(|request| is_path(request, "groups") && query(request)["per_page"] == "5")
            .times(1)
            .returning(move |_| Ok(json_response(200, body.clone())));
        let mut service = authorized_service(transport);

        let (records, _) = service
            .fetch_conversation_group_vertical(&QueryParams::new(), Some(5))
            .unwrap();
        let records: Vec<Value> = records
            .iter()
            .map(|record| serde_json::to_value(record).unwrap())
            .collect();
        assert_eq!(
            records,
            vec![
                json!({
                    "service_object_id": "1234567890",
                    "creator_user_id": USER_ID,
                    "data_owner_id": USER_ID,
                    "service": "GroupMe",
                    "vertical_name": "conversation_group",
                    "created_at": "2011-04-12T15:48:48Z",
                    "url": null,
                    "is_group_conversation": true,
                    "abstract": null,
                    "associated_media": [
                        {"media_type": "image", "url": "https://i.groupme.com/123456789"}
                    ],
                    "is_private": true,
                    "member_user_ids": [USER_ID],
                    "members_count": 1,
                    "messages_count": 100,
                    "title": "Family"
                }),
                json!({
                    "service_object_id": "111111",
                    "creator_user_id": "u222222",
                    "data_owner_id": USER_ID,
                    "service": "GroupMe",
                    "vertical_name": "conversation_group",
                    "created_at": "2019-04-02T15:57:46Z",
                    "url": null,
                    "is_group_conversation": true,
                    "abstract": null,
                    "associated_media": [],
                    "is_private": false,
                    "member_user_ids": [USER_ID, "u222222"],
                    "members_count": 2,
                    "messages_count": 380,
                    "title": "Second Group"
                }),
                json!({
                    "service_object_id": "3",
                    "creator_user_id": null,
                    "data_owner_id": USER_ID,
                    "service": "GroupMe",
                    "vertical_name": "conversation_group",
                    "created_at": null,
                    "url": null,
                    "is_group_conversation": true,
                    "abstract": null,
                    "associated_media": [],
                    "is_private": null,
                    "member_user_ids": [],
                    "members_count": null,
                    "messages_count": null,
                    "title": "Unknown"
                }),
            ]
        );
    }

    #[test]
    fn members_count_is_only_derived_from_a_member_list() {
        let listed = json!({"id": 1, "members": [{"user_id": "a"}, {"user_id": "b"}]});
        let empty = json!({"id": 2, "members": []});
        let unknown = json!({"id": 3, "name": "Unknown"});

        assert_eq!(parse_conversation_group(&listed, USER_ID).unwrap().members_count, Some(2));
        assert_eq!(parse_conversation_group(&empty, USER_ID).unwrap().members_count, Some(0));
        let unknown = parse_conversation_group(&unknown, USER_ID).unwrap();
        assert_eq!(unknown.members_count, None);
        assert!(unknown.member_user_ids.is_empty());
    }

    #[test]
    fn unsupported_vertical_is_rejected() {
        let settings = settings().verticals(vec![Vertical::PhysicalActivity]);
        assert!(matches!(
            GroupMeTransferService::with_transport(settings, Box::new(MockTransport::new())),
            Err(Error::UnsupportedVertical { .. })
        ));
    }
}
