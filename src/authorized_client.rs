use crate::error::{Error, Result};
use crate::scope::{scope_to_set, scope_to_string};
use crate::settings::Settings;
use crate::transport::Transport;
use log::{debug, trace};
use oauth2::basic::BasicClient;
use oauth2::http::header::{ACCEPT, AUTHORIZATION};
use oauth2::http::{HeaderMap, HeaderValue, Method};
use oauth2::{
    AuthType, AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, HttpRequest,
    RedirectUrl, Scope, TokenUrl,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use url::Url;

/// Query parameters of a resource request. Later inserts override earlier ones.
pub type QueryParams = BTreeMap<String, String>;

/// How the end-user's authorization reaches the client.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GrantFlow {
    /// The redirect carries a code that is exchanged at the token endpoint.
    AuthorizationCode,
    /// The redirect carries the access token itself.
    Implicit,
}

/// Where the access token goes on resource requests.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenPlacement {
    BearerHeader,
    /// As a query parameter with the given name.
    Query(&'static str),
}

/// Fixed endpoints and conventions of a service.
#[derive(Clone, Copy, Debug)]
pub struct Endpoints {
    pub authorization_url: &'static str,
    pub token_url: Option<&'static str>,
    pub base_url: &'static str,
    pub flow: GrantFlow,
    pub token_placement: TokenPlacement,
    pub scope_delimiter: &'static str,
}

/// Access token returned by the authorization server.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

impl Token {
    /// Scope granted by the server, when it reported one.
    pub fn scope_set(&self, delimiter: &str) -> BTreeSet<String> {
        scope_to_set(self.scope.clone(), delimiter)
    }
}

/// OAuth 2.0 session of one end-user with one service.
///
/// Holds the requested scope, the CSRF state and the access token, and issues
/// authenticated GETs through the configured [`Transport`].
pub struct AuthorizedClient {
    oauth_client: BasicClient,
    transport: Box<dyn Transport>,
    endpoints: Endpoints,
    scope: BTreeSet<String>,
    state: Option<String>,
    token: Option<Token>,
}

impl AuthorizedClient {
    pub fn new(
        endpoints: Endpoints,
        settings: &Settings,
        transport: Box<dyn Transport>,
    ) -> Result<Self> {
        let oauth_client = oauth_client(
            endpoints.authorization_url,
            endpoints.token_url,
            &settings.client_id,
            settings.client_secret.as_deref(),
            &settings.redirect_uri,
        )?;

        Ok(AuthorizedClient {
            oauth_client,
            transport,
            endpoints,
            scope: BTreeSet::new(),
            state: settings.state.clone(),
            token: None,
        })
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    pub fn scope(&self) -> &BTreeSet<String> {
        &self.scope
    }

    pub fn set_scope(&mut self, scope: BTreeSet<String>) {
        self.scope = scope;
    }

    /// The scope as the service expects it on the wire.
    pub fn encoded_scope(&self) -> String {
        scope_to_string(&self.scope, self.endpoints.scope_delimiter).unwrap_or_default()
    }

    pub fn state(&self) -> Option<&str> {
        self.state.as_deref()
    }

    pub fn token(&self) -> Option<&Token> {
        self.token.as_ref()
    }

    pub fn access_token(&self) -> Option<&str> {
        self.token.as_ref().map(|token| token.access_token.as_str())
    }

    pub fn set_token(&mut self, token: Token) {
        self.token = Some(token);
    }

    /// Drops the access token so the next use requires a new authorization.
    pub fn invalidate_token(&mut self) {
        if self.token.take().is_some() {
            debug!("Invalidated access token");
        }
    }

    /// Builds the URL the end-user visits to authorize the client, together with the
    /// CSRF state embedded in it.
    pub fn authorization_url(&mut self) -> Result<(Url, String)> {
        let state = match &self.state {
            Some(state) => CsrfToken::new(state.clone()),
            None => CsrfToken::new_random(),
        };
        let (url, state) = authorization_request_url(
            &self.oauth_client,
            state,
            self.encoded_scope(),
            self.endpoints.flow,
        );

        self.state = Some(state.clone());
        Ok((url, state))
    }

    /// Obtains the access token once the end-user authorized the client.
    ///
    /// For the authorization code flow either `code` or `authorization_response` (the
    /// full URL the end-user was redirected to) must be given. The implicit flow
    /// requires `authorization_response`, since the token is carried by the redirect
    /// itself.
    pub fn fetch_token(
        &mut self,
        code: Option<&str>,
        authorization_response: Option<&str>,
        include_client_id: bool,
    ) -> Result<Token> {
        let response_params = authorization_response
            .map(redirect_params)
            .transpose()?;
        if let Some(params) = &response_params {
            self.check_state(params)?;
        }

        let token = match self.endpoints.flow {
            GrantFlow::Implicit => {
                let params = response_params.ok_or_else(|| {
                    Error::InvalidArgument(
                        "the implicit flow requires the authorization response url \
                         instead of a code"
                            .to_string(),
                    )
                })?;
                token_from_redirect(&params)?
            }
            GrantFlow::AuthorizationCode => {
                let code = authorization_code(code, response_params.as_ref())?;
                exchange_code(&self.oauth_client, &*self.transport, code, include_client_id)?
            }
        };

        debug!("Obtained access token");
        self.token = Some(token.clone());
        Ok(token)
    }

    fn check_state(&self, params: &BTreeMap<String, String>) -> Result<()> {
        match (self.state.as_deref(), params.get("state")) {
            (Some(expected), Some(received)) if expected != received => Err(Error::StateMismatch),
            _ => Ok(()),
        }
    }

    /// GETs `url` and decodes the JSON body. Any status outside 2xx is an error.
    pub fn get_json(&self, url: &str, params: &QueryParams) -> Result<Value> {
        let mut url = Url::parse(url)?;
        {
            // Add the query parameters
            let mut query = url.query_pairs_mut();
            for (key, value) in params {
                query.append_pair(key, value);
            }
            // Some services want the token as a parameter, an explicit one wins
            if let (TokenPlacement::Query(name), Some(token)) =
                (self.endpoints.token_placement, self.access_token())
            {
                if !params.contains_key(name) {
                    query.append_pair(name, token);
                }
            }
        }
        if url.query() == Some("") {
            url.set_query(None);
        }

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        // Add the bearer token
        if let (TokenPlacement::BearerHeader, Some(token)) =
            (self.endpoints.token_placement, self.access_token())
        {
            let value = HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|_| {
                Error::InvalidArgument("access token is not a valid header".to_string())
            })?;
            headers.insert(AUTHORIZATION, value);
        }

        // Send the request
        trace!("GET {}", url.path());
        let response = self.transport.execute(HttpRequest {
            url,
            method: Method::GET,
            headers,
            body: Vec::new(),
        })?;

        if !response.status_code.is_success() {
            return Err(Error::Http {
                status: response.status_code.as_u16(),
                reason: response
                    .status_code
                    .canonical_reason()
                    .unwrap_or_default()
                    .to_string(),
            });
        }
        Ok(serde_json::from_slice(&response.body)?)
    }
}

pub(crate) fn oauth_client(
    authorization_url: &str,
    token_url: Option<&str>,
    client_id: &str,
    client_secret: Option<&str>,
    redirect_uri: &str,
) -> Result<BasicClient> {
    let token_url = token_url.map(|url| TokenUrl::new(url.to_string())).transpose()?;
    Ok(BasicClient::new(
        ClientId::new(client_id.to_string()),
        client_secret.map(|secret| ClientSecret::new(secret.to_string())),
        AuthUrl::new(authorization_url.to_string())?,
        token_url,
    )
    .set_redirect_uri(RedirectUrl::new(redirect_uri.to_string())?))
}

/// Builds the authorization URL for `oauth_client` and returns it with the state it
/// carries. An empty `scope` is left off the URL.
pub(crate) fn authorization_request_url(
    oauth_client: &BasicClient,
    state: CsrfToken,
    scope: String,
    flow: GrantFlow,
) -> (Url, String) {
    let mut request = oauth_client.authorize_url(move || state);
    if !scope.is_empty() {
        request = request.add_scope(Scope::new(scope));
    }
    if flow == GrantFlow::Implicit {
        request = request.use_implicit_flow();
    }
    let (url, state) = request.url();

    trace!("Built authorization url for {}", url.host_str().unwrap_or_default());
    (url, state.secret().clone())
}

/// Picks the authorization code, from `code` when given, from the redirect otherwise.
pub(crate) fn authorization_code(
    code: Option<&str>,
    response_params: Option<&BTreeMap<String, String>>,
) -> Result<String> {
    match (code, response_params) {
        (Some(code), _) => Ok(code.to_string()),
        (None, Some(params)) => params.get("code").cloned().ok_or_else(|| {
            Error::InvalidArgument("authorization response does not contain a code".to_string())
        }),
        (None, None) => Err(Error::InvalidArgument(
            "either a code or an authorization response is required".to_string(),
        )),
    }
}

/// Trades `code` for an access token at the token endpoint of `oauth_client`.
///
/// With `include_client_id` the client credentials travel in the request body,
/// otherwise as HTTP basic auth.
pub(crate) fn exchange_code(
    oauth_client: &BasicClient,
    transport: &dyn Transport,
    code: String,
    include_client_id: bool,
) -> Result<Token> {
    let auth_type = if include_client_id {
        AuthType::RequestBody
    } else {
        AuthType::BasicAuth
    };
    let oauth_client = oauth_client.clone().set_auth_type(auth_type);

    // Let the oauth2 client build the request, the transport sends it
    trace!("Exchanging authorization code for an access token");
    let response = oauth_client
        .exchange_code(AuthorizationCode::new(code))
        .request(|request| transport.execute(request))
        .map_err(|e| {
            Error::TokenExchange(anyhow::Error::new(e).context("code exchange rejected"))
        })?;

    // Keep the token in our own shape
    Ok(serde_json::from_value(serde_json::to_value(&response)?)?)
}

/// Collects the parameters of a redirect URL, from its fragment first and its query
/// second.
pub(crate) fn redirect_params(authorization_response: &str) -> Result<BTreeMap<String, String>> {
    let url = Url::parse(authorization_response)?;
    let mut params: BTreeMap<String, String> = url.query_pairs().into_owned().collect();
    if let Some(fragment) = url.fragment() {
        params.extend(url::form_urlencoded::parse(fragment.as_bytes()).into_owned());
    }
    Ok(params)
}

fn token_from_redirect(params: &BTreeMap<String, String>) -> Result<Token> {
    let access_token = params.get("access_token").cloned().ok_or_else(|| {
        Error::InvalidArgument(
            "authorization response does not contain an access token".to_string(),
        )
    })?;
    Ok(Token {
        access_token,
        token_type: params.get("token_type").cloned(),
        expires_in: params.get("expires_in").and_then(|value| value.parse().ok()),
        refresh_token: None,
        scope: params.get("scope").cloned(),
    })
}
