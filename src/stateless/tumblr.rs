//! Stateless authorization against Tumblr.
use super::TokenRequest;
use crate::authorized_client::{GrantFlow, Token};
use crate::error::Result;
use crate::transport::Transport;
use std::collections::BTreeSet;
use url::Url;

pub const AUTHORIZATION_URL: &str = "https://www.tumblr.com/oauth2/authorize";
pub const TOKEN_URL: &str = "https://api.tumblr.com/v2/oauth2/token";

/// The scope Tumblr needs for every supported vertical. Read access only ever needs
/// `base`.
pub fn scope() -> BTreeSet<String> {
    std::iter::once("base".to_string()).collect()
}

/// Builds the Tumblr authorization URL and the state embedded in it.
pub fn construct_authorization_url(client_id: &str, redirect_uri: &str) -> Result<(Url, String)> {
    super::construct_authorization_url(
        AUTHORIZATION_URL,
        client_id,
        redirect_uri,
        scope(),
        GrantFlow::AuthorizationCode,
    )
}

/// Exchanges a Tumblr authorization for an access token.
///
/// Either `code` or `authorization_response` must be given. Tumblr wants the client
/// credentials in the request body.
pub fn fetch_token(
    transport: &dyn Transport,
    client_id: &str,
    client_secret: Option<&str>,
    redirect_uri: &str,
    code: Option<&str>,
    authorization_response: Option<&str>,
) -> Result<Token> {
    let request = TokenRequest {
        token_url: TOKEN_URL,
        client_id,
        client_secret,
        redirect_uri,
        code,
        authorization_response,
        include_client_id: true,
    };
    super::fetch_token(&request, transport)
}
