//! Authorization without a session.
//!
//! Each call here takes everything it needs as arguments and keeps nothing, so
//! endpoints can be chosen at runtime. The caller holds on to the state and the token.
//! Services with fixed endpoints have their own wrappers, e.g. [`tumblr`].
use crate::authorized_client::{
    authorization_code, authorization_request_url, exchange_code, oauth_client,
    redirect_params, GrantFlow, Token,
};
use crate::error::Result;
use crate::scope::{scope_to_string, Scopes};
use crate::transport::Transport;
use log::debug;
use oauth2::CsrfToken;
use url::Url;

pub mod tumblr;

/// Delimiter used to encode the scope on the authorization URL.
pub const SCOPE_DELIMITER: &str = " ";

/// Builds the URL the end-user visits to authorize `client_id`, together with the fresh
/// random state embedded in it.
///
/// The scope is joined with [`SCOPE_DELIMITER`] and left off the URL when empty.
pub fn construct_authorization_url(
    authorization_url: &str,
    client_id: &str,
    redirect_uri: &str,
    scope: impl Into<Scopes>,
    flow: GrantFlow,
) -> Result<(Url, String)> {
    let oauth_client = oauth_client(authorization_url, None, client_id, None, redirect_uri)?;
    let scope = scope_to_string(scope, SCOPE_DELIMITER).unwrap_or_default();
    Ok(authorization_request_url(&oauth_client, CsrfToken::new_random(), scope, flow))
}

/// Everything needed to trade an authorization for an access token.
#[derive(Clone, Debug, Default)]
pub struct TokenRequest<'a> {
    pub token_url: &'a str,
    pub client_id: &'a str,
    pub client_secret: Option<&'a str>,
    pub redirect_uri: &'a str,
    /// The code from the redirect.
    pub code: Option<&'a str>,
    /// The full URL the end-user was redirected to. Its `code` is used when no `code`
    /// is given.
    pub authorization_response: Option<&'a str>,
    /// Send the client credentials in the request body instead of as basic auth.
    pub include_client_id: bool,
}

/// Exchanges the code of `request` at its token endpoint.
///
/// Fails with `InvalidArgument` before sending anything when the request carries
/// neither a code nor an authorization response. No state check happens here, the
/// caller owns the state.
pub fn fetch_token(request: &TokenRequest<'_>, transport: &dyn Transport) -> Result<Token> {
    let response_params = request.authorization_response.map(redirect_params).transpose()?;
    let code = authorization_code(request.code, response_params.as_ref())?;

    let oauth_client = oauth_client(
        // The authorization endpoint plays no part in the exchange
        request.token_url,
        Some(request.token_url),
        request.client_id,
        request.client_secret,
        request.redirect_uri,
    )?;
    let token = exchange_code(&oauth_client, transport, code, request.include_client_id)?;

    debug!("Obtained access token");
    Ok(token)
}
