//! The engine shared by every service: vertical and scope bookkeeping, the
//! authorization flow and dispatch of fetches to a service's parsers.

use crate::authorized_client::{AuthorizedClient, QueryParams, Token};
use crate::error::{Error, Result};
use crate::records::Record;
use crate::scope::has_sufficient_scope;
use crate::vertical::Vertical;
use log::debug;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use url::Url;

/// Records parsed from one response, positionally aligned with the raw items. An item
/// that could not be parsed leaves a `None` in its place.
pub type Parsed<T> = (Vec<Option<T>>, Value);

/// Result of a [`TransferService::fetch`].
#[derive(Clone, Debug, PartialEq)]
pub struct Fetched {
    pub records: Vec<Option<Record>>,
    pub raw: Value,
}

impl<T: Into<Record>> From<Parsed<T>> for Fetched {
    fn from((records, raw): Parsed<T>) -> Self {
        Fetched {
            records: records
                .into_iter()
                .map(|record| record.map(Into::into))
                .collect(),
            raw,
        }
    }
}

/// Arguments of a fetch. `count` falls back to the endpoint's default page size.
#[derive(Clone, Debug, Default)]
pub struct FetchRequest {
    pub params: QueryParams,
    pub count: Option<usize>,
}

impl FetchRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(mut self, count: usize) -> Self {
        self.count = Some(count);
        self
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }
}

/// Fetches one vertical on service `S`.
pub type Fetcher<S> = fn(&mut S, &FetchRequest) -> Result<Fetched>;

/// Maps every vertical a service supports to the function that fetches it.
pub type FetcherTable<S> = BTreeMap<Vertical, Fetcher<S>>;

/// State every service carries.
pub struct ServiceCore {
    name: &'static str,
    supported_verticals: BTreeSet<Vertical>,
    verticals: BTreeSet<Vertical>,
    client: AuthorizedClient,
}

impl ServiceCore {
    /// Fails with [`Error::UnsupportedVertical`] if any of `verticals` is not in
    /// `supported_verticals`.
    pub fn new(
        name: &'static str,
        supported_verticals: BTreeSet<Vertical>,
        verticals: impl IntoIterator<Item = Vertical>,
        client: AuthorizedClient,
    ) -> Result<Self> {
        let mut core = ServiceCore {
            name,
            supported_verticals,
            verticals: BTreeSet::new(),
            client,
        };
        core.set_verticals(verticals)?;
        Ok(core)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn supported_verticals(&self) -> &BTreeSet<Vertical> {
        &self.supported_verticals
    }

    pub fn verticals(&self) -> &BTreeSet<Vertical> {
        &self.verticals
    }

    pub fn client(&self) -> &AuthorizedClient {
        &self.client
    }

    pub fn client_mut(&mut self) -> &mut AuthorizedClient {
        &mut self.client
    }

    /// Fails with [`Error::UnsupportedVertical`], naming every offending vertical,
    /// unless all of `verticals` are supported.
    pub fn ensure_supported<'a, I>(&self, verticals: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a Vertical>,
    {
        let unsupported: Vec<Vertical> = verticals
            .into_iter()
            .filter(|vertical| !self.supported_verticals.contains(vertical))
            .copied()
            .collect();
        if unsupported.is_empty() {
            Ok(())
        } else {
            Err(Error::unsupported_vertical(unsupported, self.name))
        }
    }

    /// Replaces the selected verticals. Leaves them untouched on failure. The scope is
    /// not updated.
    pub fn set_verticals(&mut self, verticals: impl IntoIterator<Item = Vertical>) -> Result<()> {
        let verticals: BTreeSet<Vertical> = verticals.into_iter().collect();
        self.ensure_supported(&verticals)?;
        self.verticals = verticals;
        Ok(())
    }

    /// Joins `base` (the service's base URL by default) and `path` with exactly one
    /// slash between them.
    pub fn build_resource_url(&self, path: &str, base: Option<&str>) -> String {
        let base = base.unwrap_or(self.client.endpoints().base_url);
        format!(
            "{}/{}",
            base.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    pub fn get_resource(&self, uri: &str, params: &QueryParams) -> Result<Value> {
        self.client.get_json(uri, params)
    }
}

/// A service that data can be transferred from.
///
/// Implementors provide the scope each vertical needs and a table of fetchers; the
/// bookkeeping around them is shared.
pub trait TransferService {
    fn core(&self) -> &ServiceCore;

    fn core_mut(&mut self) -> &mut ServiceCore;

    /// The scope needed to fetch `verticals`. Fails with
    /// [`Error::UnsupportedVertical`] if any of them is not supported.
    fn scope_for_verticals(&self, verticals: &BTreeSet<Vertical>) -> Result<BTreeSet<String>>;

    fn fetchers(&self) -> &FetcherTable<Self>
    where
        Self: Sized;

    /// Whether the token request carries the client id in its body.
    fn includes_client_id(&self) -> bool {
        false
    }

    fn name(&self) -> &'static str {
        self.core().name()
    }

    fn supported_verticals(&self) -> &BTreeSet<Vertical> {
        self.core().supported_verticals()
    }

    fn is_vertical_supported(&self, vertical: Vertical) -> bool {
        self.core().supported_verticals().contains(&vertical)
    }

    /// The verticals currently selected for fetching.
    fn verticals(&self) -> &BTreeSet<Vertical> {
        self.core().verticals()
    }

    fn set_verticals(&mut self, verticals: impl IntoIterator<Item = Vertical>) -> Result<()>
    where
        Self: Sized,
    {
        self.core_mut().set_verticals(verticals)
    }

    fn scope(&self) -> &BTreeSet<String> {
        self.core().client().scope()
    }

    fn set_scope(&mut self, scope: BTreeSet<String>) {
        self.core_mut().client_mut().set_scope(scope)
    }

    /// Recomputes the scope from the selected verticals.
    fn reset_scope(&mut self) -> Result<()> {
        let scope = self.scope_for_verticals(self.verticals())?;
        self.set_scope(scope);
        Ok(())
    }

    /// Adds to the selected verticals.
    ///
    /// Returns `true` when the current scope already covers them. Otherwise, without
    /// `should_reauth` this fails with [`Error::InsufficientScope`] and changes
    /// nothing; with it, the verticals are added, the scope is widened, the access
    /// token is dropped and `false` is returned so the caller authorizes again.
    fn add_verticals(
        &mut self,
        verticals: impl IntoIterator<Item = Vertical>,
        should_reauth: bool,
    ) -> Result<bool>
    where
        Self: Sized,
    {
        // Only the verticals not selected yet need scope
        let requested: BTreeSet<Vertical> = verticals.into_iter().collect();
        let new_verticals: BTreeSet<Vertical> =
            requested.difference(self.verticals()).copied().collect();
        let needed_scope = self.scope_for_verticals(&new_verticals)?;
        let merged: BTreeSet<Vertical> = self.verticals().union(&new_verticals).copied().collect();

        // The current scope covers them, no new authorization needed
        if has_sufficient_scope(self.scope(), &needed_scope) {
            self.set_verticals(merged)?;
            return Ok(true);
        }
        if !should_reauth {
            return Err(Error::InsufficientScope {
                verticals: requested.into_iter().collect(),
                service: self.name().to_string(),
            });
        }

        // Widen the scope and drop the token so the user authorizes again
        self.set_verticals(merged)?;
        let scope: BTreeSet<String> = self.scope().union(&needed_scope).cloned().collect();
        debug!("Widened {} scope, reauthorization required", self.name());
        let client = self.core_mut().client_mut();
        client.invalidate_token();
        client.set_scope(scope);
        Ok(false)
    }

    /// The URL the end-user visits to authorize the client, and the CSRF state in it.
    fn authorization_url(&mut self) -> Result<(Url, String)> {
        self.core_mut().client_mut().authorization_url()
    }

    /// Obtains the access token from the authorization `code` or from the full
    /// `authorization_response` URL.
    fn fetch_token(
        &mut self,
        code: Option<&str>,
        authorization_response: Option<&str>,
    ) -> Result<Token> {
        let include_client_id = self.includes_client_id();
        self.core_mut()
            .client_mut()
            .fetch_token(code, authorization_response, include_client_id)
    }

    fn build_resource_url(&self, path: &str, base: Option<&str>) -> String {
        self.core().build_resource_url(path, base)
    }

    fn get_resource(&self, uri: &str, params: &QueryParams) -> Result<Value> {
        self.core().get_resource(uri, params)
    }

    fn get_resource_from_path(&mut self, path: &str, params: QueryParams) -> Result<Value> {
        let uri = self.build_resource_url(path, None);
        self.get_resource(&uri, &params)
    }

    /// Fetches `vertical`, failing with [`Error::UnsupportedVertical`] if the service
    /// cannot serve it.
    fn fetch(&mut self, vertical: Vertical, request: &FetchRequest) -> Result<Fetched>
    where
        Self: Sized,
    {
        let fetcher = self
            .fetchers()
            .get(&vertical)
            .copied()
            .ok_or_else(|| Error::unsupported_vertical(vec![vertical], self.name()))?;
        fetcher(self, request)
    }
}

/// Fails with [`Error::UnsupportedRequest`] when `count` exceeds what the endpoint
/// serves in one request. Checked before any network call.
pub(crate) fn check_count(service: &str, count: usize, max_count: usize, what: &str) -> Result<()> {
    if count > max_count {
        return Err(Error::unsupported_request(
            service,
            format!("can only make a request for at most {} {} at a time", max_count, what),
        ));
    }
    Ok(())
}

/// `defaults` overridden by the caller's `params`.
pub(crate) fn merge_params(defaults: &[(&str, String)], params: &QueryParams) -> QueryParams {
    let mut merged: QueryParams = defaults
        .iter()
        .map(|(key, value)| (key.to_string(), value.clone()))
        .collect();
    merged.extend(params.iter().map(|(key, value)| (key.clone(), value.clone())));
    merged
}
