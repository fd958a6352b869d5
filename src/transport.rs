use crate::error::TransportError;
use log::trace;
use oauth2::{HttpRequest, HttpResponse};
use reqwest::blocking::Client;
use reqwest::redirect::Policy;

/// Executes a single HTTP request. Both the token exchange and every resource GET go
/// through this, so it is the only place a service touches the network.
#[cfg_attr(test, mockall::automock)]
pub trait Transport {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// Blocking transport backed by `reqwest`.
#[derive(Clone, Debug)]
pub struct ReqwestTransport {
    http_client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, TransportError> {
        // Redirects are handed back to the caller, never followed
        let http_client = Client::builder().redirect(Policy::none()).build()?;
        Ok(ReqwestTransport { http_client })
    }
}

impl Transport for ReqwestTransport {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        trace!("{} {}", request.method, request.url.path());
        let response = self
            .http_client
            .request(request.method, request.url.as_str())
            .headers(request.headers)
            .body(request.body)
            .send()?;

        let status_code = response.status();
        let headers = response.headers().clone();
        let body = response.bytes()?.to_vec();
        trace!("Received {}", status_code);

        Ok(HttpResponse {
            status_code,
            headers,
            body,
        })
    }
}
