//! # Vertical Transfer
//! The goal of this library is to make it easy to transfer a user's data out of third party
//! services through their OAuth 2.0 protected rest endpoints.
//! Data is requested per *vertical* (a category like blocked users or physical activities), the
//! library works out the scope the verticals need and normalizes every service's responses into
//! one set of records.
//! The client is based on the `Reqwest` and `Oauth2` library
//!
//! Supported services are Strava, Tumblr and GroupMe.
//!
//! ## Usage
//! Add this library as a dependency to your project.
//! ```toml
//! [dependencies]
//! vertical_transfer = "0.1"
//! ```
//!
//! ## Example code
//! ```no_run
//!# fn doc_test() -> anyhow::Result<()> {
//! use vertical_transfer::services::StravaTransferService;
//! use vertical_transfer::{FetchRequest, Settings, TransferService, Vertical};
//!
//! // Set up the service
//! let settings = Settings::new("xxxxxxxxxx", "https://my-app.com/callback")
//!     .client_secret("xxxxxxxxxx")
//!     .verticals(vec![Vertical::PhysicalActivity]);
//! let mut strava = StravaTransferService::new(settings)?;
//!
//! // Send the end-user to this url, they get redirected back with a code.
//! let (url, _state) = strava.authorization_url()?;
//! println!("Visit {}", url);
//!
//! strava.fetch_token(None, Some("https://my-app.com/callback?code=xxxxxxxxxx"))?;
//!
//! // Reading social postings too needs no new authorization, the scope already covers them.
//! strava.add_verticals(vec![Vertical::SocialPosting], false)?;
//!
//! let fetched = strava.fetch(Vertical::PhysicalActivity, &FetchRequest::new().count(10))?;
//! for record in fetched.records.into_iter().flatten() {
//!     println!("{}", serde_json::to_string(&record)?);
//! }
//!
//!# Ok(())
//!# }
//! ```
mod authorized_client;
mod error;
pub mod records;
pub mod scope;
mod service;
pub mod services;
mod settings;
pub mod stateless;
mod transport;
mod vertical;

pub use crate::authorized_client::{
    AuthorizedClient, Endpoints, GrantFlow, QueryParams, Token, TokenPlacement,
};
pub use crate::error::{Error, Result, TransportError};
pub use crate::service::{
    FetchRequest, Fetched, Fetcher, FetcherTable, Parsed, ServiceCore, TransferService,
};
pub use crate::settings::Settings;
pub use crate::transport::{ReqwestTransport, Transport};
pub use crate::vertical::Vertical;
