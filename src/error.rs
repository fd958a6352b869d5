use crate::vertical::Vertical;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error(
        "cannot use {} with {service} because {} not supported",
        join(.verticals),
        are_or_is(.verticals)
    )]
    UnsupportedVertical {
        verticals: Vec<Vertical>,
        service: String,
    },
    #[error("cannot add {} to {service} with current scope", join(.verticals))]
    InsufficientScope {
        verticals: Vec<Vertical>,
        service: String,
    },
    #[error("cannot fetch data from {service}: {message}")]
    UnsupportedRequest { service: String, message: String },
    #[error("invalid argument : {0}")]
    InvalidArgument(String),
    #[error("malformed response from {service}: {message}")]
    MalformedResponse { service: String, message: String },
    #[error("state returned by the authorization server does not match the issued state")]
    StateMismatch,
    #[error("request failed with status {status} ({reason})")]
    Http { status: u16, reason: String },
    #[error("transport failed : {0}")]
    Transport(#[from] TransportError),
    #[error("token exchange failed : {0:#}")]
    TokenExchange(anyhow::Error),
    #[error("invalid url : {0}")]
    Url(#[from] url::ParseError),
    #[error("invalid json : {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("request failed : {0}")]
    Reqwest(#[from] reqwest::Error),
}

impl Error {
    pub(crate) fn unsupported_vertical<I>(verticals: I, service: &str) -> Self
    where
        I: IntoIterator<Item = Vertical>,
    {
        Error::UnsupportedVertical {
            verticals: verticals.into_iter().collect(),
            service: service.to_string(),
        }
    }

    pub(crate) fn unsupported_request(service: &str, message: impl Into<String>) -> Self {
        Error::UnsupportedRequest {
            service: service.to_string(),
            message: message.into(),
        }
    }

    pub(crate) fn malformed(service: &str, message: impl Into<String>) -> Self {
        Error::MalformedResponse {
            service: service.to_string(),
            message: message.into(),
        }
    }
}

fn join(verticals: &[Vertical]) -> String {
    verticals
        .iter()
        .map(|vertical| vertical.name())
        .collect::<Vec<_>>()
        .join(", ")
}

fn are_or_is(verticals: &[Vertical]) -> &'static str {
    if verticals.len() > 1 {
        "they are"
    } else {
        "it is"
    }
}
