use crate::vertical::Vertical;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;

/// Client registration of an application with a service, plus the verticals it
/// starts out with.
#[derive(Clone, Debug, Deserialize)]
pub struct Settings {
    pub client_id: String,
    #[serde(default)]
    pub client_secret: Option<String>,
    pub redirect_uri: String,
    #[serde(default)]
    pub verticals: Vec<Vertical>,
    /// CSRF state to reuse instead of generating one.
    #[serde(default)]
    pub state: Option<String>,
}

impl Settings {
    pub fn new(client_id: impl Into<String>, redirect_uri: impl Into<String>) -> Self {
        Settings {
            client_id: client_id.into(),
            client_secret: None,
            redirect_uri: redirect_uri.into(),
            verticals: Vec::new(),
            state: None,
        }
    }

    pub fn client_secret(mut self, client_secret: impl Into<String>) -> Self {
        self.client_secret = Some(client_secret.into());
        self
    }

    pub fn verticals<I>(mut self, verticals: I) -> Self
    where
        I: IntoIterator<Item = Vertical>,
    {
        self.verticals = verticals.into_iter().collect();
        self
    }

    pub fn state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    /// Reads `<PREFIX>_CLIENT_ID`, `<PREFIX>_REDIRECT_URI` and the optional
    /// `<PREFIX>_CLIENT_SECRET` and `<PREFIX>_VERTICALS` (comma separated).
    pub fn from_env(prefix: &str) -> Result<Self> {
        Self::from_lookup(prefix, |key| env::var(key).ok())
    }

    fn from_lookup(prefix: &str, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |name: &str| format!("{}_{}", prefix, name);
        let required = |name: &str| {
            let key = var(name);
            lookup(&key).with_context(|| format!("Environment variable {} is not set", key))
        };

        let mut settings = Settings::new(required("CLIENT_ID")?, required("REDIRECT_URI")?);
        settings.client_secret = lookup(&var("CLIENT_SECRET"));
        if let Some(verticals) = lookup(&var("VERTICALS")) {
            settings.verticals = verticals
                .split(',')
                .filter(|name| !name.trim().is_empty())
                .map(|name| name.parse::<Vertical>())
                .collect::<std::result::Result<_, _>>()
                .with_context(|| format!("Invalid {}", var("VERTICALS")))?;
        }
        Ok(settings)
    }

    /// The client secret, for services that only accept confidential clients.
    pub(crate) fn require_client_secret(&self, service: &str) -> crate::Result<&str> {
        self.client_secret.as_deref().ok_or_else(|| {
            crate::Error::InvalidArgument(format!("{} requires a client secret", service))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn reads_prefixed_variables() {
        let settings = Settings::from_lookup(
            "STRAVA",
            lookup(&[
                ("STRAVA_CLIENT_ID", "id"),
                ("STRAVA_CLIENT_SECRET", "secret"),
                ("STRAVA_REDIRECT_URI", "https://redirect_uri"),
                ("STRAVA_VERTICALS", "physical_activities, social_posting"),
            ]),
        )
        .unwrap();

        assert_eq!(settings.client_id, "id");
        assert_eq!(settings.client_secret.as_deref(), Some("secret"));
        assert_eq!(settings.redirect_uri, "https://redirect_uri");
        assert_eq!(
            settings.verticals,
            vec![Vertical::PhysicalActivity, Vertical::SocialPosting]
        );
    }

    #[test]
    fn missing_variable_is_named() {
        let error = Settings::from_lookup("GROUPME", lookup(&[("GROUPME_CLIENT_ID", "id")]))
            .unwrap_err();
        assert!(error.to_string().contains("GROUPME_REDIRECT_URI"));
    }

    #[test]
    fn unknown_vertical_is_rejected() {
        let result = Settings::from_lookup(
            "X",
            lookup(&[
                ("X_CLIENT_ID", "id"),
                ("X_REDIRECT_URI", "https://redirect_uri"),
                ("X_VERTICALS", "feed"),
            ]),
        );
        assert!(result.is_err());
    }

    #[test]
    fn deserializes_from_json() {
        let settings: Settings = serde_json::from_str(
            r#"{
                "client_id": "id",
                "redirect_uri": "https://redirect_uri",
                "verticals": ["chat_bots"]
            }"#,
        )
        .unwrap();
        assert_eq!(settings.client_secret, None);
        assert_eq!(settings.verticals, vec![Vertical::ChatBot]);
    }
}
