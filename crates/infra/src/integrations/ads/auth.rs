//! Refresh-token exchange against the LWA token endpoint

use adpulse_core::TokenRefresher;
use adpulse_domain::{
    AdPulseError, Config, OAuthClientConfig, PrincipalId, RefreshedToken, RemoteFailure, TokenSlot,
};
use async_trait::async_trait;
use reqwest::Method;
use tracing::{debug, instrument};

use super::types::TokenResponse;
use crate::errors::failure_from_response;
use crate::http::HttpClient;

/// [`TokenRefresher`] posting `grant_type=refresh_token` to the token
/// endpoint configured for each slot.
pub struct OAuthTokenRefresher {
    http: HttpClient,
    reporting: OAuthClientConfig,
    catalog: OAuthClientConfig,
}

impl OAuthTokenRefresher {
    /// Refresher with an explicit OAuth client per slot.
    pub fn new(http: HttpClient, reporting: OAuthClientConfig, catalog: OAuthClientConfig) -> Self {
        Self { http, reporting, catalog }
    }

    /// Build from application config; the catalog slot falls back to the
    /// reporting OAuth client when no override is configured.
    ///
    /// # Errors
    /// `Auth` when either OAuth client lacks an id or secret.
    pub fn from_config(config: &Config) -> Result<Self, AdPulseError> {
        for (slot, oauth) in
            [(TokenSlot::Reporting, &config.oauth), (TokenSlot::Catalog, config.catalog_oauth())]
        {
            if oauth.client_id.trim().is_empty() || oauth.client_secret.trim().is_empty() {
                return Err(AdPulseError::Auth(format!(
                    "OAuth client for the {slot} slot needs a client id and secret"
                )));
            }
        }

        let http = HttpClient::builder()
            .timeout(config.reporting.request_timeout())
            .max_attempts(config.reporting.http_max_attempts)
            .build()?;
        Ok(Self::new(http, config.oauth.clone(), config.catalog_oauth().clone()))
    }

    fn client_for(&self, slot: TokenSlot) -> &OAuthClientConfig {
        match slot {
            TokenSlot::Reporting => &self.reporting,
            TokenSlot::Catalog => &self.catalog,
        }
    }
}

#[async_trait]
impl TokenRefresher for OAuthTokenRefresher {
    #[instrument(skip(self, refresh_token), fields(principal = %principal, slot = %slot))]
    async fn refresh(
        &self,
        principal: &PrincipalId,
        slot: TokenSlot,
        refresh_token: &str,
    ) -> Result<RefreshedToken, RemoteFailure> {
        let oauth = self.client_for(slot);
        let params = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", oauth.client_id.as_str()),
            ("client_secret", oauth.client_secret.as_str()),
        ];

        let request = self.http.request(Method::POST, &oauth.token_url).form(&params);
        let response = self.http.send(request).await?;
        if !response.status().is_success() {
            return Err(failure_from_response(response).await);
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| RemoteFailure::message(format!("invalid token response: {e}")))?;
        debug!(expires_in = ?token.expires_in, "access token minted");
        Ok(token.into())
    }
}

#[cfg(test)]
mod tests {
    use adpulse_domain::ReportingConfig;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn oauth(server: &MockServer, client_id: &str) -> OAuthClientConfig {
        OAuthClientConfig {
            token_url: format!("{}/auth/o2/token", server.uri()),
            client_id: client_id.into(),
            client_secret: "shh".into(),
        }
    }

    #[tokio::test]
    async fn posts_refresh_grant_and_parses_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/o2/token"))
            .and(body_string_contains("grant_type=refresh_token"))
            .and(body_string_contains("refresh_token=Atzr%7Cabc"))
            .and(body_string_contains("client_id=amzn1.reporting"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "Atza|fresh",
                "refresh_token": "Atzr|abc",
                "token_type": "bearer",
                "expires_in": 3600
            })))
            .expect(1)
            .mount(&server)
            .await;

        let refresher = OAuthTokenRefresher::new(
            HttpClient::new().unwrap(),
            oauth(&server, "amzn1.reporting"),
            oauth(&server, "amzn1.catalog"),
        );
        let token = refresher
            .refresh(&PrincipalId::new("acct-1"), TokenSlot::Reporting, "Atzr|abc")
            .await
            .unwrap();

        assert_eq!(token.access_token, "Atza|fresh");
        assert_eq!(token.expires_in_secs, Some(3600));
    }

    #[tokio::test]
    async fn catalog_slot_uses_its_own_client() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_string_contains("client_id=amzn1.catalog"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "cat"})))
            .expect(1)
            .mount(&server)
            .await;

        let refresher = OAuthTokenRefresher::new(
            HttpClient::new().unwrap(),
            oauth(&server, "amzn1.reporting"),
            oauth(&server, "amzn1.catalog"),
        );
        let token = refresher
            .refresh(&PrincipalId::new("acct-1"), TokenSlot::Catalog, "rt")
            .await
            .unwrap();

        assert_eq!(token.access_token, "cat");
    }

    #[test]
    fn blank_client_secret_is_rejected() {
        let mut config = Config {
            oauth: OAuthClientConfig {
                token_url: "https://api.amazon.com/auth/o2/token".into(),
                client_id: "amzn1.client".into(),
                client_secret: "secret".into(),
            },
            catalog_oauth: None,
            reporting: ReportingConfig::new("https://advertising-api.amazon.com"),
            credentials: Default::default(),
            jobs: Default::default(),
            logging: Default::default(),
        };
        assert!(OAuthTokenRefresher::from_config(&config).is_ok());

        config.catalog_oauth = Some(OAuthClientConfig {
            token_url: "https://api.amazon.com/auth/o2/token".into(),
            client_id: "amzn1.catalog".into(),
            client_secret: "  ".into(),
        });
        let err = OAuthTokenRefresher::from_config(&config).err().unwrap();

        assert!(matches!(err, AdPulseError::Auth(ref msg) if msg.contains("catalog")));
    }

    #[tokio::test]
    async fn invalid_grant_surfaces_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": "invalid_grant",
                "error_description": "The request has an invalid grant parameter : refresh_token"
            })))
            .mount(&server)
            .await;

        let refresher = OAuthTokenRefresher::new(
            HttpClient::new().unwrap(),
            oauth(&server, "a"),
            oauth(&server, "b"),
        );
        let failure = refresher
            .refresh(&PrincipalId::new("acct-1"), TokenSlot::Reporting, "dead")
            .await
            .unwrap_err();

        assert_eq!(failure.status, Some(400));
        assert_eq!(failure.body.unwrap()["error"], "invalid_grant");
    }
}
