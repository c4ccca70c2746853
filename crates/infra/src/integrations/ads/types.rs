//! Wire types private to the ads HTTP adapters

use adpulse_domain::RefreshedToken;
use serde::Deserialize;

/// Token endpoint success body.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

impl From<TokenResponse> for RefreshedToken {
    fn from(response: TokenResponse) -> Self {
        Self {
            access_token: response.access_token,
            refresh_token: response.refresh_token,
            expires_in_secs: response.expires_in,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tolerates_minimal_token_body() {
        let response: TokenResponse = serde_json::from_str(r#"{"access_token": "Atza|abc"}"#).unwrap();
        let token = RefreshedToken::from(response);

        assert_eq!(token.access_token, "Atza|abc");
        assert!(token.refresh_token.is_none());
        assert!(token.expires_in_secs.is_none());
    }
}
