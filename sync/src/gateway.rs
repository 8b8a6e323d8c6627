use async_trait::async_trait;
use thiserror::Error;

#[cfg(test)]
use mockall::automock;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("token fetch failed: {0}")]
    TokenFetch(String),
    #[error("identity gateway error: {0}")]
    Gateway(String),
}

/// The identity provider's client SDK, seen through the three operations
/// reconciliation needs.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait IdentityGateway: Send + Sync {
    /// The uid the SDK currently holds a credential for, if any.
    fn current_uid(&self) -> Option<String>;

    /// Exchanges a server-minted custom token for a signed-in SDK state.
    async fn sign_in_with_custom_token(&self, token: &str) -> Result<(), SyncError>;

    async fn sign_out(&self) -> Result<(), SyncError>;
}

/// Source of short-lived custom tokens scoped to the current web session.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn fetch_custom_token(&self) -> Result<String, SyncError>;
}

/// Token source backed by the server's custom-token endpoint. The provided
/// client must carry the web session cookie; the endpoint re-derives the
/// uid from the session and accepts nothing from the caller.
pub struct HttpTokenSource {
    client: reqwest::Client,
    token_url: String,
}

impl HttpTokenSource {
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        HttpTokenSource {
            client,
            token_url: format!("{}/api/auth/token", base_url.trim_end_matches('/')),
        }
    }
}

#[async_trait]
impl TokenSource for HttpTokenSource {
    async fn fetch_custom_token(&self) -> Result<String, SyncError> {
        let response = self
            .client
            .get(&self.token_url)
            .send()
            .await
            .map_err(|e| SyncError::TokenFetch(e.to_string()))?;

        if !response.status().is_success() {
            return Err(SyncError::TokenFetch(format!(
                "token endpoint returned status {}",
                response.status()
            )));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| SyncError::TokenFetch(e.to_string()))?;

        body["token"]
            .as_str()
            .map(|token| token.to_string())
            .ok_or_else(|| SyncError::TokenFetch("response carried no token".to_string()))
    }
}
