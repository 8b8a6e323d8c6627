use common::{
    env_config::Config,
    error::{AppError, Res},
};
use oauth2::basic::*;
use oauth2::*;

use crate::dtos::auth::GoogleUserData;

/// Create the Google OAuth client object from server configuration.
pub fn create_google_client(
    config: &Config,
) -> Client<
    StandardErrorResponse<BasicErrorResponseType>,
    StandardTokenResponse<EmptyExtraTokenFields, BasicTokenType>,
    StandardTokenIntrospectionResponse<EmptyExtraTokenFields, BasicTokenType>,
    StandardRevocableToken,
    StandardErrorResponse<RevocationErrorResponseType>,
    EndpointSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointSet,
> {
    let provider_client = &config.google_client;

    let client_id = ClientId::new(provider_client.client_id.clone());
    let client_secret = ClientSecret::new(provider_client.client_secret.clone());
    let auth_url =
        AuthUrl::new(provider_client.auth_url.clone()).expect("Invalid authorization endpoint URL");
    let token_url =
        TokenUrl::new(provider_client.token_url.clone()).expect("Invalid token endpoint URL");

    BasicClient::new(client_id)
        .set_client_secret(client_secret)
        .set_auth_uri(auth_url)
        .set_token_uri(token_url)
        .set_redirect_uri(
            RedirectUrl::new(provider_client.redirect_uri.to_string())
                .expect("Invalid redirect URL"),
        )
}

/// Fetches the authenticated user's profile from Google's userinfo API.
pub async fn fetch_google_user_data(access_token: &str) -> Res<GoogleUserData> {
    let client = reqwest::Client::new();
    let response = client
        .get("https://www.googleapis.com/oauth2/v2/userinfo")
        .header("Authorization", format!("Bearer {}", access_token))
        .send()
        .await
        .map_err(|e| AppError::upstream("Authentication service unavailable", e))?;

    if !response.status().is_success() {
        return Err(AppError::upstream(
            "Authentication service unavailable",
            format!("Google userinfo returned status {}", response.status()),
        ));
    }

    let profile: serde_json::Value = response
        .json()
        .await
        .map_err(|e| AppError::upstream("Authentication service unavailable", e))?;

    let email = profile["email"]
        .as_str()
        .ok_or_else(|| {
            AppError::upstream(
                "Authentication service unavailable",
                "Google userinfo response missing email",
            )
        })?
        .to_string();

    Ok(GoogleUserData {
        email,
        name: profile["name"].as_str().map(|s| s.to_string()),
        picture: profile["picture"].as_str().map(|s| s.to_string()),
    })
}
