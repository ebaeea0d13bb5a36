//! OAuth2 grants against Google's token endpoint.

use chrono::{DateTime, Duration, Utc};
use famcal_core::{FamcalError, FamcalResult, TokenUpdate};
use reqwest::StatusCode;
use serde::Deserialize;

use crate::api::{GoogleApi, decode, unreachable_error};
use crate::app_config::Credentials;

/// Google omits `expires_in` only in unusual cases; an hour is its usual lifetime.
const DEFAULT_EXPIRES_IN: i64 = 3600;

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    refresh_token: Option<String>,
}

/// Tokens issued by an authorization-code exchange.
#[derive(Clone)]
pub struct GrantedTokens {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: DateTime<Utc>,
}

impl TokenResponse {
    fn expires_at(&self) -> DateTime<Utc> {
        Utc::now() + Duration::seconds(self.expires_in.unwrap_or(DEFAULT_EXPIRES_IN))
    }
}

pub async fn refresh_access_token(
    api: &GoogleApi,
    credentials: &Credentials,
    refresh_token: &str,
) -> FamcalResult<TokenUpdate> {
    let params = [
        ("client_id", credentials.client_id.as_str()),
        ("client_secret", credentials.client_secret.as_str()),
        ("refresh_token", refresh_token),
        ("grant_type", "refresh_token"),
    ];

    let tokens = request_tokens(api, &params).await?;
    Ok(TokenUpdate {
        expires_at: tokens.expires_at(),
        access_token: tokens.access_token,
    })
}

pub async fn exchange_code(
    api: &GoogleApi,
    credentials: &Credentials,
    authorization_code: &str,
) -> FamcalResult<GrantedTokens> {
    let mut params = vec![
        ("client_id", credentials.client_id.as_str()),
        ("client_secret", credentials.client_secret.as_str()),
        ("code", authorization_code),
        ("grant_type", "authorization_code"),
    ];
    if let Some(redirect_uri) = &credentials.redirect_uri {
        params.push(("redirect_uri", redirect_uri.as_str()));
    }

    let tokens = request_tokens(api, &params).await?;
    Ok(GrantedTokens {
        expires_at: tokens.expires_at(),
        access_token: tokens.access_token,
        refresh_token: tokens.refresh_token,
    })
}

async fn request_tokens(api: &GoogleApi, params: &[(&str, &str)]) -> FamcalResult<TokenResponse> {
    let response = api
        .http()
        .post(&api.endpoints().token_url)
        .form(params)
        .send()
        .await
        .map_err(|e| unreachable_error("token endpoint", e))?;

    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Could not read error response".to_string());
        let message = format!("Token request failed: HTTP {} - {}", status, body);
        return Err(match status {
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED => FamcalError::AuthExpired(message),
            _ => FamcalError::ProviderUnavailable(message),
        });
    }

    decode(response).await
}
