//! Account linking: authorization code to linked calendar drafts.

use famcal_core::event::DEFAULT_COLOR;
use famcal_core::{FamcalResult, LinkedCalendarDraft, ProviderTag};
use serde::Deserialize;

use crate::api::{Call, GoogleApi, check, decode, unreachable_error};
use crate::app_config::Credentials;
use crate::session::exchange_code;

#[derive(Deserialize)]
struct UserInfo {
    email: String,
}

pub async fn link_account(
    api: &GoogleApi,
    credentials: &Credentials,
    tag: &ProviderTag,
    authorization_code: &str,
    user_id: &str,
    family_id: &str,
) -> FamcalResult<Vec<LinkedCalendarDraft>> {
    let tokens = exchange_code(api, credentials, authorization_code).await?;

    let response = api
        .http()
        .get(&api.endpoints().userinfo_url)
        .bearer_auth(&tokens.access_token)
        .send()
        .await
        .map_err(|e| unreachable_error("userinfo", e))?;
    let user: UserInfo = decode(check(response, Call::UserInfo).await?).await?;

    let calendars = api.calendar_list(&tokens.access_token).await?;

    let drafts: Vec<LinkedCalendarDraft> = calendars
        .items
        .into_iter()
        .filter(|entry| entry.is_writable())
        .map(|entry| LinkedCalendarDraft {
            user_id: user_id.to_string(),
            family_id: family_id.to_string(),
            provider: tag.clone(),
            account_email: user.email.clone(),
            provider_calendar_id: entry.id,
            display_name: entry.summary,
            color: entry
                .background_color
                .unwrap_or_else(|| DEFAULT_COLOR.to_string()),
            access_token: tokens.access_token.clone(),
            refresh_token: tokens.refresh_token.clone(),
            expires_at: tokens.expires_at,
        })
        .collect();

    tracing::info!(
        "Google account {} has {} writable calendar(s)",
        user.email,
        drafts.len()
    );
    Ok(drafts)
}
