//! Authorization decision bookkeeping.
//!
//! Everything here is pure apart from [`clear_current_user_if_necessary`],
//! which applies [`should_clear_current_user`] to a session.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use sha2::{Digest, Sha256};

use crate::error::SessionResult;
use crate::models::{
    AuthorizationFailReason, AuthorizationIssueRequest, AuthorizationResponse, Client, Prompt,
    SubjectType,
};
use crate::session::Session;
use crate::session::fields;
use crate::users::User;

/// Current time in seconds since the epoch.
#[must_use]
pub fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Pairwise subject for `client`, or `None` when the client uses public subjects.
///
/// Computes `BASE64URL(SHA256(sector_identifier || subject || salt))`.
#[must_use]
pub fn calc_sub(subject: &str, client: &Client, salt: &str) -> Option<String> {
    if client.subject_type != SubjectType::Pairwise || subject.is_empty() {
        return None;
    }
    let sector = client.sector_identifier()?;

    let mut hasher = Sha256::new();
    hasher.update(sector.as_bytes());
    hasher.update(subject.as_bytes());
    hasher.update(salt.as_bytes());
    Some(URL_SAFE_NO_PAD.encode(hasher.finalize()))
}

/// Whether an authentication at `auth_time` is too old for `max_age`.
///
/// A `max_age` of zero means no limit.
#[must_use]
pub const fn is_auth_age_exceeded(auth_time: i64, max_age: u32, now: i64) -> bool {
    max_age != 0 && auth_time.saturating_add(max_age as i64) < now
}

/// Whether the logged-in user must be forgotten before interacting.
#[must_use]
pub fn should_clear_current_user(
    prompts: &[Prompt],
    max_age: u32,
    auth_time: Option<i64>,
    now: i64,
) -> bool {
    prompts.contains(&Prompt::Login)
        || auth_time.is_some_and(|t| is_auth_age_exceeded(t, max_age, now))
}

/// Drop the session user when re-authentication is required.
///
/// Returns whether the user was cleared.
pub async fn clear_current_user_if_necessary(
    session: &Session,
    prompts: &[Prompt],
    max_age: u32,
    now: i64,
) -> SessionResult<bool> {
    let auth_time = session.get::<fields::AuthTime>().await?;
    if !should_clear_current_user(prompts, max_age, auth_time, now) {
        return Ok(false);
    }

    session.batch_delete::<(fields::User, fields::AuthTime)>().await?;
    tracing::debug!("Cleared current user from session");
    Ok(true)
}

/// Outcome of a successful authorization decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueGrant {
    pub subject: String,
    pub sub: Option<String>,
    pub auth_time: i64,
    pub acr: Option<String>,
}

impl IssueGrant {
    /// Build the issue request for `ticket`.
    #[must_use]
    pub fn into_request(self, ticket: String, claims: Option<String>) -> AuthorizationIssueRequest {
        AuthorizationIssueRequest {
            ticket,
            subject: self.subject,
            sub: self.sub,
            auth_time: Some(self.auth_time),
            acr: self.acr,
            claims,
            scopes: None,
        }
    }
}

/// ACR to report for `user`, or `Err` when an essential ACR cannot be met.
fn select_acr(
    user: &User,
    requested: &[String],
    essential: bool,
) -> Result<Option<String>, AuthorizationFailReason> {
    if requested.is_empty() {
        return Ok(user.acr.clone());
    }

    match user.acr {
        Some(ref acr) if requested.contains(acr) => Ok(Some(acr.clone())),
        _ if essential => Err(AuthorizationFailReason::AcrNotSatisfied),
        _ => Ok(None),
    }
}

/// Decide a `prompt=none` request from the session state alone.
pub fn evaluate_no_interaction(
    response: &AuthorizationResponse,
    user: Option<&User>,
    auth_time: Option<i64>,
    now: i64,
    salt: &str,
) -> Result<IssueGrant, AuthorizationFailReason> {
    let Some(user) = user else {
        return Err(AuthorizationFailReason::NotLoggedIn);
    };

    let auth_time = auth_time.unwrap_or(0);
    if is_auth_age_exceeded(auth_time, response.max_age, now) {
        return Err(AuthorizationFailReason::ExceedsMaxAge);
    }

    if let Some(ref requested) = response.subject {
        if *requested != user.subject {
            return Err(AuthorizationFailReason::DifferentSubject);
        }
    }

    let acr = select_acr(user, &response.acrs, response.acr_essential)?;
    let sub = response.client.as_ref().and_then(|c| calc_sub(&user.subject, c, salt));

    Ok(IssueGrant { subject: user.subject.clone(), sub, auth_time, acr })
}

/// Grant for an interactive decision, where the user has just been checked.
#[must_use]
pub fn interactive_grant(
    user: &User,
    auth_time: i64,
    client: Option<&Client>,
    acrs: &[String],
    salt: &str,
) -> IssueGrant {
    IssueGrant {
        subject: user.subject.clone(),
        sub: client.and_then(|c| calc_sub(&user.subject, c, salt)),
        auth_time,
        acr: select_acr(user, acrs, false).ok().flatten(),
    }
}

/// Claim values for the requested names as a JSON object string.
///
/// Localized values (`name#locale`) win over plain ones, following the order
/// of `locales`. Returns `None` when nothing is released.
#[must_use]
pub fn collect_claims(user: &User, names: &[String], locales: &[String]) -> Option<String> {
    let claims: serde_json::Map<String, serde_json::Value> = names
        .iter()
        .filter_map(|name| user.claim(name, locales))
        .map(|(key, value)| (key, value.clone()))
        .collect();

    if claims.is_empty() { None } else { Some(serde_json::Value::Object(claims).to_string()) }
}
