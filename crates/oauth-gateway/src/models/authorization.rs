//! Authorization endpoint models (`/auth/authorization`, `/issue`, `/fail`).

use serde::{Deserialize, Serialize};

use super::Client;

/// `prompt` values requested by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Prompt {
    None,
    Login,
    Consent,
    SelectAccount,
    Create,
    #[serde(other)]
    Unknown,
}

/// Request body for `/auth/authorization`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizationRequest {
    /// Query string or form body of the authorization request.
    pub parameters: String,
}

/// Next step dictated by the backend for an authorization request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthorizationAction {
    InternalServerError,
    BadRequest,
    Location,
    Form,
    NoInteraction,
    Interaction,
    #[default]
    #[serde(other)]
    Unknown,
}

/// Response of `/auth/authorization`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AuthorizationResponse {
    pub result_code: Option<String>,
    pub result_message: Option<String>,
    pub action: AuthorizationAction,
    pub response_content: Option<String>,

    /// Handle for the follow-up issue/fail call.
    pub ticket: Option<String>,
    pub client: Option<Client>,
    pub display: Option<String>,

    /// `max_age` request parameter; `0` when absent.
    pub max_age: u32,
    pub scopes: Vec<Scope>,
    pub ui_locales: Vec<String>,
    pub claims_locales: Vec<String>,

    /// Claim names requested for the ID token.
    pub claims: Vec<String>,
    pub acr_essential: bool,
    pub client_id_alias_used: bool,
    pub acrs: Vec<String>,

    /// Subject the client requires the end-user to be.
    pub subject: Option<String>,
    pub login_hint: Option<String>,
    pub prompts: Vec<Prompt>,
    pub lowest_prompt: Option<Prompt>,
    pub request_object_payload: Option<String>,
    pub id_token_claims: Option<String>,
    pub user_info_claims: Option<String>,
    pub resources: Vec<String>,
    pub purpose: Option<String>,
}

/// Scope entry as returned by the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Scope {
    pub name: String,
    pub description: Option<String>,
}

/// Request body for `/auth/authorization/issue`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizationIssueRequest {
    pub ticket: String,
    pub subject: String,

    /// Pairwise value for the `sub` claim; the backend uses `subject` when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,

    /// Seconds since the epoch of the end-user's authentication.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_time: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub acr: Option<String>,

    /// JSON object of claim values, serialized to a string.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub claims: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub scopes: Option<Vec<String>>,
}

/// Result of `/auth/authorization/issue`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthorizationIssueAction {
    InternalServerError,
    BadRequest,
    Location,
    Form,
    #[default]
    #[serde(other)]
    Unknown,
}

/// Response of `/auth/authorization/issue`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AuthorizationIssueResponse {
    pub result_code: Option<String>,
    pub result_message: Option<String>,
    pub action: AuthorizationIssueAction,
    pub response_content: Option<String>,
    pub authorization_code: Option<String>,
    pub access_token: Option<String>,
    pub id_token: Option<String>,
}

/// Why an authorization request is being rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthorizationFailReason {
    Unknown,
    NotLoggedIn,
    MaxAgeNotSupported,
    ExceedsMaxAge,
    DifferentSubject,
    AcrNotSatisfied,
    Denied,
    ServerError,
    NotAuthenticated,
    AccountSelectionRequired,
    ConsentRequired,
    InteractionRequired,
    InvalidTarget,
}

/// Request body for `/auth/authorization/fail`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizationFailRequest {
    pub ticket: String,
    pub reason: AuthorizationFailReason,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Result of `/auth/authorization/fail`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthorizationFailAction {
    InternalServerError,
    BadRequest,
    Location,
    Form,
    #[default]
    #[serde(other)]
    Unknown,
}

/// Response of `/auth/authorization/fail`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AuthorizationFailResponse {
    pub result_code: Option<String>,
    pub result_message: Option<String>,
    pub action: AuthorizationFailAction,
    pub response_content: Option<String>,
}
