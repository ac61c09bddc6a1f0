//! Authorization endpoint and the end-user decision that completes it.
//!
//! The backend validates the request and answers with an action. For
//! `INTERACTION` the request context is parked in the session and the
//! decision endpoint picks it up once the user has logged in and consented.
//! For `NO_INTERACTION` (`prompt=none`) the session alone decides.

use std::sync::Arc;

use axum::Form;
use axum::extract::{RawQuery, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};

use crate::decision::{self, IssueGrant};
use crate::error::{HandlerError, HandlerResult};
use crate::models::{
    AuthorizationAction, AuthorizationFailAction, AuthorizationFailReason,
    AuthorizationFailRequest, AuthorizationIssueAction, AuthorizationIssueRequest,
    AuthorizationRequest, AuthorizationResponse, Scope,
};
use crate::server::AppState;
use crate::server::http;
use crate::server::router::paths;
use crate::session::fields::{
    Acrs, AuthTime, ClaimLocales, ClaimNames, Client, MaxAge, RequestedSubject, Ticket, User,
};
use crate::session::{Session, SessionUpdate};

/// Session fields describing the request awaiting a decision.
type PendingRequest = (Ticket, Client, ClaimNames, ClaimLocales, Acrs, RequestedSubject, MaxAge);

/// `GET /api/authorization`
pub async fn handle_authorization_get(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    RawQuery(query): RawQuery,
) -> HandlerResult<(CookieJar, Response)> {
    process(&state, jar, query.unwrap_or_default()).await
}

/// `POST /api/authorization`
pub async fn handle_authorization_post(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    body: String,
) -> HandlerResult<(CookieJar, Response)> {
    process(&state, jar, body).await
}

async fn process(
    state: &AppState,
    jar: CookieJar,
    parameters: String,
) -> HandlerResult<(CookieJar, Response)> {
    let res = state.client.authorization(&AuthorizationRequest { parameters }).await?;
    let client_id = res.client.as_ref().map(|c| c.client_id);
    tracing::info!(action = ?res.action, ?client_id, "Authorization request");

    let (jar, session) = http::session(state, jar).await?;

    let response = match res.action {
        AuthorizationAction::InternalServerError | AuthorizationAction::Unknown => {
            http::json(StatusCode::INTERNAL_SERVER_ERROR, res.response_content)
        }
        AuthorizationAction::BadRequest => {
            http::json(StatusCode::BAD_REQUEST, res.response_content)
        }
        AuthorizationAction::Location => http::location(res.response_content),
        AuthorizationAction::Form => http::html(res.response_content),
        AuthorizationAction::NoInteraction => no_interaction(state, &session, &res).await?,
        AuthorizationAction::Interaction => interaction(&session, &res).await?,
    };

    Ok((jar, response))
}

fn ticket_of(res: &AuthorizationResponse) -> HandlerResult<String> {
    res.ticket
        .clone()
        .ok_or_else(|| HandlerError::internal("Backend response carries no ticket"))
}

async fn no_interaction(
    state: &AppState,
    session: &Session,
    res: &AuthorizationResponse,
) -> HandlerResult<Response> {
    let ticket = ticket_of(res)?;
    let (user, auth_time) = session.batch_get::<(User, AuthTime)>().await?;

    match decision::evaluate_no_interaction(
        res,
        user.as_ref(),
        auth_time,
        decision::now(),
        &state.config.pairwise_salt,
    ) {
        Ok(grant) => {
            let claims = user
                .as_ref()
                .and_then(|u| decision::collect_claims(u, &res.claims, &res.claims_locales));
            issue(state, grant.into_request(ticket, claims)).await
        }
        Err(reason) => {
            tracing::info!(?reason, "Rejecting authorization without interaction");
            fail(state, ticket, reason, None).await
        }
    }
}

async fn interaction(session: &Session, res: &AuthorizationResponse) -> HandlerResult<Response> {
    let ticket = ticket_of(res)?;

    decision::clear_current_user_if_necessary(session, &res.prompts, res.max_age, decision::now())
        .await?;

    session.batch_delete::<PendingRequest>().await?;
    session
        .batch_set(
            SessionUpdate::new()
                .set::<Ticket>(&ticket)?
                .set_opt::<Client>(res.client.as_ref())?
                .set::<ClaimNames>(&res.claims)?
                .set::<ClaimLocales>(&res.claims_locales)?
                .set::<Acrs>(&res.acrs)?
                .set_opt::<RequestedSubject>(res.subject.as_ref())?
                .set::<MaxAge>(&res.max_age)?,
        )
        .await?;

    let user = session.get::<User>().await?;
    let page = AuthorizationPage::new(res, user.as_ref());

    Ok(http::json(StatusCode::OK, Some(serde_json::to_string(&page)?)))
}

/// What a login/consent page needs to render.
#[derive(Debug, Clone, Serialize)]
pub struct AuthorizationPage {
    pub client_id: Option<String>,
    pub client_name: Option<String>,
    pub logo_uri: Option<String>,
    pub scopes: Vec<Scope>,
    pub claims: Vec<String>,
    pub acrs: Vec<String>,
    pub resources: Vec<String>,
    pub purpose: Option<String>,
    pub ui_locales: Vec<String>,
    pub display: Option<String>,
    pub login_hint: Option<String>,
    /// Subject the client insists on.
    pub subject: Option<String>,
    /// Login ID of the user already logged in, if any.
    pub user: Option<String>,
    pub login_required: bool,
    pub decision_endpoint: &'static str,
}

impl AuthorizationPage {
    fn new(res: &AuthorizationResponse, user: Option<&crate::users::User>) -> Self {
        Self {
            client_id: res.client.as_ref().map(|c| c.display_id()),
            client_name: res.client.as_ref().and_then(|c| c.client_name.clone()),
            logo_uri: res.client.as_ref().and_then(|c| c.logo_uri.clone()),
            scopes: res.scopes.clone(),
            claims: res.claims.clone(),
            acrs: res.acrs.clone(),
            resources: res.resources.clone(),
            purpose: res.purpose.clone(),
            ui_locales: res.ui_locales.clone(),
            display: res.display.clone(),
            login_hint: res.login_hint.clone(),
            subject: res.subject.clone(),
            user: user.map(|u| u.login_id.clone()),
            login_required: user.is_none(),
            decision_endpoint: paths::AUTHORIZATION_DECISION,
        }
    }
}

/// Form posted by the consent page.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DecisionForm {
    /// Present (`true`, `on`, ...) when the user approved.
    #[serde(default)]
    pub authorized: Option<String>,
    #[serde(default, rename = "loginId")]
    pub login_id: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl DecisionForm {
    fn approved(&self) -> bool {
        matches!(
            self.authorized.as_deref().map(str::to_ascii_lowercase).as_deref(),
            Some("true" | "on" | "1" | "yes" | "allow")
        )
    }
}

/// `POST /api/authorization/decision`
pub async fn handle_decision(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(form): Form<DecisionForm>,
) -> HandlerResult<(CookieJar, Response)> {
    let (jar, session) = http::session(&state, jar).await?;

    let (ticket, client, claim_names, claim_locales, acrs, requested_subject, max_age) =
        session.batch_get::<PendingRequest>().await?;
    let Some(ticket) = ticket else {
        return Err(HandlerError::invalid_request("No authorization request is awaiting a decision"));
    };

    let now = decision::now();
    let mut login_failed = false;

    if let (Some(login_id), Some(password)) = (form.login_id.as_deref(), form.password.as_deref()) {
        if !login_id.is_empty() {
            match state.users.authenticate(login_id, password).await {
                Some(user) => {
                    tracing::info!(subject = %user.subject, "End-user logged in");
                    session
                        .batch_set(SessionUpdate::new().set::<User>(&user)?.set::<AuthTime>(&now)?)
                        .await?;
                }
                None => {
                    tracing::info!(login_id, "End-user login failed");
                    login_failed = true;
                }
            }
        }
    }

    let pending = Pending {
        ticket,
        client,
        claim_names: claim_names.unwrap_or_default(),
        claim_locales: claim_locales.unwrap_or_default(),
        acrs: acrs.unwrap_or_default(),
        requested_subject,
        max_age: max_age.unwrap_or(0),
    };
    let outcome = decide(&state, &session, &form, login_failed, pending, now).await;

    // Single-use, also when the backend call failed.
    session.batch_delete::<PendingRequest>().await?;
    Ok((jar, outcome?))
}

/// Request context read back from the session for a decision.
struct Pending {
    ticket: String,
    client: Option<crate::models::Client>,
    claim_names: Vec<String>,
    claim_locales: Vec<String>,
    acrs: Vec<String>,
    requested_subject: Option<String>,
    max_age: u32,
}

async fn decide(
    state: &AppState,
    session: &Session,
    form: &DecisionForm,
    login_failed: bool,
    pending: Pending,
    now: i64,
) -> HandlerResult<Response> {
    let ticket = pending.ticket;

    if !form.approved() {
        return fail(state, ticket, AuthorizationFailReason::Denied, None).await;
    }
    if login_failed {
        return fail(state, ticket, AuthorizationFailReason::NotAuthenticated, None).await;
    }

    let (user, auth_time) = session.batch_get::<(User, AuthTime)>().await?;
    let auth_time = auth_time.unwrap_or(now);

    match user {
        None => fail(state, ticket, AuthorizationFailReason::NotAuthenticated, None).await,
        Some(user) if pending.requested_subject.as_ref().is_some_and(|s| *s != user.subject) => {
            fail(state, ticket, AuthorizationFailReason::DifferentSubject, None).await
        }
        Some(_) if decision::is_auth_age_exceeded(auth_time, pending.max_age, now) => {
            fail(state, ticket, AuthorizationFailReason::ExceedsMaxAge, None).await
        }
        Some(user) => {
            let grant: IssueGrant = decision::interactive_grant(
                &user,
                auth_time,
                pending.client.as_ref(),
                &pending.acrs,
                &state.config.pairwise_salt,
            );
            let claims =
                decision::collect_claims(&user, &pending.claim_names, &pending.claim_locales);
            issue(state, grant.into_request(ticket, claims)).await
        }
    }
}

/// Call `/auth/authorization/issue` and relay the outcome.
pub(crate) async fn issue(
    state: &AppState,
    request: AuthorizationIssueRequest,
) -> HandlerResult<Response> {
    let subject = request.subject.clone();
    let res = state.client.authorization_issue(&request).await?;
    tracing::info!(action = ?res.action, %subject, "Authorization issued");

    Ok(match res.action {
        AuthorizationIssueAction::Location => http::location(res.response_content),
        AuthorizationIssueAction::Form => http::html(res.response_content),
        AuthorizationIssueAction::BadRequest => {
            http::json(StatusCode::BAD_REQUEST, res.response_content)
        }
        AuthorizationIssueAction::InternalServerError | AuthorizationIssueAction::Unknown => {
            http::json(StatusCode::INTERNAL_SERVER_ERROR, res.response_content)
        }
    })
}

/// Call `/auth/authorization/fail` and relay the outcome.
pub(crate) async fn fail(
    state: &AppState,
    ticket: String,
    reason: AuthorizationFailReason,
    description: Option<String>,
) -> HandlerResult<Response> {
    let res = state
        .client
        .authorization_fail(&AuthorizationFailRequest { ticket, reason, description })
        .await?;
    tracing::info!(action = ?res.action, ?reason, "Authorization failed");

    Ok(match res.action {
        AuthorizationFailAction::Location => http::location(res.response_content),
        AuthorizationFailAction::Form => http::html(res.response_content),
        AuthorizationFailAction::BadRequest => {
            http::json(StatusCode::BAD_REQUEST, res.response_content)
        }
        AuthorizationFailAction::InternalServerError | AuthorizationFailAction::Unknown => {
            http::json(StatusCode::INTERNAL_SERVER_ERROR, res.response_content)
        }
    })
}
