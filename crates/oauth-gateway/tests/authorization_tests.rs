//! Authorization endpoint and decision flow against a mocked backend.

mod common;

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use serde_json::json;

use common::{TestApp, body_json, body_string, form_post, session_cookie};
use oauth_gateway::session::{Session, SessionUpdate, fields};
use oauth_gateway::users::User;

fn interaction(ticket: &str) -> serde_json::Value {
    json!({
        "resultCode": "A004001",
        "action": "INTERACTION",
        "ticket": ticket,
        "client": {
            "clientId": 5899463614448063_i64,
            "clientName": "Demo Client",
            "subjectType": "PUBLIC",
            "redirectUris": ["https://client.example.org/cb"]
        },
        "scopes": [{"name": "openid"}, {"name": "profile"}],
        "claims": ["name", "email"],
        "claimsLocales": ["ja"],
        "acrs": [],
        "maxAge": 0,
        "loginHint": "john"
    })
}

async fn session_with_user(app: &TestApp, id: &str, subject: &str, auth_time: i64) {
    let user = User { subject: subject.into(), login_id: "john".into(), ..User::default() };
    Session::new(id, Arc::clone(&app.sessions))
        .batch_set(
            SessionUpdate::new()
                .set::<fields::User>(&user)
                .unwrap()
                .set::<fields::AuthTime>(&auth_time)
                .unwrap(),
        )
        .await
        .unwrap();
}

fn get_authorization(query: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::get(format!("/api/authorization?{query}"));
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_location_redirects() {
    let app = TestApp::start().await;
    app.mock_post(
        "/auth/authorization",
        json!({
            "action": "LOCATION",
            "responseContent": "https://client.example.org/cb?error=invalid_request&state=s"
        }),
    )
    .await;

    let response = app.send(get_authorization("client_id=1&state=s", None)).await;

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(
        response.headers()[header::LOCATION],
        "https://client.example.org/cb?error=invalid_request&state=s"
    );
    assert_eq!(response.headers()[header::CACHE_CONTROL], "no-store");

    let sent = app.received("/auth/authorization").await;
    assert_eq!(sent[0]["parameters"], "client_id=1&state=s");
}

#[tokio::test]
async fn test_bad_request_and_form() {
    let app = TestApp::start().await;
    app.mock_post(
        "/auth/authorization",
        json!({"action": "BAD_REQUEST", "responseContent": "{\"error\":\"invalid_request\"}"}),
    )
    .await;

    let response = app.send(form_post("/api/authorization", "client_id=1")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "invalid_request");

    let app = TestApp::start().await;
    app.mock_post(
        "/auth/authorization",
        json!({"action": "FORM", "responseContent": "<html><form></form></html>"}),
    )
    .await;

    let response = app.send(get_authorization("response_mode=form_post", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers()[header::CONTENT_TYPE].to_str().unwrap().starts_with("text/html"));
    assert_eq!(body_string(response).await, "<html><form></form></html>");
}

#[tokio::test]
async fn test_unknown_action_is_server_error() {
    let app = TestApp::start().await;
    app.mock_post("/auth/authorization", json!({"action": "SOMETHING_NEW"})).await;

    let response = app.send(get_authorization("client_id=1", None)).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_interaction_then_login_and_consent() {
    let app = TestApp::start().await;
    app.mock_post("/auth/authorization", interaction("ticket-1")).await;
    app.mock_post(
        "/auth/authorization/issue",
        json!({
            "action": "LOCATION",
            "responseContent": "https://client.example.org/cb?code=abc"
        }),
    )
    .await;

    // Interaction page
    let response = app.send(get_authorization("client_id=1&scope=openid", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = session_cookie(&response).expect("session cookie");

    let page = body_json(response).await;
    assert_eq!(page["client_name"], "Demo Client");
    assert_eq!(page["login_hint"], "john");
    assert_eq!(page["login_required"], true);
    assert_eq!(page["scopes"][1]["name"], "profile");

    // Decision
    let mut request = form_post(
        "/api/authorization/decision",
        &serde_urlencoded::to_string([("authorized", "true"), ("loginId", "john"), ("password", "john")])
            .unwrap(),
    );
    request.headers_mut().insert(header::COOKIE, cookie.parse().unwrap());

    let response = app.send(request).await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(response.headers()[header::LOCATION], "https://client.example.org/cb?code=abc");

    let issued = app.received("/auth/authorization/issue").await;
    assert_eq!(issued.len(), 1);
    assert_eq!(issued[0]["ticket"], "ticket-1");
    assert_eq!(issued[0]["subject"], "1001");
    assert!(issued[0]["authTime"].as_i64().unwrap() > 0);
    assert!(issued[0].get("sub").is_none());

    let claims: serde_json::Value =
        serde_json::from_str(issued[0]["claims"].as_str().unwrap()).unwrap();
    assert_eq!(claims["name#ja"], "ジョン・スミス");
    assert_eq!(claims["email"], "john@example.com");

    // The ticket is consumed
    let id = cookie.trim_start_matches("gateway_session=");
    let session = Session::new(id, Arc::clone(&app.sessions));
    assert!(session.get::<fields::Ticket>().await.unwrap().is_none());
    assert_eq!(session.get::<fields::User>().await.unwrap().unwrap().subject, "1001");
}

#[tokio::test]
async fn test_decision_denied() {
    let app = TestApp::start().await;
    app.mock_post("/auth/authorization", interaction("ticket-2")).await;
    app.mock_post(
        "/auth/authorization/fail",
        json!({
            "action": "LOCATION",
            "responseContent": "https://client.example.org/cb?error=access_denied"
        }),
    )
    .await;

    let response = app.send(get_authorization("client_id=1", None)).await;
    let cookie = session_cookie(&response).unwrap();

    let mut request = form_post("/api/authorization/decision", "loginId=john&password=john");
    request.headers_mut().insert(header::COOKIE, cookie.parse().unwrap());
    let response = app.send(request).await;

    assert_eq!(response.status(), StatusCode::FOUND);
    let failed = app.received("/auth/authorization/fail").await;
    assert_eq!(failed[0]["ticket"], "ticket-2");
    assert_eq!(failed[0]["reason"], "DENIED");
}

#[tokio::test]
async fn test_decision_with_wrong_password() {
    let app = TestApp::start().await;
    app.mock_post("/auth/authorization", interaction("ticket-3")).await;
    app.mock_post(
        "/auth/authorization/fail",
        json!({"action": "FORM", "responseContent": "<html>denied</html>"}),
    )
    .await;

    let response = app.send(get_authorization("client_id=1", None)).await;
    let cookie = session_cookie(&response).unwrap();

    let mut request =
        form_post("/api/authorization/decision", "authorized=true&loginId=john&password=nope");
    request.headers_mut().insert(header::COOKIE, cookie.parse().unwrap());
    let response = app.send(request).await;

    assert_eq!(response.status(), StatusCode::OK);
    let failed = app.received("/auth/authorization/fail").await;
    assert_eq!(failed[0]["reason"], "NOT_AUTHENTICATED");
}

#[tokio::test]
async fn test_decision_without_pending_request() {
    let app = TestApp::start().await;

    let response = app.send(form_post("/api/authorization/decision", "authorized=true")).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "invalid_request");
}

#[tokio::test]
async fn test_no_interaction_without_login_fails() {
    let app = TestApp::start().await;
    app.mock_post(
        "/auth/authorization",
        json!({"action": "NO_INTERACTION", "ticket": "ticket-4", "prompts": ["NONE"]}),
    )
    .await;
    app.mock_post(
        "/auth/authorization/fail",
        json!({
            "action": "LOCATION",
            "responseContent": "https://client.example.org/cb?error=login_required"
        }),
    )
    .await;

    let response = app.send(get_authorization("prompt=none", None)).await;

    assert_eq!(response.status(), StatusCode::FOUND);
    let failed = app.received("/auth/authorization/fail").await;
    assert_eq!(failed[0]["reason"], "NOT_LOGGED_IN");
}

#[tokio::test]
async fn test_no_interaction_with_session_user_issues() {
    let app = TestApp::start().await;
    let now = chrono::Utc::now().timestamp();
    session_with_user(&app, "sid-logged-in", "1001", now - 10).await;

    app.mock_post(
        "/auth/authorization",
        json!({
            "action": "NO_INTERACTION",
            "ticket": "ticket-5",
            "maxAge": 3600,
            "client": {
                "clientId": 1,
                "subjectType": "PAIRWISE",
                "derivedSectorIdentifier": "client.example.org"
            }
        }),
    )
    .await;
    app.mock_post(
        "/auth/authorization/issue",
        json!({"action": "LOCATION", "responseContent": "https://client.example.org/cb?code=x"}),
    )
    .await;

    let response = app
        .send(get_authorization("prompt=none", Some("gateway_session=sid-logged-in")))
        .await;

    assert_eq!(response.status(), StatusCode::FOUND);
    assert!(session_cookie(&response).is_none());

    let issued = app.received("/auth/authorization/issue").await;
    assert_eq!(issued[0]["subject"], "1001");
    assert_eq!(issued[0]["authTime"], now - 10);
    assert_eq!(issued[0]["sub"].as_str().unwrap().len(), 43);
}

#[tokio::test]
async fn test_no_interaction_exceeding_max_age_fails() {
    let app = TestApp::start().await;
    let now = chrono::Utc::now().timestamp();
    session_with_user(&app, "sid-old", "1001", now - 600).await;

    app.mock_post(
        "/auth/authorization",
        json!({"action": "NO_INTERACTION", "ticket": "ticket-6", "maxAge": 60}),
    )
    .await;
    app.mock_post(
        "/auth/authorization/fail",
        json!({"action": "BAD_REQUEST", "responseContent": "{\"error\":\"login_required\"}"}),
    )
    .await;

    let response =
        app.send(get_authorization("prompt=none&max_age=60", Some("gateway_session=sid-old"))).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let failed = app.received("/auth/authorization/fail").await;
    assert_eq!(failed[0]["reason"], "EXCEEDS_MAX_AGE");
}

#[tokio::test]
async fn test_prompt_login_clears_session_user() {
    let app = TestApp::start().await;
    session_with_user(&app, "sid-relogin", "1001", chrono::Utc::now().timestamp()).await;

    let mut res = interaction("ticket-7");
    res["prompts"] = json!(["LOGIN"]);
    app.mock_post("/auth/authorization", res).await;

    let response = app
        .send(get_authorization("prompt=login", Some("gateway_session=sid-relogin")))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["login_required"], true);

    let session = Session::new("sid-relogin", Arc::clone(&app.sessions));
    let (user, auth_time, ticket) = session
        .batch_get::<(fields::User, fields::AuthTime, fields::Ticket)>()
        .await
        .unwrap();
    assert!(user.is_none());
    assert!(auth_time.is_none());
    assert_eq!(ticket.as_deref(), Some("ticket-7"));
}

#[tokio::test]
async fn test_backend_outage_is_bad_gateway() {
    let app = TestApp::start().await;
    wiremock::Mock::given(wiremock::matchers::method("POST"))
        .respond_with(wiremock::ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&app.backend)
        .await;

    let response = app.send(get_authorization("client_id=1", None)).await;

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(body_json(response).await["error"], "server_error");
}

/// Log in as john and approve the pending request held by `cookie`.
fn approve_as_john(cookie: &str) -> Request<Body> {
    let mut request =
        form_post("/api/authorization/decision", "authorized=true&loginId=john&password=john");
    request.headers_mut().insert(header::COOKIE, cookie.parse().unwrap());
    request
}

#[tokio::test]
async fn test_unknown_session_cookie_is_replaced() {
    let app = TestApp::start().await;
    app.mock_post("/auth/authorization", interaction("ticket-8")).await;

    let response = app
        .send(get_authorization("client_id=1", Some("gateway_session=attacker-chosen")))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let cookie = session_cookie(&response).expect("fresh session cookie");
    assert_ne!(cookie, "gateway_session=attacker-chosen");

    assert!(!app.sessions.exists("attacker-chosen").await.unwrap());
    let planted = Session::new("attacker-chosen", Arc::clone(&app.sessions));
    assert!(planted.get::<fields::Ticket>().await.unwrap().is_none());

    let id = cookie.trim_start_matches("gateway_session=");
    let session = Session::new(id, Arc::clone(&app.sessions));
    assert_eq!(session.get::<fields::Ticket>().await.unwrap().as_deref(), Some("ticket-8"));
}

#[tokio::test]
async fn test_decision_clears_ticket_when_issue_fails() {
    let app = TestApp::start().await;
    app.mock_post("/auth/authorization", interaction("ticket-9")).await;
    app.mock_status("/auth/authorization/issue", 500).await;

    let response = app.send(get_authorization("client_id=1", None)).await;
    let cookie = session_cookie(&response).unwrap();

    let response = app.send(approve_as_john(&cookie)).await;

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(app.received("/auth/authorization/issue").await.len(), 1);

    let id = cookie.trim_start_matches("gateway_session=");
    let session = Session::new(id, Arc::clone(&app.sessions));
    assert!(session.get::<fields::Ticket>().await.unwrap().is_none());
    assert!(session.get::<fields::ClaimNames>().await.unwrap().is_none());

    // A replay finds nothing to decide.
    let response = app.send(approve_as_john(&cookie)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_decision_for_different_subject_fails() {
    let app = TestApp::start().await;
    let mut res = interaction("ticket-10");
    res["subject"] = json!("1004");
    app.mock_post("/auth/authorization", res).await;
    app.mock_post(
        "/auth/authorization/fail",
        json!({
            "action": "LOCATION",
            "responseContent": "https://client.example.org/cb?error=login_required"
        }),
    )
    .await;

    let response = app.send(get_authorization("client_id=1", None)).await;
    let cookie = session_cookie(&response).unwrap();
    assert_eq!(body_json(response).await["subject"], "1004");

    let response = app.send(approve_as_john(&cookie)).await;

    assert_eq!(response.status(), StatusCode::FOUND);
    let failed = app.received("/auth/authorization/fail").await;
    assert_eq!(failed[0]["ticket"], "ticket-10");
    assert_eq!(failed[0]["reason"], "DIFFERENT_SUBJECT");
    assert!(app.received("/auth/authorization/issue").await.is_empty());
}

#[tokio::test]
async fn test_no_interaction_for_different_subject_fails() {
    let app = TestApp::start().await;
    session_with_user(&app, "sid-other", "1001", chrono::Utc::now().timestamp()).await;

    app.mock_post(
        "/auth/authorization",
        json!({"action": "NO_INTERACTION", "ticket": "ticket-11", "subject": "1004"}),
    )
    .await;
    app.mock_post(
        "/auth/authorization/fail",
        json!({
            "action": "LOCATION",
            "responseContent": "https://client.example.org/cb?error=login_required"
        }),
    )
    .await;

    let response =
        app.send(get_authorization("prompt=none", Some("gateway_session=sid-other"))).await;

    assert_eq!(response.status(), StatusCode::FOUND);
    let failed = app.received("/auth/authorization/fail").await;
    assert_eq!(failed[0]["reason"], "DIFFERENT_SUBJECT");
    assert!(app.received("/auth/authorization/issue").await.is_empty());
}

#[tokio::test]
async fn test_no_interaction_with_unmet_essential_acr_fails() {
    let app = TestApp::start().await;
    session_with_user(&app, "sid-acr", "1001", chrono::Utc::now().timestamp()).await;

    app.mock_post(
        "/auth/authorization",
        json!({
            "action": "NO_INTERACTION",
            "ticket": "ticket-12",
            "acrs": ["urn:x"],
            "acrEssential": true
        }),
    )
    .await;
    app.mock_post(
        "/auth/authorization/fail",
        json!({
            "action": "LOCATION",
            "responseContent": "https://client.example.org/cb?error=unmet_authentication_requirements"
        }),
    )
    .await;

    let response = app.send(get_authorization("prompt=none", Some("gateway_session=sid-acr"))).await;

    assert_eq!(response.status(), StatusCode::FOUND);
    let failed = app.received("/auth/authorization/fail").await;
    assert_eq!(failed[0]["ticket"], "ticket-12");
    assert_eq!(failed[0]["reason"], "ACR_NOT_SATISFIED");
}

#[tokio::test]
async fn test_decision_for_pairwise_client_sends_sector_sub() {
    let app = TestApp::start().await;
    let mut res = interaction("ticket-13");
    res["client"] = json!({
        "clientId": 42,
        "clientName": "Pairwise Client",
        "subjectType": "PAIRWISE",
        "derivedSectorIdentifier": "client.example.org"
    });
    app.mock_post("/auth/authorization", res).await;
    app.mock_post(
        "/auth/authorization/issue",
        json!({"action": "LOCATION", "responseContent": "https://client.example.org/cb?code=pw"}),
    )
    .await;

    let response = app.send(get_authorization("client_id=42", None)).await;
    let cookie = session_cookie(&response).unwrap();

    let response = app.send(approve_as_john(&cookie)).await;
    assert_eq!(response.status(), StatusCode::FOUND);

    let issued = app.received("/auth/authorization/issue").await;
    assert_eq!(issued[0]["subject"], "1001");
    let sub = issued[0]["sub"].as_str().unwrap();
    assert_eq!(sub.len(), 43);
    assert_ne!(sub, "1001");
}
