//! Credential and deferred credential endpoints.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use serde_json::{Value, json};

use common::{TestApp, body_json, body_string, header_value};

fn credential_request(uri: &str, token: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::post(uri).header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("DPoP {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn token_is_valid(app: &TestApp, subject: &str) {
    app.mock_post(
        "/auth/introspection",
        json!({"action": "OK", "subject": subject, "usable": true, "dpopNonce": "n-vci"}),
    )
    .await;
}

async fn parsed_as(app: &TestApp, parse_path: &str, format: &str, details: Value) {
    app.mock_post(
        parse_path,
        json!({
            "action": "OK",
            "info": {"identifier": "req-1", "format": format, "details": details.to_string()}
        }),
    )
    .await;
}

#[tokio::test]
async fn test_credential_requires_token() {
    let app = TestApp::start().await;

    let response = app.send(credential_request("/api/credential", None, "{}")).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(header_value(&response, "www-authenticate").unwrap().starts_with("Bearer error="));
    assert!(body_string(response).await.is_empty());
    assert!(app.received("/auth/introspection").await.is_empty());
}

#[tokio::test]
async fn test_credential_rejected_token_carries_challenge() {
    let challenge = "DPoP error=\"use_dpop_nonce\"";
    let app = TestApp::start().await;
    app.mock_post(
        "/auth/introspection",
        json!({"action": "UNAUTHORIZED", "responseContent": challenge, "dpopNonce": "n-new"}),
    )
    .await;

    let response = app.send(credential_request("/api/credential", Some("at"), "{}")).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(header_value(&response, "www-authenticate").as_deref(), Some(challenge));
    assert_eq!(header_value(&response, "dpop-nonce").as_deref(), Some("n-new"));
    assert!(app.received("/vci/single/parse").await.is_empty());

    let checked = app.received("/auth/introspection").await;
    assert_eq!(checked[0]["token"], "at");
    assert_eq!(checked[0]["htu"], "https://as.example.com/api/credential");
}

#[tokio::test]
async fn test_sd_jwt_credential_issued() {
    let app = TestApp::start().await;
    token_is_valid(&app, "1004").await;
    parsed_as(&app, "/vci/single/parse", "dc+sd-jwt", json!({"vct": "urn:eudi:pid:1"})).await;
    app.mock_post(
        "/vci/single/issue",
        json!({"action": "OK", "responseContent": "{\"credential\":\"eyJ...~\"}"}),
    )
    .await;

    let body = r#"{"format":"dc+sd-jwt","vct":"urn:eudi:pid:1"}"#;
    let response = app.send(credential_request("/api/credential", Some("at"), body)).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(header_value(&response, "dpop-nonce").as_deref(), Some("n-vci"));
    assert_eq!(body_json(response).await["credential"], "eyJ...~");

    let parsed = app.received("/vci/single/parse").await;
    assert_eq!(parsed[0], json!({"accessToken": "at", "requestContent": body}));

    let issued = app.received("/vci/single/issue").await;
    assert_eq!(issued[0]["accessToken"], "at");
    assert_eq!(issued[0]["order"]["requestIdentifier"], "req-1");
    let payload: Value =
        serde_json::from_str(issued[0]["order"]["credentialPayload"].as_str().unwrap()).unwrap();
    assert_eq!(payload["vct"], "urn:eudi:pid:1");
    assert_eq!(payload["sub"], "1004");
    assert_eq!(payload["family_name"], "Silverstone");
}

#[tokio::test]
async fn test_credential_issue_actions() {
    let cases = [
        ("OK_JWT", StatusCode::OK, Some("application/jwt")),
        ("ACCEPTED", StatusCode::ACCEPTED, Some("application/json;charset=UTF-8")),
        ("ACCEPTED_JWT", StatusCode::ACCEPTED, Some("application/jwt")),
        ("UNAUTHORIZED", StatusCode::UNAUTHORIZED, None),
        ("FORBIDDEN", StatusCode::FORBIDDEN, None),
        ("CALLER_ERROR", StatusCode::INTERNAL_SERVER_ERROR, None),
    ];

    for (action, status, content_type) in cases {
        let app = TestApp::start().await;
        token_is_valid(&app, "1001").await;
        parsed_as(&app, "/vci/single/parse", "jwt_vc_json", json!({})).await;
        app.mock_post("/vci/single/issue", json!({"action": action, "responseContent": "x"}))
            .await;

        let response = app.send(credential_request("/api/credential", Some("at"), "{}")).await;

        assert_eq!(response.status(), status, "action {action}");
        if let Some(content_type) = content_type {
            assert_eq!(header_value(&response, "content-type").as_deref(), Some(content_type));
        }
    }
}

#[tokio::test]
async fn test_credential_parse_failure() {
    let app = TestApp::start().await;
    token_is_valid(&app, "1001").await;
    app.mock_post(
        "/vci/single/parse",
        json!({"action": "BAD_REQUEST", "responseContent": "{\"error\":\"invalid_credential_request\"}"}),
    )
    .await;

    let response = app.send(credential_request("/api/credential", Some("at"), "{}")).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "invalid_credential_request");
    assert!(app.received("/vci/single/issue").await.is_empty());
}

#[tokio::test]
async fn test_credential_unsupported_format() {
    let app = TestApp::start().await;
    token_is_valid(&app, "1001").await;
    parsed_as(&app, "/vci/single/parse", "ldp_vc", json!({})).await;

    let response = app.send(credential_request("/api/credential", Some("at"), "{}")).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "unsupported_credential_format");
}

#[tokio::test]
async fn test_credential_unknown_subject_is_forbidden() {
    let app = TestApp::start().await;
    token_is_valid(&app, "9999").await;
    parsed_as(&app, "/vci/single/parse", "dc+sd-jwt", json!({"vct": "urn:x"})).await;

    let response = app.send(credential_request("/api/credential", Some("at"), "{}")).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await["error"], "invalid_token");
}

#[tokio::test]
async fn test_deferred_credential_issued() {
    let app = TestApp::start().await;
    token_is_valid(&app, "1001").await;
    parsed_as(&app, "/vci/deferred/parse", "mso_mdoc", json!({"doctype": "org.iso.18013.5.1.mDL"}))
        .await;
    app.mock_post(
        "/vci/deferred/issue",
        json!({"action": "OK", "responseContent": "{\"credential\":\"omdk...\"}"}),
    )
    .await;

    let body = r#"{"transaction_id":"tx-1"}"#;
    let response =
        app.send(credential_request("/api/deferred_credential", Some("at"), body)).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["credential"], "omdk...");

    let checked = app.received("/auth/introspection").await;
    assert_eq!(checked[0]["htu"], "https://as.example.com/api/deferred_credential");

    let issued = app.received("/vci/deferred/issue").await;
    assert!(issued[0].get("accessToken").is_none());
    let payload: Value =
        serde_json::from_str(issued[0]["order"]["credentialPayload"].as_str().unwrap()).unwrap();
    assert_eq!(payload["doctype"], "org.iso.18013.5.1.mDL");
    assert_eq!(payload["claims"]["org.iso.18013.5.1"]["family_name"], "Smith");
    assert!(app.received("/vci/single/issue").await.is_empty());
}
