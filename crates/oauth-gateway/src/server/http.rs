//! Request extraction and response shaping shared by the endpoints.

use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use super::AppState;
use crate::models::{ClientCredentials, DpopContext};
use crate::error::SessionResult;
use crate::session::Session;

/// `DPoP-Nonce` response header.
pub const DPOP_NONCE: HeaderName = HeaderName::from_static("dpop-nonce");

const JSON: &str = "application/json;charset=UTF-8";
const HTML: &str = "text/html;charset=UTF-8";

// ─── Request side ────────────────────────────────────────────────────────────

/// Client ID and secret from an `Authorization: Basic` header.
#[must_use]
pub fn basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, encoded) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }

    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (id, secret) = decoded.split_once(':')?;
    Some((id.to_string(), secret.to_string()))
}

/// Client authentication material of an incoming request.
#[must_use]
pub fn client_credentials(headers: &HeaderMap, cert_header: &str) -> ClientCredentials {
    let (client_id, client_secret) = match basic_credentials(headers) {
        Some((id, secret)) => (Some(id), Some(secret)),
        None => (None, None),
    };

    ClientCredentials {
        client_id,
        client_secret,
        client_certificate: client_certificate(headers, cert_header),
    }
}

/// PEM certificate forwarded by the TLS terminator.
#[must_use]
pub fn client_certificate(headers: &HeaderMap, cert_header: &str) -> Option<String> {
    let value = headers.get(cert_header)?.to_str().ok()?.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// DPoP proof with the coordinates it must be bound to.
#[must_use]
pub fn dpop_context(headers: &HeaderMap, method: &Method, htu: String) -> DpopContext {
    DpopContext {
        dpop: headers.get("dpop").and_then(|v| v.to_str().ok()).map(str::to_string),
        htm: method.as_str().to_string(),
        htu,
    }
}

/// Access token from `Authorization: Bearer` or `Authorization: DPoP`.
#[must_use]
pub fn access_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();

    (scheme.eq_ignore_ascii_case("bearer") || scheme.eq_ignore_ascii_case("dpop"))
        .then(|| token.to_string())
        .filter(|t| !t.is_empty())
}

/// Value of a parameter in a form-encoded body.
#[must_use]
pub fn form_parameter(body: &str, name: &str) -> Option<String> {
    url::form_urlencoded::parse(body.as_bytes())
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}

/// Session bound to the request's cookie, starting a new one when the cookie
/// is absent or names a session this gateway does not hold.
///
/// The returned jar must be part of the response so a new cookie reaches the
/// user agent.
pub async fn session(
    state: &AppState,
    jar: CookieJar,
) -> SessionResult<(CookieJar, Session)> {
    let name = state.config.session_cookie_name.clone();
    if let Some(cookie) = jar.get(&name) {
        let id = cookie.value();
        if !id.is_empty() && state.sessions.exists(id).await? {
            let session = Session::new(id, state.sessions.clone());
            return Ok((jar, session));
        }
        tracing::debug!("Ignoring unknown session cookie");
    }

    let id = Session::generate_id();
    tracing::debug!("Starting new session");
    let cookie = Cookie::build((name, id.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.config.public_base_url.starts_with("https://"));

    Ok((jar.add(cookie), Session::new(id, state.sessions.clone())))
}

// ─── Response side ───────────────────────────────────────────────────────────

/// Response with the given body and content type, never cached.
#[must_use]
pub fn no_store(status: StatusCode, content_type: &'static str, body: Option<String>) -> Response {
    let mut response = (status, body.unwrap_or_default()).into_response();

    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
    response
}

/// JSON body supplied by the backend.
#[must_use]
pub fn json(status: StatusCode, content: Option<String>) -> Response {
    no_store(status, JSON, content)
}

/// HTML body supplied by the backend (form post response mode).
#[must_use]
pub fn html(content: Option<String>) -> Response {
    no_store(StatusCode::OK, HTML, content)
}

/// JWT body with a specific media type.
#[must_use]
pub fn jwt(status: StatusCode, content_type: &'static str, content: Option<String>) -> Response {
    no_store(status, content_type, content)
}

/// `302 Found` to the URL supplied by the backend.
#[must_use]
pub fn location(content: Option<String>) -> Response {
    let mut response = no_store(StatusCode::FOUND, JSON, None);
    response.headers_mut().remove(header::CONTENT_TYPE);
    set_header(&mut response, header::LOCATION, content.as_deref());
    response
}

/// OAuth error body built locally.
#[must_use]
pub fn oauth_error(status: StatusCode, error: &str, description: &str) -> Response {
    let body = serde_json::json!({ "error": error, "error_description": description });
    json(status, Some(body.to_string()))
}

/// `401` with a Basic challenge, for failed client authentication.
#[must_use]
pub fn invalid_client(content: Option<String>, realm: &str) -> Response {
    let mut response = json(StatusCode::UNAUTHORIZED, content);
    let challenge = format!("Basic realm=\"{realm}\"");
    set_header(&mut response, header::WWW_AUTHENTICATE, Some(&challenge));
    response
}

/// Empty response carrying the backend's `WWW-Authenticate` challenge.
#[must_use]
pub fn challenge(status: StatusCode, content: Option<String>) -> Response {
    let mut response = no_store(status, JSON, None);
    response.headers_mut().remove(header::CONTENT_TYPE);
    set_header(&mut response, header::WWW_AUTHENTICATE, content.as_deref());
    response
}

/// Echo a DPoP nonce issued by the backend.
#[must_use]
pub fn with_dpop_nonce(mut response: Response, nonce: Option<String>) -> Response {
    set_header(&mut response, DPOP_NONCE, nonce.as_deref());
    response
}

fn set_header(response: &mut Response, name: HeaderName, value: Option<&str>) {
    let Some(value) = value else { return };
    match HeaderValue::from_str(value) {
        Ok(value) => {
            response.headers_mut().insert(name, value);
        }
        Err(_) => tracing::warn!(header = %name, "Dropping header with invalid characters"),
    }
}
