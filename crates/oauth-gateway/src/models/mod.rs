//! Data models for the backend authorization-server API.
//!
//! All models use `#[serde(rename_all = "camelCase")]` to match the API naming.
//! Response structs default every field so that additions on the backend side
//! never break deserialization; unknown `action` values decode to `Unknown`.

mod authorization;
mod client;
mod credential;
mod introspection;
mod par;
mod revocation;
mod token;
mod userinfo;

pub use authorization::{
    AuthorizationAction, AuthorizationFailAction, AuthorizationFailReason,
    AuthorizationFailRequest, AuthorizationFailResponse, AuthorizationIssueAction,
    AuthorizationIssueRequest, AuthorizationIssueResponse, AuthorizationRequest,
    AuthorizationResponse, Prompt, Scope,
};
pub use client::{Client, SubjectType};
pub use credential::{
    CredentialDeferredIssueRequest, CredentialDeferredParseRequest, CredentialIssuanceOrder,
    CredentialIssueAction, CredentialIssueResponse, CredentialIssuerJwksRequest,
    CredentialIssuerMetadataRequest, CredentialMetadataAction, CredentialMetadataResponse,
    CredentialParseAction, CredentialParseResponse, CredentialRequestInfo,
    CredentialSingleIssueRequest, CredentialSingleParseRequest,
};
pub use introspection::{
    IntrospectionAction, IntrospectionRequest, IntrospectionResponse,
    StandardIntrospectionAction, StandardIntrospectionRequest, StandardIntrospectionResponse,
};
pub use par::{PushedAuthReqAction, PushedAuthReqRequest, PushedAuthReqResponse};
pub use revocation::{RevocationAction, RevocationRequest, RevocationResponse};
pub use token::{
    TokenAction, TokenFailAction, TokenFailReason, TokenFailRequest, TokenFailResponse,
    TokenIssueAction, TokenIssueRequest, TokenIssueResponse, TokenRequest, TokenResponse,
};
pub use userinfo::{
    UserInfoAction, UserInfoIssueAction, UserInfoIssueRequest, UserInfoIssueResponse,
    UserInfoRequest, UserInfoResponse,
};

/// Client authentication material extracted from an incoming request.
///
/// Shared by the PAR, token, revocation and introspection calls.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientCredentials {
    /// Client ID from HTTP Basic authentication.
    pub client_id: Option<String>,
    /// Client secret from HTTP Basic authentication.
    pub client_secret: Option<String>,
    /// PEM client certificate forwarded by the TLS terminator.
    pub client_certificate: Option<String>,
}

/// DPoP proof plus the request coordinates it must be bound to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DpopContext {
    /// Value of the `DPoP` header.
    pub dpop: Option<String>,
    /// HTTP method of the request.
    pub htm: String,
    /// Absolute URL of the endpoint.
    pub htu: String,
}
