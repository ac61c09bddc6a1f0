//! Endpoint handlers.
//!
//! Each handler forwards the request to the backend and maps the returned
//! `action` onto an HTTP response. Protocol failures reported by the backend
//! are ordinary responses; only transport and session failures surface as
//! [`HandlerError`](crate::error::HandlerError).

pub mod authorization;
pub mod credential;
pub mod discovery;
pub mod introspection;
pub mod par;
pub mod revocation;
pub mod token;
pub mod userinfo;
