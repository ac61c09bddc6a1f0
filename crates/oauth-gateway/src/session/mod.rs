//! Key-value session with schema-typed access.
//!
//! Each storable item is a [`SessionField`]: a zero-sized marker type carrying
//! the key name and value type. [`Session`] offers single and batch operations
//! over those fields; the raw storage is a [`SessionStore`] of JSON values.
//!
//! ```
//! # use oauth_gateway::session::{MemorySessionStore, Session, SessionUpdate, fields};
//! # use std::sync::Arc;
//! # tokio_test_block(async {
//! let session = Session::new("sid", Arc::new(MemorySessionStore::default()));
//! session
//!     .batch_set(SessionUpdate::new().set::<fields::Ticket>(&"t-1".to_string())?
//!         .set::<fields::AuthTime>(&1_700_000_000)?)
//!     .await?;
//! let (ticket, auth_time) = session.batch_get::<(fields::Ticket, fields::AuthTime)>().await?;
//! assert_eq!(ticket.as_deref(), Some("t-1"));
//! assert_eq!(auth_time, Some(1_700_000_000));
//! # Ok::<(), oauth_gateway::error::SessionError>(())
//! # }).unwrap();
//! # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Runtime::new().unwrap().block_on(f)
//! # }
//! ```

mod memory;

pub use memory::MemorySessionStore;

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{SessionError, SessionResult};

/// A named, typed slot in the session.
pub trait SessionField: Send + Sync + 'static {
    /// Storage key.
    const NAME: &'static str;

    /// Value type.
    type Value: Serialize + DeserializeOwned + Send + Sync;
}

/// Raw storage for session data.
#[async_trait::async_trait]
pub trait SessionStore: Send + Sync {
    /// Read the named values; missing entries are `None`.
    async fn load(&self, session_id: &str, names: &[&'static str])
    -> SessionResult<Vec<Option<Value>>>;

    /// Write the given values, creating the session if needed.
    async fn save(&self, session_id: &str, entries: Vec<(&'static str, Value)>)
    -> SessionResult<()>;

    /// Remove the named values and return what was stored.
    async fn remove(
        &self,
        session_id: &str,
        names: &[&'static str],
    ) -> SessionResult<Vec<Option<Value>>>;

    /// Whether a session with this ID has been stored and not yet expired.
    async fn exists(&self, session_id: &str) -> SessionResult<bool>;

    /// Number of live sessions, when known.
    fn session_count(&self) -> Option<u64> {
        None
    }
}

/// A set of fields read or deleted together.
///
/// Implemented for tuples of up to eight [`SessionField`]s; the values come
/// back as a tuple of `Option`s in the same order.
pub trait FieldSet {
    /// Tuple of optional values.
    type Values;

    /// Storage keys in order.
    fn names() -> Vec<&'static str>;

    /// Decode raw values in [`FieldSet::names`] order.
    fn decode(raw: Vec<Option<Value>>) -> SessionResult<Self::Values>;
}

fn decode<F: SessionField>(raw: Option<Value>) -> SessionResult<Option<F::Value>> {
    raw.map(|value| {
        serde_json::from_value(value).map_err(|source| SessionError::Decode { field: F::NAME, source })
    })
    .transpose()
}

macro_rules! impl_field_set {
    ($($field:ident),+) => {
        impl<$($field: SessionField),+> FieldSet for ($($field,)+) {
            type Values = ($(Option<$field::Value>,)+);

            fn names() -> Vec<&'static str> {
                vec![$($field::NAME),+]
            }

            fn decode(raw: Vec<Option<Value>>) -> SessionResult<Self::Values> {
                let mut raw = raw.into_iter();
                Ok(($(decode::<$field>(raw.next().flatten())?,)+))
            }
        }
    };
}

impl_field_set!(A);
impl_field_set!(A, B);
impl_field_set!(A, B, C);
impl_field_set!(A, B, C, D);
impl_field_set!(A, B, C, D, E);
impl_field_set!(A, B, C, D, E, F);
impl_field_set!(A, B, C, D, E, F, G);
impl_field_set!(A, B, C, D, E, F, G, H);

/// Values to write in one batch.
#[derive(Debug, Default)]
pub struct SessionUpdate {
    entries: Vec<(&'static str, Value)>,
}

impl SessionUpdate {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a value for `F`.
    pub fn set<F: SessionField>(mut self, value: &F::Value) -> SessionResult<Self> {
        let value = serde_json::to_value(value)
            .map_err(|source| SessionError::Encode { field: F::NAME, source })?;
        self.entries.push((F::NAME, value));
        Ok(self)
    }

    /// Add a value for `F` when present.
    pub fn set_opt<F: SessionField>(self, value: Option<&F::Value>) -> SessionResult<Self> {
        match value {
            Some(value) => self.set::<F>(value),
            None => Ok(self),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Handle on one end-user session.
#[derive(Clone)]
pub struct Session {
    id: String,
    store: Arc<dyn SessionStore>,
}

impl Session {
    /// Bind a session ID to a store.
    #[must_use]
    pub fn new(id: impl Into<String>, store: Arc<dyn SessionStore>) -> Self {
        Self { id: id.into(), store }
    }

    /// Generate a fresh, unguessable session ID (256 bits).
    #[must_use]
    pub fn generate_id() -> String {
        format!("{}{}", uuid::Uuid::new_v4().simple(), uuid::Uuid::new_v4().simple())
    }

    /// Session ID.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Read one field.
    pub async fn get<F: SessionField>(&self) -> SessionResult<Option<F::Value>> {
        let mut raw = self.store.load(&self.id, &[F::NAME]).await?;
        decode::<F>(raw.pop().flatten())
    }

    /// Write one field.
    pub async fn set<F: SessionField>(&self, value: &F::Value) -> SessionResult<()> {
        self.batch_set(SessionUpdate::new().set::<F>(value)?).await
    }

    /// Remove one field, returning its previous value.
    pub async fn delete<F: SessionField>(&self) -> SessionResult<Option<F::Value>> {
        let mut raw = self.store.remove(&self.id, &[F::NAME]).await?;
        decode::<F>(raw.pop().flatten())
    }

    /// Read several fields at once.
    pub async fn batch_get<S: FieldSet>(&self) -> SessionResult<S::Values> {
        let raw = self.store.load(&self.id, &S::names()).await?;
        S::decode(raw)
    }

    /// Write several fields at once.
    pub async fn batch_set(&self, update: SessionUpdate) -> SessionResult<()> {
        if update.is_empty() {
            return Ok(());
        }
        self.store.save(&self.id, update.entries).await
    }

    /// Remove several fields at once, returning their previous values.
    pub async fn batch_delete<S: FieldSet>(&self) -> SessionResult<S::Values> {
        let raw = self.store.remove(&self.id, &S::names()).await?;
        S::decode(raw)
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Session IDs are bearer secrets; only show a prefix.
        let prefix: String = self.id.chars().take(6).collect();
        f.debug_struct("Session").field("id", &format!("{prefix}…")).finish()
    }
}

/// Fields used by the authorization flow.
pub mod fields {
    use super::SessionField;
    use crate::models::Client as ClientEntity;
    use crate::users::User as EndUser;

    macro_rules! session_fields {
        ($($(#[$doc:meta])* $name:ident => $key:literal: $ty:ty;)*) => {
            $(
                $(#[$doc])*
                #[derive(Debug, Clone, Copy)]
                pub struct $name;

                impl SessionField for $name {
                    const NAME: &'static str = $key;
                    type Value = $ty;
                }
            )*
        };
    }

    session_fields! {
        /// Ticket of the authorization request awaiting a decision.
        Ticket => "ticket": String;
        /// Logged-in end-user.
        User => "user": EndUser;
        /// When the user authenticated, in seconds since the epoch.
        AuthTime => "authTime": i64;
        /// ACR values requested by the client.
        Acrs => "acrs": Vec<String>;
        /// Client behind the pending request.
        Client => "client": ClientEntity;
        /// Claims requested for the ID token.
        ClaimNames => "claimNames": Vec<String>;
        /// Preferred claim locales.
        ClaimLocales => "claimLocales": Vec<String>;
        /// Subject the client demands.
        RequestedSubject => "requestedSubject": String;
        /// `max_age` of the pending request.
        MaxAge => "maxAge": u32;
    }
}
