//! End-user directory.
//!
//! The gateway needs to authenticate end-users on the authorization decision
//! and password grant paths, and to read their claims for ID tokens, UserInfo
//! and credentials. [`UserHandler`] is the seam; [`InMemoryUserHandler`] is the
//! bundled implementation.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// An authenticated end-user, as kept in the session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Stable subject identifier.
    pub subject: String,

    /// Name typed on the login form.
    pub login_id: String,

    /// Authentication context class the user logged in with.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acr: Option<String>,

    /// Standard and custom claims (`name`, `email`, `birthdate`, ...).
    #[serde(default)]
    pub claims: serde_json::Map<String, serde_json::Value>,
}

impl User {
    /// Look up a claim, honouring `claims_locales` via `name#locale` keys.
    ///
    /// Returns the key that matched together with its value.
    #[must_use]
    pub fn claim(&self, name: &str, locales: &[String]) -> Option<(String, &serde_json::Value)> {
        locales
            .iter()
            .find_map(|locale| {
                let key = format!("{name}#{locale}");
                self.claims.get(&key).map(|value| (key, value))
            })
            .or_else(|| self.claims.get(name).map(|value| (name.to_string(), value)))
    }
}

/// A user record with its password, as loaded from the directory.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserRecord {
    #[serde(flatten)]
    user: User,
    password: String,
}

/// Lookup and authentication of end-users.
#[async_trait::async_trait]
pub trait UserHandler: Send + Sync {
    /// Verify login credentials.
    async fn authenticate(&self, login_id: &str, password: &str) -> Option<User>;

    /// Find a user by subject.
    async fn lookup(&self, subject: &str) -> Option<User>;
}

/// Users held in memory, keyed by login ID.
#[derive(Debug, Clone, Default)]
pub struct InMemoryUserHandler {
    records: HashMap<String, UserRecord>,
}

impl InMemoryUserHandler {
    /// Create an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Directory with the bundled sample users.
    #[must_use]
    pub fn with_sample_users() -> Self {
        let mut handler = Self::new();
        for (subject, login_id, password, claims) in [
            (
                "1001",
                "john",
                "john",
                serde_json::json!({
                    "name": "John Smith",
                    "given_name": "John",
                    "family_name": "Smith",
                    "email": "john@example.com",
                    "email_verified": true,
                    "birthdate": "1974-02-18",
                    "address": {"country": "US", "locality": "Springfield"},
                    "name#ja": "ジョン・スミス"
                }),
            ),
            (
                "1004",
                "inga",
                "inga",
                serde_json::json!({
                    "name": "Inga Silverstone",
                    "given_name": "Inga",
                    "family_name": "Silverstone",
                    "email": "inga@example.com",
                    "email_verified": true,
                    "birthdate": "1991-11-06",
                    "nationalities": ["DE"]
                }),
            ),
        ] {
            handler.add(
                User {
                    subject: subject.to_string(),
                    login_id: login_id.to_string(),
                    acr: None,
                    claims: match claims {
                        serde_json::Value::Object(map) => map,
                        _ => serde_json::Map::new(),
                    },
                },
                password,
            );
        }
        handler
    }

    /// Load users from a JSON array of `{subject, loginId, password, claims}`.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let records: Vec<UserRecord> = serde_json::from_str(&text)?;
        tracing::info!(count = records.len(), path = %path.display(), "Loaded users");

        Ok(Self {
            records: records.into_iter().map(|r| (r.user.login_id.clone(), r)).collect(),
        })
    }

    /// Add or replace a user.
    pub fn add(&mut self, user: User, password: impl Into<String>) {
        self.records
            .insert(user.login_id.clone(), UserRecord { user, password: password.into() });
    }

    /// Number of users.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the directory is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait::async_trait]
impl UserHandler for InMemoryUserHandler {
    async fn authenticate(&self, login_id: &str, password: &str) -> Option<User> {
        let record = self.records.get(login_id)?;
        (record.password == password).then(|| record.user.clone())
    }

    async fn lookup(&self, subject: &str) -> Option<User> {
        self.records.values().find(|r| r.user.subject == subject).map(|r| r.user.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_authenticate_sample_user() {
        let users = InMemoryUserHandler::with_sample_users();
        let user = users.authenticate("john", "john").await.unwrap();
        assert_eq!(user.subject, "1001");
        assert!(users.authenticate("john", "wrong").await.is_none());
        assert!(users.authenticate("nobody", "john").await.is_none());
    }

    #[tokio::test]
    async fn test_lookup_by_subject() {
        let users = InMemoryUserHandler::with_sample_users();
        assert_eq!(users.lookup("1004").await.unwrap().login_id, "inga");
        assert!(users.lookup("9999").await.is_none());
    }

    #[test]
    fn test_localized_claim() {
        let users = InMemoryUserHandler::with_sample_users();
        let john = &users.records["john"].user;
        let (key, value) = john.claim("name", &["ja".to_string()]).unwrap();
        assert_eq!(key, "name#ja");
        assert_eq!(value, "ジョン・スミス");
        let (key, value) = john.claim("name", &["fr".to_string()]).unwrap();
        assert_eq!(key, "name");
        assert_eq!(value, "John Smith");
        assert!(john.claim("phone_number", &[]).is_none());
    }

    #[test]
    fn test_user_serialization_has_no_password() {
        let users = InMemoryUserHandler::with_sample_users();
        let json = serde_json::to_string(&users.records["inga"].user).unwrap();
        assert!(!json.contains("password"));
    }

    #[tokio::test]
    async fn test_load_bundled_file() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("data/users.json");
        let users = InMemoryUserHandler::from_file(&path).unwrap();
        assert!(!users.is_empty());

        let inga = users.authenticate("inga", "inga").await.unwrap();
        assert_eq!(inga.subject, "1004");
        assert!(inga.acr.is_some());
    }
}
