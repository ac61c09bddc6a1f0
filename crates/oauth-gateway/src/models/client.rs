//! Registered client entity as reported by the backend.

use serde::{Deserialize, Serialize};

/// Subject identifier type registered for a client.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubjectType {
    /// Same `sub` for every client.
    #[default]
    Public,
    /// Per-sector `sub` values.
    Pairwise,
}

/// A client application registered with the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Client {
    /// Numeric client ID.
    pub client_id: i64,

    /// Client ID alias, if configured.
    pub client_id_alias: Option<String>,

    /// Whether the alias is enabled.
    pub client_id_alias_enabled: bool,

    /// Human readable name.
    pub client_name: Option<String>,

    /// Logo shown on consent pages.
    pub logo_uri: Option<String>,

    /// Subject type.
    pub subject_type: SubjectType,

    /// Sector identifier computed by the backend.
    pub derived_sector_identifier: Option<String>,

    /// Explicit sector identifier URI.
    pub sector_identifier_uri: Option<String>,

    /// Registered redirect URIs.
    pub redirect_uris: Vec<String>,
}

impl Client {
    /// Identifier shown to users: the alias when enabled, else the numeric ID.
    #[must_use]
    pub fn display_id(&self) -> String {
        match (&self.client_id_alias, self.client_id_alias_enabled) {
            (Some(alias), true) => alias.clone(),
            _ => self.client_id.to_string(),
        }
    }

    /// Sector identifier used for pairwise subjects.
    ///
    /// Falls back to the host of the single registered redirect URI.
    #[must_use]
    pub fn sector_identifier(&self) -> Option<String> {
        if let Some(ref sector) = self.derived_sector_identifier {
            if !sector.is_empty() {
                return Some(sector.clone());
            }
        }

        match self.redirect_uris.as_slice() {
            [only] => url::Url::parse(only).ok()?.host_str().map(str::to_owned),
            _ => None,
        }
    }
}
