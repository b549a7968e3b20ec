//! Decoded external connection requests.
//!
//! The request is decoded upstream of the onboarding flow; this module only
//! defines what the flow reads from it.

use serde::{Deserialize, Serialize};
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppManifest {
    pub name: String,
    #[serde(default)]
    pub icon: Option<String>,
}

/// Payload of an app's auth request token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestPayload {
    pub domain_name: String,
    #[serde(default)]
    pub manifest_uri: Option<String>,
    #[serde(default)]
    pub redirect_uri: Option<String>,
    #[serde(default)]
    pub scopes: Vec<String>,
    #[serde(default)]
    pub app_details: Option<AppManifest>,
}

/// Requester shown in the account chooser header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppDetails {
    pub name: String,
    pub icon: Option<String>,
    pub url: Option<Url>,
}

impl AppDetails {
    pub fn from_request(payload: &RequestPayload, origin: Option<&Url>) -> Self {
        let (name, icon) = match &payload.app_details {
            Some(manifest) => (manifest.name.clone(), manifest.icon.clone()),
            None => (payload.domain_name.clone(), None),
        };
        Self {
            name,
            icon,
            url: origin.cloned(),
        }
    }
}

/// Result of a resolver call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ResolveOutcome {
    /// The request was approved for this account.
    Completed { account_index: usize },
    /// The request was cancelled by this call.
    Cancelled,
    /// A previous call already resolved the request; nothing happened.
    AlreadyResolved,
    /// There is no pending request in this session.
    NoPendingRequest,
}
