use async_trait::async_trait;
use url::Url;

use crate::account::Account;
use crate::auth_request::RequestPayload;

/// Notifies the requesting origin of the final decision.
///
/// ## Behavior
/// - Called at most once per request, after the resolved flag is set.
/// - An `Err` is logged by the caller; the request is never re-opened.
#[async_trait]
pub trait AuthResponsePort: Send + Sync {
    /// Approve the request for `account`.
    async fn send_auth_response(
        &self,
        origin: Option<&Url>,
        request: &RequestPayload,
        account: &Account,
    ) -> anyhow::Result<()>;

    /// Tell the origin the user declined.
    async fn send_cancellation(
        &self,
        origin: Option<&Url>,
        request: &RequestPayload,
    ) -> anyhow::Result<()>;
}
