use url::Url;

use crate::auth_request::RequestPayload;

/// Source of the pending request, decoded before the onboarding pages run.
pub trait AuthRequestDecoderPort: Send + Sync {
    /// The request payload, or `None` for a plain onboarding session.
    fn get_decoded_request(&self) -> Option<RequestPayload>;
    /// Origin the response is posted back to.
    fn get_origin(&self) -> Option<Url>;
}
