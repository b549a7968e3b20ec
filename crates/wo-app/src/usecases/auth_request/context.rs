use std::sync::{Arc, OnceLock};

use tokio::sync::watch;
use wo_core::url::Url;
use wo_core::{ports::AuthRequestDecoderPort, AccountSet, AppDetails, RequestPayload};

/// The external request waiting for a decision.
///
/// `resolved` only ever goes from false to true, and only through
/// [`super::AuthRequestResolver`]. Observers can wait on the flip with
/// [`AuthRequestContext::subscribe_resolved`].
#[derive(Debug)]
pub struct PendingAuthRequest {
    origin: Option<Url>,
    decoded: Option<RequestPayload>,
    resolved: watch::Sender<bool>,
}

/// Session context shared by the flow controller, the resolver and the tab
/// guard.
///
/// Created when the request is decoded; holds the account set once key
/// material has been unlocked.
#[derive(Debug)]
pub struct AuthRequestContext {
    request: PendingAuthRequest,
    accounts: OnceLock<AccountSet>,
}

impl AuthRequestContext {
    pub fn new(origin: Option<Url>, decoded: Option<RequestPayload>) -> Self {
        Self {
            request: PendingAuthRequest {
                origin,
                decoded,
                resolved: watch::Sender::new(false),
            },
            accounts: OnceLock::new(),
        }
    }

    pub fn from_decoder(decoder: &dyn AuthRequestDecoderPort) -> Self {
        Self::new(decoder.get_origin(), decoder.get_decoded_request())
    }

    /// Context for a plain onboarding session with no connecting app.
    pub fn without_request() -> Self {
        Self::new(None, None)
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn has_pending_request(&self) -> bool {
        self.request.decoded.is_some()
    }

    pub fn decoded_request(&self) -> Option<&RequestPayload> {
        self.request.decoded.as_ref()
    }

    pub fn origin(&self) -> Option<&Url> {
        self.request.origin.as_ref()
    }

    pub fn app_details(&self) -> Option<AppDetails> {
        self.request
            .decoded
            .as_ref()
            .map(|payload| AppDetails::from_request(payload, self.request.origin.as_ref()))
    }

    pub fn is_resolved(&self) -> bool {
        *self.request.resolved.borrow()
    }

    /// Receiver that sees the resolved flag flip, whoever resolved the
    /// request.
    pub fn subscribe_resolved(&self) -> watch::Receiver<bool> {
        self.request.resolved.subscribe()
    }

    /// Check-and-set of the resolved flag. Returns `false` if it was
    /// already set. Outside tests, only the resolver calls this.
    pub(crate) fn mark_resolved(&self) -> bool {
        self.request
            .resolved
            .send_if_modified(|resolved| !std::mem::replace(resolved, true))
    }

    pub fn accounts(&self) -> Option<&AccountSet> {
        self.accounts.get()
    }

    /// Store the account set for this request. The first set wins; later
    /// calls return the stored one unchanged.
    pub fn set_accounts(&self, accounts: AccountSet) -> &AccountSet {
        self.accounts.get_or_init(|| accounts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wo_core::Account;

    fn account(index: usize) -> Account {
        Account {
            index,
            address: format!("SP{index:040}"),
        }
    }

    #[test]
    fn resolved_flag_is_set_once() {
        let context = AuthRequestContext::without_request();
        assert!(!context.is_resolved());
        assert!(context.mark_resolved());
        assert!(!context.mark_resolved());
        assert!(context.is_resolved());
    }

    #[test]
    fn subscribers_see_the_flag_flip_once() {
        let context = AuthRequestContext::without_request();
        let mut resolved = context.subscribe_resolved();
        assert!(!*resolved.borrow_and_update());

        assert!(context.mark_resolved());
        assert!(!context.mark_resolved());

        assert!(resolved.has_changed().unwrap());
        assert!(*resolved.borrow_and_update());
        assert!(!resolved.has_changed().unwrap());
    }

    #[test]
    fn account_set_is_immutable_after_first_set() {
        let context = AuthRequestContext::without_request();
        context.set_accounts(AccountSet::new(vec![account(0), account(1)]));

        let stored = context.set_accounts(AccountSet::new(vec![account(5)]));

        assert_eq!(stored.len(), 2);
        assert_eq!(context.accounts().map(AccountSet::len), Some(2));
    }

    #[test]
    fn context_without_request_has_no_app_details() {
        let context = AuthRequestContext::without_request();
        assert!(!context.has_pending_request());
        assert!(context.app_details().is_none());
    }
}
