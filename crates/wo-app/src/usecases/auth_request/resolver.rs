//! Auth request resolver.
//!
//! Finalizes the pending request exactly once: either completes it for the
//! chosen account or cancels it. This is the only writer of the resolved
//! flag, so explicit cancel, tab teardown and completion can race freely;
//! the loser of the race is a logged no-op.

use std::sync::Arc;

use tracing::{debug, error, info, info_span, warn, Instrument};

use wo_core::config::ResolverConfig;
use wo_core::ports::{AuthResponsePort, WindowPort};
use wo_core::ResolveOutcome;

use super::AuthRequestContext;

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("account index {index} out of range ({available} accounts available)")]
    MissingAccount { index: usize, available: usize },
}

/// Single writer of the request's resolved flag. Shared by the flow
/// controller and the tab guard.
pub struct AuthRequestResolver {
    context: Arc<AuthRequestContext>,
    responder: Arc<dyn AuthResponsePort>,
    window: Arc<dyn WindowPort>,
    strict_account_index: bool,
}

impl AuthRequestResolver {
    pub fn new(
        context: Arc<AuthRequestContext>,
        responder: Arc<dyn AuthResponsePort>,
        window: Arc<dyn WindowPort>,
        config: &ResolverConfig,
    ) -> Self {
        Self {
            context,
            responder,
            window,
            strict_account_index: config.strict_account_index,
        }
    }

    /// The request this resolver finalizes.
    pub fn context(&self) -> &Arc<AuthRequestContext> {
        &self.context
    }

    /// Approve the pending request with the account at `account_index`.
    ///
    /// The resolved flag is set before the origin is notified; a failed
    /// notification is logged and never re-opens the request.
    ///
    /// An index outside the account set is a caller bug. In strict mode it
    /// returns [`ResolveError::MissingAccount`] and leaves the request
    /// pending; otherwise the request is cancelled instead.
    pub async fn complete(&self, account_index: usize) -> Result<ResolveOutcome, ResolveError> {
        let span = info_span!("usecase.auth_request_resolver.complete", account_index);
        async {
            let Some(request) = self.context.decoded_request() else {
                warn!("complete requested without a pending auth request");
                return Ok(ResolveOutcome::NoPendingRequest);
            };
            if self.context.is_resolved() {
                debug!("auth request already resolved, ignoring complete");
                return Ok(ResolveOutcome::AlreadyResolved);
            }

            let available = self.context.accounts().map_or(0, |accounts| accounts.len());
            let Some(account) = self
                .context
                .accounts()
                .and_then(|accounts| accounts.get(account_index))
            else {
                if self.strict_account_index {
                    error!(available, "complete requested for missing account");
                    return Err(ResolveError::MissingAccount {
                        index: account_index,
                        available,
                    });
                }
                error!(
                    available,
                    "complete requested for missing account, cancelling request instead"
                );
                return Ok(self.cancel().await);
            };

            if !self.context.mark_resolved() {
                debug!("auth request resolved concurrently, ignoring complete");
                return Ok(ResolveOutcome::AlreadyResolved);
            }

            if let Err(err) = self
                .responder
                .send_auth_response(self.context.origin(), request, account)
                .await
            {
                error!(error = %err, "failed to deliver auth response to origin");
            }
            self.window.close();

            info!(address = %account.address, "auth request completed");
            Ok(ResolveOutcome::Completed { account_index })
        }
        .instrument(span)
        .await
    }

    /// Cancel the pending request. Safe to call any number of times.
    pub async fn cancel(&self) -> ResolveOutcome {
        let span = info_span!("usecase.auth_request_resolver.cancel");
        async {
            let Some(request) = self.context.decoded_request() else {
                debug!("cancel requested without a pending auth request");
                return ResolveOutcome::NoPendingRequest;
            };
            if !self.context.mark_resolved() {
                debug!("auth request already resolved, ignoring cancel");
                return ResolveOutcome::AlreadyResolved;
            }

            if let Err(err) = self
                .responder
                .send_cancellation(self.context.origin(), request)
                .await
            {
                error!(error = %err, "failed to deliver cancellation to origin");
            }
            self.window.close();

            info!("auth request cancelled");
            ResolveOutcome::Cancelled
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex as StdMutex;
    use wo_core::url::Url;
    use wo_core::{Account, AccountSet, RequestPayload};

    #[derive(Default)]
    struct RecordingResponder {
        responses: StdMutex<Vec<usize>>,
        cancellations: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl AuthResponsePort for RecordingResponder {
        async fn send_auth_response(
            &self,
            _origin: Option<&Url>,
            _request: &RequestPayload,
            account: &Account,
        ) -> anyhow::Result<()> {
            self.responses.lock().unwrap().push(account.index);
            if self.fail {
                anyhow::bail!("origin tab gone");
            }
            Ok(())
        }

        async fn send_cancellation(
            &self,
            _origin: Option<&Url>,
            _request: &RequestPayload,
        ) -> anyhow::Result<()> {
            self.cancellations.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[derive(Default)]
    struct CountingWindow {
        closes: AtomicUsize,
    }

    impl WindowPort for CountingWindow {
        fn close(&self) {
            self.closes.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn payload() -> RequestPayload {
        RequestPayload {
            domain_name: "https://app.example".to_string(),
            manifest_uri: None,
            redirect_uri: None,
            scopes: vec!["store_write".to_string()],
            app_details: None,
        }
    }

    fn context_with_accounts(count: usize) -> Arc<AuthRequestContext> {
        let context = AuthRequestContext::new(
            Some(Url::parse("https://app.example").unwrap()),
            Some(payload()),
        );
        context.set_accounts(AccountSet::new(
            (0..count)
                .map(|index| Account {
                    index,
                    address: format!("SP{index:040}"),
                })
                .collect(),
        ));
        context.arc()
    }

    fn resolver(
        context: Arc<AuthRequestContext>,
        responder: Arc<RecordingResponder>,
        window: Arc<CountingWindow>,
        strict: bool,
    ) -> AuthRequestResolver {
        AuthRequestResolver::new(
            context,
            responder,
            window,
            &ResolverConfig {
                strict_account_index: strict,
            },
        )
    }

    #[tokio::test]
    async fn complete_notifies_origin_once() {
        let responder = Arc::new(RecordingResponder::default());
        let window = Arc::new(CountingWindow::default());
        let context = context_with_accounts(2);
        let resolver = resolver(context.clone(), responder.clone(), window.clone(), true);

        let first = resolver.complete(1).await.unwrap();
        let second = resolver.complete(1).await.unwrap();

        assert_eq!(first, ResolveOutcome::Completed { account_index: 1 });
        assert_eq!(second, ResolveOutcome::AlreadyResolved);
        assert_eq!(*responder.responses.lock().unwrap(), vec![1]);
        assert_eq!(window.closes.load(Ordering::SeqCst), 1);
        assert!(context.is_resolved());
    }

    #[tokio::test]
    async fn cancel_after_complete_is_a_no_op() {
        let responder = Arc::new(RecordingResponder::default());
        let window = Arc::new(CountingWindow::default());
        let resolver = resolver(
            context_with_accounts(1),
            responder.clone(),
            window.clone(),
            true,
        );

        resolver.complete(0).await.unwrap();
        let outcome = resolver.cancel().await;

        assert_eq!(outcome, ResolveOutcome::AlreadyResolved);
        assert_eq!(responder.cancellations.load(Ordering::SeqCst), 0);
        assert_eq!(window.closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn duplicate_cancels_notify_once() {
        let responder = Arc::new(RecordingResponder::default());
        let window = Arc::new(CountingWindow::default());
        let resolver = resolver(
            context_with_accounts(1),
            responder.clone(),
            window.clone(),
            true,
        );

        assert_eq!(resolver.cancel().await, ResolveOutcome::Cancelled);
        assert_eq!(resolver.cancel().await, ResolveOutcome::AlreadyResolved);
        assert_eq!(
            resolver.complete(0).await.unwrap(),
            ResolveOutcome::AlreadyResolved
        );
        assert_eq!(responder.cancellations.load(Ordering::SeqCst), 1);
        assert!(responder.responses.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn strict_mode_rejects_missing_account_and_keeps_request_pending() {
        let responder = Arc::new(RecordingResponder::default());
        let context = context_with_accounts(2);
        let resolver = resolver(
            context.clone(),
            responder.clone(),
            Arc::new(CountingWindow::default()),
            true,
        );

        let err = resolver.complete(5).await.unwrap_err();

        assert!(matches!(
            err,
            ResolveError::MissingAccount {
                index: 5,
                available: 2
            }
        ));
        assert!(!context.is_resolved());
        assert!(responder.responses.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn lenient_mode_cancels_on_missing_account() {
        let responder = Arc::new(RecordingResponder::default());
        let context = context_with_accounts(2);
        let resolver = resolver(
            context.clone(),
            responder.clone(),
            Arc::new(CountingWindow::default()),
            false,
        );

        let outcome = resolver.complete(5).await.unwrap();

        assert_eq!(outcome, ResolveOutcome::Cancelled);
        assert!(context.is_resolved());
        assert_eq!(responder.cancellations.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_notification_keeps_request_resolved() {
        let responder = Arc::new(RecordingResponder {
            fail: true,
            ..Default::default()
        });
        let context = context_with_accounts(1);
        let resolver = resolver(
            context.clone(),
            responder.clone(),
            Arc::new(CountingWindow::default()),
            true,
        );

        let outcome = resolver.complete(0).await.unwrap();

        assert_eq!(outcome, ResolveOutcome::Completed { account_index: 0 });
        assert!(context.is_resolved());
        assert_eq!(
            resolver.complete(0).await.unwrap(),
            ResolveOutcome::AlreadyResolved
        );
        assert_eq!(responder.responses.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn resolving_without_request_does_nothing() {
        let responder = Arc::new(RecordingResponder::default());
        let window = Arc::new(CountingWindow::default());
        let resolver = resolver(
            AuthRequestContext::without_request().arc(),
            responder.clone(),
            window.clone(),
            true,
        );

        assert_eq!(
            resolver.complete(0).await.unwrap(),
            ResolveOutcome::NoPendingRequest
        );
        assert_eq!(resolver.cancel().await, ResolveOutcome::NoPendingRequest);
        assert_eq!(window.closes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn concurrent_complete_and_cancel_resolve_once() {
        let responder = Arc::new(RecordingResponder::default());
        let resolver = Arc::new(resolver(
            context_with_accounts(2),
            responder.clone(),
            Arc::new(CountingWindow::default()),
            true,
        ));

        let complete = {
            let resolver = Arc::clone(&resolver);
            tokio::spawn(async move { resolver.complete(1).await })
        };
        let cancel = {
            let resolver = Arc::clone(&resolver);
            tokio::spawn(async move { resolver.cancel().await })
        };
        let complete = complete.await.unwrap().unwrap();
        let cancel = cancel.await.unwrap();

        let effects = responder.responses.lock().unwrap().len()
            + responder.cancellations.load(Ordering::SeqCst);
        assert_eq!(effects, 1);
        assert!(
            (complete == ResolveOutcome::AlreadyResolved) ^ (cancel == ResolveOutcome::AlreadyResolved)
        );
    }
}
