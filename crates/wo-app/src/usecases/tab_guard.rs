//! Tab lifecycle guard.
//!
//! Cancels the pending request when the popup is torn down, and closes the
//! popup when the requesting app's tab goes away.

use std::sync::{Arc, Mutex};

use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn, Instrument};

use wo_core::ports::{TeardownPort, TeardownSignal, WindowPort};

use crate::usecases::auth_request::AuthRequestResolver;

/// One teardown listener per request-bound page.
///
/// Dropping the guard (or calling [`unmount`](Self::unmount)) removes the
/// listener, so a completed page never fires a late cancel.
pub struct TabLifecycleGuard {
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl TabLifecycleGuard {
    /// Must be called from within a tokio runtime.
    pub fn register(
        teardown: &dyn TeardownPort,
        resolver: Arc<AuthRequestResolver>,
        window: Arc<dyn WindowPort>,
    ) -> Self {
        let mut signals = teardown.subscribe();
        let span = tracing::info_span!("usecase.tab_lifecycle_guard");

        let listener = tokio::spawn(
            async move {
                loop {
                    match signals.recv().await {
                        Ok(TeardownSignal::WindowUnload) => {
                            if resolver.context().is_resolved() {
                                debug!("window unloading after resolution");
                            } else {
                                let outcome = resolver.cancel().await;
                                info!(?outcome, "window unloading, pending request cancelled");
                            }
                            break;
                        }
                        Ok(TeardownSignal::OriginTabClosed) => {
                            info!("origin tab closed, closing window");
                            window.close();
                        }
                        Err(RecvError::Lagged(skipped)) => {
                            warn!(skipped, "teardown listener lagged");
                        }
                        Err(RecvError::Closed) => {
                            debug!("teardown source closed");
                            break;
                        }
                    }
                }
            }
            .instrument(span),
        );

        Self {
            listener: Mutex::new(Some(listener)),
        }
    }

    pub fn is_registered(&self) -> bool {
        self.lock_listener()
            .as_ref()
            .is_some_and(|listener| !listener.is_finished())
    }

    /// Remove the listener. Idempotent.
    pub fn unmount(&self) {
        if let Some(listener) = self.lock_listener().take() {
            listener.abort();
            debug!("tab lifecycle guard unmounted");
        }
    }

    fn lock_listener(&self) -> std::sync::MutexGuard<'_, Option<JoinHandle<()>>> {
        match self.listener.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Drop for TabLifecycleGuard {
    fn drop(&mut self) {
        self.unmount();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::broadcast;
    use wo_core::config::ResolverConfig;
    use wo_core::ports::AuthResponsePort;
    use wo_core::url::Url;
    use wo_core::{Account, AccountSet, RequestPayload, ResolveOutcome};

    use crate::usecases::auth_request::AuthRequestContext;

    struct FakeTeardown(broadcast::Sender<TeardownSignal>);

    impl TeardownPort for FakeTeardown {
        fn subscribe(&self) -> broadcast::Receiver<TeardownSignal> {
            self.0.subscribe()
        }
    }

    #[derive(Default)]
    struct Recorder {
        responses: AtomicUsize,
        cancellations: AtomicUsize,
        closes: AtomicUsize,
    }

    #[async_trait]
    impl AuthResponsePort for Recorder {
        async fn send_auth_response(
            &self,
            _origin: Option<&Url>,
            _request: &RequestPayload,
            _account: &Account,
        ) -> anyhow::Result<()> {
            self.responses.fetch_add(1, Ordering::SeqCst);
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

    impl WindowPort for Recorder {
        fn close(&self) {
            self.closes.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn setup() -> (FakeTeardown, Arc<AuthRequestResolver>, Arc<Recorder>) {
        let context = AuthRequestContext::new(
            Some(Url::parse("https://app.example").unwrap()),
            Some(RequestPayload {
                domain_name: "https://app.example".to_string(),
                manifest_uri: None,
                redirect_uri: None,
                scopes: Vec::new(),
                app_details: None,
            }),
        );
        context.set_accounts(AccountSet::new(vec![Account {
            index: 0,
            address: "SP0".to_string(),
        }]));
        let recorder = Arc::new(Recorder::default());
        let resolver = Arc::new(AuthRequestResolver::new(
            context.arc(),
            recorder.clone(),
            recorder.clone(),
            &ResolverConfig::default(),
        ));
        let (tx, _) = broadcast::channel(8);
        (FakeTeardown(tx), resolver, recorder)
    }

    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn window_unload_cancels_pending_request() {
        let (teardown, resolver, recorder) = setup();
        let guard = TabLifecycleGuard::register(&teardown, resolver.clone(), recorder.clone());

        teardown.0.send(TeardownSignal::WindowUnload).unwrap();
        settle().await;

        assert!(resolver.context().is_resolved());
        assert_eq!(recorder.cancellations.load(Ordering::SeqCst), 1);
        assert!(!guard.is_registered());
    }

    #[tokio::test]
    async fn unload_after_completion_sends_nothing() {
        let (teardown, resolver, recorder) = setup();
        let _guard = TabLifecycleGuard::register(&teardown, resolver.clone(), recorder.clone());

        assert_eq!(
            resolver.complete(0).await.unwrap(),
            ResolveOutcome::Completed { account_index: 0 }
        );
        teardown.0.send(TeardownSignal::WindowUnload).unwrap();
        settle().await;

        assert_eq!(recorder.responses.load(Ordering::SeqCst), 1);
        assert_eq!(recorder.cancellations.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unmounted_guard_ignores_teardown() {
        let (teardown, resolver, recorder) = setup();
        let guard = TabLifecycleGuard::register(&teardown, resolver.clone(), recorder.clone());
        guard.unmount();
        guard.unmount();
        settle().await;

        let _ = teardown.0.send(TeardownSignal::WindowUnload);
        settle().await;

        assert!(!guard.is_registered());
        assert!(!resolver.context().is_resolved());
    }

    #[tokio::test]
    async fn origin_tab_close_closes_window_and_keeps_listening() {
        let (teardown, resolver, recorder) = setup();
        let guard = TabLifecycleGuard::register(&teardown, resolver.clone(), recorder.clone());

        teardown.0.send(TeardownSignal::OriginTabClosed).unwrap();
        settle().await;

        assert_eq!(recorder.closes.load(Ordering::SeqCst), 1);
        assert!(!resolver.context().is_resolved());
        assert!(guard.is_registered());
    }

    #[tokio::test]
    async fn dropping_guard_removes_listener() {
        let (teardown, resolver, recorder) = setup();
        drop(TabLifecycleGuard::register(
            &teardown,
            resolver.clone(),
            recorder.clone(),
        ));
        tokio::time::sleep(Duration::from_millis(1)).await;

        let _ = teardown.0.send(TeardownSignal::WindowUnload);
        settle().await;

        assert_eq!(recorder.cancellations.load(Ordering::SeqCst), 0);
    }
}
