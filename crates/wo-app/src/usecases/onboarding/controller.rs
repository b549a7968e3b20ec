//! Onboarding flow controller.
//!
//! Drives the set-password / choose-account state machine and executes its
//! side effects against the ports.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use tokio::task::JoinHandle;
use tracing::{debug, error, info, info_span, warn, Instrument};

use wo_core::onboarding::{ResolutionView, ValidationError};
use wo_core::ports::{
    AccountsPort, AnalyticsPort, KeyActionsPort, KeyDerivationError, NavigationPort,
    OnboardingEventPort, WalletStatePort,
};
use wo_core::{
    AccountSet, AppDetails, OnboardingAction, OnboardingEvent, OnboardingState,
    OnboardingStateMachine, PasswordPolicy, SecretString,
};

use super::context::FlowContext;
use crate::usecases::auth_request::{AuthRequestContext, AuthRequestResolver, ResolveError};

/// Failures that escape a dispatch. Validation and key derivation errors
/// are not here; they are part of the returned state.
#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    #[error("resolve auth request failed: {0}")]
    Resolve(#[from] ResolveError),
}

/// Values of the set-password form at submit time.
pub struct PasswordForm {
    pub password: SecretString,
    pub confirm_password: SecretString,
}

impl PasswordForm {
    pub fn new(password: impl Into<String>, confirm_password: impl Into<String>) -> Self {
        Self {
            password: SecretString::new(password),
            confirm_password: SecretString::new(confirm_password),
        }
    }
}

/// Ports and shared request state the controller runs against.
pub struct OnboardingFlowDeps {
    pub request: Arc<AuthRequestContext>,
    pub resolver: Arc<AuthRequestResolver>,
    pub policy: Arc<PasswordPolicy>,
    pub key_actions: Arc<dyn KeyActionsPort>,
    pub accounts: Arc<dyn AccountsPort>,
    pub wallet_state: Arc<dyn WalletStatePort>,
    pub analytics: Arc<dyn AnalyticsPort>,
    pub navigation: Arc<dyn NavigationPort>,
    pub events: Arc<dyn OnboardingEventPort>,
}

/// Set-password / choose-account flow for one popup session.
///
/// Dispatches are serialized; [`cancel`](Self::cancel) resolves the request
/// before queueing, so it is never held up by an in-flight submit.
pub struct OnboardingFlowController {
    context: Arc<FlowContext>,
    request: Arc<AuthRequestContext>,
    resolver: Arc<AuthRequestResolver>,
    policy: Arc<PasswordPolicy>,
    key_actions: Arc<dyn KeyActionsPort>,
    accounts: Arc<dyn AccountsPort>,
    wallet_state: Arc<dyn WalletStatePort>,
    analytics: Arc<dyn AnalyticsPort>,
    navigation: Arc<dyn NavigationPort>,
    resolution_watcher: Mutex<Option<JoinHandle<()>>>,
}

impl OnboardingFlowController {
    pub fn new(deps: OnboardingFlowDeps) -> Self {
        let OnboardingFlowDeps {
            request,
            resolver,
            policy,
            key_actions,
            accounts,
            wallet_state,
            analytics,
            navigation,
            events,
        } = deps;
        Self {
            context: FlowContext::new(OnboardingState::Idle, events).arc(),
            request,
            resolver,
            policy,
            key_actions,
            accounts,
            wallet_state,
            analytics,
            navigation,
            resolution_watcher: Mutex::new(None),
        }
    }

    /// Set-password page mounted. Redirects home when a wallet already exists.
    ///
    /// ## Behavior
    /// - With a pending request, starts watching its resolved flag so a
    ///   resolution from outside the flow (tab teardown) is published as
    ///   `Cancelled` without waiting for the next call.
    /// - Must be called from within a tokio runtime.
    pub async fn mount(&self) -> Result<OnboardingState, FlowError> {
        self.watch_resolution();
        let wallet_exists = self.wallet_state.has_secret_key().await;
        self.dispatch(OnboardingEvent::Mount { wallet_exists }, None)
            .await
    }

    /// Submit the form. Strength is recomputed from the submitted value,
    /// never taken from the debounced evaluator.
    pub async fn submit(&self, form: PasswordForm) -> Result<OnboardingState, FlowError> {
        let validation = self.validate(&form);
        let password = validation.is_ok().then_some(form.password);
        self.dispatch(OnboardingEvent::SubmitPassword { validation }, password)
            .await
    }

    /// Pick an account on the chooser page.
    ///
    /// ## Behavior
    /// - Only meaningful while the chooser is shown; an index outside the
    ///   account set leaves the chooser as it is.
    /// - Completes the pending request for that account, at most once.
    pub async fn select_account(&self, index: usize) -> Result<OnboardingState, FlowError> {
        self.dispatch(OnboardingEvent::SelectAccount { index }, None)
            .await
    }

    /// Explicit user cancellation, from any state.
    ///
    /// ## Behavior
    /// - The pending request is cancelled first, without waiting for the
    ///   dispatch lock. A submit that is still deriving the key then aborts
    ///   at its next step instead of approving the request.
    /// - Idempotent; after completion it is a no-op returning `Completed`.
    pub async fn cancel(&self) -> Result<OnboardingState, FlowError> {
        let outcome = self.resolver.cancel().await;
        debug!(?outcome, "explicit cancel resolved");
        self.dispatch(OnboardingEvent::Cancel, None).await
    }

    /// Header close / history back on the set-password page.
    pub async fn back(&self) -> Result<OnboardingState, FlowError> {
        self.dispatch(OnboardingEvent::Back, None).await
    }

    /// Current state, reconciled with resolutions made outside the flow.
    pub async fn get_state(&self) -> OnboardingState {
        let _dispatch_guard = self.context.acquire_dispatch_lock().await;
        self.context.reconcile(&self.request).await
    }

    /// Busy flag of the submit button.
    ///
    /// Reads without the dispatch lock, so it sees `DerivingKey` while a
    /// submit is in flight. A request resolved elsewhere is never busy.
    pub async fn is_loading(&self) -> bool {
        let state = self.context.get_state().await;
        if self.resolved_elsewhere(&state) {
            return false;
        }
        matches!(
            state,
            OnboardingState::DerivingKey
                | OnboardingState::ResolvingAccount {
                    view: ResolutionView::Resolving
                }
        )
    }

    /// Requester shown in the chooser header.
    pub fn app_details(&self) -> Option<AppDetails> {
        self.request.app_details()
    }

    /// Accounts offered for the pending request, once loaded.
    pub fn accounts(&self) -> Option<&AccountSet> {
        self.request.accounts()
    }

    fn watch_resolution(&self) {
        let mut watcher = match self.resolution_watcher.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if watcher.is_some() || !self.request.has_pending_request() {
            return;
        }

        let mut resolved = self.request.subscribe_resolved();
        let context = self.context.clone();
        let request = self.request.clone();
        let span = info_span!("usecase.onboarding_flow.resolution_watch");
        *watcher = Some(tokio::spawn(
            async move {
                // drop the watch borrow before waiting on the dispatch lock
                let flipped = resolved.wait_for(|flag| *flag).await.map(|_| ());
                if flipped.is_err() {
                    return;
                }
                let _dispatch_guard = context.acquire_dispatch_lock().await;
                context.reconcile(&request).await;
            }
            .instrument(span),
        ));
    }

    fn validate(&self, form: &PasswordForm) -> Result<(), ValidationError> {
        if form.password.is_blank() {
            return Err(ValidationError::Empty);
        }
        if !form.confirm_password.is_blank() && !form.password.matches(&form.confirm_password) {
            return Err(ValidationError::Mismatch);
        }
        let result = self.policy.evaluate(Some(form.password.expose()));
        if !result.meets_all_strength_requirements {
            return Err(ValidationError::Weak {
                reasons: result.reasons,
            });
        }
        Ok(())
    }

    fn resolved_elsewhere(&self, state: &OnboardingState) -> bool {
        !state.is_terminal() && self.request.is_resolved()
    }

    async fn dispatch(
        &self,
        event: OnboardingEvent,
        password: Option<SecretString>,
    ) -> Result<OnboardingState, FlowError> {
        let _dispatch_guard = self.context.acquire_dispatch_lock().await;

        let span = info_span!("usecase.onboarding_flow.dispatch", event = ?event);
        async {
            let mut password = password;
            let mut current = self.context.get_state().await;
            let mut pending_events = VecDeque::new();
            if self.resolved_elsewhere(&current) {
                pending_events.push_back(OnboardingEvent::ResolvedElsewhere);
            }
            pending_events.push_back(event);

            while let Some(event) = pending_events.pop_front() {
                let from = current.clone();
                let event_name = format!("{:?}", event);
                let (next, actions) = OnboardingStateMachine::transition(current, event);
                info!(from = ?from, to = ?next, event = %event_name, "onboarding state transition");
                if next != from {
                    self.context.publish(next.clone()).await;
                }
                current = next;
                let follow_up_events = self.execute_actions(actions, &mut password).await?;
                pending_events.extend(follow_up_events);
            }

            Ok(current)
        }
        .instrument(span)
        .await
    }

    async fn execute_actions(
        &self,
        actions: Vec<OnboardingAction>,
        password: &mut Option<SecretString>,
    ) -> Result<Vec<OnboardingEvent>, FlowError> {
        let mut follow_up_events = Vec::new();
        for action in actions {
            debug!(?action, "onboarding executing action");
            match action {
                OnboardingAction::TrackPage { action, path } => {
                    self.analytics.page(action, path);
                }
                OnboardingAction::Track { event } => {
                    self.analytics.track(event);
                }
                OnboardingAction::DeriveKey => {
                    if self.request.is_resolved() {
                        warn!("request resolved before key derivation, aborting");
                        follow_up_events.push(OnboardingEvent::ResolvedElsewhere);
                        break;
                    }
                    follow_up_events.push(self.derive_key(password.take()).await);
                }
                OnboardingAction::LoadAccounts => {
                    if self.request.is_resolved() {
                        warn!("request resolved before loading accounts, aborting");
                        follow_up_events.push(OnboardingEvent::ResolvedElsewhere);
                        break;
                    }
                    follow_up_events.push(self.load_accounts().await);
                }
                OnboardingAction::Navigate { route } => {
                    if self.request.is_resolved() {
                        warn!(?route, "request resolved before navigation, aborting");
                        follow_up_events.push(OnboardingEvent::ResolvedElsewhere);
                        break;
                    }
                    self.navigation.navigate_to(route);
                }
                OnboardingAction::CompleteRequest { account_index } => {
                    let outcome = self.resolver.complete(account_index).await?;
                    follow_up_events.push(OnboardingEvent::Resolved { outcome });
                }
                OnboardingAction::CancelRequest => {
                    let outcome = self.resolver.cancel().await;
                    debug!(?outcome, "onboarding cancel resolved");
                }
            }
        }

        Ok(follow_up_events)
    }

    async fn derive_key(&self, password: Option<SecretString>) -> OnboardingEvent {
        let Some(password) = password else {
            error!("key derivation requested without a submitted password");
            return OnboardingEvent::KeyDerivationFailed {
                error: KeyDerivationError::InvalidInput("no password submitted".to_string()),
            };
        };
        match self.key_actions.set_password(&password).await {
            Ok(()) => OnboardingEvent::KeyDerived,
            Err(error) => {
                error!(error = %error, "set password failed");
                OnboardingEvent::KeyDerivationFailed { error }
            }
        }
    }

    async fn load_accounts(&self) -> OnboardingEvent {
        let accounts = self.accounts.get_accounts().await;
        let has_pending_request = self.request.has_pending_request();
        let account_count = if has_pending_request {
            self.request.set_accounts(AccountSet::new(accounts)).len()
        } else {
            accounts.len()
        };
        debug!(account_count, has_pending_request, "accounts loaded");
        OnboardingEvent::AccountsLoaded {
            account_count,
            has_pending_request,
        }
    }
}

impl Drop for OnboardingFlowController {
    fn drop(&mut self) {
        let watcher = match self.resolution_watcher.get_mut() {
            Ok(watcher) => watcher.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(watcher) = watcher {
            watcher.abort();
        }
    }
}
