//! Session wiring.
//!
//! Builds one onboarding session (controller, evaluator, resolver, tab
//! guard) from the infra adapters.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};

use wo_app::usecases::{
    AuthRequestContext, AuthRequestResolver, OnboardingFlowController, OnboardingFlowDeps,
    PasswordStrengthEvaluator, TabLifecycleGuard,
};
use wo_core::ports::AuthRequestDecoderPort;
use wo_core::{AppConfig, OnboardingState, PasswordPolicy, RouteUrl};
use wo_infra::{
    BroadcastTeardownSource, ChannelNavigator, ChannelOriginMessenger, KeyVault, PopupWindow,
    TracingAnalytics, VaultAccountsStore, WatchStateEvents,
};

/// A running onboarding session and the channels it reports through.
pub struct OnboardingSession {
    pub controller: OnboardingFlowController,
    pub evaluator: PasswordStrengthEvaluator,
    pub resolver: Arc<AuthRequestResolver>,
    pub teardown: Arc<BroadcastTeardownSource>,
    pub window: Arc<PopupWindow>,
    pub states: watch::Receiver<OnboardingState>,
    pub routes: mpsc::UnboundedReceiver<RouteUrl>,
    pub origin_messages: mpsc::UnboundedReceiver<String>,
    guard: Option<TabLifecycleGuard>,
}

impl OnboardingSession {
    pub fn is_guarded(&self) -> bool {
        self.guard
            .as_ref()
            .is_some_and(TabLifecycleGuard::is_registered)
    }
}

/// Must be called from within a tokio runtime.
pub fn build_session(
    config: &AppConfig,
    decoder: &dyn AuthRequestDecoderPort,
    vault: Arc<KeyVault>,
) -> OnboardingSession {
    let request = AuthRequestContext::from_decoder(decoder).arc();

    let teardown = Arc::new(BroadcastTeardownSource::new());
    let window = Arc::new(PopupWindow::new(teardown.clone()));
    let (origin_tx, origin_messages) = mpsc::unbounded_channel();
    let (route_tx, routes) = mpsc::unbounded_channel();
    let events = Arc::new(WatchStateEvents::new());
    let states = events.subscribe();
    let analytics = Arc::new(TracingAnalytics);
    let policy = Arc::new(PasswordPolicy::from_config(&config.password_policy));

    let resolver = Arc::new(AuthRequestResolver::new(
        request.clone(),
        Arc::new(ChannelOriginMessenger::new(origin_tx)),
        window.clone(),
        &config.resolver,
    ));

    let guard = request.has_pending_request().then(|| {
        TabLifecycleGuard::register(teardown.as_ref(), resolver.clone(), window.clone())
    });

    let controller = OnboardingFlowController::new(OnboardingFlowDeps {
        request,
        resolver: resolver.clone(),
        policy: policy.clone(),
        key_actions: vault.clone(),
        accounts: Arc::new(VaultAccountsStore::new(
            vault.clone(),
            config.wallet.account_count,
        )),
        wallet_state: vault,
        analytics: analytics.clone(),
        navigation: Arc::new(ChannelNavigator::new(route_tx)),
        events,
    });

    let evaluator = PasswordStrengthEvaluator::from_config(policy, analytics, &config.evaluator);

    OnboardingSession {
        controller,
        evaluator,
        resolver,
        teardown,
        window,
        states,
        routes,
        origin_messages,
        guard,
    }
}
