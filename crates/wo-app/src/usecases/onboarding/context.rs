use std::sync::Arc;

use tokio::sync::{Mutex, MutexGuard};
use tracing::info;

use wo_core::ports::OnboardingEventPort;
use wo_core::{OnboardingEvent, OnboardingState, OnboardingStateMachine};

use crate::usecases::auth_request::AuthRequestContext;

/// Onboarding state, the dispatch lock and the port the state is published
/// on.
///
/// Every state write goes through [`publish`](Self::publish), so observers
/// of the event port never miss a transition, including the ones caused by
/// the request being resolved outside the flow.
///
/// ## Lock Ordering
/// When acquiring both locks, acquire `dispatch_lock` first, then `state`.
/// - `dispatch_lock`: held for a whole dispatch (transition, emit, actions).
/// - `state`: short reads (`get_state`) and writes during dispatch.
pub struct FlowContext {
    state: Mutex<OnboardingState>,
    dispatch_lock: Mutex<()>,
    events: Arc<dyn OnboardingEventPort>,
}

impl FlowContext {
    pub fn new(initial_state: OnboardingState, events: Arc<dyn OnboardingEventPort>) -> Self {
        Self {
            state: Mutex::new(initial_state),
            dispatch_lock: Mutex::new(()),
            events,
        }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Does NOT acquire `dispatch_lock`; observes intermediate states of an
    /// in-flight dispatch.
    pub async fn get_state(&self) -> OnboardingState {
        self.state.lock().await.clone()
    }

    pub async fn acquire_dispatch_lock(&self) -> MutexGuard<'_, ()> {
        self.dispatch_lock.lock().await
    }

    /// Store `state` and emit it. Only call while holding `dispatch_lock`.
    pub async fn publish(&self, state: OnboardingState) {
        *self.state.lock().await = state.clone();
        self.events.emit_state_changed(state).await;
    }

    /// Move a live flow to its terminal state when `request` was resolved
    /// by someone else (tab teardown, an explicit cancel racing a submit).
    /// Terminal flows and unresolved requests are left alone.
    ///
    /// Only call while holding `dispatch_lock`.
    pub async fn reconcile(&self, request: &AuthRequestContext) -> OnboardingState {
        let current = self.get_state().await;
        if current.is_terminal() || !request.is_resolved() {
            return current;
        }
        let (next, _) =
            OnboardingStateMachine::transition(current, OnboardingEvent::ResolvedElsewhere);
        info!(to = ?next, "onboarding request resolved outside the flow");
        self.publish(next.clone()).await;
        next
    }
}
