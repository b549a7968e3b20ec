use crate::onboarding::OnboardingState;

/// Publishes every onboarding state change to the page.
#[async_trait::async_trait]
pub trait OnboardingEventPort: Send + Sync {
    async fn emit_state_changed(&self, state: OnboardingState);
}
