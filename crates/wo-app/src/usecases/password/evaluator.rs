use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::AbortHandle;
use tokio::time::sleep;
use tracing::debug;

use wo_core::analytics;
use wo_core::config::EvaluatorConfig;
use wo_core::ports::AnalyticsPort;
use wo_core::{PasswordPolicy, PasswordStrengthResult, SecretString};

/// Live password strength feedback.
///
/// Every keystroke calls [`schedule`](Self::schedule); the policy runs once
/// input has been quiet for the debounce window. Only the newest scheduled
/// candidate may publish a result.
///
/// Submit gating must not read [`latest`](Self::latest): a submit can land
/// before the debounce fires. Use [`check`](Self::check) on the current
/// field value instead.
pub struct PasswordStrengthEvaluator {
    policy: Arc<PasswordPolicy>,
    analytics: Arc<dyn AnalyticsPort>,
    debounce: Duration,
    generation: Arc<AtomicU64>,
    pending: Mutex<Option<AbortHandle>>,
    result: Arc<watch::Sender<PasswordStrengthResult>>,
}

impl PasswordStrengthEvaluator {
    pub fn new(
        policy: Arc<PasswordPolicy>,
        analytics: Arc<dyn AnalyticsPort>,
        debounce: Duration,
    ) -> Self {
        let (result, _) = watch::channel(PasswordStrengthResult::blank());
        Self {
            policy,
            analytics,
            debounce,
            generation: Arc::new(AtomicU64::new(0)),
            pending: Mutex::new(None),
            result: Arc::new(result),
        }
    }

    pub fn from_config(
        policy: Arc<PasswordPolicy>,
        analytics: Arc<dyn AnalyticsPort>,
        config: &EvaluatorConfig,
    ) -> Self {
        Self::new(policy, analytics, Duration::from_millis(config.debounce_ms))
    }

    /// Synchronous policy check, no debounce and no analytics.
    pub fn check(&self, candidate: Option<&str>) -> PasswordStrengthResult {
        self.policy.evaluate(candidate)
    }

    /// Schedule a debounced evaluation, superseding any pending one.
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule(&self, candidate: Option<SecretString>) {
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;

        let latest_generation = Arc::clone(&self.generation);
        let policy = Arc::clone(&self.policy);
        let analytics = Arc::clone(&self.analytics);
        let result = Arc::clone(&self.result);
        let debounce = self.debounce;

        let handle = tokio::spawn(async move {
            sleep(debounce).await;
            if latest_generation.load(Ordering::Acquire) != generation {
                return;
            }

            let evaluated = policy.evaluate(candidate.as_deref());
            if !evaluated.is_blank() {
                analytics.track(if evaluated.meets_all_strength_requirements {
                    analytics::VALID_PASSWORD_ENTERED
                } else {
                    analytics::SUBMIT_INVALID_PASSWORD
                });
            }
            debug!(
                generation,
                meets_all_strength_requirements = evaluated.meets_all_strength_requirements,
                strength = ?evaluated.strength,
                "password strength evaluated"
            );
            result.send_replace(evaluated);
        });

        let mut pending = match self.pending.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(previous) = pending.replace(handle.abort_handle()) {
            previous.abort();
        }
    }

    /// Most recently published result (blank until the first evaluation).
    pub fn latest(&self) -> PasswordStrengthResult {
        self.result.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<PasswordStrengthResult> {
        self.result.subscribe()
    }
}

impl Drop for PasswordStrengthEvaluator {
    fn drop(&mut self) {
        let pending = match self.pending.get_mut() {
            Ok(pending) => pending.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(handle) = pending {
            handle.abort();
        }
    }
}
