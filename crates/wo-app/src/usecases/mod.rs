//! Use cases of the connect-request lifecycle.
//!
//! [AuthRequestDecoder]
//         ↓
// AuthRequestContext  ←──────────────┐
//         ↓                          │
// OnboardingFlowController ──→ AuthRequestResolver ←── TabLifecycleGuard
//         ↓
// PasswordStrengthEvaluator (live feedback only)

pub mod auth_request;
pub mod onboarding;
pub mod password;
pub mod tab_guard;

pub use auth_request::{AuthRequestContext, AuthRequestResolver, ResolveError};
pub use onboarding::{FlowError, OnboardingFlowController, OnboardingFlowDeps, PasswordForm};
pub use password::PasswordStrengthEvaluator;
pub use tab_guard::TabLifecycleGuard;
