mod context;
mod controller;

pub use context::FlowContext;
pub use controller::{FlowError, OnboardingFlowController, OnboardingFlowDeps, PasswordForm};
