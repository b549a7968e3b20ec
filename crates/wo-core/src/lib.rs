//! # wo-core
//!
//! Core domain models and business logic for the wallet onboarding flow.
//!
//! This crate contains the pure parts of the connect-request lifecycle:
//! password policy, the onboarding state machine, auth request models and
//! the ports implemented by infrastructure. It has no runtime dependencies
//! beyond channel types used in port signatures.

pub mod account;
pub mod analytics;
pub mod auth_request;
pub mod config;
pub mod error_page;
pub mod onboarding;
pub mod password;
pub mod ports;
pub mod routes;
pub mod security;

// Re-export commonly used types at the crate root
pub use account::{Account, AccountSet};
pub use auth_request::{AppDetails, RequestPayload, ResolveOutcome};
pub use config::AppConfig;
pub use onboarding::{OnboardingAction, OnboardingEvent, OnboardingState, OnboardingStateMachine};
pub use password::{PasswordPolicy, PasswordStrength, PasswordStrengthResult, PolicyViolation};
pub use routes::RouteUrl;
pub use security::SecretString;

pub use url;
