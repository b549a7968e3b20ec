//! Port interfaces for the onboarding flow
//!
//! Ports define the contract between the flow (use cases in `wo-app`) and
//! the extension environment: key storage, accounts, messaging back to the
//! requesting origin, navigation and analytics. Infrastructure implements
//! them; tests replace them with fakes.

pub mod accounts;
pub mod analytics;
pub mod auth_request_decoder;
pub mod auth_response;
pub mod key_actions;
pub mod navigation;
pub mod onboarding_event;
pub mod teardown;
pub mod wallet_state;
pub mod window;

pub use accounts::AccountsPort;
pub use analytics::AnalyticsPort;
pub use auth_request_decoder::AuthRequestDecoderPort;
pub use auth_response::AuthResponsePort;
pub use key_actions::{KeyActionsPort, KeyDerivationError};
pub use navigation::NavigationPort;
pub use onboarding_event::OnboardingEventPort;
pub use teardown::{TeardownPort, TeardownSignal};
pub use wallet_state::WalletStatePort;
pub use window::WindowPort;
