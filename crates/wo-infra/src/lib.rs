//! Infrastructure adapters for the onboarding flow ports.

pub mod analytics;
pub mod auth_request;
pub mod messaging;
pub mod security;

pub use analytics::TracingAnalytics;
pub use auth_request::TokenAuthRequestDecoder;
pub use messaging::{
    BroadcastTeardownSource, ChannelNavigator, ChannelOriginMessenger, PopupWindow,
    WatchStateEvents,
};
pub use security::{KdfParams, KeyVault, VaultAccountsStore};
