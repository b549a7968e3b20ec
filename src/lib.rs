//! Wallet onboarding
//!
//! Set-password and choose-account flow that answers an app's connect
//! request. The crates under `crates/` hold the domain (`wo-core`), the use
//! cases (`wo-app`) and the adapters (`wo-infra`); this crate wires them.

pub mod bootstrap;
