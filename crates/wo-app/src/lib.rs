//! Wallet onboarding application layer
//!
//! This crate contains the use cases that orchestrate the connect-request
//! lifecycle on top of the ports defined in `wo-core`.

pub mod usecases;
