//! Onboarding domain module.
//!
//! This module defines the set-password / choose-account state machine.

pub mod state_machine;

pub use state_machine::{
    OnboardingAction, OnboardingError, OnboardingEvent, OnboardingState, OnboardingStateMachine,
    ResolutionView, ValidationError,
};
