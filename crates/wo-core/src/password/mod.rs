//! Password strength policy.
//!
//! The policy is a pure, synchronous check. Live (debounced) evaluation and
//! analytics live in the application layer; submit-time gating calls
//! [`PasswordPolicy::evaluate`] directly on the current field value.

mod policy;

pub use policy::{
    PasswordPolicy, PasswordStrength, PasswordStrengthResult, PolicyViolation,
    DEFAULT_MIN_CHARACTER_CLASSES, DEFAULT_MIN_LENGTH, DEFAULT_WEAK_PASSWORDS,
};
