//! Debounced password strength feedback.

mod evaluator;

pub use evaluator::PasswordStrengthEvaluator;
