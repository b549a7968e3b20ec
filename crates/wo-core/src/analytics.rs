//! Analytics event names emitted by the onboarding flow.

pub const SUBMIT_VALID_PASSWORD: &str = "submit_valid_password";
pub const SUBMIT_INVALID_PASSWORD: &str = "submit_invalid_password";
pub const VALID_PASSWORD_ENTERED: &str = "valid_password_entered";

pub const PAGE_VIEW: &str = "view";
