use std::collections::{BTreeSet, HashSet};

use serde::Serialize;

use crate::config::PasswordPolicyConfig;

pub const DEFAULT_MIN_LENGTH: usize = 8;
pub const DEFAULT_MIN_CHARACTER_CLASSES: usize = 3;

/// Passwords rejected regardless of length or diversity. Compared lowercased.
pub const DEFAULT_WEAK_PASSWORDS: &[&str] = &[
    "password",
    "password1",
    "password12",
    "password123",
    "password!",
    "passw0rd",
    "passw0rd!",
    "p@ssw0rd",
    "p@ssword1",
    "12345678",
    "123456789",
    "1234567890",
    "11111111",
    "00000000",
    "qwerty123",
    "qwertyuiop",
    "qwerty12",
    "1qaz2wsx",
    "abc12345",
    "abcd1234",
    "admin123",
    "iloveyou",
    "iloveyou1",
    "letmein1",
    "welcome1",
    "welcome123",
    "sunshine1",
    "football1",
    "monkey123",
    "trustno1",
];

/// A single unmet policy predicate.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum PolicyViolation {
    TooShort { min_length: usize },
    NotEnoughCharacterClasses { required: usize, found: usize },
    CommonPassword,
}

/// Coarse grade for the live strength meter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum PasswordStrength {
    Poor,
    Weak,
    Average,
    Strong,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PasswordStrengthResult {
    pub meets_all_strength_requirements: bool,
    pub reasons: BTreeSet<PolicyViolation>,
    pub strength: PasswordStrength,
}

impl PasswordStrengthResult {
    /// Result while the field is untouched or being typed into.
    ///
    /// Not a validation failure: no violations are reported.
    pub fn blank() -> Self {
        Self {
            meets_all_strength_requirements: false,
            reasons: BTreeSet::new(),
            strength: PasswordStrength::Poor,
        }
    }

    pub fn is_blank(&self) -> bool {
        !self.meets_all_strength_requirements && self.reasons.is_empty()
    }
}

impl Default for PasswordStrengthResult {
    fn default() -> Self {
        Self::blank()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordPolicy {
    min_length: usize,
    min_character_classes: usize,
    weak_passwords: HashSet<String>,
}

impl PasswordPolicy {
    pub fn new(
        min_length: usize,
        min_character_classes: usize,
        weak_passwords: impl IntoIterator<Item = impl AsRef<str>>,
    ) -> Self {
        Self {
            min_length,
            // four classes exist: lower, upper, digit, symbol
            min_character_classes: min_character_classes.min(4),
            weak_passwords: weak_passwords
                .into_iter()
                .map(|p| p.as_ref().to_lowercase())
                .collect(),
        }
    }

    pub fn from_config(config: &PasswordPolicyConfig) -> Self {
        Self::new(
            config.min_length,
            config.min_character_classes,
            &config.weak_passwords,
        )
    }

    pub fn min_length(&self) -> usize {
        self.min_length
    }

    /// Evaluate a candidate against every predicate.
    ///
    /// `None` and the empty string yield [`PasswordStrengthResult::blank`].
    pub fn evaluate(&self, candidate: Option<&str>) -> PasswordStrengthResult {
        let candidate = match candidate {
            Some(value) if !value.is_empty() => value,
            _ => return PasswordStrengthResult::blank(),
        };

        let length = candidate.chars().count();
        let classes = character_classes(candidate);
        let common = self.weak_passwords.contains(&candidate.to_lowercase());

        let mut reasons = BTreeSet::new();
        if length < self.min_length {
            reasons.insert(PolicyViolation::TooShort {
                min_length: self.min_length,
            });
        }
        if classes < self.min_character_classes {
            reasons.insert(PolicyViolation::NotEnoughCharacterClasses {
                required: self.min_character_classes,
                found: classes,
            });
        }
        if common {
            reasons.insert(PolicyViolation::CommonPassword);
        }

        PasswordStrengthResult {
            meets_all_strength_requirements: reasons.is_empty(),
            strength: self.grade(length, classes, common),
            reasons,
        }
    }

    fn grade(&self, length: usize, classes: usize, common: bool) -> PasswordStrength {
        if common {
            return PasswordStrength::Poor;
        }
        if length < self.min_length {
            return if classes >= self.min_character_classes {
                PasswordStrength::Weak
            } else {
                PasswordStrength::Poor
            };
        }
        if classes < self.min_character_classes {
            return PasswordStrength::Weak;
        }
        if classes == 4 && length >= self.min_length.max(12) {
            PasswordStrength::Strong
        } else {
            PasswordStrength::Average
        }
    }
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self::new(
            DEFAULT_MIN_LENGTH,
            DEFAULT_MIN_CHARACTER_CLASSES,
            DEFAULT_WEAK_PASSWORDS,
        )
    }
}

fn character_classes(candidate: &str) -> usize {
    let mut lower = false;
    let mut upper = false;
    let mut digit = false;
    let mut symbol = false;
    for c in candidate.chars() {
        if c.is_lowercase() {
            lower = true;
        } else if c.is_uppercase() {
            upper = true;
        } else if c.is_numeric() {
            digit = true;
        } else {
            symbol = true;
        }
    }
    [lower, upper, digit, symbol].iter().filter(|b| **b).count()
}
