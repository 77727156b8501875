//! Password complexity policy applied on creation and reset.

use account_shared::constants::{MAX_PASSWORD_LENGTH, MIN_PASSWORD_LENGTH};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PolicyError {
    #[error("Password must be at least {0} characters long")]
    TooShort(usize),
    #[error("Password must be at most {0} characters long")]
    TooLong(usize),
    #[error("Password must contain at least one uppercase letter")]
    MissingUppercase,
    #[error("Password must contain at least one lowercase letter")]
    MissingLowercase,
    #[error("Password must contain at least one digit")]
    MissingDigit,
    #[error("Password must contain at least one special character")]
    MissingSpecial,
    #[error("Password must not contain whitespace")]
    ContainsWhitespace,
    #[error("Password is too weak (score {score}, need {required})")]
    TooWeak { score: u8, required: u8 },
}

#[derive(Debug, Clone)]
pub struct PasswordPolicy {
    min_length: usize,
    max_length: usize,
    min_strength: Option<u8>,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            min_length: MIN_PASSWORD_LENGTH,
            max_length: MAX_PASSWORD_LENGTH,
            min_strength: None,
        }
    }
}

impl PasswordPolicy {
    /// Adds a zxcvbn score floor (clamped to 4) on top of the character rules.
    pub fn with_min_strength(mut self, min_strength: Option<u8>) -> Self {
        self.min_strength = min_strength.map(|s| s.min(4));
        self
    }

    /// Returns the first violated rule.
    pub fn validate(&self, password: &str) -> Result<(), PolicyError> {
        let length = password.chars().count();
        if length < self.min_length {
            return Err(PolicyError::TooShort(self.min_length));
        }
        if length > self.max_length {
            return Err(PolicyError::TooLong(self.max_length));
        }
        if password.chars().any(char::is_whitespace) {
            return Err(PolicyError::ContainsWhitespace);
        }
        if !password.chars().any(|c| c.is_uppercase()) {
            return Err(PolicyError::MissingUppercase);
        }
        if !password.chars().any(|c| c.is_lowercase()) {
            return Err(PolicyError::MissingLowercase);
        }
        if !password.chars().any(|c| c.is_ascii_digit()) {
            return Err(PolicyError::MissingDigit);
        }
        if !password.chars().any(|c| !c.is_alphanumeric()) {
            return Err(PolicyError::MissingSpecial);
        }

        if let Some(required) = self.min_strength {
            let score = zxcvbn::zxcvbn(password, &[]).score() as u8;
            if score < required {
                return Err(PolicyError::TooWeak { score, required });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_strong_passwords() {
        let policy = PasswordPolicy::default();
        for password in ["Str0ng!Pass", "ValidPassword123!", "MySuperPassword$1234", "NewPassword123!"] {
            assert_eq!(policy.validate(password), Ok(()), "{password}");
        }
    }

    #[test]
    fn test_rejects_each_rule() {
        let policy = PasswordPolicy::default();
        assert_eq!(policy.validate("short"), Err(PolicyError::TooShort(MIN_PASSWORD_LENGTH)));
        assert_eq!(policy.validate(&"Aa1!".repeat(40)), Err(PolicyError::TooLong(MAX_PASSWORD_LENGTH)));
        assert_eq!(policy.validate("Has Space1!"), Err(PolicyError::ContainsWhitespace));
        assert_eq!(policy.validate("lowercase1!"), Err(PolicyError::MissingUppercase));
        assert_eq!(policy.validate("UPPERCASE1!"), Err(PolicyError::MissingLowercase));
        assert_eq!(policy.validate("NoDigits!!"), Err(PolicyError::MissingDigit));
        assert_eq!(policy.validate("NoSpecial123"), Err(PolicyError::MissingSpecial));
    }

    #[test]
    fn test_strength_floor() {
        let policy = PasswordPolicy::default().with_min_strength(Some(4));
        assert!(matches!(
            policy.validate("Password1!"),
            Err(PolicyError::TooWeak { required: 4, .. })
        ));
    }
}
