// ============================================================================
// Account Core - Input Validation
// File: crates/account-core/src/validation.rs
// ============================================================================
//! Explicit validators run before any record is built or mutated.
//!
//! Failures are collected per field into [`ValidationErrors`] so callers can
//! report every problem at once.

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::Regex;
use validator::{ValidateEmail, ValidateUrl, ValidationError, ValidationErrors};

use account_security::PasswordPolicy;
use account_shared::constants::{MAX_NICKNAME_LENGTH, MIN_NICKNAME_LENGTH};

use crate::domain::{NewUser, UserUpdate};

const MAX_EMAIL_LENGTH: usize = 254;
const MAX_NAME_LENGTH: usize = 100;
const MAX_BIO_LENGTH: usize = 500;
const MAX_URL_LENGTH: usize = 2048;

/// Conservative address shape: no whitespace, at least one dot in the domain.
static EMAIL_ADDRESS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9_.+-]+@[a-zA-Z0-9-]+\.[a-zA-Z0-9-.]+$").expect("valid email regex")
});

static NICKNAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("valid nickname regex"));

/// Shared by registration and the notification gateway, so an address that
/// passes registration can always be mailed.
pub fn is_valid_email_address(address: &str) -> bool {
    EMAIL_ADDRESS.is_match(address)
}

fn failure(code: &'static str, message: impl Into<Cow<'static, str>>) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(message.into());
    error
}

pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if email.len() > MAX_EMAIL_LENGTH || !email.validate_email() || !is_valid_email_address(email) {
        return Err(failure("email", "value is not a valid email address"));
    }
    Ok(())
}

pub fn validate_nickname(nickname: &str) -> Result<(), ValidationError> {
    let length = nickname.chars().count();
    if !(MIN_NICKNAME_LENGTH..=MAX_NICKNAME_LENGTH).contains(&length) {
        return Err(failure(
            "length",
            format!(
                "nickname must be between {} and {} characters",
                MIN_NICKNAME_LENGTH, MAX_NICKNAME_LENGTH
            ),
        ));
    }
    if !NICKNAME.is_match(nickname) {
        return Err(failure(
            "nickname",
            "nickname may only contain letters, digits, hyphens and underscores",
        ));
    }
    Ok(())
}

/// Absolute http(s) URLs only.
pub fn validate_profile_url(url: &str) -> Result<(), ValidationError> {
    let scheme_ok = url.starts_with("http://") || url.starts_with("https://");
    if url.len() > MAX_URL_LENGTH || !scheme_ok || !url.validate_url() {
        return Err(failure("url", "URL must be a valid http or https address"));
    }
    Ok(())
}

fn validate_length(value: &str, max: usize) -> Result<(), ValidationError> {
    if value.chars().count() > max {
        return Err(failure("length", format!("must be at most {} characters", max)));
    }
    Ok(())
}

fn check(
    errors: &mut ValidationErrors,
    field: &'static str,
    result: Result<(), ValidationError>,
) {
    if let Err(error) = result {
        errors.add(field, error);
    }
}

fn check_profile(
    errors: &mut ValidationErrors,
    first_name: Option<&str>,
    last_name: Option<&str>,
    bio: Option<&str>,
    urls: [(&'static str, Option<&str>); 3],
) {
    if let Some(v) = first_name {
        check(errors, "first_name", validate_length(v, MAX_NAME_LENGTH));
    }
    if let Some(v) = last_name {
        check(errors, "last_name", validate_length(v, MAX_NAME_LENGTH));
    }
    if let Some(v) = bio {
        check(errors, "bio", validate_length(v, MAX_BIO_LENGTH));
    }
    for (field, url) in urls {
        if let Some(url) = url {
            check(errors, field, validate_profile_url(url));
        }
    }
}

pub fn validate_new_user(input: &NewUser, policy: &PasswordPolicy) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();

    check(&mut errors, "email", validate_email(&input.email));
    if let Some(nickname) = &input.nickname {
        check(&mut errors, "nickname", validate_nickname(nickname));
    }
    if let Err(e) = policy.validate(&input.password) {
        errors.add("password", failure("password", e.to_string()));
    }
    check_profile(
        &mut errors,
        input.first_name.as_deref(),
        input.last_name.as_deref(),
        input.bio.as_deref(),
        [
            ("profile_picture_url", input.profile_picture_url.as_deref()),
            ("linkedin_profile_url", input.linkedin_profile_url.as_deref()),
            ("github_profile_url", input.github_profile_url.as_deref()),
        ],
    );

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// An update must change at least one field, and every supplied field must
/// be valid on its own.
pub fn validate_update(changes: &UserUpdate) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();

    if changes.is_empty() {
        errors.add("__all__", failure("empty", "at least one field must be provided"));
        return Err(errors);
    }

    if let Some(email) = &changes.email {
        check(&mut errors, "email", validate_email(email));
    }
    if let Some(nickname) = &changes.nickname {
        check(&mut errors, "nickname", validate_nickname(nickname));
    }
    check_profile(
        &mut errors,
        changes.first_name.as_deref(),
        changes.last_name.as_deref(),
        changes.bio.as_deref(),
        [
            ("profile_picture_url", changes.profile_picture_url.as_deref()),
            ("linkedin_profile_url", changes.linkedin_profile_url.as_deref()),
            ("github_profile_url", changes.github_profile_url.as_deref()),
        ],
    );

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
