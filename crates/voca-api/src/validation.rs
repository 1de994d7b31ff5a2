//! Field-level acceptance rules for registration and profile edits.
//!
//! Every rule returns `None` when the value passes, or a human-readable
//! rejection reason. Rules are strict allow-lists: nothing is sanitized.

use std::collections::HashSet;

use chrono::NaiveDate;
use voca_types::api::ValidationDetails;

pub const DEFAULT_EMAIL_DOMAINS: &[&str] = &["gmail.com", "yahoo.com", "outlook.com"];

const MIN_NAME_CHARS: usize = 3;
const MIN_USERNAME_CHARS: usize = 3;
const MIN_USERNAME_LETTERS: usize = 3;
const MIN_PASSWORD_CHARS: usize = 10;
const BIRTHDATE_FORMAT: &str = "%Y-%m-%d";

/// Email domains accepted at registration. Exact matches only, compared
/// case-insensitively.
#[derive(Debug, Clone)]
pub struct EmailDomains(HashSet<String>);

impl EmailDomains {
    pub fn new<I, S>(domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(
            domains
                .into_iter()
                .map(|d| d.as_ref().trim().to_ascii_lowercase())
                .filter(|d| !d.is_empty())
                .collect(),
        )
    }

    pub fn contains(&self, domain: &str) -> bool {
        self.0.contains(&domain.to_ascii_lowercase())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for EmailDomains {
    fn default() -> Self {
        Self::new(DEFAULT_EMAIL_DOMAINS)
    }
}

pub fn validate_name(name: &str) -> Option<&'static str> {
    if name.chars().count() < MIN_NAME_CHARS {
        return Some("Name must be at least 3 characters long.");
    }
    None
}

pub fn validate_username(username: &str) -> Option<&'static str> {
    if username.chars().count() < MIN_USERNAME_CHARS {
        return Some("Username must be at least 3 characters long.");
    }

    let letters = username.chars().filter(char::is_ascii_alphabetic).count();
    if letters < MIN_USERNAME_LETTERS {
        return Some("Username must contain at least 3 letters.");
    }

    None
}

pub fn validate_email(email: &str, domains: &EmailDomains) -> Option<&'static str> {
    if !email.contains('@') || !email.contains('.') {
        return Some("Email must contain '@' and a dot.");
    }

    let domain = email.split('@').nth(1).unwrap_or_default();
    if !domains.contains(domain) {
        return Some("Email domain is not valid.");
    }

    None
}

pub fn validate_password(password: &str) -> Option<&'static str> {
    if password.chars().count() < MIN_PASSWORD_CHARS {
        return Some("Password must be at least 10 characters long.");
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Some("Password must include at least one number.");
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Some("Password must include at least one uppercase letter.");
    }
    if !password.contains(|c: char| c == '!' || c == '?') {
        return Some("Password must include either '!' or '?'.");
    }
    None
}

pub fn validate_birthdate(birthdate: &str) -> Option<&'static str> {
    match NaiveDate::parse_from_str(birthdate, BIRTHDATE_FORMAT) {
        Ok(_) => None,
        Err(_) => Some("Birthdate must be a valid date in YYYY-MM-DD format."),
    }
}

/// Outcome of validating the profile fields at once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileReport {
    pub name: Option<&'static str>,
    pub username: Option<&'static str>,
    pub email: Option<&'static str>,
    pub password: Option<&'static str>,
    pub birthdate: Option<&'static str>,
}

impl ProfileReport {
    /// Validate every field, regardless of earlier failures. A `None`
    /// password means "unchanged" and passes.
    pub fn check(
        name: &str,
        username: &str,
        email: &str,
        password: Option<&str>,
        domains: &EmailDomains,
    ) -> Self {
        Self {
            name: validate_name(name),
            username: validate_username(username),
            email: validate_email(email, domains),
            password: password.and_then(validate_password),
            birthdate: None,
        }
    }

    /// Registration also carries a birthdate; `None` means it was omitted.
    pub fn with_birthdate(mut self, birthdate: Option<&str>) -> Self {
        self.birthdate = birthdate.and_then(validate_birthdate);
        self
    }

    pub fn is_valid(&self) -> bool {
        self.name.is_none()
            && self.username.is_none()
            && self.email.is_none()
            && self.password.is_none()
            && self.birthdate.is_none()
    }

    pub fn into_details(self) -> ValidationDetails {
        ValidationDetails {
            name: self.name.map(str::to_string),
            username: self.username.map(str::to_string),
            email: self.email.map(str::to_string),
            password: self.password.map(str::to_string),
            birthdate: self.birthdate.map(str::to_string),
        }
    }
}
