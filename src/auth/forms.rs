use regex::Regex;
use secrecy::{ExposeSecret, SecretString};
use std::sync::OnceLock;

/// Email and password as typed by the user. The password is never logged.
#[derive(Clone, Debug)]
pub struct CredentialForm {
    pub email: String,
    pub password: SecretString,
}

impl CredentialForm {
    #[must_use]
    pub fn new(email: impl Into<String>, password: SecretString) -> Self {
        Self {
            email: email.into(),
            password,
        }
    }

    /// Empties both fields, e.g. after a failed registration.
    pub fn clear(&mut self) {
        self.email.clear();
        self.password = SecretString::default();
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.email.is_empty() && self.password.expose_secret().is_empty()
    }

    /// Checks the fields before anything is sent to the provider.
    ///
    /// # Errors
    /// Returns the message to show when a field is missing or malformed.
    pub fn validate(&self) -> Result<(), String> {
        if self.email.trim().is_empty() || self.password.expose_secret().trim().is_empty() {
            return Err("Email and password are required.".to_string());
        }
        if !valid_email(self.email.trim()) {
            return Err("The email address is badly formatted.".to_string());
        }
        Ok(())
    }
}

#[must_use]
pub fn valid_email(email: &str) -> bool {
    static EMAIL: OnceLock<Option<Regex>> = OnceLock::new();
    EMAIL
        .get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").ok())
        .as_ref()
        .is_some_and(|re| re.is_match(email))
}
