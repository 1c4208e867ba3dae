//! User flows, one module per page of the onboarding journey.

pub mod account;
pub mod login;
pub mod onboarding;
pub mod register;
pub mod waitlist;

use anyhow::{Context, Result, bail};
use dialoguer::Password;
use std::io::IsTerminal;

/// Reject obviously malformed form input before any network call.
pub(crate) fn validate_email(email: &str) -> Result<()> {
    let trimmed = email.trim();
    if trimmed.is_empty() || !trimmed.contains('@') || trimmed.starts_with('@') {
        bail!("'{email}' is not a valid email address");
    }
    Ok(())
}

pub(crate) fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        bail!("name cannot be empty");
    }
    Ok(())
}

/// Hidden password prompt; refuses to prompt when stdin is not a terminal.
pub(crate) fn prompt_password(prompt: &str) -> Result<String> {
    if !std::io::stdin().is_terminal() {
        bail!("--password is required in non-interactive mode");
    }
    Password::new()
        .with_prompt(format!("{prompt} (input hidden)"))
        .allow_empty_password(false)
        .interact()
        .context("Failed to read password from terminal")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plausible_emails() {
        assert!(validate_email("ada@nexgenu.edu").is_ok());
        assert!(validate_email("  ada@nexgenu.edu  ").is_ok());
    }

    #[test]
    fn rejects_malformed_emails() {
        assert!(validate_email("").is_err());
        assert!(validate_email("ada").is_err());
        assert!(validate_email("@nexgenu.edu").is_err());
    }

    #[test]
    fn rejects_blank_names() {
        assert!(validate_name("   ").is_err());
        assert!(validate_name("Ada Lovelace").is_ok());
    }
}
