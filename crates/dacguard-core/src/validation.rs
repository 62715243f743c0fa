//! Input validation for user-supplied fields.
//!
//! The storage collaborator enforces no constraints of its own, so every
//! field is checked here before a row is written.

use crate::error::{CoreError, Result};

/// Maximum document title length, in characters.
pub const MAX_TITLE_LEN: usize = 200;

/// Maximum document content length, in bytes.
pub const MAX_CONTENT_LEN: usize = 64 * 1024;

pub fn validate_title(title: &str) -> Result<()> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(CoreError::InvalidInput("title must not be empty".into()));
    }
    if trimmed.chars().count() > MAX_TITLE_LEN {
        return Err(CoreError::InvalidInput(format!(
            "title exceeds {MAX_TITLE_LEN} characters"
        )));
    }
    Ok(())
}

pub fn validate_content(content: &str) -> Result<()> {
    if content.len() > MAX_CONTENT_LEN {
        return Err(CoreError::InvalidInput(format!(
            "content exceeds {MAX_CONTENT_LEN} bytes"
        )));
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<()> {
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(()),
        _ => Err(CoreError::InvalidInput(format!("malformed email: {email}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_rules() {
        assert!(validate_title("Leave policy").is_ok());
        assert!(validate_title("   ").is_err());
        assert!(validate_title(&"x".repeat(MAX_TITLE_LEN + 1)).is_err());
    }

    #[test]
    fn test_content_limit() {
        assert!(validate_content("").is_ok());
        assert!(validate_content(&"a".repeat(MAX_CONTENT_LEN + 1)).is_err());
    }

    #[test]
    fn test_email_shape() {
        assert!(validate_email("hr@example.com").is_ok());
        assert!(validate_email("hr.example.com").is_err());
        assert!(validate_email("@example.com").is_err());
    }
}
