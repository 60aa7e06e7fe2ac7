//! Identity types for authentication

use serde::{Deserialize, Serialize};

/// A signed-in identity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    /// Identity ID (the OIDC subject)
    pub id: String,

    /// Email address (if available)
    pub email: Option<String>,

    /// Display name (if available)
    pub name: Option<String>,

    /// URL to a profile picture (if available)
    pub avatar_url: Option<String>,
}

impl Identity {
    /// Creates a new identity
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: None,
            name: None,
            avatar_url: None,
        }
    }

    /// Sets the email
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Sets the name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the avatar URL
    pub fn with_avatar_url(mut self, avatar_url: impl Into<String>) -> Self {
        self.avatar_url = Some(avatar_url.into());
        self
    }

    /// Returns the display name, falling back to email or ID
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.email.as_deref())
            .unwrap_or(&self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_display_name() {
        let identity = Identity::new("user-123");
        assert_eq!(identity.display_name(), "user-123");

        let with_email = Identity::new("user-123").with_email("test@example.com");
        assert_eq!(with_email.display_name(), "test@example.com");

        let with_name = Identity::new("user-123")
            .with_email("test@example.com")
            .with_name("Test User");
        assert_eq!(with_name.display_name(), "Test User");
    }
}
