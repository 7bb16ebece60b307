use serde::{Deserialize, Serialize};

/// A principal's delivery address as reported by the identity provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Contact {
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
}

impl Contact {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// `Name <address>` when a name is known.
    pub fn mailbox(&self) -> String {
        match &self.name {
            Some(name) => format!("{} <{}>", name, self.email),
            None => self.email.clone(),
        }
    }
}

/// Rendered message ready for a [`NotificationSender`](crate::NotificationSender).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Email {
    pub to: Contact,
    pub subject: String,
    pub body_text: Option<String>,
    pub body_html: Option<String>,
}

impl Email {
    pub fn new(to: Contact, subject: impl Into<String>) -> Self {
        Self {
            to,
            subject: subject.into(),
            body_text: None,
            body_html: None,
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.body_text = Some(text.into());
        self
    }

    pub fn with_html(mut self, html: impl Into<String>) -> Self {
        self.body_html = Some(html.into());
        self
    }
}

/// Result of sending an email
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendResult {
    /// Provider-specific message ID
    pub message_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mailbox_formatting() {
        assert_eq!(Contact::new("a@example.com").mailbox(), "a@example.com");
        assert_eq!(
            Contact::new("a@example.com").with_name("Alice").mailbox(),
            "Alice <a@example.com>"
        );
    }
}
