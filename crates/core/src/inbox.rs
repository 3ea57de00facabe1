//! Newsletter subscribers and contact-form messages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{ContactSubject, Email, MessageId, MessageStatus, SubscriberId};
use crate::validation::{ValidationError, required};

/// Shortest accepted contact message, in characters.
pub const MIN_MESSAGE_CHARS: usize = 10;

/// A newsletter subscriber.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscriber {
    pub id: SubscriberId,
    pub email: Email,
    pub created_at: DateTime<Utc>,
}

/// Newsletter signup form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubscribeInput {
    pub email: Option<String>,
}

impl SubscribeInput {
    /// Normalize and check the address.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the email is missing or malformed.
    pub fn validate(self) -> Result<Email, ValidationError> {
        let email = required(self.email).ok_or_else(|| ValidationError::field("email", "Email is required"))?;
        Ok(Email::parse(&email)?)
    }
}

/// A stored contact message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: MessageId,
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
    pub subject: ContactSubject,
    pub message: String,
    pub status: MessageStatus,
    pub created_at: DateTime<Utc>,
}

/// Contact form as submitted.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageInput {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub subject: Option<String>,
    pub message: Option<String>,
}

/// A validated contact message ready to be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
    pub subject: ContactSubject,
    pub message: String,
}

impl MessageInput {
    /// Trim and check the form.
    ///
    /// # Errors
    ///
    /// Returns a validation error if a field is missing, the email is
    /// malformed, the subject is unknown, or the message is too short.
    pub fn validate(self) -> Result<NewMessage, ValidationError> {
        let (Some(first_name), Some(last_name), Some(email), Some(subject), Some(message)) = (
            required(self.first_name),
            required(self.last_name),
            required(self.email),
            required(self.subject),
            required(self.message),
        ) else {
            return Err(ValidationError::new("All fields are required"));
        };

        let email = Email::parse(&email)?;
        let subject = subject
            .parse::<ContactSubject>()
            .map_err(|_| ValidationError::field("subject", "Please choose a valid subject"))?;
        if message.chars().count() < MIN_MESSAGE_CHARS {
            return Err(ValidationError::field(
                "message",
                format!("Message must be at least {MIN_MESSAGE_CHARS} characters long"),
            ));
        }

        Ok(NewMessage {
            first_name,
            last_name,
            email,
            subject,
            message,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn input() -> MessageInput {
        MessageInput {
            first_name: Some(" Tom ".into()),
            last_name: Some("Cat".into()),
            email: Some("Tom@Example.com".into()),
            subject: Some("Wholesale".into()),
            message: Some("  Do you ship scratching posts in bulk?  ".into()),
        }
    }

    #[test]
    fn test_message_validates() {
        let message = input().validate().unwrap();
        assert_eq!(message.first_name, "Tom");
        assert_eq!(message.email.as_str(), "tom@example.com");
        assert_eq!(message.subject, ContactSubject::Wholesale);
        assert_eq!(message.message, "Do you ship scratching posts in bulk?");
    }

    #[test]
    fn test_message_too_short_after_trim() {
        let err = MessageInput {
            message: Some("   hi there   ".into()),
            ..input()
        }
        .validate()
        .unwrap_err();
        assert_eq!(err.field, Some("message"));
        assert_eq!(err.to_string(), "Message must be at least 10 characters long");
    }

    #[test]
    fn test_message_rejects_unknown_subject_and_bad_email() {
        let err = MessageInput {
            subject: Some("Complaint".into()),
            ..input()
        }
        .validate()
        .unwrap_err();
        assert_eq!(err.field, Some("subject"));

        let err = MessageInput {
            email: Some("tom@".into()),
            ..input()
        }
        .validate()
        .unwrap_err();
        assert_eq!(err.field, Some("email"));
    }

    #[test]
    fn test_message_missing_field() {
        let err = MessageInput {
            last_name: None,
            ..input()
        }
        .validate()
        .unwrap_err();
        assert_eq!(err.to_string(), "All fields are required");
    }

    #[test]
    fn test_subscribe_normalizes() {
        let email = SubscribeInput {
            email: Some("  Kitty@Example.ORG ".into()),
        }
        .validate()
        .unwrap();
        assert_eq!(email.as_str(), "kitty@example.org");

        let err = SubscribeInput { email: None }.validate().unwrap_err();
        assert_eq!(err.to_string(), "Email is required");

        assert!(
            SubscribeInput {
                email: Some("nope".into())
            }
            .validate()
            .is_err()
        );
    }
}
