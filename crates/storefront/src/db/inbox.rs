//! Newsletter subscribers and contact messages.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use whiskers_core::inbox::{Message, NewMessage, Subscriber};
use whiskers_core::{ContactSubject, Email, MessageId, MessageStatus, SubscriberId};

use super::{DUPLICATE_SUBSCRIBER, RepositoryError, conflict_on_unique};

#[derive(sqlx::FromRow)]
struct SubscriberRow {
    id: i32,
    email: String,
    created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct MessageRow {
    id: i32,
    first_name: String,
    last_name: String,
    email: String,
    subject: String,
    message: String,
    status: MessageStatus,
    created_at: DateTime<Utc>,
}

fn parse_email(raw: &str) -> Result<Email, RepositoryError> {
    Email::parse(raw)
        .map_err(|e| RepositoryError::DataCorruption(format!("invalid email in database: {e}")))
}

/// Repository for subscriber and message database operations.
pub struct InboxRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> InboxRepository<'a> {
    /// Create a new inbox repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Add an address to the newsletter list.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the address is already subscribed.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn subscribe(&self, email: &Email) -> Result<Subscriber, RepositoryError> {
        let row: SubscriberRow = sqlx::query_as(
            r"
            INSERT INTO subscribers (email)
            VALUES ($1)
            RETURNING id, email, created_at
            ",
        )
        .bind(email.as_str())
        .fetch_one(self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, DUPLICATE_SUBSCRIBER))?;

        Ok(Subscriber {
            id: SubscriberId::new(row.id),
            email: parse_email(&row.email)?,
            created_at: row.created_at,
        })
    }

    /// Store a contact message with status `new`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored row does not parse.
    pub async fn create_message(&self, message: &NewMessage) -> Result<Message, RepositoryError> {
        let row: MessageRow = sqlx::query_as(
            r"
            INSERT INTO messages (first_name, last_name, email, subject, message)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, first_name, last_name, email, subject, message, status, created_at
            ",
        )
        .bind(&message.first_name)
        .bind(&message.last_name)
        .bind(message.email.as_str())
        .bind(message.subject.as_str())
        .bind(&message.message)
        .fetch_one(self.pool)
        .await?;

        let subject = row.subject.parse::<ContactSubject>().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid subject in database: {e}"))
        })?;

        Ok(Message {
            id: MessageId::new(row.id),
            first_name: row.first_name,
            last_name: row.last_name,
            email: parse_email(&row.email)?,
            subject,
            message: row.message,
            status: row.status,
            created_at: row.created_at,
        })
    }
}
