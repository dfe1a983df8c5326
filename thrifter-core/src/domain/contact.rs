//! Contact-form submissions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::users::{ValidationError, validate_email};

/// A stored contact-form entry.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Contact {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// Incoming contact-form payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewContact {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
    pub message: String,
}

impl NewContact {
    pub fn validate(&self) -> Result<(), ContactValidationError> {
        if self.first_name.trim().is_empty()
            || self.last_name.trim().is_empty()
            || self.phone_number.trim().is_empty()
            || self.message.trim().is_empty()
        {
            return Err(ContactValidationError::MissingFields);
        }

        validate_email(self.email.trim()).map_err(ContactValidationError::Email)?;

        Ok(())
    }

    /// Normalized copy with the email trimmed, ready for insertion.
    pub fn normalized(mut self) -> Self {
        self.email = self.email.trim().to_string();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContactValidationError {
    #[error("All fields are required")]
    MissingFields,

    #[error(transparent)]
    Email(ValidationError),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submission() -> NewContact {
        NewContact {
            first_name: "Jane".into(),
            last_name: "Doe".into(),
            email: " jane@example.com ".into(),
            phone_number: "+15551234567".into(),
            message: "Hello there".into(),
        }
    }

    #[test]
    fn accepts_and_normalizes_valid_submission() {
        let contact = submission();
        assert!(contact.validate().is_ok());
        assert_eq!(contact.normalized().email, "jane@example.com");
    }

    #[test]
    fn rejects_blank_fields() {
        let mut contact = submission();
        contact.message = "   ".into();
        assert_eq!(
            contact.validate(),
            Err(ContactValidationError::MissingFields)
        );
    }

    #[test]
    fn rejects_bad_email() {
        let mut contact = submission();
        contact.email = "not-an-email".into();
        assert!(matches!(
            contact.validate(),
            Err(ContactValidationError::Email(_))
        ));
    }
}
