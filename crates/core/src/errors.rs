use thiserror::Error;

/// Failure reported by a query executor. `Display` is the message shown to the
/// caller verbatim, so variants carry their message as-is.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ExecutorError {
    #[error("{0}")]
    Auth(String),
    #[error("{message}")]
    Api { status: u16, error_code: Option<String>, message: String },
    #[error("{0}")]
    Transport(String),
    #[error("{0}")]
    Decode(String),
    #[error("{0}")]
    InvalidRequest(String),
}

impl ExecutorError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Auth(_) => Some(401),
            Self::InvalidRequest(_) => Some(400),
            Self::Transport(_) | Self::Decode(_) => None,
        }
    }

    /// Short stable class name for structured logs.
    pub fn class(&self) -> &'static str {
        match self {
            Self::Auth(_) => "auth",
            Self::Api { .. } => "api",
            Self::Transport(_) => "transport",
            Self::Decode(_) => "decode",
            Self::InvalidRequest(_) => "invalid_request",
        }
    }
}

/// Shape-level input failures, caught before any executor call.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Provide sobject (string) and fields (non-empty object).")]
    CreateRecord,
    #[error("Provide sobject, record_id, and fields (non-empty object).")]
    UpdateRecord,
    #[error("Provide a non-empty SOQL query.")]
    EmptyQuery,
    #[error("{field} must contain only letters, digits, and underscores (got `{value}`).")]
    InvalidIdentifier { field: &'static str, value: String },
}

/// Accepts sObject API names and record ids: `[A-Za-z0-9_]+`.
pub fn validate_identifier(field: &'static str, value: &str) -> Result<(), ValidationError> {
    let valid = !value.is_empty()
        && value.chars().all(|character| character.is_ascii_alphanumeric() || character == '_');
    if valid {
        Ok(())
    } else {
        Err(ValidationError::InvalidIdentifier { field, value: value.to_owned() })
    }
}

#[cfg(test)]
mod tests {
    use crate::errors::{validate_identifier, ExecutorError, ValidationError};

    #[test]
    fn executor_error_displays_message_verbatim() {
        let error = ExecutorError::Api {
            status: 400,
            error_code: Some("MALFORMED_QUERY".to_owned()),
            message: "unexpected token: FORM".to_owned(),
        };

        assert_eq!(error.to_string(), "unexpected token: FORM");
        assert_eq!(error.status(), Some(400));
        assert_eq!(error.class(), "api");
    }

    #[test]
    fn auth_error_reads_as_unauthorized() {
        let error = ExecutorError::Auth(
            "Missing OAuth env vars: SF_CLIENT_ID/SF_CLIENT_SECRET/SF_REFRESH_TOKEN".to_owned(),
        );

        assert_eq!(error.status(), Some(401));
        assert!(error.to_string().starts_with("Missing OAuth env vars"));
    }

    #[test]
    fn validation_messages_match_tool_contract() {
        assert_eq!(
            ValidationError::CreateRecord.to_string(),
            "Provide sobject (string) and fields (non-empty object)."
        );
        assert_eq!(
            ValidationError::UpdateRecord.to_string(),
            "Provide sobject, record_id, and fields (non-empty object)."
        );
    }

    #[test]
    fn identifiers_reject_path_characters() {
        assert!(validate_identifier("sobject", "npe03__Recurring_Donation__c").is_ok());
        assert!(validate_identifier("record_id", "003xx000004TmiQAAS").is_ok());

        let error = validate_identifier("sobject", "Contact/../Account").unwrap_err();
        assert!(matches!(error, ValidationError::InvalidIdentifier { field: "sobject", .. }));
        assert!(validate_identifier("record_id", "").is_err());
    }
}
