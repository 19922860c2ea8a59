use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// A required input was missing; no request was issued.
    Validation,
    /// The backend answered with a non-success status.
    Backend,
    /// The backend could not be reached or answered with garbage.
    Connectivity,
}

/// Error payload shape used by both backends. The auth backend fills
/// `message`; the recognition backend fills `error`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BackendErrorBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Which field of [`BackendErrorBody`] is read first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageField {
    Message,
    Error,
}

impl BackendErrorBody {
    pub fn parse(body: &[u8]) -> Option<Self> {
        serde_json::from_slice(body).ok()
    }

    /// The first non-empty field, starting with `preferred`.
    pub fn into_message(self, preferred: MessageField) -> Option<String> {
        let message = self.message.filter(|m| !m.is_empty());
        let error = self.error.filter(|e| !e.is_empty());
        match preferred {
            MessageField::Message => message.or(error),
            MessageField::Error => error.or(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(raw: &str) -> BackendErrorBody {
        BackendErrorBody::parse(raw.as_bytes()).expect("json body")
    }

    #[test]
    fn preferred_field_wins_when_both_are_present() {
        let raw = r#"{"message":"generic","error":"No faces detected"}"#;
        assert_eq!(
            body(raw).into_message(MessageField::Error).as_deref(),
            Some("No faces detected")
        );
        assert_eq!(
            body(raw).into_message(MessageField::Message).as_deref(),
            Some("generic")
        );
    }

    #[test]
    fn falls_back_to_the_other_field_when_preferred_is_blank() {
        let raw = r#"{"message":"Email already in use","error":""}"#;
        assert_eq!(
            body(raw).into_message(MessageField::Error).as_deref(),
            Some("Email already in use")
        );
    }

    #[test]
    fn non_json_bodies_yield_nothing() {
        assert!(BackendErrorBody::parse(b"<html>502</html>").is_none());
    }
}
