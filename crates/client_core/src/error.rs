use std::fmt;

use shared::error::ErrorKind;
use thiserror::Error;

/// The remote call a failure belongs to. Drives the user-facing wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Register,
    UploadPhoto,
    EnrollFace,
    Login,
    Recognize,
    FetchAttendance,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Register => "register",
            Operation::UploadPhoto => "upload_photo",
            Operation::EnrollFace => "enroll_face",
            Operation::Login => "login",
            Operation::Recognize => "recognize",
            Operation::FetchAttendance => "fetch_attendance",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Error)]
pub enum ClientError {
    #[error("{0}")]
    Validation(String),
    #[error(
        "{operation} rejected with HTTP {status}: {}",
        message.as_deref().unwrap_or("<no message>")
    )]
    Backend {
        operation: Operation,
        status: u16,
        message: Option<String>,
    },
    #[error("{operation} failed to reach backend: {detail}")]
    Connectivity { operation: Operation, detail: String },
    #[error("{operation} returned an unreadable response: {detail}")]
    UnexpectedResponse { operation: Operation, detail: String },
}

impl ClientError {
    pub fn validation(message: impl Into<String>) -> Self {
        ClientError::Validation(message.into())
    }

    pub fn connectivity(operation: Operation, err: reqwest::Error) -> Self {
        ClientError::Connectivity {
            operation,
            detail: err.to_string(),
        }
    }

    pub fn unexpected(operation: Operation, err: impl fmt::Display) -> Self {
        ClientError::UnexpectedResponse {
            operation,
            detail: err.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ClientError::Validation(_) => ErrorKind::Validation,
            ClientError::Backend { .. } => ErrorKind::Backend,
            ClientError::Connectivity { .. } | ClientError::UnexpectedResponse { .. } => {
                ErrorKind::Connectivity
            }
        }
    }

    pub fn operation(&self) -> Option<Operation> {
        match self {
            ClientError::Validation(_) => None,
            ClientError::Backend { operation, .. }
            | ClientError::Connectivity { operation, .. }
            | ClientError::UnexpectedResponse { operation, .. } => Some(*operation),
        }
    }

    /// Text shown to the user for this failure.
    pub fn notice(&self) -> String {
        match self {
            ClientError::Validation(message) => message.clone(),
            ClientError::Backend {
                operation,
                status,
                message,
            } => {
                let detail = message.clone().unwrap_or_else(|| status.to_string());
                match operation {
                    Operation::Register => format!("Registration failed: {detail}"),
                    Operation::Login => format!("Login failed: {detail}"),
                    Operation::UploadPhoto => "Failed to save photo in auth store".to_string(),
                    Operation::EnrollFace => "Face registration failed".to_string(),
                    Operation::Recognize => message
                        .clone()
                        .unwrap_or_else(|| "Recognition failed".to_string()),
                    Operation::FetchAttendance => "No attendance records found.".to_string(),
                }
            }
            ClientError::Connectivity { operation, .. }
            | ClientError::UnexpectedResponse { operation, .. } => match operation {
                Operation::Register | Operation::UploadPhoto | Operation::EnrollFace => {
                    "Error connecting to backend".to_string()
                }
                Operation::Login => "Connection error. Ensure backend is running.".to_string(),
                Operation::Recognize => "Recognition server not reachable".to_string(),
                Operation::FetchAttendance => "Error fetching attendance data.".to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_notice_prefers_message_over_status() {
        let err = ClientError::Backend {
            operation: Operation::Register,
            status: 409,
            message: Some("Email already registered".into()),
        };
        assert_eq!(err.notice(), "Registration failed: Email already registered");
        assert_eq!(err.kind(), ErrorKind::Backend);
    }

    #[test]
    fn backend_notice_falls_back_to_status_code() {
        let err = ClientError::Backend {
            operation: Operation::Login,
            status: 500,
            message: None,
        };
        assert_eq!(err.notice(), "Login failed: 500");
    }

    #[test]
    fn recognition_failure_without_body_uses_generic_text() {
        let err = ClientError::Backend {
            operation: Operation::Recognize,
            status: 400,
            message: None,
        };
        assert_eq!(err.notice(), "Recognition failed");
    }

    #[test]
    fn undecodable_responses_read_as_connectivity() {
        let err = ClientError::unexpected(Operation::FetchAttendance, "expected value");
        assert_eq!(err.kind(), ErrorKind::Connectivity);
        assert_eq!(err.notice(), "Error fetching attendance data.");
    }
}
