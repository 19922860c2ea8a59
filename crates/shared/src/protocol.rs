use serde::{Deserialize, Serialize};

use crate::domain::{AttendanceRecord, Role, UserId};

pub const FIELD_FILE: &str = "file";
pub const FIELD_EMAIL: &str = "email";
pub const FIELD_SESSION: &str = "session";
pub const FIELD_MARKED_BY: &str = "marked_by";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub id: String,
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    pub role: Role,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecognizeResponse {
    #[serde(default)]
    pub recognized: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AttendanceResponse {
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub attendance: Vec<AttendanceRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_response_accepts_numeric_ids_and_missing_token() {
        let body = r#"{"id": 42, "name": "Ada", "email": "ada@uni.edu", "role": "FACULTY"}"#;
        let parsed: LoginResponse = serde_json::from_str(body).expect("parse");
        assert_eq!(parsed.id, Some(UserId::new("42")));
        assert!(parsed.token.is_none());
        assert_eq!(parsed.role.as_deref(), Some("FACULTY"));
    }

    #[test]
    fn register_request_serializes_role_lowercase() {
        let req = RegisterRequest {
            id: "s-1".into(),
            name: "Sam".into(),
            email: "sam@uni.edu".into(),
            password: "pw".into(),
            role: Role::Student,
        };
        let json = serde_json::to_value(&req).expect("serialize");
        assert_eq!(json["role"], "student");
        assert_eq!(json["id"], "s-1");
    }

    #[test]
    fn attendance_response_tolerates_missing_lecture_name() {
        let body = r#"{"count": 1, "attendance": [{"date": "2024-01-01", "status": "present"}]}"#;
        let parsed: AttendanceResponse = serde_json::from_str(body).expect("parse");
        assert_eq!(parsed.attendance[0].lecture_label(), "N/A");
    }
}
