use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Backend-assigned user identifier.
///
/// The auth backend may hand it back as a JSON number or a string; both are
/// kept as their decimal/string form so it can be echoed into URLs and
/// multipart fields unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for UserId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Signed(i64),
            Unsigned(u64),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(text) => UserId(text),
            RawId::Signed(n) => UserId(n.to_string()),
            RawId::Unsigned(n) => UserId(n.to_string()),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Role {
    Faculty,
    #[default]
    Student,
    Unknown(String),
}

impl Role {
    /// Case-insensitive parse; anything that is not a known role is kept
    /// verbatim (lower-cased) so callers can reject it explicitly.
    pub fn parse(raw: &str) -> Self {
        let normalized = raw.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "faculty" => Role::Faculty,
            "student" => Role::Student,
            _ => Role::Unknown(normalized),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Role::Faculty => "faculty",
            Role::Student => "student",
            Role::Unknown(raw) => raw,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Role::Unknown(_))
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Role {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(Role::parse(&raw))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Option<UserId>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Role,
}

impl UserProfile {
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.email.as_deref())
            .unwrap_or("unknown user")
    }

    /// Identifier usable in requests, if the backend supplied a non-blank one.
    pub fn usable_id(&self) -> Option<&UserId> {
        self.id.as_ref().filter(|id| !id.is_blank())
    }
}

/// In-memory login state. The token is opaque and never validated locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub user: UserProfile,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub date: String,
    #[serde(default)]
    pub lecture_name: Option<String>,
    pub status: String,
}

impl AttendanceRecord {
    pub fn lecture_label(&self) -> &str {
        match self.lecture_name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => "N/A",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AttendanceHistory {
    pub count: u64,
    pub records: Vec<AttendanceRecord>,
}

impl AttendanceHistory {
    pub fn has_records(&self) -> bool {
        self.count > 0
    }
}

/// Names recognized in one classroom image, in backend order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognitionResult {
    pub session_label: String,
    pub recognized: Vec<String>,
}

impl RecognitionResult {
    pub fn present_line(&self) -> String {
        let names = if self.recognized.is_empty() {
            "— none —".to_string()
        } else {
            self.recognized.join(", ")
        };
        format!("Present ({}): {names}", self.recognized.len())
    }

    pub fn session_line(&self) -> String {
        format!("Session: {}", self.session_label)
    }
}
