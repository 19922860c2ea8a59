use std::path::{Path, PathBuf};

use shared::{
    domain::{Role, UserId},
    protocol::{LoginRequest, RegisterRequest},
};

use crate::error::ClientError;

/// A user-selected image, read fully into memory for the lifetime of the
/// requests that carry it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoAsset {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl PhotoAsset {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let mime_type = mime_guess::from_path(&file_name)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        Self {
            file_name,
            mime_type,
            bytes,
        }
    }

    pub async fn load(path: &Path) -> Result<Self, ClientError> {
        let bytes = tokio::fs::read(path).await.map_err(|err| {
            ClientError::validation(format!("could not read '{}': {err}", path.display()))
        })?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        Ok(Self::new(file_name, bytes))
    }
}

#[derive(Debug, Clone)]
pub struct RegistrationForm {
    pub role: Role,
    pub id: String,
    pub name: String,
    pub email: String,
    pub password: String,
    pub photo: Option<PhotoAsset>,
}

impl RegistrationForm {
    pub fn validate(&self) -> Result<(), ClientError> {
        if self.email.trim().is_empty() || self.password.is_empty() {
            return Err(ClientError::validation("Email & password required"));
        }
        Ok(())
    }

    pub fn to_request(&self) -> RegisterRequest {
        RegisterRequest {
            id: self.id.trim().to_string(),
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            password: self.password.clone(),
            role: self.role.clone(),
        }
    }

    /// The photo steps only run for students who attached a file.
    pub fn enrollment_photo(&self) -> Option<&PhotoAsset> {
        match self.role {
            Role::Student => self.photo.as_ref(),
            _ => None,
        }
    }
}

/// A validated registration whose photo still lives on disk.
#[derive(Debug, Clone)]
pub struct PendingRegistration {
    pub form: RegistrationForm,
    pub photo_path: Option<PathBuf>,
}

impl PendingRegistration {
    /// Reads the photo when the form is a student's and one was chosen.
    pub async fn load_photo(&self) -> Option<Result<PhotoAsset, ClientError>> {
        match (&self.form.role, &self.photo_path) {
            (Role::Student, Some(path)) => Some(PhotoAsset::load(path).await),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoginForm {
    pub role: Role,
    pub email: String,
    pub password: String,
}

impl LoginForm {
    pub fn validate(&self) -> Result<(), ClientError> {
        if self.email.trim().is_empty() || self.password.is_empty() {
            return Err(ClientError::validation("Enter email & password"));
        }
        Ok(())
    }

    pub fn to_request(&self) -> LoginRequest {
        LoginRequest {
            email: self.email.trim().to_string(),
            password: self.password.clone(),
            role: self.role.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RecognitionRequest {
    pub image: Option<PhotoAsset>,
    pub session_label: String,
    pub marked_by: Option<UserId>,
}

/// A recognition submit whose image still lives on disk. `generation` is the
/// sign-in it was issued under; replies are matched against it.
#[derive(Debug, Clone)]
pub struct PendingRecognition {
    pub image_path: PathBuf,
    pub session_label: String,
    pub marked_by: Option<UserId>,
    pub generation: u64,
}

impl PendingRecognition {
    pub async fn load(self) -> Result<RecognitionRequest, ClientError> {
        let image = PhotoAsset::load(&self.image_path).await?;
        Ok(RecognitionRequest {
            image: Some(image),
            session_label: self.session_label,
            marked_by: self.marked_by,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingAttendance {
    pub user_id: UserId,
    pub generation: u64,
}

#[derive(Debug, Clone)]
pub enum StepStatus {
    Succeeded,
    Failed(ClientError),
}

impl StepStatus {
    pub fn from_result(result: Result<(), ClientError>) -> Self {
        match result {
            Ok(()) => StepStatus::Succeeded,
            Err(err) => StepStatus::Failed(err),
        }
    }

    pub fn succeeded(&self) -> bool {
        matches!(self, StepStatus::Succeeded)
    }
}

/// Result of a registration whose credential step succeeded. The photo steps
/// are `None` when they were not attempted.
#[derive(Debug, Clone)]
pub struct RegistrationOutcome {
    pub email: String,
    pub photo_upload: Option<StepStatus>,
    pub face_enrollment: Option<StepStatus>,
}

impl RegistrationOutcome {
    pub fn fully_succeeded(&self) -> bool {
        [&self.photo_upload, &self.face_enrollment]
            .into_iter()
            .flatten()
            .all(StepStatus::succeeded)
    }
}
