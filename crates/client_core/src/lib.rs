use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use shared::{
    domain::{AttendanceHistory, RecognitionResult, Role, Session, UserId, UserProfile},
    protocol::{AttendanceResponse, LoginRequest, LoginResponse, RegisterRequest},
};
use tracing::{info, warn};

pub mod config;
pub mod error;
pub mod export;
pub mod state;
pub mod transport;
pub mod types;

pub use config::Settings;
pub use error::{ClientError, Operation};
pub use types::{
    LoginForm, PendingAttendance, PendingRecognition, PendingRegistration, PhotoAsset,
    RecognitionRequest, RegistrationForm, RegistrationOutcome, StepStatus,
};

use transport::{HttpAuthBackend, HttpRecognitionBackend};

/// Token stored when the auth backend does not issue one.
pub const PLACEHOLDER_TOKEN: &str = "dummy-token";

/// Credential store and photo archive.
#[async_trait]
pub trait AuthBackend: Send + Sync {
    async fn register(&self, request: &RegisterRequest) -> Result<(), ClientError>;
    async fn upload_photo(&self, photo: &PhotoAsset, email: &str) -> Result<(), ClientError>;
    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, ClientError>;
}

/// Face enrollment, classroom recognition and attendance records.
#[async_trait]
pub trait RecognitionBackend: Send + Sync {
    async fn enroll_face(&self, photo: &PhotoAsset, email: &str) -> Result<(), ClientError>;
    async fn recognize(
        &self,
        image: &PhotoAsset,
        session_label: &str,
        marked_by: Option<&UserId>,
    ) -> Result<Vec<String>, ClientError>;
    async fn attendance(&self, user_id: &UserId) -> Result<AttendanceResponse, ClientError>;
}

/// Runs the request sequences against both backends. Holds no session state
/// of its own; callers keep that in [`state::AppState`].
#[derive(Clone)]
pub struct AttendanceClient {
    auth: Arc<dyn AuthBackend>,
    recognition: Arc<dyn RecognitionBackend>,
    default_session_label: String,
}

impl AttendanceClient {
    pub fn new(settings: &Settings) -> Self {
        let http = Client::new();
        Self::new_with_backends(
            Arc::new(HttpAuthBackend::new(
                http.clone(),
                settings.auth_base_url.clone(),
            )),
            Arc::new(HttpRecognitionBackend::new(
                http,
                settings.recognition_base_url.clone(),
            )),
            settings.default_session_label.clone(),
        )
    }

    pub fn new_with_backends(
        auth: Arc<dyn AuthBackend>,
        recognition: Arc<dyn RecognitionBackend>,
        default_session_label: impl Into<String>,
    ) -> Self {
        Self {
            auth,
            recognition,
            default_session_label: default_session_label.into(),
        }
    }

    pub fn default_session_label(&self) -> &str {
        &self.default_session_label
    }

    /// Credential registration, then (students with a photo only) the photo
    /// archive upload and face enrollment. Only the first step is fatal; the
    /// photo steps are both attempted and their failures reported in the
    /// outcome. No compensation is attempted when the backends disagree.
    pub async fn register(
        &self,
        form: RegistrationForm,
    ) -> Result<RegistrationOutcome, ClientError> {
        let photo = form.enrollment_photo().cloned().map(Ok);
        self.register_with_photo(form, photo).await
    }

    /// Same chain for a form whose photo is still on disk. A photo that
    /// cannot be read fails both photo steps; the account is still created.
    pub async fn register_pending(
        &self,
        pending: PendingRegistration,
    ) -> Result<RegistrationOutcome, ClientError> {
        pending.form.validate()?;
        let photo = pending.load_photo().await;
        self.register_with_photo(pending.form, photo).await
    }

    async fn register_with_photo(
        &self,
        form: RegistrationForm,
        photo: Option<Result<PhotoAsset, ClientError>>,
    ) -> Result<RegistrationOutcome, ClientError> {
        form.validate()?;
        let request = form.to_request();

        info!(operation = "register", role = %request.role, "registering account");
        self.auth.register(&request).await?;

        let mut outcome = RegistrationOutcome {
            email: request.email.clone(),
            photo_upload: None,
            face_enrollment: None,
        };

        match photo {
            Some(Ok(photo)) => {
                let upload = self.auth.upload_photo(&photo, &request.email).await;
                if let Err(err) = &upload {
                    warn!(operation = "upload_photo", "photo archive upload failed: {err}");
                }
                outcome.photo_upload = Some(StepStatus::from_result(upload));

                let enrollment = self.recognition.enroll_face(&photo, &request.email).await;
                if let Err(err) = &enrollment {
                    warn!(operation = "enroll_face", "face enrollment failed: {err}");
                }
                outcome.face_enrollment = Some(StepStatus::from_result(enrollment));
            }
            Some(Err(err)) => {
                warn!(operation = "register", "photo unreadable, skipping photo steps: {err}");
                outcome.photo_upload = Some(StepStatus::Failed(err.clone()));
                outcome.face_enrollment = Some(StepStatus::Failed(err));
            }
            None => {}
        }

        info!(
            operation = "register",
            complete = outcome.fully_succeeded(),
            "registration finished"
        );
        Ok(outcome)
    }

    pub async fn login(&self, form: LoginForm) -> Result<Session, ClientError> {
        form.validate()?;
        let request = form.to_request();

        info!(operation = "login", role = %request.role, "signing in");
        let response = self.auth.login(&request).await?;
        let session = session_from_login(response, &form.role);
        info!(
            operation = "login",
            role = %session.user.role,
            has_user_id = session.user.usable_id().is_some(),
            "signed in"
        );
        Ok(session)
    }

    /// Submits a classroom image. A blank label becomes the configured
    /// default.
    pub async fn recognize(
        &self,
        request: RecognitionRequest,
    ) -> Result<RecognitionResult, ClientError> {
        let Some(image) = request.image.as_ref() else {
            return Err(ClientError::validation("Please choose a classroom image"));
        };

        let session_label = match request.session_label.trim() {
            "" => self.default_session_label.clone(),
            label => label.to_string(),
        };
        let marked_by = request.marked_by.as_ref().filter(|id| !id.is_blank());

        info!(
            operation = "recognize",
            session = %session_label,
            marked_by = marked_by.map(UserId::as_str).unwrap_or(""),
            "submitting classroom image"
        );
        let recognized = self
            .recognition
            .recognize(image, &session_label, marked_by)
            .await?;
        info!(operation = "recognize", present = recognized.len(), "recognition finished");

        Ok(RecognitionResult {
            session_label,
            recognized,
        })
    }

    pub async fn fetch_attendance(
        &self,
        user_id: Option<&UserId>,
    ) -> Result<AttendanceHistory, ClientError> {
        let Some(user_id) = user_id.filter(|id| !id.is_blank()) else {
            return Err(ClientError::validation(
                "User ID missing in login response.",
            ));
        };

        info!(operation = "fetch_attendance", user_id = %user_id, "fetching attendance");
        let response = self.recognition.attendance(user_id).await?;
        Ok(AttendanceHistory {
            count: response.count,
            records: response.attendance,
        })
    }
}

/// Builds the session from a login response: placeholder token when absent,
/// role taken from the response or else the submitted form, lower-cased.
pub fn session_from_login(response: LoginResponse, submitted_role: &Role) -> Session {
    let role = match response.role.as_deref() {
        Some(raw) if !raw.trim().is_empty() => Role::parse(raw),
        _ => Role::parse(submitted_role.as_str()),
    };
    Session {
        token: response
            .token
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| PLACEHOLDER_TOKEN.to_string()),
        user: UserProfile {
            id: response.id,
            name: response.name,
            email: response.email,
            role,
        },
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
