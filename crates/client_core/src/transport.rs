//! reqwest-backed implementations of the two backend seams.

use async_trait::async_trait;
use reqwest::{
    multipart::{Form, Part},
    Client, RequestBuilder, Response,
};
use serde::de::DeserializeOwned;
use shared::{
    domain::UserId,
    error::{BackendErrorBody, MessageField},
    protocol::{
        AttendanceResponse, LoginRequest, LoginResponse, RecognizeResponse, RegisterRequest,
        FIELD_EMAIL, FIELD_FILE, FIELD_MARKED_BY, FIELD_SESSION,
    },
};
use tracing::{debug, warn};

use crate::{
    error::{ClientError, Operation},
    types::PhotoAsset,
    AuthBackend, RecognitionBackend,
};

pub struct HttpAuthBackend {
    http: Client,
    base_url: String,
}

impl HttpAuthBackend {
    pub fn new(http: Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl AuthBackend for HttpAuthBackend {
    async fn register(&self, request: &RegisterRequest) -> Result<(), ClientError> {
        send(
            Operation::Register,
            self.http
                .post(format!("{}/register", self.base_url))
                .json(request),
        )
        .await?;
        Ok(())
    }

    async fn upload_photo(&self, photo: &PhotoAsset, email: &str) -> Result<(), ClientError> {
        let form = photo_form(Operation::UploadPhoto, photo)?.text(FIELD_EMAIL, email.to_string());
        send(
            Operation::UploadPhoto,
            self.http
                .post(format!("{}/upload-photo", self.base_url))
                .multipart(form),
        )
        .await?;
        Ok(())
    }

    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, ClientError> {
        let response = send(
            Operation::Login,
            self.http
                .post(format!("{}/login", self.base_url))
                .json(request),
        )
        .await?;
        decode(Operation::Login, response).await
    }
}

pub struct HttpRecognitionBackend {
    http: Client,
    base_url: String,
}

impl HttpRecognitionBackend {
    pub fn new(http: Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl RecognitionBackend for HttpRecognitionBackend {
    async fn enroll_face(&self, photo: &PhotoAsset, email: &str) -> Result<(), ClientError> {
        let form = photo_form(Operation::EnrollFace, photo)?.text(FIELD_EMAIL, email.to_string());
        send(
            Operation::EnrollFace,
            self.http
                .post(format!("{}/register", self.base_url))
                .multipart(form),
        )
        .await?;
        Ok(())
    }

    async fn recognize(
        &self,
        image: &PhotoAsset,
        session_label: &str,
        marked_by: Option<&UserId>,
    ) -> Result<Vec<String>, ClientError> {
        let mut form = photo_form(Operation::Recognize, image)?
            .text(FIELD_SESSION, session_label.to_string());
        if let Some(user_id) = marked_by {
            form = form.text(FIELD_MARKED_BY, user_id.to_string());
        }

        let response = send(
            Operation::Recognize,
            self.http
                .post(format!("{}/recognize", self.base_url))
                .multipart(form),
        )
        .await?;
        let body: RecognizeResponse = decode(Operation::Recognize, response).await?;
        Ok(body.recognized)
    }

    async fn attendance(&self, user_id: &UserId) -> Result<AttendanceResponse, ClientError> {
        let response = send(
            Operation::FetchAttendance,
            self.http
                .get(format!("{}/attendance/{}", self.base_url, user_id.as_str())),
        )
        .await?;
        decode(Operation::FetchAttendance, response).await
    }
}

fn photo_form(operation: Operation, photo: &PhotoAsset) -> Result<Form, ClientError> {
    let part = Part::bytes(photo.bytes.clone())
        .file_name(photo.file_name.clone())
        .mime_str(&photo.mime_type)
        .map_err(|err| {
            ClientError::validation(format!(
                "{operation}: unusable content type '{}' for '{}': {err}",
                photo.mime_type, photo.file_name
            ))
        })?;
    Ok(Form::new().part(FIELD_FILE, part))
}

/// Sends the request and turns any non-2xx answer into
/// [`ClientError::Backend`], lifting `message`/`error` out of a JSON body when
/// there is one.
async fn send(operation: Operation, request: RequestBuilder) -> Result<Response, ClientError> {
    let response = request.send().await.map_err(|err| {
        warn!(operation = operation.as_str(), "request failed: {err}");
        ClientError::connectivity(operation, err)
    })?;

    let status = response.status();
    if status.is_success() {
        debug!(operation = operation.as_str(), status = status.as_u16(), "backend ok");
        return Ok(response);
    }

    let body = response.bytes().await.unwrap_or_default();
    let preferred = match operation {
        Operation::Recognize => MessageField::Error,
        _ => MessageField::Message,
    };
    let message = BackendErrorBody::parse(&body).and_then(|body| body.into_message(preferred));
    warn!(
        operation = operation.as_str(),
        status = status.as_u16(),
        message = message.as_deref().unwrap_or(""),
        "backend rejected request"
    );
    Err(ClientError::Backend {
        operation,
        status: status.as_u16(),
        message,
    })
}

async fn decode<T: DeserializeOwned>(
    operation: Operation,
    response: Response,
) -> Result<T, ClientError> {
    response
        .json::<T>()
        .await
        .map_err(|err| ClientError::unexpected(operation, err))
}
