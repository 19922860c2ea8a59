//! Application state owned by the view layer.
//!
//! Front ends mutate it only through the `begin_*` intents, which validate
//! input and mark the action busy, and [`AppState::apply`], which folds a
//! finished flow back in. Views render from it every frame.

use std::{
    collections::{HashSet, VecDeque},
    fmt,
    path::{Path, PathBuf},
};

use shared::domain::{AttendanceHistory, RecognitionResult, Role, Session};
use tracing::debug;

use crate::{
    error::ClientError,
    export::{self, CsvExport},
    types::{
        LoginForm, PendingAttendance, PendingRecognition, PendingRegistration,
        RegistrationForm, RegistrationOutcome, StepStatus,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthTab {
    Login,
    Register,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Auth(AuthTab),
    Faculty,
    Student,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Register,
    Login,
    Recognize,
    FetchAttendance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NoticeLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AttendanceView {
    #[default]
    Idle,
    Loading {
        student: String,
    },
    Loaded(AttendanceHistory),
    Empty,
    Failed(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginDraft {
    pub role: Role,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegisterDraft {
    pub role: Role,
    pub id: String,
    pub name: String,
    pub email: String,
    pub password: String,
    pub photo_path: Option<PathBuf>,
}

impl RegisterDraft {
    pub fn shows_photo_field(&self) -> bool {
        self.role == Role::Student
    }

    /// Clears the entered values; the selected role stays.
    fn clear_inputs(&mut self) {
        *self = RegisterDraft {
            role: self.role.clone(),
            ..RegisterDraft::default()
        };
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FacultyDraft {
    pub image_path: Option<PathBuf>,
    pub session_label: String,
    pub export_date: String,
}

/// A finished flow. Session-bound replies carry the generation they were
/// issued under and are dropped once that sign-in has ended.
#[derive(Debug)]
pub enum AppEvent {
    RegistrationFinished(Result<RegistrationOutcome, ClientError>),
    LoginFinished(Result<Session, ClientError>),
    RecognitionFinished {
        generation: u64,
        result: Result<RecognitionResult, ClientError>,
    },
    AttendanceFinished {
        generation: u64,
        result: Result<AttendanceHistory, ClientError>,
    },
}

/// Follow-up work a state transition asks the front end to start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    FetchAttendance(PendingAttendance),
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub screen: Screen,
    pub session: Option<Session>,
    pub last_recognized: Option<RecognitionResult>,
    pub attendance: AttendanceView,
    pub login: LoginDraft,
    pub register: RegisterDraft,
    pub faculty: FacultyDraft,
    busy: HashSet<Action>,
    notifications: VecDeque<Notification>,
    generation: u64,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    pub fn new() -> Self {
        Self {
            screen: Screen::Auth(AuthTab::Login),
            session: None,
            last_recognized: None,
            attendance: AttendanceView::Idle,
            login: LoginDraft::default(),
            register: RegisterDraft::default(),
            faculty: FacultyDraft {
                export_date: export::today(),
                ..FacultyDraft::default()
            },
            busy: HashSet::new(),
            notifications: VecDeque::new(),
            generation: 0,
        }
    }

    /// Bumped on every logout.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn select_tab(&mut self, tab: AuthTab) {
        if matches!(self.screen, Screen::Auth(_)) {
            self.screen = Screen::Auth(tab);
        }
    }

    pub fn set_register_role(&mut self, role: Role) {
        if role != Role::Student {
            self.register.photo_path = None;
        }
        self.register.role = role;
    }

    pub fn is_busy(&self, action: Action) -> bool {
        self.busy.contains(&action)
    }

    pub fn notify(&mut self, level: NoticeLevel, message: impl Into<String>) {
        let message = message.into();
        debug!(?level, %message, "notification");
        self.notifications.push_back(Notification { level, message });
    }

    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        self.notifications.drain(..).collect()
    }

    fn reject(&mut self, err: &ClientError) {
        self.notify(NoticeLevel::Error, err.notice());
    }

    /// Marks `action` in flight. Refuses when it already is.
    fn try_begin(&mut self, action: Action) -> bool {
        if !self.busy.insert(action) {
            debug!(?action, "ignoring duplicate submission while in flight");
            return false;
        }
        true
    }

    pub fn begin_register(&mut self) -> Option<PendingRegistration> {
        if self.is_busy(Action::Register) {
            return None;
        }
        let draft = self.register.clone();
        let photo_path = if draft.shows_photo_field() {
            draft.photo_path
        } else {
            None
        };
        let form = RegistrationForm {
            role: draft.role,
            id: draft.id,
            name: draft.name,
            email: draft.email,
            password: draft.password,
            photo: None,
        };
        if let Err(err) = form.validate() {
            self.reject(&err);
            return None;
        }
        self.try_begin(Action::Register)
            .then_some(PendingRegistration { form, photo_path })
    }

    pub fn begin_login(&mut self) -> Option<LoginForm> {
        if self.is_busy(Action::Login) {
            return None;
        }
        let form = LoginForm {
            role: self.login.role.clone(),
            email: self.login.email.clone(),
            password: self.login.password.clone(),
        };
        if let Err(err) = form.validate() {
            self.reject(&err);
            return None;
        }
        self.try_begin(Action::Login).then_some(form)
    }

    pub fn begin_recognize(&mut self) -> Option<PendingRecognition> {
        if self.is_busy(Action::Recognize) {
            return None;
        }
        let Some(image_path) = self.faculty.image_path.clone() else {
            self.reject(&ClientError::validation("Please choose a classroom image"));
            return None;
        };
        let marked_by = self
            .session
            .as_ref()
            .filter(|session| session.user.role == Role::Faculty)
            .and_then(|session| session.user.usable_id().cloned());
        let pending = PendingRecognition {
            image_path,
            session_label: self.faculty.session_label.trim().to_string(),
            marked_by,
            generation: self.generation,
        };
        self.try_begin(Action::Recognize).then_some(pending)
    }

    /// Validates that the signed-in student has an id. A missing id is
    /// rendered in the attendance panel and no fetch is requested.
    pub fn begin_fetch_attendance(&mut self) -> Option<PendingAttendance> {
        if self.is_busy(Action::FetchAttendance) {
            return None;
        }
        let Some(session) = self.session.as_ref() else {
            self.attendance = AttendanceView::Idle;
            return None;
        };
        let student = session.user.display_name().to_string();
        let Some(user_id) = session.user.usable_id().cloned() else {
            self.attendance = AttendanceView::Failed("User ID missing in login response.".into());
            return None;
        };
        self.attendance = AttendanceView::Loading { student };
        let pending = PendingAttendance {
            user_id,
            generation: self.generation,
        };
        self.try_begin(Action::FetchAttendance).then_some(pending)
    }

    pub fn apply(&mut self, event: AppEvent) -> Option<Effect> {
        match event {
            AppEvent::RegistrationFinished(result) => {
                self.busy.remove(&Action::Register);
                self.finish_registration(result);
                None
            }
            AppEvent::LoginFinished(result) => {
                self.busy.remove(&Action::Login);
                self.finish_login(result)
            }
            AppEvent::RecognitionFinished { generation, result } => {
                if self.is_stale(generation, Action::Recognize) {
                    return None;
                }
                self.busy.remove(&Action::Recognize);
                match result {
                    Ok(result) => {
                        self.last_recognized = Some(result);
                        self.notify(NoticeLevel::Success, "Attendance processed successfully");
                    }
                    Err(err) => self.reject(&err),
                }
                None
            }
            AppEvent::AttendanceFinished { generation, result } => {
                if self.is_stale(generation, Action::FetchAttendance) {
                    return None;
                }
                self.busy.remove(&Action::FetchAttendance);
                self.attendance = match result {
                    Ok(history) if history.has_records() => AttendanceView::Loaded(history),
                    Ok(_) => AttendanceView::Empty,
                    Err(ClientError::Backend { .. }) => AttendanceView::Empty,
                    Err(err) => AttendanceView::Failed(err.notice()),
                };
                None
            }
        }
    }

    fn is_stale(&self, generation: u64, action: Action) -> bool {
        if generation == self.generation {
            return false;
        }
        debug!(
            ?action,
            reply = generation,
            current = self.generation,
            "dropping reply from an ended sign-in"
        );
        true
    }

    fn finish_registration(&mut self, result: Result<RegistrationOutcome, ClientError>) {
        let outcome = match result {
            Ok(outcome) => outcome,
            Err(err) => {
                self.reject(&err);
                return;
            }
        };

        self.notify(NoticeLevel::Success, "Registered successfully");
        match &outcome.photo_upload {
            Some(StepStatus::Succeeded) => {
                self.notify(NoticeLevel::Success, "Photo saved in auth store")
            }
            Some(StepStatus::Failed(_)) => {
                self.notify(NoticeLevel::Error, "Failed to save photo in auth store")
            }
            None => {}
        }
        match &outcome.face_enrollment {
            Some(StepStatus::Succeeded) => {
                self.notify(NoticeLevel::Success, "Face registered with recognition service")
            }
            Some(StepStatus::Failed(_)) => {
                self.notify(NoticeLevel::Error, "Face registration failed")
            }
            None => {}
        }
        self.register.clear_inputs();
    }

    fn finish_login(&mut self, result: Result<Session, ClientError>) -> Option<Effect> {
        let session = match result {
            Ok(session) => session,
            Err(err) => {
                self.reject(&err);
                return None;
            }
        };

        self.notify(NoticeLevel::Success, "Login successful");
        let role = session.user.role.clone();
        self.session = Some(session);
        match role {
            Role::Faculty => {
                self.screen = Screen::Faculty;
                self.notify(NoticeLevel::Info, "Faculty logged in");
                None
            }
            Role::Student => {
                self.screen = Screen::Student;
                self.notify(NoticeLevel::Info, "Student logged in");
                self.begin_fetch_attendance().map(Effect::FetchAttendance)
            }
            Role::Unknown(raw) => {
                debug!(role = %raw, "rejecting session with unknown role");
                self.session = None;
                self.screen = Screen::Auth(AuthTab::Login);
                self.notify(NoticeLevel::Error, "Unknown role detected!");
                None
            }
        }
    }

    /// Builds the CSV for the last recognition. Validation failures are
    /// reported as notifications and nothing is returned.
    pub fn export_csv(&mut self) -> Option<CsvExport> {
        let names = self
            .last_recognized
            .as_ref()
            .map(|result| result.recognized.as_slice())
            .unwrap_or_default();
        match export::build_csv(&self.faculty.export_date, names) {
            Ok(export) => Some(export),
            Err(err) => {
                self.reject(&err);
                None
            }
        }
    }

    pub fn export_written(&mut self, path: &Path) {
        self.notify(
            NoticeLevel::Success,
            format!("Attendance CSV exported to {}", path.display()),
        );
    }

    pub fn export_failed(&mut self, reason: impl fmt::Display) {
        self.notify(NoticeLevel::Error, format!("Could not write CSV: {reason}"));
    }

    /// Back to the login tab with nothing carried over from the signed-in
    /// user.
    pub fn logout(&mut self) {
        self.session = None;
        self.last_recognized = None;
        self.attendance = AttendanceView::Idle;
        self.login = LoginDraft::default();
        self.register = RegisterDraft::default();
        self.faculty = FacultyDraft {
            export_date: export::today(),
            ..FacultyDraft::default()
        };
        self.busy.clear();
        self.generation = self.generation.wrapping_add(1);
        self.screen = Screen::Auth(AuthTab::Login);
        self.notify(NoticeLevel::Info, "Logged out successfully");
    }
}

#[cfg(test)]
#[path = "tests/state_tests.rs"]
mod tests;
