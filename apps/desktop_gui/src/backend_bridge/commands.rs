//! Backend commands queued from UI to backend worker.

use client_core::{LoginForm, PendingAttendance, PendingRecognition, PendingRegistration};

#[derive(Debug)]
pub enum BackendCommand {
    Register(PendingRegistration),
    Login(LoginForm),
    Recognize(PendingRecognition),
    FetchAttendance(PendingAttendance),
}

impl BackendCommand {
    pub fn name(&self) -> &'static str {
        match self {
            BackendCommand::Register(_) => "register",
            BackendCommand::Login(_) => "login",
            BackendCommand::Recognize(_) => "recognize",
            BackendCommand::FetchAttendance(_) => "fetch_attendance",
        }
    }
}
