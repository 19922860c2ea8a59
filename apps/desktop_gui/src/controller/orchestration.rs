//! Command orchestration helpers from UI actions to backend command queue.

use client_core::{
    state::{AppEvent, AppState, Effect},
    ClientError, Operation,
};
use crossbeam_channel::{Sender, TrySendError};

use crate::backend_bridge::commands::BackendCommand;

/// Queues `cmd` for the worker. When the queue refuses it, the matching flow
/// is finished as a connectivity failure so its busy flag is released.
pub fn dispatch_backend_command(
    cmd_tx: &Sender<BackendCommand>,
    cmd: BackendCommand,
    state: &mut AppState,
) {
    let cmd_name = cmd.name();
    let (cmd, reason) = match cmd_tx.try_send(cmd) {
        Ok(()) => {
            tracing::debug!(command = cmd_name, "queued ui->backend command");
            return;
        }
        Err(TrySendError::Full(cmd)) => {
            tracing::warn!(command = cmd_name, "ui command queue is full");
            (cmd, "UI command queue is full; please retry")
        }
        Err(TrySendError::Disconnected(cmd)) => {
            tracing::warn!(command = cmd_name, "backend command processor disconnected");
            (cmd, "backend command processor disconnected")
        }
    };
    state.apply(refused(cmd, reason));
}

pub fn run_effect(cmd_tx: &Sender<BackendCommand>, effect: Effect, state: &mut AppState) {
    match effect {
        Effect::FetchAttendance(pending) => {
            dispatch_backend_command(cmd_tx, BackendCommand::FetchAttendance(pending), state)
        }
    }
}

fn refused(cmd: BackendCommand, reason: &str) -> AppEvent {
    let err = |operation| ClientError::Connectivity {
        operation,
        detail: reason.to_string(),
    };
    match cmd {
        BackendCommand::Register(_) => AppEvent::RegistrationFinished(Err(err(Operation::Register))),
        BackendCommand::Login(_) => AppEvent::LoginFinished(Err(err(Operation::Login))),
        BackendCommand::Recognize(pending) => AppEvent::RecognitionFinished {
            generation: pending.generation,
            result: Err(err(Operation::Recognize)),
        },
        BackendCommand::FetchAttendance(pending) => AppEvent::AttendanceFinished {
            generation: pending.generation,
            result: Err(err(Operation::FetchAttendance)),
        },
    }
}

#[cfg(test)]
mod tests {
    use client_core::{
        state::{Action, AttendanceView},
        PendingAttendance,
    };
    use crossbeam_channel::bounded;
    use shared::domain::UserId;

    use super::*;

    fn login_state() -> AppState {
        let mut state = AppState::new();
        state.login.email = "ada@uni.edu".into();
        state.login.password = "pw".into();
        state
    }

    #[test]
    fn queued_command_keeps_flow_busy() {
        let (cmd_tx, cmd_rx) = bounded(1);
        let mut state = login_state();
        let form = state.begin_login().expect("valid form");

        dispatch_backend_command(&cmd_tx, BackendCommand::Login(form), &mut state);

        assert!(state.is_busy(Action::Login));
        assert!(matches!(cmd_rx.try_recv(), Ok(BackendCommand::Login(_))));
    }

    #[test]
    fn disconnected_worker_releases_busy_flag() {
        let (cmd_tx, cmd_rx) = bounded(1);
        drop(cmd_rx);
        let mut state = login_state();
        let form = state.begin_login().expect("valid form");

        dispatch_backend_command(&cmd_tx, BackendCommand::Login(form), &mut state);

        assert!(!state.is_busy(Action::Login));
        let notices: Vec<_> = state
            .drain_notifications()
            .into_iter()
            .map(|n| n.message)
            .collect();
        assert_eq!(notices, vec!["Connection error. Ensure backend is running."]);
    }

    #[test]
    fn full_queue_marks_attendance_failed() {
        let (cmd_tx, _cmd_rx) = bounded(0);
        let mut state = AppState::new();

        run_effect(
            &cmd_tx,
            Effect::FetchAttendance(PendingAttendance {
                user_id: UserId::new("7"),
                generation: state.generation(),
            }),
            &mut state,
        );

        assert_eq!(
            state.attendance,
            AttendanceView::Failed("Error fetching attendance data.".into())
        );
    }
}
