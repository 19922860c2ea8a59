//! Backend worker: owns the tokio runtime and the attendance client, answers
//! each queued command with one `UiEvent::App`.

use std::thread;

use client_core::{state::AppEvent, AttendanceClient, Settings};
use crossbeam_channel::{Receiver, Sender};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::UiEvent;

pub fn launch(cmd_rx: Receiver<BackendCommand>, ui_tx: Sender<UiEvent>, settings: Settings) {
    thread::spawn(move || {
        let _ = ui_tx.try_send(UiEvent::Info("Backend worker starting...".to_string()));
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                let _ = ui_tx.try_send(UiEvent::StartupFailed(format!(
                    "backend worker startup failure: failed to build runtime: {err}"
                )));
                tracing::error!("failed to build backend runtime: {err}");
                return;
            }
        };

        let client = AttendanceClient::new(&settings);
        tracing::info!(
            auth = %settings.auth_base_url,
            recognition = %settings.recognition_base_url,
            "backend worker ready"
        );
        let _ = ui_tx.try_send(UiEvent::Info("Backend worker ready".to_string()));

        while let Ok(cmd) = cmd_rx.recv() {
            let client = client.clone();
            let ui_tx = ui_tx.clone();
            runtime.spawn(async move {
                let event = execute(&client, cmd).await;
                if ui_tx.send(UiEvent::App(event)).is_err() {
                    tracing::debug!("ui closed before backend reply was delivered");
                }
            });
        }
        tracing::info!("command queue closed; backend worker stopping");
    });
}

async fn execute(client: &AttendanceClient, cmd: BackendCommand) -> AppEvent {
    match cmd {
        BackendCommand::Register(pending) => {
            AppEvent::RegistrationFinished(client.register_pending(pending).await)
        }
        BackendCommand::Login(form) => AppEvent::LoginFinished(client.login(form).await),
        BackendCommand::Recognize(pending) => {
            let generation = pending.generation;
            let result = match pending.load().await {
                Ok(request) => client.recognize(request).await,
                Err(err) => Err(err),
            };
            AppEvent::RecognitionFinished { generation, result }
        }
        BackendCommand::FetchAttendance(pending) => AppEvent::AttendanceFinished {
            generation: pending.generation,
            result: client.fetch_attendance(Some(&pending.user_id)).await,
        },
    }
}
