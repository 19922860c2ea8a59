use std::path::PathBuf;

mod backend_bridge;
mod controller;
mod ui;

use clap::Parser;
use client_core::{
    config::{load_settings_from, SETTINGS_FILE},
    Settings,
};
use crossbeam_channel::bounded;
use eframe::egui;
use tracing_subscriber::EnvFilter;

use backend_bridge::commands::BackendCommand;
use controller::events::UiEvent;
use ui::AttendanceApp;

#[derive(Parser, Debug)]
#[command(name = "attendance-gui")]
struct Args {
    #[arg(long, default_value = SETTINGS_FILE)]
    config: PathBuf,
    #[arg(long)]
    auth_url: Option<String>,
    #[arg(long)]
    recognition_url: Option<String>,
}

fn resolve_settings(args: &Args) -> anyhow::Result<Settings> {
    let mut settings = load_settings_from(&args.config)?;
    if let Some(url) = &args.auth_url {
        settings.auth_base_url = url.clone();
    }
    if let Some(url) = &args.recognition_url {
        settings.recognition_base_url = url.clone();
    }
    settings.validated()
}

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let args = Args::parse();

    let (cmd_tx, cmd_rx) = bounded::<BackendCommand>(64);
    let (ui_tx, ui_rx) = bounded::<UiEvent>(256);

    let (settings, settings_warning) = match resolve_settings(&args) {
        Ok(settings) => (settings, None),
        Err(err) => {
            tracing::error!("invalid settings, using defaults: {err:#}");
            (Settings::default(), Some(format!("Using default settings: {err}")))
        }
    };
    backend_bridge::runtime::launch(cmd_rx, ui_tx, settings.clone());

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Smart Attendance")
            .with_inner_size([960.0, 680.0])
            .with_min_inner_size([640.0, 480.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Smart Attendance",
        options,
        Box::new(move |_cc| {
            let mut app = AttendanceApp::new(cmd_tx, ui_rx, &settings);
            if let Some(warning) = settings_warning {
                app.warn(warning);
            }
            Ok(Box::new(app))
        }),
    )
}
