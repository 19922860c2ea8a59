use std::{
    path::PathBuf,
    time::{Duration, Instant},
};

use client_core::{
    export,
    state::{Action, AppState, AttendanceView, AuthTab, NoticeLevel, Notification, Screen},
    Settings,
};
use crossbeam_channel::{Receiver, Sender};
use eframe::egui;
use shared::domain::Role;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::{
    events::UiEvent,
    orchestration::{dispatch_backend_command, run_effect},
};

const TOAST_TTL: Duration = Duration::from_secs(3);
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "webp"];

#[derive(Debug, Clone)]
struct Toast {
    level: NoticeLevel,
    message: String,
    shown_at: Instant,
}

impl Toast {
    fn new(notification: Notification, now: Instant) -> Self {
        Self {
            level: notification.level,
            message: notification.message,
            shown_at: now,
        }
    }

    fn expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.shown_at) >= TOAST_TTL
    }

    fn fill(&self) -> egui::Color32 {
        match self.level {
            NoticeLevel::Info => egui::Color32::from_rgb(52, 73, 110),
            NoticeLevel::Success => egui::Color32::from_rgb(46, 110, 70),
            NoticeLevel::Error => egui::Color32::from_rgb(111, 53, 53),
        }
    }
}

fn role_label(role: &Role) -> &'static str {
    match role {
        Role::Faculty => "Faculty",
        Role::Student => "Student",
        Role::Unknown(_) => "Unknown",
    }
}

fn pick_image(title: &str) -> Option<PathBuf> {
    rfd::FileDialog::new()
        .set_title(title)
        .add_filter("Images", IMAGE_EXTENSIONS)
        .pick_file()
}

fn file_label(path: Option<&PathBuf>) -> String {
    path.and_then(|p| p.file_name())
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "No file chosen".to_string())
}

fn role_combo(ui: &mut egui::Ui, id: &str, role: &mut Role) {
    egui::ComboBox::from_id_salt(id)
        .selected_text(role_label(role))
        .show_ui(ui, |ui| {
            ui.selectable_value(role, Role::Student, role_label(&Role::Student));
            ui.selectable_value(role, Role::Faculty, role_label(&Role::Faculty));
        });
}

pub struct AttendanceApp {
    cmd_tx: Sender<BackendCommand>,
    ui_rx: Receiver<UiEvent>,
    state: AppState,
    toasts: Vec<Toast>,
    worker_status: String,
    export_dir: PathBuf,
    default_session_label: String,
}

impl AttendanceApp {
    pub fn new(
        cmd_tx: Sender<BackendCommand>,
        ui_rx: Receiver<UiEvent>,
        settings: &Settings,
    ) -> Self {
        Self {
            cmd_tx,
            ui_rx,
            state: AppState::new(),
            toasts: Vec::new(),
            worker_status: "Backend worker not started".to_string(),
            export_dir: settings.resolved_export_dir(),
            default_session_label: settings.default_session_label.clone(),
        }
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.state.notify(NoticeLevel::Error, message);
    }

    fn process_ui_events(&mut self) {
        while let Ok(event) = self.ui_rx.try_recv() {
            match event {
                UiEvent::Info(message) => self.worker_status = message,
                UiEvent::StartupFailed(message) => {
                    self.worker_status = message.clone();
                    self.state.notify(NoticeLevel::Error, message);
                }
                UiEvent::App(event) => {
                    if let Some(effect) = self.state.apply(event) {
                        run_effect(&self.cmd_tx, effect, &mut self.state);
                    }
                }
            }
        }
    }

    fn collect_toasts(&mut self, now: Instant) {
        self.toasts
            .extend(self.state.drain_notifications().into_iter().map(|n| Toast::new(n, now)));
        self.toasts.retain(|toast| !toast.expired(now));
    }

    fn show_toasts(&self, ctx: &egui::Context) {
        if self.toasts.is_empty() {
            return;
        }
        egui::Area::new(egui::Id::new("toasts"))
            .anchor(egui::Align2::RIGHT_TOP, [-12.0, 12.0])
            .order(egui::Order::Foreground)
            .show(ctx, |ui| {
                for toast in &self.toasts {
                    egui::Frame::NONE
                        .fill(toast.fill())
                        .corner_radius(8.0)
                        .inner_margin(egui::Margin::symmetric(10, 8))
                        .show(ui, |ui| {
                            ui.label(
                                egui::RichText::new(&toast.message).color(egui::Color32::WHITE),
                            );
                        });
                    ui.add_space(6.0);
                }
            });
    }

    fn show_auth_screen(&mut self, ctx: &egui::Context, tab: AuthTab) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let avail = ui.available_size();
            ui.add_space((avail.y * 0.1).clamp(12.0, 80.0));
            ui.vertical_centered(|ui| {
                ui.set_width(avail.x.clamp(360.0, 460.0));
                ui.heading("Smart Attendance");
                ui.weak(&self.worker_status);
                ui.add_space(10.0);

                ui.horizontal(|ui| {
                    if ui.selectable_label(tab == AuthTab::Login, "Login").clicked() {
                        self.state.select_tab(AuthTab::Login);
                    }
                    if ui
                        .selectable_label(tab == AuthTab::Register, "Register")
                        .clicked()
                    {
                        self.state.select_tab(AuthTab::Register);
                    }
                });
                ui.separator();

                egui::Frame::NONE
                    .fill(ui.visuals().faint_bg_color)
                    .corner_radius(12.0)
                    .inner_margin(egui::Margin::symmetric(14, 12))
                    .show(ui, |ui| match tab {
                        AuthTab::Login => self.show_login_form(ui),
                        AuthTab::Register => self.show_register_form(ui),
                    });
            });
        });
    }

    fn show_login_form(&mut self, ui: &mut egui::Ui) {
        let draft = &mut self.state.login;
        role_combo(ui, "login_role", &mut draft.role);
        ui.add(egui::TextEdit::singleline(&mut draft.email).hint_text("Email"));
        let password = ui.add(
            egui::TextEdit::singleline(&mut draft.password)
                .password(true)
                .hint_text("Password"),
        );
        let submit_on_enter =
            password.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));

        let busy = self.state.is_busy(Action::Login);
        let label = if busy { "Signing in..." } else { "Login" };
        if ui.add_enabled(!busy, egui::Button::new(label)).clicked() || submit_on_enter {
            if let Some(form) = self.state.begin_login() {
                dispatch_backend_command(&self.cmd_tx, BackendCommand::Login(form), &mut self.state);
            }
        }
    }

    fn show_register_form(&mut self, ui: &mut egui::Ui) {
        let mut role = self.state.register.role.clone();
        role_combo(ui, "register_role", &mut role);
        if role != self.state.register.role {
            self.state.set_register_role(role);
        }

        let draft = &mut self.state.register;
        ui.add(egui::TextEdit::singleline(&mut draft.id).hint_text("ID"));
        ui.add(egui::TextEdit::singleline(&mut draft.name).hint_text("Full name"));
        ui.add(egui::TextEdit::singleline(&mut draft.email).hint_text("Email"));
        ui.add(
            egui::TextEdit::singleline(&mut draft.password)
                .password(true)
                .hint_text("Password"),
        );

        if draft.shows_photo_field() {
            ui.horizontal(|ui| {
                if ui.button("Choose photo...").clicked() {
                    if let Some(path) = pick_image("Face photo") {
                        draft.photo_path = Some(path);
                    }
                }
                ui.label(file_label(draft.photo_path.as_ref()));
            });
        }

        let busy = self.state.is_busy(Action::Register);
        let label = if busy { "Registering..." } else { "Register" };
        if ui.add_enabled(!busy, egui::Button::new(label)).clicked() {
            if let Some(pending) = self.state.begin_register() {
                dispatch_backend_command(
                    &self.cmd_tx,
                    BackendCommand::Register(pending),
                    &mut self.state,
                );
            }
        }
    }

    fn show_top_bar(&mut self, ctx: &egui::Context, title: &str) {
        egui::TopBottomPanel::top("dashboard_top_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading(title);
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.button("Logout").clicked() {
                        self.state.logout();
                    }
                    if let Some(session) = &self.state.session {
                        ui.label(format!("Welcome, {}", session.user.display_name()));
                    }
                });
            });
        });
    }

    fn show_faculty_dashboard(&mut self, ctx: &egui::Context) {
        self.show_top_bar(ctx, "Faculty Dashboard");
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("Take attendance");
            ui.horizontal(|ui| {
                if ui.button("Choose classroom image...").clicked() {
                    if let Some(path) = pick_image("Classroom image") {
                        self.state.faculty.image_path = Some(path);
                    }
                }
                ui.label(file_label(self.state.faculty.image_path.as_ref()));
            });
            ui.add(
                egui::TextEdit::singleline(&mut self.state.faculty.session_label)
                    .hint_text(self.default_session_label.as_str()),
            );

            let busy = self.state.is_busy(Action::Recognize);
            let label = if busy { "Processing..." } else { "Upload & Recognize" };
            if ui.add_enabled(!busy, egui::Button::new(label)).clicked() {
                if let Some(pending) = self.state.begin_recognize() {
                    dispatch_backend_command(
                        &self.cmd_tx,
                        BackendCommand::Recognize(pending),
                        &mut self.state,
                    );
                }
            }

            if let Some(result) = &self.state.last_recognized {
                ui.add_space(8.0);
                ui.strong(result.session_line());
                ui.label(result.present_line());
            }

            ui.separator();
            ui.heading("Export");
            ui.horizontal(|ui| {
                ui.add(
                    egui::TextEdit::singleline(&mut self.state.faculty.export_date)
                        .hint_text("YYYY-MM-DD")
                        .desired_width(110.0),
                );
                if ui.button("Export CSV").clicked() {
                    self.export_attendance();
                }
            });
            ui.weak(format!("Saved to {}", self.export_dir.display()));
        });
    }

    fn export_attendance(&mut self) {
        let Some(csv) = self.state.export_csv() else {
            return;
        };
        match export::write_export(&self.export_dir, &csv) {
            Ok(path) => {
                tracing::info!(path = %path.display(), "attendance csv written");
                self.state.export_written(&path);
            }
            Err(err) => {
                tracing::warn!("failed to write attendance csv: {err}");
                self.state.export_failed(err);
            }
        }
    }

    fn show_student_dashboard(&mut self, ctx: &egui::Context) {
        self.show_top_bar(ctx, "Student Dashboard");
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("My attendance");
                let busy = self.state.is_busy(Action::FetchAttendance);
                if ui.add_enabled(!busy, egui::Button::new("Refresh")).clicked() {
                    if let Some(pending) = self.state.begin_fetch_attendance() {
                        dispatch_backend_command(
                            &self.cmd_tx,
                            BackendCommand::FetchAttendance(pending),
                            &mut self.state,
                        );
                    }
                }
            });
            match &self.state.attendance {
                AttendanceView::Idle => {}
                AttendanceView::Loading { student } => {
                    ui.horizontal(|ui| {
                        ui.spinner();
                        ui.label(format!("Loading attendance for {student}..."));
                    });
                }
                AttendanceView::Loaded(history) => {
                    egui::ScrollArea::vertical().show(ui, |ui| {
                        egui::Grid::new("attendance_records")
                            .striped(true)
                            .num_columns(3)
                            .show(ui, |ui| {
                                ui.strong("Date");
                                ui.strong("Lecture");
                                ui.strong("Status");
                                ui.end_row();
                                for record in &history.records {
                                    ui.label(&record.date);
                                    ui.label(record.lecture_label());
                                    ui.label(&record.status);
                                    ui.end_row();
                                }
                            });
                    });
                    ui.add_space(6.0);
                    ui.strong(format!("Total Present: {}", history.count));
                }
                AttendanceView::Empty => {
                    ui.label("No attendance records found.");
                }
                AttendanceView::Failed(message) => {
                    let color = ui.visuals().error_fg_color;
                    ui.colored_label(color, message);
                }
            }
        });
    }
}

impl eframe::App for AttendanceApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_ui_events();

        match self.state.screen {
            Screen::Auth(tab) => self.show_auth_screen(ctx, tab),
            Screen::Faculty => self.show_faculty_dashboard(ctx),
            Screen::Student => self.show_student_dashboard(ctx),
        }

        self.collect_toasts(Instant::now());
        self.show_toasts(ctx);
        ctx.request_repaint_after(Duration::from_millis(100));
    }
}

#[cfg(test)]
mod tests {
    use client_core::{
        state::AppEvent,
        ClientError, Operation,
    };
    use crossbeam_channel::bounded;
    use shared::domain::{Session, UserId, UserProfile};

    use super::*;

    fn app() -> (AttendanceApp, Sender<UiEvent>, Receiver<BackendCommand>) {
        let (cmd_tx, cmd_rx) = bounded(8);
        let (ui_tx, ui_rx) = bounded(8);
        let app = AttendanceApp::new(cmd_tx, ui_rx, &Settings::default());
        (app, ui_tx, cmd_rx)
    }

    fn student_session() -> Session {
        Session {
            token: "tok".into(),
            user: UserProfile {
                id: Some(UserId::new("S-1")),
                name: Some("Sam".into()),
                email: None,
                role: Role::Student,
            },
        }
    }

    #[test]
    fn student_login_event_queues_attendance_fetch() {
        let (mut app, ui_tx, cmd_rx) = app();
        ui_tx
            .send(UiEvent::App(AppEvent::LoginFinished(Ok(student_session()))))
            .expect("send");

        app.process_ui_events();

        assert_eq!(app.state.screen, Screen::Student);
        match cmd_rx.try_recv() {
            Ok(BackendCommand::FetchAttendance(pending)) => {
                assert_eq!(pending.user_id, UserId::new("S-1"));
                assert_eq!(pending.generation, app.state.generation());
            }
            other => panic!("expected attendance fetch, got {other:?}"),
        }
        assert!(app.state.is_busy(Action::FetchAttendance));
    }

    #[test]
    fn attendance_reply_arriving_after_logout_is_ignored() {
        let (mut app, ui_tx, cmd_rx) = app();
        ui_tx
            .send(UiEvent::App(AppEvent::LoginFinished(Ok(student_session()))))
            .expect("send");
        app.process_ui_events();
        let pending = match cmd_rx.try_recv() {
            Ok(BackendCommand::FetchAttendance(pending)) => pending,
            other => panic!("expected attendance fetch, got {other:?}"),
        };

        app.state.logout();
        ui_tx
            .send(UiEvent::App(AppEvent::AttendanceFinished {
                generation: pending.generation,
                result: Err(ClientError::Connectivity {
                    operation: Operation::FetchAttendance,
                    detail: "reset".into(),
                }),
            }))
            .expect("send");
        app.process_ui_events();

        assert_eq!(app.state.attendance, AttendanceView::Idle);
        assert!(!app.state.is_busy(Action::FetchAttendance));
    }

    #[test]
    fn startup_failure_is_shown_as_error_toast() {
        let (mut app, ui_tx, _cmd_rx) = app();
        ui_tx
            .send(UiEvent::StartupFailed("runtime unavailable".into()))
            .expect("send");

        app.process_ui_events();
        app.collect_toasts(Instant::now());

        assert_eq!(app.worker_status, "runtime unavailable");
        assert_eq!(app.toasts.len(), 1);
        assert_eq!(app.toasts[0].level, NoticeLevel::Error);
    }

    #[test]
    fn toasts_expire_after_three_seconds() {
        let (mut app, ui_tx, _cmd_rx) = app();
        ui_tx
            .send(UiEvent::App(AppEvent::RecognitionFinished {
                generation: app.state.generation(),
                result: Err(ClientError::Connectivity {
                    operation: Operation::Recognize,
                    detail: "refused".into(),
                }),
            }))
            .expect("send");
        app.process_ui_events();

        let shown = Instant::now();
        app.collect_toasts(shown);
        assert_eq!(app.toasts[0].message, "Recognition server not reachable");

        app.collect_toasts(shown + Duration::from_millis(2_900));
        assert_eq!(app.toasts.len(), 1);
        app.collect_toasts(shown + TOAST_TTL);
        assert!(app.toasts.is_empty());
    }

    #[test]
    fn export_writes_into_configured_directory() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let dir = tmp.path().join("exports");
        let (cmd_tx, _cmd_rx) = bounded(1);
        let (_ui_tx, ui_rx) = bounded(1);
        let settings = Settings {
            export_dir: Some(dir.clone()),
            ..Settings::default()
        };
        let mut app = AttendanceApp::new(cmd_tx, ui_rx, &settings);
        let generation = app.state.generation();
        app.state.apply(AppEvent::RecognitionFinished {
            generation,
            result: Ok(shared::domain::RecognitionResult {
                session_label: "Algorithms".into(),
                recognized: vec!["Alice".into()],
            }),
        });
        app.state.faculty.export_date = "2024-05-06".into();

        app.export_attendance();

        let written = std::fs::read_to_string(dir.join("attendance_2024-05-06.csv")).expect("csv");
        assert_eq!(written, "#,Name\n1,Alice");
    }

    #[test]
    fn file_label_shows_only_the_name() {
        assert_eq!(file_label(None), "No file chosen");
        assert_eq!(
            file_label(Some(&PathBuf::from("/tmp/photos/me.jpg"))),
            "me.jpg"
        );
    }
}
