use std::path::PathBuf;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand, ValueEnum};
use client_core::{
    config::{load_settings_from, SETTINGS_FILE},
    export::{build_csv, write_export},
    AttendanceClient, ClientError, LoginForm, PendingRecognition, PendingRegistration,
    RegistrationForm, Settings, StepStatus,
};
use shared::domain::{Role, UserId};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "attendance-cli", about = "Classroom attendance client")]
struct Args {
    /// Settings file; missing files fall back to defaults and env.
    #[arg(long, default_value = SETTINGS_FILE)]
    config: PathBuf,
    #[arg(long)]
    auth_url: Option<String>,
    #[arg(long)]
    recognition_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create an account; students may attach a face photo.
    Register {
        #[arg(long, value_enum, default_value_t = RoleArg::Student)]
        role: RoleArg,
        #[arg(long, default_value = "")]
        id: String,
        #[arg(long, default_value = "")]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        photo: Option<PathBuf>,
    },
    /// Sign in. Students also get their attendance history.
    Login {
        #[arg(long, value_enum, default_value_t = RoleArg::Student)]
        role: RoleArg,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Submit a classroom image and list who was recognized.
    Recognize {
        #[arg(long)]
        image: PathBuf,
        #[arg(long, default_value = "")]
        session: String,
        #[arg(long)]
        marked_by: Option<String>,
        /// Also write the result as CSV for this date (YYYY-MM-DD).
        #[arg(long)]
        export_date: Option<String>,
    },
    /// Print a student's attendance history.
    Attendance {
        #[arg(long)]
        user_id: String,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum RoleArg {
    Faculty,
    Student,
}

impl From<RoleArg> for Role {
    fn from(value: RoleArg) -> Self {
        match value {
            RoleArg::Faculty => Role::Faculty,
            RoleArg::Student => Role::Student,
        }
    }
}

fn settings_for(args: &Args) -> Result<Settings> {
    let mut settings = load_settings_from(&args.config)?;
    if let Some(url) = &args.auth_url {
        settings.auth_base_url = url.clone();
    }
    if let Some(url) = &args.recognition_url {
        settings.recognition_base_url = url.clone();
    }
    settings.validated()
}

fn user_facing(err: ClientError) -> anyhow::Error {
    tracing::debug!("request failed: {err}");
    anyhow!(err.notice())
}

fn print_step(label: &str, step: &Option<StepStatus>) {
    match step {
        Some(StepStatus::Succeeded) => println!("{label}: ok"),
        Some(StepStatus::Failed(err)) => println!("{label}: {}", err.notice()),
        None => {}
    }
}

async fn print_attendance(client: &AttendanceClient, user_id: Option<&UserId>) -> Result<()> {
    match client.fetch_attendance(user_id).await {
        Ok(history) if history.has_records() => {
            for record in &history.records {
                println!(
                    "{}  {}  {}",
                    record.date,
                    record.lecture_label(),
                    record.status
                );
            }
            println!("Total Present: {}", history.count);
        }
        Ok(_) | Err(ClientError::Backend { .. }) => println!("No attendance records found."),
        Err(err) => return Err(user_facing(err)),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();
    let settings = settings_for(&args)?;
    let client = AttendanceClient::new(&settings);

    match args.command {
        Command::Register {
            role,
            id,
            name,
            email,
            password,
            photo,
        } => {
            let pending = PendingRegistration {
                form: RegistrationForm {
                    role: role.into(),
                    id,
                    name,
                    email,
                    password,
                    photo: None,
                },
                photo_path: photo,
            };
            let outcome = client.register_pending(pending).await.map_err(user_facing)?;
            println!("Registered successfully: {}", outcome.email);
            print_step("photo upload", &outcome.photo_upload);
            print_step("face enrollment", &outcome.face_enrollment);
        }
        Command::Login {
            role,
            email,
            password,
        } => {
            let session = client
                .login(LoginForm {
                    role: role.into(),
                    email,
                    password,
                })
                .await
                .map_err(user_facing)?;
            match &session.user.role {
                Role::Faculty => println!("Faculty logged in: {}", session.user.display_name()),
                Role::Student => {
                    println!("Student logged in: {}", session.user.display_name());
                    print_attendance(&client, session.user.usable_id()).await?;
                }
                Role::Unknown(_) => return Err(anyhow!("Unknown role detected!")),
            }
        }
        Command::Recognize {
            image,
            session,
            marked_by,
            export_date,
        } => {
            let request = PendingRecognition {
                image_path: image,
                session_label: session,
                marked_by: marked_by.map(UserId::new),
                generation: 0,
            }
            .load()
            .await
            .map_err(user_facing)?;
            let result = client.recognize(request).await.map_err(user_facing)?;
            println!("{}", result.session_line());
            println!("{}", result.present_line());

            if let Some(date) = export_date {
                let export = build_csv(&date, &result.recognized).map_err(user_facing)?;
                let path = write_export(&settings.resolved_export_dir(), &export)?;
                println!("Attendance CSV exported to {}", path.display());
            }
        }
        Command::Attendance { user_id } => {
            print_attendance(&client, Some(&UserId::new(user_id))).await?;
        }
    }

    Ok(())
}
