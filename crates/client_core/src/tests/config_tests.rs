use super::*;

use std::{
    env,
    time::{SystemTime, UNIX_EPOCH},
};

fn lookup_from<'a>(pairs: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
    move |name| {
        pairs
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.to_string())
    }
}

#[test]
fn defaults_point_at_local_backends() {
    let settings = Settings::default().validated().expect("defaults valid");
    assert_eq!(settings.auth_base_url, "http://localhost:5501/api/auth");
    assert_eq!(settings.recognition_base_url, "http://localhost:5500");
    assert_eq!(settings.default_session_label, "Default Lecture");
}

#[test]
fn trims_trailing_slashes_from_base_urls() {
    assert_eq!(
        normalize_base_url(" http://10.0.0.5:5500/ ").expect("valid"),
        "http://10.0.0.5:5500"
    );
    assert_eq!(
        normalize_base_url("https://auth.example.edu/api/auth//").expect("valid"),
        "https://auth.example.edu/api/auth"
    );
}

#[test]
fn rejects_non_http_base_urls() {
    assert!(normalize_base_url("ftp://example.edu").is_err());
    assert!(normalize_base_url("not a url").is_err());
    assert!(normalize_base_url("   ").is_err());
}

#[test]
fn env_overrides_win_over_file_values() {
    let mut settings = Settings::default();
    apply_file_overrides(
        &mut settings,
        r#"
auth_base_url = "http://file-auth:1/api/auth"
recognition_base_url = "http://file-face:2"
default_session_label = "Morning"
"#,
    )
    .expect("parse file");

    apply_env_overrides(
        &mut settings,
        lookup_from(&[
            ("AUTH_BASE_URL", "http://plain-env:3/api/auth"),
            ("APP__AUTH_BASE_URL", "http://app-env:4/api/auth"),
        ]),
    );

    assert_eq!(settings.auth_base_url, "http://app-env:4/api/auth");
    assert_eq!(settings.recognition_base_url, "http://file-face:2");
    assert_eq!(settings.default_session_label, "Morning");
}

#[test]
fn blank_session_label_falls_back_to_default() {
    let settings = Settings {
        default_session_label: "  ".into(),
        ..Settings::default()
    }
    .validated()
    .expect("valid");
    assert_eq!(settings.default_session_label, DEFAULT_SESSION_LABEL);
}

#[test]
fn configured_export_dir_takes_precedence() {
    let settings = Settings {
        export_dir: Some(PathBuf::from("/tmp/attendance-exports")),
        ..Settings::default()
    };
    assert_eq!(
        settings.resolved_export_dir(),
        PathBuf::from("/tmp/attendance-exports")
    );
}

#[test]
fn loads_settings_file_from_disk() {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let temp_root = env::temp_dir().join(format!("attendance_settings_test_{suffix}"));
    fs::create_dir_all(&temp_root).expect("temp root");
    let path = temp_root.join("attendance.toml");
    fs::write(&path, "recognition_base_url = \"http://face-host:9000/\"\n").expect("write");

    let mut settings = Settings::default();
    let raw = fs::read_to_string(&path).expect("read back");
    apply_file_overrides(&mut settings, &raw).expect("parse");
    let settings = settings.validated().expect("valid");
    assert_eq!(settings.recognition_base_url, "http://face-host:9000");

    fs::remove_dir_all(temp_root).expect("cleanup");
}

#[test]
fn malformed_settings_file_is_reported() {
    let mut settings = Settings::default();
    assert!(apply_file_overrides(&mut settings, "auth_base_url = [1, 2").is_err());
}
