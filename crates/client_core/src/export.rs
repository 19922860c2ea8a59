//! Attendance CSV export.
//!
//! The content is a plain comma/newline join. Names are not quoted or
//! escaped; recognized names never contain commas in practice.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use chrono::{Local, NaiveDate};

use crate::error::ClientError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvExport {
    pub file_name: String,
    pub contents: String,
}

pub fn build_csv(date: &str, names: &[String]) -> Result<CsvExport, ClientError> {
    let date = date.trim();
    if date.is_empty() {
        return Err(ClientError::validation("Select a date before exporting"));
    }
    if date.contains(['/', '\\']) {
        return Err(ClientError::validation(
            "Export date must not contain path separators",
        ));
    }
    if names.is_empty() {
        return Err(ClientError::validation("No attendance data to export"));
    }

    let mut rows = Vec::with_capacity(names.len() + 1);
    rows.push("#,Name".to_string());
    rows.extend(
        names
            .iter()
            .enumerate()
            .map(|(index, name)| format!("{},{name}", index + 1)),
    );

    Ok(CsvExport {
        file_name: format!("attendance_{date}.csv"),
        contents: rows.join("\n"),
    })
}

pub fn write_export(dir: &Path, export: &CsvExport) -> io::Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(&export.file_name);
    fs::write(&path, export.contents.as_bytes())?;
    Ok(path)
}

/// Today's local date in the `YYYY-MM-DD` form a date picker would produce.
pub fn today() -> String {
    Local::now().date_naive().format("%Y-%m-%d").to_string()
}

pub fn is_calendar_date(raw: &str) -> bool {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn builds_header_and_one_based_rows_without_trailing_newline() {
        let export = build_csv("2024-01-01", &names(&["Alice", "Bob"])).expect("export");
        assert_eq!(export.contents, "#,Name\n1,Alice\n2,Bob");
        assert_eq!(export.file_name, "attendance_2024-01-01.csv");
    }

    #[test]
    fn empty_date_is_rejected_before_anything_else() {
        let err = build_csv("  ", &[]).expect_err("must fail");
        assert_eq!(err.notice(), "Select a date before exporting");
    }

    #[test]
    fn empty_result_set_is_rejected() {
        let err = build_csv("2024-01-01", &[]).expect_err("must fail");
        assert_eq!(err.notice(), "No attendance data to export");
    }

    #[test]
    fn names_are_not_escaped() {
        let export = build_csv("2024-02-02", &names(&["Doe, Jane"])).expect("export");
        assert_eq!(export.contents, "#,Name\n1,Doe, Jane");
    }

    #[test]
    fn writes_into_the_requested_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        let export = build_csv("2024-03-03", &names(&["Ana"])).expect("export");
        let path = write_export(&dir.path().join("nested"), &export).expect("write");
        assert_eq!(path.file_name().and_then(|n| n.to_str()), Some("attendance_2024-03-03.csv"));
        assert_eq!(fs::read_to_string(path).expect("read"), "#,Name\n1,Ana");
    }

    #[test]
    fn today_is_a_calendar_date() {
        assert!(is_calendar_date(&today()));
        assert!(!is_calendar_date("01/02/2024"));
    }
}
