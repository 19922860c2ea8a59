//! UI layer for the attendance desktop GUI.

pub mod app;

pub use app::AttendanceApp;
