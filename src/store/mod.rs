// src/store/mod.rs
//! Durable sinks: dated JSON files on disk and uploads to Google Drive.

pub mod drive;
pub mod google_auth;
pub mod json_file;

pub use drive::{DriveUploader, Uploader};
pub use google_auth::{DriveAuth, ServiceAccountKey};
pub use json_file::{JsonFileStore, PathTemplate};
