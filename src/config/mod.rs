// src/config/mod.rs
pub mod keywords;
pub mod relay;

pub use relay::{default_window, DriveSettings, RelayConfig, SourceSettings};
