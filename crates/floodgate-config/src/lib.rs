#![forbid(unsafe_code)]
#![warn(
    unused,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    rustdoc::broken_intra_doc_links,
    missing_docs
)]

//! Configuration for Floodgate: the engine settings translation table and
//! environment-driven process configuration.

pub mod app;
pub mod error;
pub mod settings;

pub use app::AppConfig;
pub use error::{ConfigError, ConfigResult};
pub use settings::{SettingDescriptor, SettingsTable, Transform};
