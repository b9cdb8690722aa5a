pub mod args;
pub mod check;
pub mod config;
pub mod loader;

pub use args::{Args, Command, RunArgs};
pub use check::{CheckResult, check_manifests};
pub use config::ConfigFile;
pub use loader::{RunSettings, SettingsLoader};
