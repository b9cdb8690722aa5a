use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use crate::controller::ControllerSettings;
use crate::error::HostPolicyError;

use super::args::RunArgs;
use super::config::ConfigFile;

pub const DEFAULT_STORE_DIR: &str = "policies";

/// Everything `run` needs once config file and flags are merged
#[derive(Debug, Clone, PartialEq)]
pub struct RunSettings {
    pub dir: PathBuf,
    pub controller: ControllerSettings,
}

/// Merge settings from the config file and command line arguments
pub struct SettingsLoader;

impl SettingsLoader {
    /// Flags take precedence over the config file, which takes precedence over defaults
    pub fn load(config: Option<&Path>, args: &RunArgs) -> Result<RunSettings, HostPolicyError> {
        let file = match config {
            Some(path) => ConfigFile::load(path)?,
            None => ConfigFile::default(),
        };
        Self::merge(file, args)
    }

    fn merge(file: ConfigFile, args: &RunArgs) -> Result<RunSettings, HostPolicyError> {
        let defaults = ControllerSettings::default();
        let controller = file.controller;

        let workers = args
            .workers
            .or(controller.workers)
            .unwrap_or(defaults.workers);
        if workers == 0 {
            return Err(HostPolicyError::InvalidSetting {
                name: "workers",
                reason: "must be at least 1".to_string(),
            });
        }

        let poll_interval = args
            .poll_interval_ms
            .or(controller.poll_interval_ms)
            .map(Duration::from_millis)
            .unwrap_or(defaults.poll_interval);
        if poll_interval.is_zero() {
            return Err(HostPolicyError::InvalidSetting {
                name: "poll_interval_ms",
                reason: "must be greater than 0".to_string(),
            });
        }

        let retry_backoff = args
            .retry_backoff_ms
            .or(controller.retry_backoff_ms)
            .map(Duration::from_millis)
            .unwrap_or(defaults.retry_backoff);

        // The flag can only switch deletion on
        let delete_invalid = args.delete_invalid || controller.delete_invalid.unwrap_or(false);

        let dir = args
            .dir
            .clone()
            .or(file.store.dir)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STORE_DIR));

        Ok(RunSettings {
            dir,
            controller: ControllerSettings {
                workers,
                poll_interval,
                retry_backoff,
                delete_invalid,
            },
        })
    }
}
