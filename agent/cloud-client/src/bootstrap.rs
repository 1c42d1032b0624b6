/*!

The `bootstrap` module reads the settings that a [`ClientFactory`] needs from the process
environment and prepares the shared state directory.

[`ClientFactory`]: crate::ClientFactory

!*/

use crate::connector::DEFAULT_API_TIMEOUT;
use cloud_model::constants::{
    ENV_API_TIMEOUT_SECS, ENV_EDIT_PROFILE_URL, ENV_PLUGIN_DATA_DIR, STATE_DIRECTORY_NAME,
};
use log::debug;
use snafu::{ResultExt, Snafu};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// The public error type for [`FactorySettings`].
#[derive(Debug, Snafu)]
pub struct BootstrapError(InnerError);

#[derive(Debug, Snafu)]
pub(crate) enum InnerError {
    #[snafu(display("Unable to read environment variable: '{}': {}", key, source))]
    EnvRead {
        key: String,
        source: std::env::VarError,
    },

    #[snafu(display("Unable to parse '{}' as a timeout in seconds: {}", value, source))]
    BadTimeout {
        value: String,
        source: std::num::ParseIntError,
    },

    #[snafu(display("Unable to create state directory '{}': {}", path.display(), source))]
    CreateDirectory {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// The host-provided settings of a [`ClientFactory`].
///
/// [`ClientFactory`]: crate::ClientFactory
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FactorySettings {
    /// The plugin's data directory. The instance index lives in a subdirectory of it.
    pub plugin_data_dir: PathBuf,
    /// Passed through to the host as the profile settings page.
    pub edit_profile_url: Option<String>,
    /// The timeout of each management API call.
    pub api_timeout: Duration,
}

impl FactorySettings {
    pub fn new<P: Into<PathBuf>>(plugin_data_dir: P) -> Self {
        Self {
            plugin_data_dir: plugin_data_dir.into(),
            edit_profile_url: None,
            api_timeout: DEFAULT_API_TIMEOUT,
        }
    }

    pub fn from_env() -> Result<FactorySettings, BootstrapError> {
        let plugin_data_dir = std::env::var(ENV_PLUGIN_DATA_DIR).context(EnvReadSnafu {
            key: ENV_PLUGIN_DATA_DIR,
        })?;
        let edit_profile_url = std::env::var(ENV_EDIT_PROFILE_URL)
            .ok()
            .filter(|s| !s.trim().is_empty());
        let api_timeout = match std::env::var(ENV_API_TIMEOUT_SECS) {
            Ok(value) => Duration::from_secs(
                value
                    .trim()
                    .parse::<u64>()
                    .context(BadTimeoutSnafu { value: &value })?,
            ),
            Err(_) => DEFAULT_API_TIMEOUT,
        };
        Ok(FactorySettings {
            plugin_data_dir: plugin_data_dir.into(),
            edit_profile_url,
            api_timeout,
        })
    }

    /// The directory that holds one instance file per profile.
    pub fn state_directory(&self) -> PathBuf {
        self.plugin_data_dir.join(STATE_DIRECTORY_NAME)
    }

    /// Create the state directory if needed. An existing directory is fine.
    pub fn ensure_state_directory(&self) -> Result<PathBuf, BootstrapError> {
        let path = self.state_directory();
        create_dir(&path)?;
        debug!("Using state directory '{}'", path.display());
        Ok(path)
    }
}

fn create_dir(path: &Path) -> Result<(), BootstrapError> {
    std::fs::create_dir_all(path).context(CreateDirectorySnafu { path })?;
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn state_directory_is_idempotent() {
        let dir = tempfile::TempDir::new().unwrap();
        let settings = FactorySettings::new(dir.path());
        let first = settings.ensure_state_directory().unwrap();
        let second = settings.ensure_state_directory().unwrap();
        assert_eq!(first, second);
        assert_eq!(first, dir.path().join("azureIdx"));
        assert!(first.is_dir());
    }

    #[test]
    fn state_directory_under_a_file_fails() {
        let dir = tempfile::TempDir::new().unwrap();
        let file = dir.path().join("plain-file");
        std::fs::write(&file, "x").unwrap();
        let settings = FactorySettings::new(&file);
        assert!(settings.ensure_state_directory().is_err());
    }
}
