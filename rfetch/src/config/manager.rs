//! Configuration file wrangling
// (c) 2026 The rfetch developers

use std::path::{Path, PathBuf};

use figment::{
    Figment, Provider,
    providers::{Env, Format as _, Toml},
};
use serde::Deserialize;
use tracing::{debug, warn};

use super::{BASE_CONFIG_FILENAME, ConfigurationOverrides, ENV_PREFIX, SystemDefault};

/// Processes and merges all possible configuration sources.
///
/// Configuration file locations are platform-dependent.
/// To see what applies on the current platform, run `rfetch --config-files`.
#[derive(Debug)]
pub struct Manager {
    /// Configuration data
    pub(super) data: Figment,
}

impl Manager {
    /// Constructor. The system defaults are always applied, at the lowest priority.
    fn new(apply_config_files: bool, apply_env: bool) -> Self {
        let mut mgr = Self {
            data: Figment::new().join(SystemDefault {}),
        };
        if apply_config_files {
            // N.B. This may leave data in a fused-error state, if a config file isn't parseable.
            if let Some(p) = system_config_path() {
                mgr.merge_toml_file(&p, "system");
            } else {
                debug!("no system configuration file on this platform");
            }
            match user_config_path() {
                Some(p) => mgr.merge_toml_file(&p, "user"),
                None => warn!("could not determine user configuration file path"),
            }
        }
        if apply_env {
            mgr.merge_provider(Env::prefixed(ENV_PREFIX));
        }
        mgr
    }

    /// General constructor for production use
    ///
    /// Initialises this structure, reading the set of config files appropriate to the platform
    /// and the current user, then the environment.
    #[must_use]
    pub fn standard() -> Self {
        Self::new(true, true)
    }

    /// Testing/internal constructor, does not read files from system or apply environment; DOES apply system default.
    #[must_use]
    pub fn without_files() -> Self {
        Self::new(false, false)
    }

    /// Returns the list of configuration files we read, in the order we read them.
    ///
    /// This is a function of platform and the current user.
    #[must_use]
    pub fn config_files() -> Vec<PathBuf> {
        system_config_path()
            .into_iter()
            .chain(user_config_path())
            .collect()
    }

    /// Merges in a data set, which is some sort of [figment::Provider](https://docs.rs/figment/latest/figment/trait.Provider.html).
    /// This uses figment's `merge` operation, which prefers to _replace_ existing items.
    pub fn merge_provider<T>(&mut self, provider: T)
    where
        T: Provider,
    {
        let f = std::mem::take(&mut self.data);
        self.data = f.merge(provider); // in the error case, this leaves the provider in a fused state
    }

    /// Merges in a TOML configuration file, if it exists.
    ///
    /// `what` describes the file in log messages.
    /// Syntax errors are not reported here, but when the configuration is extracted.
    pub fn merge_toml_file(&mut self, path: &Path, what: &str) {
        if !path.exists() {
            debug!("{what} configuration file {path:?} not present");
            return;
        }
        debug!("reading {what} configuration file {path:?}");
        self.merge_provider(Toml::file_exact(path));
    }

    /// Applies options given on the command line, at the highest priority
    pub fn apply_overrides(&mut self, overrides: &ConfigurationOverrides) {
        self.merge_provider(overrides.clone());
    }

    /// Attempts to extract a particular struct from the data.
    ///
    /// Within rfetch, `T` is usually [`Configuration`](super::Configuration), but it isn't intrinsically required to be.
    /// (This is useful for unit testing.)
    pub fn get<'de, T>(&self) -> Result<T, figment::Error>
    where
        T: Deserialize<'de>,
    {
        self.data.extract::<T>()
    }
}

/// The system-wide configuration file
fn system_config_path() -> Option<PathBuf> {
    if cfg!(unix) {
        Some(PathBuf::from("/etc").join(BASE_CONFIG_FILENAME))
    } else {
        std::env::var_os("ProgramData").map(|p| PathBuf::from(p).join(BASE_CONFIG_FILENAME))
    }
}

/// The current user's configuration file
fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("rfetch").join(BASE_CONFIG_FILENAME))
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod test {
    use std::io::Write as _;
    use std::path::PathBuf;

    use pretty_assertions::assert_eq;
    use serde::Deserialize;

    use crate::config::{Configuration, ConfigurationOverrides, Manager};
    use crate::util::{AddressFamily, TimeFormat};

    fn write_config(dir: &tempfile::TempDir, contents: &str) -> PathBuf {
        let path = dir.path().join("test.toml");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn defaults() {
        let mgr = Manager::without_files();
        let result = mgr.get::<Configuration>().unwrap();
        let expected = Configuration::system_default();
        assert_eq!(*expected, result);
    }

    #[test]
    fn config_merge() {
        // simulate a CLI
        let entered = ConfigurationOverrides {
            buffer_size: Some(12345),
            ..Default::default()
        };
        let expected = Configuration {
            buffer_size: 12345,
            ..Configuration::system_default().clone()
        };

        let mut mgr = Manager::without_files();
        mgr.apply_overrides(&entered);
        let result = mgr.get::<Configuration>().unwrap();
        assert_eq!(expected, result);
    }

    #[test]
    fn file_overrides_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            r#"
            port = 9999
            server_root = "/srv/files"
            address_family = 6
            time_format = "UTC"
            "#,
        );
        let mut mgr = Manager::without_files();
        mgr.merge_toml_file(&path, "test");
        let result = mgr.get::<Configuration>().unwrap();
        assert_eq!(result.port, 9999);
        assert_eq!(result.server_root, PathBuf::from("/srv/files"));
        assert_eq!(result.address_family, AddressFamily::Inet6);
        assert_eq!(result.time_format, TimeFormat::Utc);
        // untouched
        assert_eq!(result.buffer_size, 102_400);
    }

    #[test]
    fn cli_beats_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "port = 9999\nconnect_timeout = 3\n");
        let mut mgr = Manager::without_files();
        mgr.merge_toml_file(&path, "test");
        // The order of merging mirrors what happens in the CLI
        mgr.apply_overrides(&ConfigurationOverrides {
            port: Some(1234),
            ..Default::default()
        });
        let result = mgr.get::<Configuration>().unwrap();
        assert_eq!(result.port, 1234);
        assert_eq!(result.connect_timeout, 3);
    }

    #[test]
    fn missing_file_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let mut mgr = Manager::without_files();
        mgr.merge_toml_file(&dir.path().join("nonexistent.toml"), "test");
        assert!(mgr.get::<Configuration>().is_ok());
    }

    #[test]
    fn type_error() {
        #[derive(Deserialize)]
        struct Test {
            magic: i32,
        }
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "port = \"wombat\"\nmagic = 42\n");
        let mut mgr = Manager::without_files();
        mgr.merge_toml_file(&path, "test");
        // This file successfully merges into the config, but you can't extract the struct.
        let err = mgr.get::<Configuration>().unwrap_err();
        assert!(err.to_string().contains("port"), "{err}");

        // But the config as a whole is not broken and other things can be extracted:
        let other_struct = mgr.get::<Test>().unwrap();
        assert_eq!(other_struct.magic, 42);
    }

    #[test]
    fn syntax_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "port = = 4\n");
        let mut mgr = Manager::without_files();
        mgr.merge_toml_file(&path, "test");
        assert!(mgr.get::<Configuration>().is_err());
    }

    #[test]
    fn invalid_enum() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "address_family = \"wombat\"\n");
        let mut mgr = Manager::without_files();
        mgr.merge_toml_file(&path, "test");
        let err = mgr.get::<Configuration>().unwrap_err().to_string();
        assert!(err.contains("wombat"), "{err}");
        assert!(err.contains("inet6"), "{err}");
    }

    #[test]
    fn config_file_list() {
        let files = Manager::config_files();
        assert!(!files.is_empty());
        assert!(files.iter().all(|f| f.ends_with("rfetch.toml")));
    }
}
