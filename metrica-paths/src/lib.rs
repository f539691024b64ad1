//! XDG Base Directory paths for metrica.
//!
//! The CLI uses XDG paths on every platform rather than platform-native
//! ones, so `~/.config/metrica` holds config on macOS too.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

const APP: &str = "metrica";

/// File name of the analytics cache database inside [`data_dir`].
pub const CACHE_DATABASE: &str = "analytics.db";

/// Get the metrica config directory.
///
/// Returns `$XDG_CONFIG_HOME/metrica` if set, otherwise `~/.config/metrica`.
///
/// # Examples
///
/// ```
/// use metrica_paths::config_dir;
///
/// let config = config_dir();
/// let user_config = config.join("config.toml");
/// ```
pub fn config_dir() -> PathBuf {
    resolve(
        std::env::var_os("XDG_CONFIG_HOME"),
        dirs::home_dir(),
        Path::new(".config"),
    )
}

/// Get the metrica data directory.
///
/// Returns `$XDG_DATA_HOME/metrica` if set, otherwise `~/.local/share/metrica`.
pub fn data_dir() -> PathBuf {
    resolve(
        std::env::var_os("XDG_DATA_HOME"),
        dirs::home_dir(),
        Path::new(".local/share"),
    )
}

/// Default location of the analytics cache database.
pub fn cache_database() -> PathBuf {
    data_dir().join(CACHE_DATABASE)
}

/// `<xdg>/metrica` when the variable is set and non-empty, else
/// `<home>/<fallback>/metrica`, else the relative `<fallback>/metrica`.
fn resolve(xdg: Option<OsString>, home: Option<PathBuf>, fallback: &Path) -> PathBuf {
    match (xdg.filter(|v| !v.is_empty()), home) {
        (Some(base), _) => PathBuf::from(base).join(APP),
        (None, Some(home)) => home.join(fallback).join(APP),
        (None, None) => fallback.join(APP),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_dir_ends_with_metrica() {
        assert!(config_dir().ends_with("metrica"));
    }

    #[test]
    fn cache_database_lives_in_data_dir() {
        let path = cache_database();

        assert_eq!(path.file_name().unwrap(), CACHE_DATABASE);
        assert!(path.parent().unwrap().ends_with("metrica"));
    }

    #[test]
    fn xdg_variable_wins_over_home() {
        let path = resolve(
            Some("/tmp/test-config".into()),
            Some(PathBuf::from("/home/ana")),
            Path::new(".config"),
        );

        assert_eq!(path, PathBuf::from("/tmp/test-config/metrica"));
    }

    #[test]
    fn empty_xdg_variable_falls_back_to_home() {
        let path = resolve(
            Some(OsString::new()),
            Some(PathBuf::from("/home/ana")),
            Path::new(".local/share"),
        );

        assert_eq!(path, PathBuf::from("/home/ana/.local/share/metrica"));
    }

    #[test]
    fn missing_home_gives_relative_path() {
        let path = resolve(None, None, Path::new(".config"));

        assert_eq!(path, PathBuf::from(".config/metrica"));
    }
}
