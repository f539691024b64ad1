use super::types::{
    AnalyticsConfig, CacheConfig, MetricaConfig, RawAnalyticsConfig, RawCacheConfig,
    RawMetricaConfig,
};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load merged configuration (user + project)
    pub fn load() -> Result<MetricaConfig> {
        Self::load_layers(&Self::user_config_path(), &Self::project_config_path())
    }

    /// Merge the user layer and then the project layer over the defaults
    pub fn load_layers(user_path: &Path, project_path: &Path) -> Result<MetricaConfig> {
        let mut raw = RawMetricaConfig::default();

        // Layer 1: User config
        if let Some(user_config) = Self::read_raw(user_path)? {
            raw = Self::merge_raw(raw, user_config);
        }

        // Layer 2: Project config
        if let Some(project_config) = Self::read_raw(project_path)? {
            raw = Self::merge_raw(raw, project_config);
        }

        Self::finalize(raw)
    }

    /// Get user config path (`~/.config/metrica/config.toml`)
    pub fn user_config_path() -> PathBuf {
        metrica_paths::config_dir().join("config.toml")
    }

    /// Get project config path
    /// Can be overridden with METRICA_PROJECT_CONFIG_DIR env var (useful for isolated tests)
    pub fn project_config_path() -> PathBuf {
        if let Ok(dir) = std::env::var("METRICA_PROJECT_CONFIG_DIR") {
            PathBuf::from(dir).join("config.toml")
        } else {
            PathBuf::from(".metrica/config.toml")
        }
    }

    fn read_raw(path: &Path) -> Result<Option<RawMetricaConfig>> {
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let raw = toml::from_str(&contents)
            .with_context(|| format!("parsing {}", path.display()))?;
        Ok(Some(raw))
    }

    /// Merge two raw configs (overlay values override base only if explicitly set)
    fn merge_raw(base: RawMetricaConfig, overlay: RawMetricaConfig) -> RawMetricaConfig {
        RawMetricaConfig {
            cache: RawCacheConfig {
                ttl_hours: overlay.cache.ttl_hours.or(base.cache.ttl_hours),
                enabled: overlay.cache.enabled.or(base.cache.enabled),
                database: overlay.cache.database.or(base.cache.database),
            },
            analytics: RawAnalyticsConfig {
                project_id: overlay.analytics.project_id.or(base.analytics.project_id),
            },
        }
    }

    /// Convert raw config to final config with defaults applied
    fn finalize(raw: RawMetricaConfig) -> Result<MetricaConfig> {
        let cache_defaults = CacheConfig::default();
        let config = MetricaConfig {
            cache: CacheConfig {
                ttl_hours: raw.cache.ttl_hours.unwrap_or(cache_defaults.ttl_hours),
                enabled: raw.cache.enabled.unwrap_or(cache_defaults.enabled),
                database: raw.cache.database.unwrap_or(cache_defaults.database),
            },
            analytics: AnalyticsConfig {
                project_id: raw
                    .analytics
                    .project_id
                    .unwrap_or(AnalyticsConfig::default().project_id),
            },
        };
        config.cache.ttl()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_config(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "{contents}").unwrap();
        path
    }

    #[test]
    fn test_load_without_files_returns_defaults() {
        let temp_dir = TempDir::new().unwrap();

        let config = ConfigLoader::load_layers(
            &temp_dir.path().join("user.toml"),
            &temp_dir.path().join("project.toml"),
        )
        .unwrap();

        assert_eq!(config.cache.ttl_hours, 24);
        assert!(config.cache.enabled);
        assert_eq!(config.analytics.project_id, 1);
    }

    #[test]
    fn test_project_layer_overrides_user_layer() {
        let temp_dir = TempDir::new().unwrap();
        let user = write_config(
            &temp_dir,
            "user.toml",
            r#"
[cache]
ttl_hours = 12
database = "/data/user.db"

[analytics]
project_id = 3
"#,
        );
        let project = write_config(
            &temp_dir,
            "project.toml",
            r#"
[cache]
enabled = false

[analytics]
project_id = 7
"#,
        );

        let config = ConfigLoader::load_layers(&user, &project).unwrap();

        assert_eq!(config.cache.ttl_hours, 12);
        assert!(!config.cache.enabled);
        assert_eq!(config.cache.database, PathBuf::from("/data/user.db"));
        assert_eq!(config.analytics.project_id, 7);
    }

    #[test]
    fn test_load_invalid_toml_returns_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_config(&temp_dir, "invalid.toml", "this is not valid toml {{{{");

        let result = ConfigLoader::load_layers(&path, &temp_dir.path().join("none.toml"));

        assert!(result.is_err());
    }

    #[test]
    fn test_load_rejects_unusable_ttl() {
        let temp_dir = TempDir::new().unwrap();
        let none = temp_dir.path().join("none.toml");

        for ttl in ["0", "-1", "10000000000"] {
            let path = write_config(&temp_dir, "ttl.toml", &format!("[cache]\nttl_hours = {ttl}"));
            let err = ConfigLoader::load_layers(&path, &none).unwrap_err();
            assert!(err.to_string().contains("ttl_hours"), "{ttl}: {err}");
        }
    }

    #[test]
    fn test_merge_raw_none_preserves_base() {
        let base = RawMetricaConfig {
            cache: RawCacheConfig {
                ttl_hours: Some(48),
                enabled: Some(false),
                database: Some(PathBuf::from("/base.db")),
            },
            analytics: RawAnalyticsConfig {
                project_id: Some(9),
            },
        };

        let merged = ConfigLoader::merge_raw(base, RawMetricaConfig::default());

        assert_eq!(merged.cache.ttl_hours, Some(48));
        assert_eq!(merged.cache.enabled, Some(false));
        assert_eq!(merged.cache.database, Some(PathBuf::from("/base.db")));
        assert_eq!(merged.analytics.project_id, Some(9));
    }

    #[test]
    fn test_user_config_path_is_under_metrica_config_dir() {
        let path = ConfigLoader::user_config_path();

        assert!(path.ends_with("metrica/config.toml"));
    }

    #[test]
    #[serial]
    fn test_project_config_path_default() {
        unsafe {
            std::env::remove_var("METRICA_PROJECT_CONFIG_DIR");
        }

        let path = ConfigLoader::project_config_path();

        assert_eq!(path, PathBuf::from(".metrica/config.toml"));
    }

    #[test]
    #[serial]
    fn test_project_config_path_respects_env() {
        unsafe {
            std::env::set_var("METRICA_PROJECT_CONFIG_DIR", "/tmp/metrica-e2e");
        }

        let path = ConfigLoader::project_config_path();

        unsafe {
            std::env::remove_var("METRICA_PROJECT_CONFIG_DIR");
        }
        assert_eq!(path, PathBuf::from("/tmp/metrica-e2e/config.toml"));
    }
}
