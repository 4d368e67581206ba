//! Settings resolution: defaults < config file < command-line flags

use amsreport_core::config::DEFAULT_CONFIG_FILE;
use amsreport_core::Settings;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Command-line values that override the config file
#[derive(Clone, Debug, Default)]
pub struct Overrides {
    pub config: Option<PathBuf>,
    pub base_path: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
}

pub fn resolve(overrides: &Overrides) -> Result<Settings> {
    let mut settings = match config_file(overrides) {
        Some(path) => {
            debug!("loading settings from {}", path.display());
            Settings::load(&path).with_context(|| format!("failed to load config {}", path.display()))?
        }
        None => Settings::default(),
    };

    if let Some(base_path) = &overrides.base_path {
        settings.base_path.clone_from(base_path);
    }
    if let Some(output_dir) = &overrides.output_dir {
        settings.output_dir.clone_from(output_dir);
    }
    settings.validate().context("invalid settings")?;
    Ok(settings)
}

/// Explicit `--config`, else `amsreport.toml` in the base path when present
fn config_file(overrides: &Overrides) -> Option<PathBuf> {
    if let Some(path) = &overrides.config {
        return Some(path.clone());
    }
    let base = overrides.base_path.as_deref().unwrap_or(Path::new("."));
    let candidate = base.join(DEFAULT_CONFIG_FILE);
    candidate.is_file().then_some(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_config() {
        let dir = tempfile::tempdir().unwrap();
        let settings = resolve(&Overrides {
            base_path: Some(dir.path().to_path_buf()),
            ..Overrides::default()
        })
        .unwrap();
        assert_eq!(settings.base_path, dir.path());
        assert_eq!(settings.retry_attempts, 3);
    }

    #[test]
    fn discovered_config_is_overridden_by_flags() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("amsreport.toml"),
            "output_dir = \"from-config\"\nretry_attempts = 7\n",
        )
        .unwrap();

        let settings = resolve(&Overrides {
            base_path: Some(dir.path().to_path_buf()),
            output_dir: Some(PathBuf::from("from-flag")),
            ..Overrides::default()
        })
        .unwrap();
        assert_eq!(settings.output_dir, PathBuf::from("from-flag"));
        assert_eq!(settings.retry_attempts, 7);
    }

    #[test]
    fn explicit_config_must_exist() {
        let err = resolve(&Overrides {
            config: Some(PathBuf::from("/definitely/missing/amsreport.toml")),
            ..Overrides::default()
        })
        .unwrap_err();
        assert!(format!("{err:#}").contains("failed to load config"));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "highlight_low = 20.0\nhighlight_high = 10.0\n").unwrap();
        let err = resolve(&Overrides {
            config: Some(path),
            ..Overrides::default()
        })
        .unwrap_err();
        assert!(format!("{err:#}").contains("highlight_low"));
    }
}
