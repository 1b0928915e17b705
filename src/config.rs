//! Settings file naming the base directories of the three data stores.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Result, SdmError};

/// Locations of the CoD tables, region masks and the daily archive, read
/// from a TOML file.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Root of the per-identity CoD directory tree.
    pub cod_base_dir: PathBuf,
    /// Directory holding the `mask_<region>.nc` files.
    pub mask_base_dir: PathBuf,
    /// Root of the month-chunked daily archive.
    pub gridded_base_dir: PathBuf,
    /// Spatial resolution tag used in archive file names.
    #[serde(default = "default_resolution")]
    pub resolution: String,
}

fn default_resolution() -> String {
    "0.05".to_string()
}

impl Settings {
    /// Default settings location, `~/.sdm.toml`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".sdm.toml"))
    }

    /// Load settings from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(SdmError::NotFound {
                what: "settings file",
                path: path.to_path_buf(),
            });
        }
        let text = std::fs::read_to_string(path)?;
        toml::from_str(&text)
            .map_err(|e| SdmError::Parse(format!("{}: {}", path.display(), e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_settings() {
        let settings: Settings = toml::from_str(
            r#"
            cod_base_dir = "/data/cod"
            mask_base_dir = "/data/masks"
            gridded_base_dir = "/data/awap"
            "#,
        )
        .unwrap();
        assert_eq!(settings.cod_base_dir, PathBuf::from("/data/cod"));
        assert_eq!(settings.resolution, "0.05");
    }

    #[test]
    fn test_resolution_override() {
        let settings: Settings = toml::from_str(
            r#"
            cod_base_dir = "/data/cod"
            mask_base_dir = "/data/masks"
            gridded_base_dir = "/data/awap"
            resolution = "0.25"
            "#,
        )
        .unwrap();
        assert_eq!(settings.resolution, "0.25");
    }

    #[test]
    fn test_unknown_key_rejected() {
        let result: std::result::Result<Settings, _> = toml::from_str(
            r#"
            cod_base_dir = "/data/cod"
            mask_base_dir = "/data/masks"
            gridded_base_dir = "/data/awap"
            typo_key = 1
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_settings_file() {
        let err = Settings::load(Path::new("/no/such/settings.toml")).unwrap_err();
        assert!(matches!(err, SdmError::NotFound { .. }));
    }
}
